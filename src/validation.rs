use log::debug;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

use crate::record::{FeedbackRecord, Field, FieldRequirements, MAX_MESSAGE_CHARS, MAX_RATING, MIN_RATING};

pub const CODE_REQUIRED: &str = "required";
pub const CODE_EMAIL: &str = "email";
pub const CODE_LENGTH: &str = "length";
pub const CODE_RANGE: &str = "range";

// User-facing text for the codes this module emits. Anything else is shown as-is.
static ERROR_MESSAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (CODE_REQUIRED, "Field cannot be empty."),
        (CODE_EMAIL, "Please enter a valid email address."),
        (CODE_LENGTH, "Please Keep it brief! Max 500 characters allowed."),
        (CODE_RANGE, "Please choose a rating between 1 and 5."),
    ])
});

/// Maps an error code to the string rendered under the field.
pub fn error_message(code: &str) -> String {
    ERROR_MESSAGES
        .get(code)
        .map(|m| m.to_string())
        .unwrap_or_else(|| code.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub code: String,
    pub message: String,
}

/// Per-field validation failures, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(pub BTreeMap<Field, FieldError>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    pub fn message(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(|e| e.message.as_str())
    }

    pub fn code(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(|e| e.code.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn from_validator(errors: &ValidationErrors) -> Self {
        let mut out = BTreeMap::new();
        for (name, errs) in errors.field_errors() {
            let Ok(field) = name.parse::<Field>() else {
                continue;
            };
            if let Some(first) = errs.first() {
                let code = first.code.to_string();
                out.insert(
                    field,
                    FieldError {
                        message: error_message(&code),
                        code,
                    },
                );
            }
        }
        FieldErrors(out)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checks `record` against the requirement sets and returns the normalised
/// record: strings trimmed, empty strings dropped, hidden fields removed.
pub fn validate(
    requirements: &FieldRequirements,
    record: &FeedbackRecord,
) -> Result<FeedbackRecord, FieldErrors> {
    let mut errors = ValidationErrors::new();
    let mut normalized = FeedbackRecord::default();

    if requirements.is_visible(Field::Name) {
        normalized.name = non_empty(&record.name);
        if normalized.name.is_none() && requirements.is_required(Field::Name) {
            errors.add("name", ValidationError::new(CODE_REQUIRED));
        }
    }

    if requirements.is_visible(Field::Email) {
        normalized.email = non_empty(&record.email);
        match normalized.email.as_deref() {
            None if requirements.is_required(Field::Email) => {
                errors.add("email", ValidationError::new(CODE_REQUIRED));
            }
            Some(email) if !validator::validate_email(email) => {
                errors.add("email", ValidationError::new(CODE_EMAIL));
            }
            _ => {}
        }
    }

    if requirements.is_visible(Field::Message) {
        normalized.message = non_empty(&record.message);
        match normalized.message.as_deref() {
            None if requirements.is_required(Field::Message) => {
                errors.add("message", ValidationError::new(CODE_REQUIRED));
            }
            Some(message) if message.chars().count() > MAX_MESSAGE_CHARS => {
                errors.add("message", ValidationError::new(CODE_LENGTH));
            }
            _ => {}
        }
    }

    if requirements.is_visible(Field::Rating) {
        normalized.rating = record.rating.filter(|r| *r != 0);
        match normalized.rating {
            None if requirements.is_required(Field::Rating) => {
                errors.add("rating", ValidationError::new(CODE_RANGE));
            }
            Some(r) if !(MIN_RATING..=MAX_RATING).contains(&r) => {
                errors.add("rating", ValidationError::new(CODE_RANGE));
            }
            _ => {}
        }
    }

    if errors.errors().is_empty() {
        Ok(normalized)
    } else {
        let errors = FieldErrors::from_validator(&errors);
        debug!("Feedback validation failed on {} field(s)", errors.len());
        Err(errors)
    }
}
