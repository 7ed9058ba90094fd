use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Maximum length of the free-text message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Lowest and highest accepted star rating.
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// The four form fields the widget knows how to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    #[serde(alias = "feedback")]
    Message,
    Rating,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Message, Field::Rating];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Message => "message",
            Field::Rating => "rating",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Field::Name),
            "email" => Ok(Field::Email),
            "message" | "feedback" => Ok(Field::Message),
            "rating" => Ok(Field::Rating),
            other => Err(format!("Unknown field: {}", other)),
        }
    }
}

/// The payload being collected. Every field is optional until validation
/// decides otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, alias = "feedback", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl FeedbackRecord {
    /// Empty record pre-filled with the embedding application's known
    /// name/email, used at mount and after every reset.
    pub fn prefilled(name: Option<&str>, email: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            message: None,
            rating: None,
        }
    }

    /// Text value of a field as the form would display it.
    pub fn text(&self, field: Field) -> Option<String> {
        match field {
            Field::Name => self.name.clone(),
            Field::Email => self.email.clone(),
            Field::Message => self.message.clone(),
            Field::Rating => self.rating.map(|r| r.to_string()),
        }
    }

    /// Store a keystroke-level update. Empty strings clear the field.
    /// Rating text that does not parse clears the rating.
    pub fn set_text(&mut self, field: Field, value: &str) {
        let value = if value.is_empty() { None } else { Some(value.to_string()) };
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Message => self.message = value,
            Field::Rating => self.rating = value.and_then(|v| v.trim().parse().ok()),
        }
    }

    pub fn set_rating(&mut self, rating: u8) {
        // 0 is how the star control reports "nothing selected"
        self.rating = if rating == 0 { None } else { Some(rating) };
    }

    /// Drop a field from the record entirely.
    pub fn clear(&mut self, field: Field) {
        match field {
            Field::Name => self.name = None,
            Field::Email => self.email = None,
            Field::Message => self.message = None,
            Field::Rating => self.rating = None,
        }
    }
}

/// Which fields the form shows, and which of those must be filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRequirements {
    pub required: BTreeSet<Field>,
    pub optional: BTreeSet<Field>,
}

impl Default for FieldRequirements {
    fn default() -> Self {
        Self {
            required: [Field::Name, Field::Email, Field::Message].into_iter().collect(),
            optional: [Field::Rating].into_iter().collect(),
        }
    }
}

impl FieldRequirements {
    pub fn new(
        required: impl IntoIterator<Item = Field>,
        optional: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self {
            required: required.into_iter().collect(),
            optional: optional.into_iter().collect(),
        }
    }

    pub fn is_required(&self, field: Field) -> bool {
        self.required.contains(&field)
    }

    /// A field is rendered when it is either required or optional.
    pub fn is_visible(&self, field: Field) -> bool {
        self.required.contains(&field) || self.optional.contains(&field)
    }

    /// Visible fields in form order.
    pub fn visible(&self) -> Vec<Field> {
        Field::ALL.into_iter().filter(|f| self.is_visible(*f)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_parsing_accepts_feedback_alias() {
        assert_eq!("feedback".parse::<Field>().unwrap(), Field::Message);
        assert_eq!(" Email ".parse::<Field>().unwrap(), Field::Email);
        assert!("phone".parse::<Field>().is_err());
    }

    #[test]
    fn test_record_accepts_feedback_key() {
        let record: FeedbackRecord =
            serde_json::from_str(r#"{"name":"Ada","feedback":"Nice","rating":4}"#).unwrap();
        assert_eq!(record.message.as_deref(), Some("Nice"));
        assert_eq!(record.rating, Some(4));
        assert_eq!(record.email, None);
    }

    #[test]
    fn test_set_text_and_rating() {
        let mut record = FeedbackRecord::prefilled(Some("Ada"), None);
        record.set_text(Field::Message, "hello");
        record.set_text(Field::Name, "");
        record.set_rating(0);
        assert_eq!(record.message.as_deref(), Some("hello"));
        assert_eq!(record.name, None);
        assert_eq!(record.rating, None);

        record.set_text(Field::Rating, "3");
        assert_eq!(record.rating, Some(3));
    }

    #[test]
    fn test_default_requirements() {
        let req = FieldRequirements::default();
        assert!(req.is_required(Field::Email));
        assert!(!req.is_required(Field::Rating));
        assert_eq!(req.visible(), Field::ALL.to_vec());

        let req = FieldRequirements::new([Field::Message], []);
        assert_eq!(req.visible(), vec![Field::Message]);
    }
}
