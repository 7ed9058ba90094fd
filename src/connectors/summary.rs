use crate::record::FeedbackRecord;

pub const TITLE: &str = "New Feedback Received";

const ANONYMOUS: &str = "Anonymous";
const NOT_PROVIDED: &str = "Not provided";
const NO_FEEDBACK: &str = "No feedback provided";

/// Accent used when no rating was given.
pub const NEUTRAL_ACCENT: u32 = 0x95A5A6;

// 1 = alert red ... 5 = positive green
const RATING_ACCENTS: [u32; 5] = [0xE74C3C, 0xE67E22, 0xF1C40F, 0x9ACD32, 0x2ECC71];

/// 24-bit RGB accent for a rating. Out-of-range ratings snap to the nearest end.
pub fn accent_color(rating: Option<u8>) -> u32 {
    match rating {
        None | Some(0) => NEUTRAL_ACCENT,
        Some(r) => RATING_ACCENTS[(r.min(5) - 1) as usize],
    }
}

pub fn accent_hex(accent: u32) -> String {
    format!("#{:06X}", accent)
}

/// Display strings shared by the chat backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSummary {
    pub title: &'static str,
    pub name: String,
    pub email: String,
    pub rating: String,
    pub message: String,
    pub accent: u32,
}

impl FeedbackSummary {
    pub fn from_record(record: &FeedbackRecord) -> Self {
        Self {
            title: TITLE,
            name: record.name.clone().unwrap_or_else(|| ANONYMOUS.to_string()),
            email: record.email.clone().unwrap_or_else(|| NOT_PROVIDED.to_string()),
            rating: match record.rating {
                Some(r) if r > 0 => format!("`{}`/5", r),
                _ => NOT_PROVIDED.to_string(),
            },
            message: record.message.clone().unwrap_or_else(|| NO_FEEDBACK.to_string()),
            accent: accent_color(record.rating),
        }
    }

    /// Single-line rendering for plain-text fallbacks.
    pub fn plain_text(&self) -> String {
        format!(
            "{}: {} <{}> rated {}: {}",
            self.title, self.name, self.email, self.rating, self.message
        )
    }
}
