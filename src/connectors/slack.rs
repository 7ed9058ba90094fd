//! Token-authenticated chat API backend (`chat.postMessage`).

use serde_json::{json, Value};
use url::Url;

use super::summary::{accent_hex, FeedbackSummary};
use crate::record::FeedbackRecord;
use crate::transport::{OutboundRequest, TransportError, TransportResponse};

pub const DEFAULT_API_BASE: &str = "https://slack.com";
const POST_MESSAGE_SEGMENTS: [&str; 2] = ["api", "chat.postMessage"];

/// Appends `api/chat.postMessage` to the base, keeping any path prefix.
pub fn post_message_url(api_base: &Url) -> String {
    let mut url = api_base.clone();
    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments.pop_if_empty().extend(POST_MESSAGE_SEGMENTS);
        }
        Err(()) => {
            return format!(
                "{}/{}",
                api_base.as_str().trim_end_matches('/'),
                POST_MESSAGE_SEGMENTS.join("/")
            )
        }
    }
    url.to_string()
}

pub fn blocks(summary: &FeedbackSummary) -> Value {
    json!([
        {
            "type": "header",
            "text": { "type": "plain_text", "text": summary.title }
        },
        {
            "type": "section",
            "fields": [
                { "type": "mrkdwn", "text": format!("*Name:*\n{}", summary.name) },
                { "type": "mrkdwn", "text": format!("*Email:*\n{}", summary.email) },
                { "type": "mrkdwn", "text": format!("*Rating:*\n{}", summary.rating) }
            ]
        },
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("*Feedback:*\n{}", summary.message) }
        },
        {
            "type": "context",
            "elements": [
                { "type": "mrkdwn", "text": format!("Accent {}", accent_hex(summary.accent)) }
            ]
        }
    ])
}

pub fn build_request(api_base: &Url, token: &str, channel: &str, record: &FeedbackRecord) -> OutboundRequest {
    let summary = FeedbackSummary::from_record(record);
    OutboundRequest::form(
        post_message_url(api_base),
        vec![
            ("channel".to_string(), channel.to_string()),
            ("text".to_string(), summary.plain_text()),
            ("blocks".to_string(), blocks(&summary).to_string()),
            ("token".to_string(), token.to_string()),
        ],
    )
}

/// The API answers 200 even for failures; the JSON `ok` flag is authoritative.
pub fn check_ok(response: &TransportResponse) -> Result<(), TransportError> {
    let body = response
        .json()
        .ok_or_else(|| TransportError::Rejected("response was not JSON".to_string()))?;

    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        Ok(())
    } else {
        let reason = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("ok flag missing or false");
        Err(TransportError::Rejected(reason.to_string()))
    }
}
