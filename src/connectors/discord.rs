//! Chat-webhook backend: one JSON POST to an incoming webhook URL.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use url::Url;

use super::summary::FeedbackSummary;
use crate::record::FeedbackRecord;
use crate::transport::OutboundRequest;

pub fn payload(record: &FeedbackRecord, submitted_at: DateTime<Utc>) -> Value {
    let summary = FeedbackSummary::from_record(record);
    json!({
        "embeds": [
            {
                "title": summary.title,
                "color": summary.accent,
                "fields": [
                    { "name": "Name", "value": summary.name, "inline": true },
                    { "name": "Email", "value": summary.email, "inline": true },
                    { "name": "Rating", "value": summary.rating, "inline": true },
                    { "name": "Feedback", "value": summary.message, "inline": false }
                ],
                "timestamp": submitted_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            }
        ]
    })
}

pub fn build_request(webhook_url: &Url, record: &FeedbackRecord, submitted_at: DateTime<Utc>) -> OutboundRequest {
    OutboundRequest::json(webhook_url.as_str(), payload(record, submitted_at))
}
