//! Generic data-store backend: inserts the record into a named collection.
//!
//! `POST {endpoint}/{collection}` with a bearer key and the normalised record
//! plus an id and a submission timestamp as JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use url::Url;
use uuid::Uuid;

use crate::record::FeedbackRecord;
use crate::transport::OutboundRequest;

pub fn collection_url(endpoint: &Url, collection: &str) -> Url {
    let mut url = endpoint.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(collection);
    }
    url
}

pub fn payload(record: &FeedbackRecord, id: Uuid, submitted_at: DateTime<Utc>) -> Value {
    let mut body = serde_json::to_value(record).unwrap_or_else(|_| json!({}));
    if let Some(map) = body.as_object_mut() {
        map.insert("id".to_string(), json!(id.to_string()));
        map.insert(
            "submitted_at".to_string(),
            json!(submitted_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
    }
    body
}

pub fn build_request(
    endpoint: &Url,
    api_key: &str,
    collection: &str,
    record: &FeedbackRecord,
    submitted_at: DateTime<Utc>,
) -> OutboundRequest {
    OutboundRequest::json(
        collection_url(endpoint, collection).as_str(),
        payload(record, Uuid::new_v4(), submitted_at),
    )
    .with_header("Authorization", format!("Bearer {}", api_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_collection_url_joins_segment() {
        let endpoint = Url::parse("https://db.example.com/v1/").unwrap();
        assert_eq!(
            collection_url(&endpoint, "feedback").as_str(),
            "https://db.example.com/v1/feedback"
        );
        let endpoint = Url::parse("https://db.example.com/v1").unwrap();
        assert_eq!(
            collection_url(&endpoint, "user feedback").as_str(),
            "https://db.example.com/v1/user%20feedback"
        );
    }

    #[test]
    fn test_payload_forwards_record() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let record = FeedbackRecord {
            name: Some("Ada".into()),
            email: None,
            message: Some("Hi".into()),
            rating: Some(3),
        };
        let id = Uuid::new_v4();
        let body = payload(&record, id, at);
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["message"], "Hi");
        assert_eq!(body["rating"], 3);
        assert!(body.get("email").is_none());
        assert_eq!(body["id"], id.to_string());
        assert_eq!(body["submitted_at"], "2024-01-02T03:04:05Z");
    }

    #[test]
    fn test_request_carries_bearer_key() {
        let endpoint = Url::parse("https://db.example.com").unwrap();
        let request = build_request(&endpoint, "k3y", "feedback", &FeedbackRecord::default(), Utc::now());
        assert_eq!(request.url, "https://db.example.com/feedback");
        assert_eq!(request.header("Authorization"), Some("Bearer k3y"));
    }
}
