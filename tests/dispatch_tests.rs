mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::ScriptedTransport;
use feedback_widget::connectors::{DiscordSettings, SlackSettings, StoreSettings};
use feedback_widget::transport::{RequestBody, TransportError, TransportResponse};
use feedback_widget::{ConnectorConfig, DispatchError, Dispatcher, FeedbackRecord, RetryPolicy};
use serde_json::Value;

fn record() -> FeedbackRecord {
    FeedbackRecord {
        name: Some("Ada".into()),
        email: Some("ada@example.com".into()),
        message: Some("The export button is hidden".into()),
        rating: Some(2),
    }
}

fn quick_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        initial_delay: Duration::from_millis(5),
        timeout: Duration::from_millis(500),
    }
}

fn discord_config() -> ConnectorConfig {
    ConnectorConfig {
        discord: Some(DiscordSettings {
            webhook_url: Some("https://discord.com/api/webhooks/1/token".into()),
        }),
        ..Default::default()
    }
}

fn slack_config() -> ConnectorConfig {
    ConnectorConfig {
        slack: Some(SlackSettings {
            token: Some("xoxb-test".into()),
            channel: Some("C0FEED".into()),
            api_base: Some("http://127.0.0.1:9000".into()),
        }),
        ..Default::default()
    }
}

fn dispatcher(transport: &Arc<ScriptedTransport>, policy: RetryPolicy) -> Dispatcher {
    Dispatcher::new(transport.clone(), policy)
}

#[tokio::test]
async fn test_webhook_delivery_sends_one_embed() {
    let transport = Arc::new(ScriptedTransport::default());
    dispatcher(&transport, quick_policy())
        .dispatch("discord", &record(), &discord_config())
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://discord.com/api/webhooks/1/token");
    assert!(requests[0].header("User-Agent").is_some());

    let RequestBody::Json(body) = &requests[0].body else {
        panic!("webhook body should be JSON");
    };
    let embed = &body["embeds"][0];
    assert_eq!(embed["title"], "New Feedback Received");
    assert_eq!(embed["color"], 0xE67E22);
    assert_eq!(embed["fields"][2]["value"], "`2`/5");
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Ok(TransportResponse::new(500, "boom")),
        Err(TransportError::Network("connection reset".into())),
    ]));
    let result = dispatcher(&transport, quick_policy())
        .dispatch("discord", &record(), &discord_config())
        .await;

    assert_eq!(result, Ok(()));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn test_exhausted_retries_report_last_failure() {
    let transport = Arc::new(ScriptedTransport::failing(503, 10));
    let started = Instant::now();
    let err = dispatcher(&transport, RetryPolicy::default())
        .dispatch("discord", &record(), &discord_config())
        .await
        .unwrap_err();

    // 200 + 400 + 800 ms of backoff between four attempts
    assert!(started.elapsed() >= Duration::from_millis(1400));
    assert_eq!(transport.calls(), 4);
    assert_eq!(
        err,
        DispatchError::DeliveryFailed {
            backend: "discord".into(),
            cause: TransportError::Http {
                status: 503,
                body: "unavailable".into(),
            },
        }
    );
    assert!(!err.is_config_error());
}

#[tokio::test]
async fn test_slow_backend_times_out_each_attempt() {
    let transport = Arc::new(ScriptedTransport::slow(Duration::from_millis(300)));
    let policy = RetryPolicy {
        max_retries: 1,
        initial_delay: Duration::from_millis(5),
        timeout: Duration::from_millis(50),
    };
    let err = dispatcher(&transport, policy)
        .dispatch("discord", &record(), &discord_config())
        .await
        .unwrap_err();

    assert_eq!(transport.calls(), 2);
    assert!(matches!(
        err,
        DispatchError::DeliveryFailed {
            cause: TransportError::Timeout(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_configuration_errors_never_touch_the_network() {
    let transport = Arc::new(ScriptedTransport::default());
    let dispatcher = dispatcher(&transport, quick_policy());

    let unknown = dispatcher.dispatch("teams", &record(), &discord_config()).await.unwrap_err();
    assert_eq!(unknown.to_string(), "Connector 'teams' not found");

    let missing = dispatcher
        .dispatch("store", &record(), &ConnectorConfig::default())
        .await
        .unwrap_err();
    match &missing {
        DispatchError::InvalidConfig { backend, missing, .. } => {
            assert_eq!(backend, "store");
            assert_eq!(missing, &vec!["endpoint_url", "api_key", "collection_name"]);
        }
        other => panic!("expected InvalidConfig, got {:?}", other),
    }
    assert!(missing.is_config_error());
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_chat_api_requires_ok_flag() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Ok(TransportResponse::new(200, r#"{"ok":false,"error":"ratelimited"}"#)),
        Ok(TransportResponse::new(200, r#"{"ok":true,"ts":"1.2"}"#)),
    ]));
    dispatcher(&transport, quick_policy())
        .dispatch("Slack", &record(), &slack_config())
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, "http://127.0.0.1:9000/api/chat.postMessage");
    let RequestBody::Form(fields) = &requests[0].body else {
        panic!("chat API body should be form encoded");
    };
    let blocks = fields
        .iter()
        .find(|(k, _)| k == "blocks")
        .map(|(_, v)| serde_json::from_str::<Value>(v).unwrap())
        .unwrap();
    assert_eq!(blocks[1]["fields"][0]["text"], "*Name:*\nAda");
}

#[tokio::test]
async fn test_chat_api_rejection_is_a_delivery_failure() {
    let transport = Arc::new(ScriptedTransport::new(
        (0..4)
            .map(|_| Ok(TransportResponse::new(200, r#"{"ok":false,"error":"not_in_channel"}"#)))
            .collect(),
    ));
    let err = dispatcher(&transport, quick_policy())
        .dispatch("slack", &record(), &slack_config())
        .await
        .unwrap_err();
    assert_eq!(transport.calls(), 4);
    assert_eq!(
        err,
        DispatchError::DeliveryFailed {
            backend: "slack".into(),
            cause: TransportError::Rejected("not_in_channel".into()),
        }
    );
}

#[tokio::test]
async fn test_store_insert_uses_bearer_key() {
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(TransportResponse::new(201, "{}"))]));
    let config = ConnectorConfig {
        store: Some(StoreSettings {
            endpoint_url: Some("https://db.example.com/rest/v1".into()),
            api_key: Some("service-key".into()),
            collection_name: Some("feedback".into()),
        }),
        ..Default::default()
    };
    dispatcher(&transport, quick_policy())
        .dispatch("supabase", &record(), &config)
        .await
        .unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.url, "https://db.example.com/rest/v1/feedback");
    assert_eq!(request.header("authorization"), Some("Bearer service-key"));
    let RequestBody::Json(body) = &request.body else {
        panic!("store body should be JSON");
    };
    assert_eq!(body["email"], "ada@example.com");
    assert!(body["id"].as_str().is_some());
}
