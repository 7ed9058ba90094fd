//! Delivery backends for submitted feedback.
//!
//! A backend is picked by name from a fixed registry, its settings are
//! checked before anything touches the network, and the shaped request is
//! sent through a [`Transport`] under a [`RetryPolicy`].

pub mod discord;
pub mod slack;
pub mod store;
pub mod summary;

use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::record::FeedbackRecord;
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, OutboundRequest, Transport, TransportError, TransportResponse};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Connector '{0}' not found")]
    UnknownBackend(String),
    #[error("Invalid {backend} configuration (missing: {missing:?}, invalid: {invalid:?})")]
    InvalidConfig {
        backend: String,
        missing: Vec<&'static str>,
        invalid: Vec<&'static str>,
    },
    #[error("Settings for {backend} given under more than one key: {keys:?}")]
    AmbiguousConfig { backend: String, keys: Vec<&'static str> },
    #[error("Delivery to {backend} failed: {cause}")]
    DeliveryFailed { backend: String, cause: TransportError },
}

impl DispatchError {
    /// Configuration problems are permanent; only delivery failures are
    /// worth retrying from the UI.
    pub fn is_config_error(&self) -> bool {
        !matches!(self, DispatchError::DeliveryFailed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordSettings {
    #[serde(default, alias = "webhookUrl")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackSettings {
    #[serde(default, alias = "apiKey")]
    pub token: Option<String>,
    #[serde(default, alias = "channelId")]
    pub channel: Option<String>,
    /// Overrides `https://slack.com`, mainly for self-hosted proxies.
    #[serde(default, alias = "apiBase")]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default, alias = "endpointUrl", alias = "url")]
    pub endpoint_url: Option<String>,
    #[serde(default, alias = "apiKey")]
    pub api_key: Option<String>,
    #[serde(default, alias = "collectionName", alias = "tableName")]
    pub collection_name: Option<String>,
}

/// Raw, possibly incomplete settings for every backend, as supplied by the
/// embedding application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    #[serde(default)]
    pub discord: Option<DiscordSettings>,
    #[serde(default)]
    pub slack: Option<SlackSettings>,
    #[serde(default)]
    pub store: Option<StoreSettings>,
    /// Legacy name for `store`. Setting both is rejected at resolve time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase: Option<StoreSettings>,
}

impl ConnectorConfig {
    /// Store settings from whichever of `store`/`supabase` is present.
    pub fn store_settings(&self) -> Result<StoreSettings, DispatchError> {
        match (&self.store, &self.supabase) {
            (Some(_), Some(_)) => Err(DispatchError::AmbiguousConfig {
                backend: BackendKind::GenericStore.name().to_string(),
                keys: vec!["store", "supabase"],
            }),
            (Some(settings), None) | (None, Some(settings)) => Ok(settings.clone()),
            (None, None) => Ok(StoreSettings::default()),
        }
    }
}

/// A backend with every required setting present and parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    ChatWebhook {
        webhook_url: Url,
    },
    ChatApiToken {
        token: String,
        channel: String,
        api_base: Url,
    },
    GenericStore {
        endpoint_url: Url,
        api_key: String,
        collection_name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    ChatWebhook,
    ChatApiToken,
    GenericStore,
}

const REGISTRY: [(&str, BackendKind); 4] = [
    ("discord", BackendKind::ChatWebhook),
    ("slack", BackendKind::ChatApiToken),
    ("store", BackendKind::GenericStore),
    ("supabase", BackendKind::GenericStore),
];

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_http_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Collects missing/invalid keys while resolving one backend.
struct Checker {
    missing: Vec<&'static str>,
    invalid: Vec<&'static str>,
}

impl Checker {
    fn new() -> Self {
        Self {
            missing: Vec::new(),
            invalid: Vec::new(),
        }
    }

    fn text<'a>(&mut self, key: &'static str, value: &'a Option<String>) -> Option<&'a str> {
        let v = present(value);
        if v.is_none() {
            self.missing.push(key);
        }
        v
    }

    fn url(&mut self, key: &'static str, value: &Option<String>) -> Option<Url> {
        let raw = self.text(key, value)?;
        let url = parse_http_url(raw);
        if url.is_none() {
            self.invalid.push(key);
        }
        url
    }

    fn finish(self, kind: BackendKind) -> Result<(), DispatchError> {
        if self.missing.is_empty() && self.invalid.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::InvalidConfig {
                backend: kind.name().to_string(),
                missing: self.missing,
                invalid: self.invalid,
            })
        }
    }
}

impl BackendKind {
    /// Case-insensitive registry lookup.
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        REGISTRY.iter().find(|(n, _)| *n == name).map(|(_, kind)| *kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::ChatWebhook => "discord",
            BackendKind::ChatApiToken => "slack",
            BackendKind::GenericStore => "store",
        }
    }

    pub fn registered_names() -> Vec<&'static str> {
        REGISTRY.iter().map(|(n, _)| *n).collect()
    }

    /// Extracts and checks this backend's settings. Never does I/O.
    pub fn resolve(&self, config: &ConnectorConfig) -> Result<BackendConfig, DispatchError> {
        let mut check = Checker::new();
        match self {
            BackendKind::ChatWebhook => {
                let settings = config.discord.clone().unwrap_or_default();
                let webhook_url = check.url("webhook_url", &settings.webhook_url);
                check.finish(*self)?;
                match webhook_url {
                    Some(webhook_url) => Ok(BackendConfig::ChatWebhook { webhook_url }),
                    None => Err(self.unresolved()),
                }
            }
            BackendKind::ChatApiToken => {
                let settings = config.slack.clone().unwrap_or_default();
                let token = check.text("token", &settings.token).map(str::to_string);
                let channel = check.text("channel", &settings.channel).map(str::to_string);
                let api_base = match present(&settings.api_base) {
                    Some(raw) => {
                        let url = parse_http_url(raw);
                        if url.is_none() {
                            check.invalid.push("api_base");
                        }
                        url
                    }
                    None => parse_http_url(slack::DEFAULT_API_BASE),
                };
                check.finish(*self)?;
                match (token, channel, api_base) {
                    (Some(token), Some(channel), Some(api_base)) => Ok(BackendConfig::ChatApiToken {
                        token,
                        channel,
                        api_base,
                    }),
                    _ => Err(self.unresolved()),
                }
            }
            BackendKind::GenericStore => {
                let settings = config.store_settings()?;
                let endpoint_url = check.url("endpoint_url", &settings.endpoint_url);
                let api_key = check.text("api_key", &settings.api_key).map(str::to_string);
                let collection_name = check
                    .text("collection_name", &settings.collection_name)
                    .map(str::to_string);
                check.finish(*self)?;
                match (endpoint_url, api_key, collection_name) {
                    (Some(endpoint_url), Some(api_key), Some(collection_name)) => {
                        Ok(BackendConfig::GenericStore {
                            endpoint_url,
                            api_key,
                            collection_name,
                        })
                    }
                    _ => Err(self.unresolved()),
                }
            }
        }
    }

    // Only reachable if the checker and the extraction disagree.
    fn unresolved(&self) -> DispatchError {
        DispatchError::InvalidConfig {
            backend: self.name().to_string(),
            missing: Vec::new(),
            invalid: Vec::new(),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl BackendConfig {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::ChatWebhook { .. } => BackendKind::ChatWebhook,
            BackendConfig::ChatApiToken { .. } => BackendKind::ChatApiToken,
            BackendConfig::GenericStore { .. } => BackendKind::GenericStore,
        }
    }

    /// Shapes the outbound request. Pure apart from the store backend's
    /// generated record id.
    pub fn build_request(&self, record: &FeedbackRecord, submitted_at: DateTime<Utc>) -> OutboundRequest {
        let request = match self {
            BackendConfig::ChatWebhook { webhook_url } => discord::build_request(webhook_url, record, submitted_at),
            BackendConfig::ChatApiToken {
                token,
                channel,
                api_base,
            } => slack::build_request(api_base, token, channel, record),
            BackendConfig::GenericStore {
                endpoint_url,
                api_key,
                collection_name,
            } => store::build_request(endpoint_url, api_key, collection_name, record, submitted_at),
        };
        request.with_header("User-Agent", crate::transport::USER_AGENT)
    }

    /// Decides whether a response counts as delivered.
    pub fn check_response(&self, response: TransportResponse) -> Result<(), TransportError> {
        if !response.is_success() {
            return Err(TransportError::Http {
                status: response.status,
                body: response.body,
            });
        }
        match self {
            BackendConfig::ChatApiToken { .. } => slack::check_ok(&response),
            _ => Ok(()),
        }
    }

    /// Host of the target, safe to log.
    pub fn target_host(&self) -> String {
        let url = match self {
            BackendConfig::ChatWebhook { webhook_url } => webhook_url,
            BackendConfig::ChatApiToken { api_base, .. } => api_base,
            BackendConfig::GenericStore { endpoint_url, .. } => endpoint_url,
        };
        url.host_str().unwrap_or("unknown").to_string()
    }
}

/// Resolves backends by name and delivers records to them.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Dispatcher backed by a real HTTP client.
    pub fn http(policy: RetryPolicy) -> Self {
        Self::new(Arc::new(HttpTransport::new()), policy)
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Looks up `backend_name` and checks its settings in `config`.
    pub fn resolve(backend_name: &str, config: &ConnectorConfig) -> Result<BackendConfig, DispatchError> {
        let kind = BackendKind::lookup(backend_name)
            .ok_or_else(|| DispatchError::UnknownBackend(backend_name.to_string()))?;
        kind.resolve(config)
    }

    pub async fn dispatch(
        &self,
        backend_name: &str,
        record: &FeedbackRecord,
        config: &ConnectorConfig,
    ) -> Result<(), DispatchError> {
        let backend = Self::resolve(backend_name, config).map_err(|e| {
            error!("❌ Feedback connector rejected before sending: {}", e);
            e
        })?;
        self.deliver(&backend, record).await
    }

    /// Sends `record` to an already resolved backend.
    pub async fn deliver(&self, backend: &BackendConfig, record: &FeedbackRecord) -> Result<(), DispatchError> {
        let kind = backend.kind();
        let request = backend.build_request(record, Utc::now());
        info!("📤 Submitting feedback to {} ({})", kind, backend.target_host());

        let label = format!("Feedback delivery to {}", kind);
        let transport = &self.transport;
        let request = &request;
        self.policy
            .run(&label, |_| async move {
                let response = transport.send(request).await?;
                backend.check_response(response)
            })
            .await
            .map_err(|cause| DispatchError::DeliveryFailed {
                backend: kind.name().to_string(),
                cause,
            })?;

        info!("✅ Feedback delivered to {}", kind);
        Ok(())
    }
}
