//! Widget configuration: built-in defaults, partial overrides from the
//! embedding application, and a single merge step between them.

use config::{Config, Environment, File};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::connectors::ConnectorConfig;
use crate::geometry::{Position, Size};
use crate::record::{Field, FieldRequirements};
use crate::retry::RetryPolicy;
use crate::theme::{ButtonSize, ThemeMode, TooltipPlacement};

pub const ENV_PREFIX: &str = "FEEDBACK";
pub const DEFAULT_TITLE: &str = "Give us your feedback";
pub const DEFAULT_DESCRIPTION: &str =
    "Your feedback helps us improve our product. Please take a moment to share your thoughts.";
pub const DEFAULT_TOOLTIP: &str = "Let us know what you think 👋!";

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Failed to read widget configuration: {0}")]
    Source(#[from] config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipOptions {
    pub show: bool,
    pub placement: TooltipPlacement,
    pub message: String,
    pub font_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelOptions {
    pub show_title: bool,
    pub show_description: bool,
    pub width: f64,
    pub height: f64,
    pub font_size: u32,
}

impl PanelOptions {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryOptions {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub timeout_ms: u64,
}

impl RetryOptions {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Which backend submissions go to, and the settings for all backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSelection {
    pub name: String,
    #[serde(default)]
    pub config: ConnectorConfig,
}

/// Fully resolved configuration the widget runs with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub position: Position,
    pub draggable: bool,
    pub required_fields: Vec<Field>,
    pub optional_fields: Vec<Field>,
    pub theme: ThemeMode,
    pub title: String,
    pub description: String,
    pub button_size: ButtonSize,
    pub tooltip: TooltipOptions,
    pub panel: PanelOptions,
    pub trigger_size: Size,
    pub prefill_name: Option<String>,
    pub prefill_email: Option<String>,
    pub retry: RetryOptions,
    pub connector: Option<ConnectorSelection>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            position: Position::new(20.0, 20.0),
            draggable: false,
            required_fields: vec![Field::Name, Field::Email, Field::Message],
            optional_fields: vec![Field::Rating],
            theme: ThemeMode::Light,
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            button_size: ButtonSize::default(),
            tooltip: TooltipOptions {
                show: true,
                placement: TooltipPlacement::Top,
                message: DEFAULT_TOOLTIP.to_string(),
                font_size: 12,
            },
            panel: PanelOptions {
                show_title: true,
                show_description: true,
                width: 350.0,
                height: 500.0,
                font_size: 14,
            },
            trigger_size: Size::new(100.0, 100.0),
            prefill_name: None,
            prefill_email: None,
            retry: RetryOptions {
                max_retries: 3,
                initial_delay_ms: 200,
                timeout_ms: 1000,
            },
            connector: None,
        }
    }
}

impl WidgetConfig {
    pub fn requirements(&self) -> FieldRequirements {
        FieldRequirements::new(self.required_fields.iter().copied(), self.optional_fields.iter().copied())
    }

    /// Defaults, then the optional file at `path`, then `FEEDBACK_*`
    /// environment variables (`__` separates nested keys, e.g.
    /// `FEEDBACK_PANEL__WIDTH=420`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!("📄 Loading widget configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let overrides: WidgetOverrides = builder.build()?.try_deserialize()?;
        Ok(merge(&WidgetConfig::default(), &overrides))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionOverrides {
    pub right: Option<f64>,
    pub bottom: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TooltipOverrides {
    pub show: Option<bool>,
    pub placement: Option<TooltipPlacement>,
    pub message: Option<String>,
    pub font_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelOverrides {
    pub show_title: Option<bool>,
    pub show_description: Option<bool>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub font_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeOverrides {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryOverrides {
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

/// What the embedding application supplies. Every field is optional;
/// nested groups are merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetOverrides {
    pub position: Option<PositionOverrides>,
    pub draggable: Option<bool>,
    pub required_fields: Option<Vec<Field>>,
    pub optional_fields: Option<Vec<Field>>,
    pub theme: Option<ThemeMode>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub button_size: Option<ButtonSize>,
    pub tooltip: Option<TooltipOverrides>,
    pub panel: Option<PanelOverrides>,
    pub trigger_size: Option<SizeOverrides>,
    pub prefill_name: Option<String>,
    pub prefill_email: Option<String>,
    pub retry: Option<RetryOverrides>,
    pub connector: Option<ConnectorSelection>,
}

/// Applies `overrides` on top of `defaults`. Pure; `defaults` is untouched.
pub fn merge(defaults: &WidgetConfig, overrides: &WidgetOverrides) -> WidgetConfig {
    let mut out = defaults.clone();

    if let Some(p) = &overrides.position {
        out.position.right = p.right.unwrap_or(out.position.right);
        out.position.bottom = p.bottom.unwrap_or(out.position.bottom);
    }
    if let Some(v) = overrides.draggable {
        out.draggable = v;
    }
    if let Some(v) = &overrides.required_fields {
        out.required_fields = v.clone();
    }
    if let Some(v) = &overrides.optional_fields {
        out.optional_fields = v.clone();
    }
    if let Some(v) = overrides.theme {
        out.theme = v;
    }
    if let Some(v) = &overrides.title {
        out.title = v.clone();
    }
    if let Some(v) = &overrides.description {
        out.description = v.clone();
    }
    if let Some(v) = overrides.button_size {
        out.button_size = v;
    }
    if let Some(t) = &overrides.tooltip {
        out.tooltip.show = t.show.unwrap_or(out.tooltip.show);
        out.tooltip.placement = t.placement.unwrap_or(out.tooltip.placement);
        if let Some(message) = &t.message {
            out.tooltip.message = message.clone();
        }
        out.tooltip.font_size = t.font_size.unwrap_or(out.tooltip.font_size);
    }
    if let Some(p) = &overrides.panel {
        out.panel.show_title = p.show_title.unwrap_or(out.panel.show_title);
        out.panel.show_description = p.show_description.unwrap_or(out.panel.show_description);
        out.panel.width = p.width.unwrap_or(out.panel.width);
        out.panel.height = p.height.unwrap_or(out.panel.height);
        out.panel.font_size = p.font_size.unwrap_or(out.panel.font_size);
    }
    if let Some(s) = &overrides.trigger_size {
        out.trigger_size.width = s.width.unwrap_or(out.trigger_size.width);
        out.trigger_size.height = s.height.unwrap_or(out.trigger_size.height);
    }
    if overrides.prefill_name.is_some() {
        out.prefill_name = overrides.prefill_name.clone();
    }
    if overrides.prefill_email.is_some() {
        out.prefill_email = overrides.prefill_email.clone();
    }
    if let Some(r) = &overrides.retry {
        out.retry.max_retries = r.max_retries.unwrap_or(out.retry.max_retries);
        out.retry.initial_delay_ms = r.initial_delay_ms.unwrap_or(out.retry.initial_delay_ms);
        out.retry.timeout_ms = r.timeout_ms.unwrap_or(out.retry.timeout_ms);
    }
    if overrides.connector.is_some() {
        out.connector = overrides.connector.clone();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_widget_defaults() {
        let config = WidgetConfig::default();
        assert_eq!(config.position, Position::new(20.0, 20.0));
        assert!(!config.draggable);
        assert_eq!(config.panel.size(), Size::new(350.0, 500.0));
        assert_eq!(config.panel.font_size, 14);
        assert_eq!(config.requirements(), FieldRequirements::default());
        assert_eq!(config.retry.policy(), RetryPolicy::default());
    }

    #[test]
    fn test_nested_groups_merge_field_by_field() {
        let overrides = WidgetOverrides {
            position: Some(PositionOverrides {
                right: Some(64.0),
                bottom: None,
            }),
            panel: Some(PanelOverrides {
                width: Some(420.0),
                ..Default::default()
            }),
            tooltip: Some(TooltipOverrides {
                show: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        let defaults = WidgetConfig::default();
        let merged = merge(&defaults, &overrides);

        assert_eq!(merged.position, Position::new(64.0, 20.0));
        assert_eq!(merged.panel.width, 420.0);
        assert_eq!(merged.panel.height, 500.0);
        assert!(!merged.tooltip.show);
        assert_eq!(merged.tooltip.message, DEFAULT_TOOLTIP);
        // defaults untouched
        assert_eq!(defaults, WidgetConfig::default());
    }

    #[test]
    fn test_overrides_deserialize_from_json() {
        let overrides: WidgetOverrides = serde_json::from_str(
            r#"{
                "draggable": true,
                "theme": "system",
                "required_fields": ["feedback", "rating"],
                "optional_fields": [],
                "button_size": "medium",
                "connector": {"name": "discord", "config": {"discord": {"webhookUrl": "https://d.example/h"}}}
            }"#,
        )
        .unwrap();
        let merged = merge(&WidgetConfig::default(), &overrides);
        assert!(merged.draggable);
        assert_eq!(merged.theme, ThemeMode::System);
        assert_eq!(merged.required_fields, vec![Field::Message, Field::Rating]);
        assert!(merged.optional_fields.is_empty());
        assert_eq!(merged.connector.unwrap().name, "discord");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = WidgetConfig::load(None).unwrap();
        assert_eq!(config.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_load_toml_file() {
        let path = std::env::temp_dir().join(format!("feedback-widget-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
draggable = true
title = "Tell us"

[panel]
height = 420.0

[retry]
max_retries = 1

[connector]
name = "store"

# keys are lowercased by the loader, so use snake_case here
[connector.config.supabase]
endpoint_url = "https://db.example.com"
api_key = "k"
collection_name = "feedback"
"#,
        )
        .unwrap();

        let loaded = WidgetConfig::load(Some(&path));
        std::fs::remove_file(&path).ok();
        let config = loaded.unwrap();

        assert!(config.draggable);
        assert_eq!(config.title, "Tell us");
        assert_eq!(config.panel.height, 420.0);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.timeout_ms, 1000);
        let store = config.connector.unwrap().config.store_settings().unwrap();
        assert_eq!(store.collection_name.as_deref(), Some("feedback"));
    }

    #[test]
    fn test_environment_overrides_nested_keys() {
        std::env::set_var("FEEDBACK_PANEL__WIDTH", "420");
        std::env::set_var("FEEDBACK_RETRY__INITIAL_DELAY_MS", "50");
        let loaded = WidgetConfig::load(None);
        std::env::remove_var("FEEDBACK_PANEL__WIDTH");
        std::env::remove_var("FEEDBACK_RETRY__INITIAL_DELAY_MS");
        let config = loaded.unwrap();

        assert_eq!(config.panel.width, 420.0);
        assert_eq!(config.panel.height, 500.0);
        assert_eq!(config.retry.initial_delay_ms, 50);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("feedback-widget-does-not-exist.toml");
        assert!(WidgetConfig::load(Some(&path)).is_err());
    }
}
