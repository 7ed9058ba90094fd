use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use std::path::PathBuf;

pub mod config;
pub mod connectors;
pub mod geometry;
pub mod record;
pub mod retry;
pub mod theme;
pub mod transport;
pub mod validation;
pub mod widget;

#[cfg(feature = "tauri")]
pub mod plugin; // Tauri v2 bindings for the controller

pub use config::{WidgetConfig, WidgetOverrides};
pub use connectors::{BackendConfig, BackendKind, ConnectorConfig, DispatchError, Dispatcher};
pub use geometry::{clamp_to_viewport, place_panel, Position, Size, Viewport};
pub use record::{FeedbackRecord, Field, FieldRequirements};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport, TransportError};
pub use validation::{validate, FieldErrors};
pub use widget::{FeedbackWidget, SubmitError, SubmitTarget};

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_PATH_VAR: &str = "FEEDBACK_CONFIG";

pub const USAGE: &str = "usage: feedback-widget [--config PATH] [--connector NAME] name=.. email=.. message=.. [rating=1-5]";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub connector: Option<String>,
    pub record: FeedbackRecord,
}

impl CliArgs {
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().ok_or_else(|| anyhow!("--config needs a path\n{}", USAGE))?;
                    parsed.config_path = Some(PathBuf::from(path));
                }
                "--connector" => {
                    parsed.connector = Some(args.next().ok_or_else(|| anyhow!("--connector needs a name\n{}", USAGE))?);
                }
                other => {
                    let (key, value) = other
                        .split_once('=')
                        .ok_or_else(|| anyhow!("unexpected argument '{}'\n{}", other, USAGE))?;
                    let field: Field = key.parse().map_err(|e| anyhow!("{}\n{}", e, USAGE))?;
                    match field {
                        Field::Rating => {
                            let rating: u8 = value
                                .trim()
                                .parse()
                                .with_context(|| format!("rating must be a number, got '{}'", value))?;
                            parsed.record.set_rating(rating);
                        }
                        text => parsed.record.set_text(text, value),
                    }
                }
            }
        }

        Ok(parsed)
    }
}

/// One-shot submission from the command line: load config, validate the
/// record and deliver it through the configured connector.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args
        .config_path
        .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));
    let config = WidgetConfig::load(config_path.as_deref()).context("Failed to load widget configuration")?;

    let record = match validate(&config.requirements(), &args.record) {
        Ok(record) => record,
        Err(errors) => {
            for (field, err) in errors.0.iter() {
                warn!("{}: {}", field, err.message);
            }
            bail!("Feedback is not valid ({} field errors)", errors.len());
        }
    };

    let selection = config
        .connector
        .clone()
        .ok_or_else(|| anyhow!("No connector configured. Set FEEDBACK_CONNECTOR__NAME or add [connector] to the config file"))?;
    let name = args.connector.unwrap_or(selection.name);

    info!(
        "📨 Sending feedback via '{}' (up to {} attempts)",
        name,
        config.retry.policy().max_attempts()
    );
    Dispatcher::http(config.retry.policy())
        .dispatch(&name, &record, &selection.config)
        .await?;
    info!("✅ Feedback delivered via '{}'", name);
    Ok(())
}
