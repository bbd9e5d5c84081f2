//! Subscriber installation for applications embedding the client
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! caller's choice. [`init_tracing`] is the stock one.

use bqstream_domain::{BqError, LogConfig, LogFormat, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Transport crates that are chatty at debug level
const NOISY_TARGETS: &[(&str, &str)] =
    &[("hyper", "warn"), ("hyper_util", "warn"), ("reqwest", "warn"), ("h2", "warn"), ("rustls", "warn")];

/// Filter from `RUST_LOG` when set, otherwise from `level` with the noisy
/// transport crates clamped.
///
/// # Errors
/// Returns `BqError::Config` when the resulting directives do not parse.
pub fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = std::iter::once(level.to_string())
        .chain(NOISY_TARGETS.iter().map(|(target, lvl)| format!("{target}={lvl}")))
        .collect::<Vec<_>>()
        .join(",");

    EnvFilter::try_new(&directives)
        .map_err(|e| BqError::Config(format!("Invalid tracing filter '{directives}': {e}")))
}

/// Install a global fmt subscriber.
///
/// # Errors
/// Returns `BqError::Config` for a bad filter or when a global subscriber
/// is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let filter = build_env_filter(&config.level)?;

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .boxed(),
        LogFormat::Compact => {
            tracing_subscriber::fmt::layer().compact().with_target(true).boxed()
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| BqError::Config(format!("tracing subscriber already set: {e}")))
}
