//! Shared pieces of the `thispdf` command-line tool.

use serde::Serialize;
use thispdf_core::{AppError, ErrorMetadata};
use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

pub const DEFAULT_LOG_FILTER: &str = "thispdf=info";

/// Initialize tracing. `RUST_LOG` overrides the default filter; `json`
/// switches the output to one JSON object per line.
pub fn init_telemetry(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // Logs go to stderr so command output on stdout stays parseable.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(Format::default().compact().with_target(false))
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown");
}

/// Error payload printed when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(rename = "type")]
    pub error_type: String,
    pub status: u16,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            error: err.client_message(),
            code: err.error_code(),
            error_type: err.error_type().to_string(),
            status: err.http_status_code(),
        }
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{}", out);
    Ok(())
}
