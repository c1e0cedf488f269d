//! Logging setup for the medical chatbot service.
//!
//! Installs a global `tracing` subscriber with an `EnvFilter` (taken from
//! `RUST_LOG`, default `info`) and either human-readable or JSON output.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::Span;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored output for terminals.
    #[default]
    Pretty,
    /// One JSON object per line for log collectors.
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("unknown log format '{0}' (expected 'pretty' or 'json')")]
    UnknownFormat(String),

    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set, so it is meant to be called
/// once from `main`.
pub fn init_telemetry(service_name: &str, format: LogFormat) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(false)
            .try_init(),
    };
    result.map_err(|e| TelemetryError::Install(e.to_string()))?;

    tracing::info!(service = service_name, log_format = %format, "telemetry initialized");
    Ok(())
}

/// Create the span wrapping one HTTP request, tagged with a fresh
/// `request.id`.
pub fn request_span(method: &str, path: &str) -> Span {
    let request_id = uuid::Uuid::new_v4();
    tracing::info_span!(
        "request",
        request.id = %request_id,
        http.method = method,
        http.path = path,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_formats() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
        assert!(matches!("xml".parse::<LogFormat>(), Err(TelemetryError::UnknownFormat(f)) if f == "xml"));
    }

    #[test]
    fn second_init_is_an_error() {
        // Only this test installs a global subscriber.
        let _ = init_telemetry("medical-chatbot", LogFormat::Json);
        assert!(matches!(
            init_telemetry("medical-chatbot", LogFormat::Pretty),
            Err(TelemetryError::Install(_))
        ));
    }

    #[test]
    fn request_span_is_named_request() {
        let span = request_span("POST", "/chat");
        if let Some(meta) = span.metadata() {
            assert_eq!(meta.name(), "request");
            assert!(meta.fields().field("request.id").is_some());
        }
    }
}
