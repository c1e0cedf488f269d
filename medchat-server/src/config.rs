//! Service configuration read from the process environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use medchat_rag::config::{DEFAULT_DIMENSIONS, DEFAULT_TOP_K};
use medchat_telemetry::LogFormat;
use thiserror::Error;

use crate::server::ServerConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_COHERE_MODEL: &str = "command-r-plus";
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {name}: {reason}")]
    Invalid { name: &'static str, value: String, reason: String },
}

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Which provider writes the answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationBackend {
    Gemini { model: String },
    Cohere { api_key: ApiKey, model: String },
}

impl GenerationBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gemini { .. } => "gemini",
            Self::Cohere { .. } => "cohere",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub gemini_api_key: ApiKey,
    pub pinecone_api_key: ApiKey,
    pub pinecone_index: String,
    /// Data-plane host; resolved through the control plane when unset.
    pub pinecone_index_host: Option<String>,
    pub pinecone_namespace: Option<String>,
    pub embedding_model: String,
    pub generation: GenerationBackend,
    pub dimensions: usize,
    pub top_k: usize,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub expose_error_details: bool,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let generation = match get("GENERATION_PROVIDER").as_deref().map(str::to_ascii_lowercase) {
            None => GenerationBackend::Gemini {
                model: get("GEMINI_GENERATION_MODEL")
                    .unwrap_or_else(|| DEFAULT_GENERATION_MODEL.to_string()),
            },
            Some(provider) if provider == "gemini" => GenerationBackend::Gemini {
                model: get("GEMINI_GENERATION_MODEL")
                    .unwrap_or_else(|| DEFAULT_GENERATION_MODEL.to_string()),
            },
            Some(provider) if provider == "cohere" => GenerationBackend::Cohere {
                api_key: ApiKey::new(required("COHERE_API_KEY")?),
                model: get("COHERE_MODEL").unwrap_or_else(|| DEFAULT_COHERE_MODEL.to_string()),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "GENERATION_PROVIDER",
                    value: other,
                    reason: "expected 'gemini' or 'cohere'".to_string(),
                });
            }
        };

        let log_format = match get("LOG_FORMAT") {
            None => LogFormat::default(),
            Some(value) => value.parse::<LogFormat>().map_err(|e| {
                ConfigError::Invalid { name: "LOG_FORMAT", value, reason: e.to_string() }
            })?,
        };

        let dimensions = positive(&get, "EMBEDDING_DIMENSIONS", DEFAULT_DIMENSIONS)?;
        let top_k = positive(&get, "TOP_K", DEFAULT_TOP_K)?;
        let retry_attempts = positive(&get, "EMBED_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS)?;
        let retry_delay_ms = parse_or(&get, "EMBED_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS)?;
        let timeout_secs = positive(&get, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        let expose_error_details = match get("EXPOSE_ERROR_DETAILS") {
            None => true,
            Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid {
                name: "EXPOSE_ERROR_DETAILS",
                value,
                reason: "expected true or false".to_string(),
            })?,
        };

        Ok(Self {
            gemini_api_key: ApiKey::new(required("GEMINI_API_KEY")?),
            pinecone_api_key: ApiKey::new(required("PINECONE_API_KEY")?),
            pinecone_index: required("PINECONE_INDEX")?,
            pinecone_index_host: get("PINECONE_INDEX_HOST"),
            pinecone_namespace: get("PINECONE_NAMESPACE"),
            embedding_model: get("GEMINI_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            generation,
            dimensions,
            top_k,
            retry_attempts,
            retry_delay: Duration::from_millis(retry_delay_ms),
            request_timeout: Duration::from_secs(timeout_secs),
            expose_error_details,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            log_format,
        })
    }

    /// The listener settings.
    pub fn server(&self) -> ServerConfig {
        ServerConfig { host: self.host.clone(), port: self.port }
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

/// Like [`parse_or`], but zero is rejected.
fn positive<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default + fmt::Display,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, name, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("GEMINI_API_KEY", "g-key"),
        ("PINECONE_API_KEY", "pc-key"),
        ("PINECONE_INDEX", "medical"),
    ];

    #[test]
    fn minimal_environment_uses_defaults() {
        let config = config_from(&REQUIRED).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.dimensions, 768);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.expose_error_details);
        assert_eq!(config.pinecone_index_host, None);
        assert_eq!(
            config.generation,
            GenerationBackend::Gemini { model: "gemini-2.5-flash".to_string() }
        );
    }

    #[test]
    fn each_required_variable_is_enforced() {
        for (missing, _) in REQUIRED {
            let vars: Vec<_> = REQUIRED.iter().copied().filter(|(k, _)| *k != missing).collect();
            assert_eq!(config_from(&vars).unwrap_err(), ConfigError::Missing(missing));
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[0] = ("GEMINI_API_KEY", "   ");
        assert_eq!(config_from(&vars).unwrap_err(), ConfigError::Missing("GEMINI_API_KEY"));
    }

    #[test]
    fn cohere_requires_its_own_key() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("GENERATION_PROVIDER", "Cohere"));
        assert_eq!(config_from(&vars).unwrap_err(), ConfigError::Missing("COHERE_API_KEY"));

        vars.push(("COHERE_API_KEY", "co-key"));
        let config = config_from(&vars).unwrap();
        assert_eq!(config.generation.name(), "cohere");
    }

    #[test]
    fn unparsable_numbers_are_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "http"));
        assert!(matches!(config_from(&vars), Err(ConfigError::Invalid { name: "PORT", .. })));

        let mut vars = REQUIRED.to_vec();
        vars.push(("TOP_K", "0"));
        assert!(matches!(config_from(&vars), Err(ConfigError::Invalid { name: "TOP_K", .. })));
    }

    #[test]
    fn unknown_provider_and_format_are_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("GENERATION_PROVIDER", "openai"));
        assert!(matches!(
            config_from(&vars),
            Err(ConfigError::Invalid { name: "GENERATION_PROVIDER", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("LOG_FORMAT", "xml"));
        assert!(matches!(config_from(&vars), Err(ConfigError::Invalid { name: "LOG_FORMAT", .. })));
    }

    #[test]
    fn details_can_be_hidden() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("EXPOSE_ERROR_DETAILS", "false"));
        assert!(!config_from(&vars).unwrap().expose_error_details);
    }

    #[test]
    fn api_keys_are_redacted_in_debug_output() {
        let config = config_from(&REQUIRED).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("g-key"));
        assert!(!rendered.contains("pc-key"));
        assert_eq!(config.gemini_api_key.expose(), "g-key");
    }
}
