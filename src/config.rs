//! Runtime configuration for the model-backed commands.

use crate::ollama::{DEFAULT_HOST, DEFAULT_TEMPERATURE, OllamaClient, OllamaClientBuilder, OllamaError};

/// Model used when `OLLAMA_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Settings for talking to the model server.
///
/// Values come from the environment via [`ResolverConfig::from_env`]; the
/// CLI then overrides individual fields from its flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    pub host: String,
    pub model: String,
    pub temperature: f64,
    pub json_format: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            json_format: true,
        }
    }
}

impl ResolverConfig {
    /// Reads `OLLAMA_HOST`, `OLLAMA_MODEL`, `HYRES_TEMPERATURE` and
    /// `HYRES_JSON_FORMAT`.
    ///
    /// Unset, empty or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: non_empty_var("OLLAMA_HOST").unwrap_or(defaults.host),
            model: non_empty_var("OLLAMA_MODEL").unwrap_or(defaults.model),
            temperature: non_empty_var("HYRES_TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .filter(|t: &f64| t.is_finite() && *t >= 0.0)
                .unwrap_or(defaults.temperature),
            json_format: non_empty_var("HYRES_JSON_FORMAT")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.json_format),
        }
    }

    /// Builds an [`OllamaClient`] from these settings.
    ///
    /// # Errors
    ///
    /// Returns `OllamaError::InvalidUrl` if `host` is not a valid URL.
    pub fn client(&self) -> Result<OllamaClient, OllamaError> {
        OllamaClientBuilder::new()
            .base_url(&self.host)
            .temperature(self.temperature)
            .json_format(self.json_format)
            .build()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 4] = [
        "OLLAMA_HOST",
        "OLLAMA_MODEL",
        "HYRES_TEMPERATURE",
        "HYRES_JSON_FORMAT",
    ];

    fn clear_env() {
        for key in KEYS {
            // SAFETY: env-mutating tests are serialized with #[serial].
            unsafe { std::env::remove_var(key) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: env-mutating tests are serialized with #[serial].
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    #[serial]
    fn from_env_uses_defaults_when_unset() {
        clear_env();
        assert_eq!(ResolverConfig::from_env(), ResolverConfig::default());
        assert_eq!(ResolverConfig::default().model, "llama3.2");
    }

    #[test]
    #[serial]
    fn from_env_reads_all_variables() {
        clear_env();
        set_env("OLLAMA_HOST", "http://gpu-box:11434");
        set_env("OLLAMA_MODEL", "qwen2.5:7b");
        set_env("HYRES_TEMPERATURE", "0.1");
        set_env("HYRES_JSON_FORMAT", "off");

        let config = ResolverConfig::from_env();
        clear_env();

        assert_eq!(
            config,
            ResolverConfig {
                host: "http://gpu-box:11434".to_string(),
                model: "qwen2.5:7b".to_string(),
                temperature: 0.1,
                json_format: false,
            }
        );
    }

    #[test]
    #[serial]
    fn invalid_values_fall_back_to_defaults() {
        clear_env();
        set_env("OLLAMA_MODEL", "  ");
        set_env("HYRES_TEMPERATURE", "warm");
        set_env("HYRES_JSON_FORMAT", "maybe");

        let config = ResolverConfig::from_env();
        clear_env();

        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    #[serial]
    fn negative_temperature_is_rejected() {
        clear_env();
        set_env("HYRES_TEMPERATURE", "-1");
        let config = ResolverConfig::from_env();
        clear_env();
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn client_carries_settings() {
        let config = ResolverConfig {
            temperature: 0.3,
            json_format: false,
            ..ResolverConfig::default()
        };
        let client = config.client().unwrap();
        assert_eq!(client.base_url(), DEFAULT_HOST);
        assert_eq!(client.temperature(), 0.3);
        assert!(!client.json_format());
    }

    #[test]
    fn client_rejects_bad_host() {
        let config = ResolverConfig {
            host: "nowhere".to_string(),
            ..ResolverConfig::default()
        };
        assert!(matches!(config.client(), Err(OllamaError::InvalidUrl(_))));
    }
}
