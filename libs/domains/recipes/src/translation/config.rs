use std::path::PathBuf;
use std::time::Duration;

use core_config::{env_or_default, env_parse_or};

use crate::error::{RecipeError, RecipeResult};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Translation pipeline configuration
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub model: String,
    pub base_url: String,
    /// Pause after every dispatched call, successful or not
    pub delay: Duration,
    /// Upper bound on a single backend call
    pub call_timeout: Duration,
    pub cache_file: PathBuf,
}

impl TranslatorConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = path.into();
        self
    }

    /// Reads:
    /// - `OPENAI_MODEL` (default `gpt-4o-mini`)
    /// - `OPENAI_BASE_URL`
    /// - `TRANSLATION_DELAY` seconds (default 2.0)
    /// - `TRANSLATION_TIMEOUT_SECS` (default 30)
    /// - `TRANSLATION_CACHE_FILE` (default `logs/translation_cache.json`)
    pub fn from_env() -> RecipeResult<Self> {
        let delay_secs: f64 = env_parse_or("TRANSLATION_DELAY", 2.0)?;
        let timeout_secs: u64 = env_parse_or("TRANSLATION_TIMEOUT_SECS", 30)?;

        Ok(Self {
            model: env_or_default("OPENAI_MODEL", "gpt-4o-mini"),
            base_url: env_or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            delay: seconds("TRANSLATION_DELAY", delay_secs)?,
            call_timeout: Duration::from_secs(timeout_secs),
            cache_file: PathBuf::from(env_or_default(
                "TRANSLATION_CACHE_FILE",
                "logs/translation_cache.json",
            )),
        })
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            delay: Duration::from_secs(2),
            call_timeout: Duration::from_secs(30),
            cache_file: PathBuf::from("logs/translation_cache.json"),
        }
    }
}

/// Convert a fractional-seconds setting, rejecting negative or non-finite values.
pub(crate) fn seconds(key: &str, value: f64) -> RecipeResult<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| RecipeError::Config(format!("{} must be a non-negative number of seconds", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("OPENAI_MODEL", None::<&str>),
                ("OPENAI_BASE_URL", None),
                ("TRANSLATION_DELAY", None),
                ("TRANSLATION_TIMEOUT_SECS", None),
                ("TRANSLATION_CACHE_FILE", None),
            ],
            || {
                let config = TranslatorConfig::from_env().unwrap();
                assert_eq!(config.model, "gpt-4o-mini");
                assert_eq!(config.base_url, DEFAULT_OPENAI_BASE_URL);
                assert_eq!(config.delay, Duration::from_secs(2));
                assert_eq!(config.call_timeout, Duration::from_secs(30));
                assert_eq!(config.cache_file, PathBuf::from("logs/translation_cache.json"));
            },
        );
    }

    #[test]
    fn test_from_env_fractional_delay() {
        temp_env::with_var("TRANSLATION_DELAY", Some("0.3"), || {
            let config = TranslatorConfig::from_env().unwrap();
            assert_eq!(config.delay, Duration::from_millis(300));
        });
    }

    #[test]
    fn test_from_env_rejects_negative_delay() {
        temp_env::with_var("TRANSLATION_DELAY", Some("-1"), || {
            let err = TranslatorConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("TRANSLATION_DELAY"));
        });
    }

    #[test]
    fn test_builder() {
        let config = TranslatorConfig::new("gpt-4o")
            .with_base_url("http://localhost:8080/v1")
            .with_delay(Duration::ZERO)
            .with_cache_file("/tmp/cache.json");

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.delay, Duration::ZERO);
        assert_eq!(config.cache_file, PathBuf::from("/tmp/cache.json"));
    }
}
