//! Runtime configuration.
//!
//! Built once at startup (file, then environment and CLI overrides) and
//! passed by value into the pipeline. Nothing reads global state after that.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::generator::{DEFAULT_GEMINI_ENDPOINT, GeminiClient, TextGenerator};
use crate::insight::PromptStyle;
use crate::selector::DEFAULT_TOP_N;
use crate::verdict::VerdictPolicy;

/// Configuration loading or validation failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Blocking CPU measurement window.
    pub cpu_window_ms: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            cpu_window_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub policy: VerdictPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub style: PromptStyle,
    /// Deadline for one text-generation call, independent of sampling.
    pub timeout_ms: u64,
    /// Entries per list in ranking mode.
    pub top_n: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            style: PromptStyle::default(),
            timeout_ms: 6000,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl InsightConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub endpoint: String,
    /// Never serialized back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            api_key: None,
        }
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GeneratorConfig {
    /// Whether a usable API key is configured.
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sampling: SamplingConfig,
    pub classifier: ClassifierConfig,
    pub insight: InsightConfig,
    pub generator: GeneratorConfig,
}

impl Config {
    /// Parse a TOML document. Missing sections take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling.cpu_window_ms == 0 {
            return Err(ConfigError::Invalid(
                "sampling.cpu_window_ms must be positive".to_string(),
            ));
        }
        if self.insight.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "insight.timeout_ms must be positive".to_string(),
            ));
        }
        if self.insight.top_n == 0 {
            return Err(ConfigError::Invalid(
                "insight.top_n must be at least 1".to_string(),
            ));
        }
        if self.generator.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "generator.endpoint must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cpu_window(&self) -> Duration {
        Duration::from_millis(self.sampling.cpu_window_ms)
    }

    /// Build the text generator, or `None` when no API key is configured.
    pub fn build_generator(&self) -> Result<Option<Arc<dyn TextGenerator>>, ConfigError> {
        if !self.generator.is_enabled() {
            return Ok(None);
        }
        let key = self.generator.api_key.clone().unwrap_or_default();
        let client = GeminiClient::new(&self.generator.endpoint, key, self.insight.timeout())?;
        Ok(Some(Arc::new(client)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.cpu_window(), Duration::from_secs(1));
        assert_eq!(config.classifier.policy, VerdictPolicy::Memory);
        assert_eq!(config.insight.style, PromptStyle::Numbered);
        assert_eq!(config.insight.timeout(), Duration::from_secs(6));
        assert_eq!(config.insight.top_n, 3);
        assert_eq!(config.generator.endpoint, DEFAULT_GEMINI_ENDPOINT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [classifier]
            policy = "memory-swap"

            [insight]
            style = "brief"
            "#,
        )
        .unwrap();
        assert_eq!(config.classifier.policy, VerdictPolicy::MemorySwap);
        assert_eq!(config.insight.style, PromptStyle::Brief);
        assert_eq!(config.insight.timeout_ms, 6000);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = Config::from_toml_str("[classifier]\npolicy = \"cpu\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(matches!(
            Config::from_toml_str("[sampling]\ncpu_window_ms = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[insight]\ntimeout_ms = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[insight]\ntop_n = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 8080\n[generator]\napi_key = \"secret\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.generator.is_enabled());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/hostpulse.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let mut config = Config::default();
        config.generator.api_key = Some("super-secret".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = Config::default();
        config.generator.api_key = Some("super-secret".to_string());
        let out = toml::to_string(&config).unwrap();
        assert!(!out.contains("super-secret"));
    }

    #[test]
    fn test_generator_disabled_without_key() {
        let config = Config::default();
        assert!(config.build_generator().unwrap().is_none());

        let mut blank = Config::default();
        blank.generator.api_key = Some("   ".to_string());
        assert!(blank.build_generator().unwrap().is_none());
    }

    #[test]
    fn test_generator_enabled_with_key() {
        let mut config = Config::default();
        config.generator.api_key = Some("key".to_string());
        let generator = config.build_generator().unwrap().unwrap();
        assert_eq!(generator.name(), "gemini");
    }
}
