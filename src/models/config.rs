//! Configuration models for doxa.
//!
//! Everything tunable about a run is an explicit field here: catalog
//! contents, backend model and token budget, simulation seed and cutoff.
//! There is no hidden process-wide state to reach for.

use crate::models::Catalog;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for an audit run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Query the live text-generation backend instead of the simulator
    #[serde(default)]
    pub use_live_backend: bool,

    /// Text-generation backend settings (live runs only)
    #[serde(default)]
    pub backend: BackendConfig,

    /// Simulated-response settings
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// External Rasch fitting service settings
    #[serde(default)]
    pub fitting: FittingConfig,

    /// Output artifact paths
    #[serde(default)]
    pub output: OutputConfig,

    /// Demographics and decision items; defaults to the reference catalog
    #[serde(default)]
    pub catalog: Catalog,
}

/// Text-generation backend configuration.
///
/// Any OpenAI-compatible chat-completions endpoint works; OpenRouter is
/// the default aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Model identifier (e.g. "meta-llama/llama-3.1-8b-instruct")
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (can also be set via the env var named by `api_key_env`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable name for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL for the API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Output-length bound per call, in tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature; decision prompts want determinism
    #[serde(default)]
    pub temperature: f64,

    /// Per-call timeout in seconds; expiry aborts the batch
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failure before the batch aborts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_model() -> String {
    "meta-llama/llama-3.1-8b-instruct".to_string()
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_max_tokens() -> u32 {
    50
}

fn default_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// Simulated-response configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// PRNG seed; the default makes default runs reproducible
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Income at or below this gets the naturalistic-style penalty.
    ///
    /// The default is the third-highest income of the reference catalog.
    /// It is a fixed cutoff, not a computed median: runs against a custom
    /// catalog should set this explicitly.
    #[serde(default = "default_low_income_cutoff")]
    pub low_income_cutoff: u32,
}

fn default_seed() -> u64 {
    42
}

fn default_low_income_cutoff() -> u32 {
    35000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            low_income_cutoff: default_low_income_cutoff(),
        }
    }
}

/// External Rasch fitting service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittingConfig {
    /// Fitting service endpoint URL. When unset, the run stops after
    /// writing the response table and matrix payload.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Fit request timeout in seconds (MCMC is slow)
    #[serde(default = "default_fit_timeout")]
    pub timeout_secs: u64,
}

fn default_fit_timeout() -> u64 {
    600
}

impl Default for FittingConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            timeout_secs: default_fit_timeout(),
        }
    }
}

/// Output artifact paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Delimited response table, one row per response record
    #[serde(default = "default_table_path")]
    pub table_path: PathBuf,

    /// Labeled response matrix payload handed to the fitting service
    #[serde(default = "default_matrix_path")]
    pub matrix_path: PathBuf,
}

fn default_table_path() -> PathBuf {
    PathBuf::from("output/responses.csv")
}

fn default_matrix_path() -> PathBuf {
    PathBuf::from("output/matrix.json")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            table_path: default_table_path(),
            matrix_path: default_matrix_path(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Resolve the backend API key from config or environment.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        // Explicit api_key in config wins
        if let Some(key) = &self.backend.api_key {
            return Ok(expand_env_vars(key));
        }

        std::env::var(&self.backend.api_key_env).map_err(|_| ConfigError::MissingApiKey {
            env_var: self.backend.api_key_env.clone(),
        })
    }

    /// Validate everything that can be checked before the pipeline runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.catalog.validate()?;
        if self.use_live_backend {
            self.resolve_api_key()?;
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax. Unset variables leave the placeholder
/// unchanged.
pub fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

    for cap in re.captures_iter(s) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing API key: set {env_var} env var or api_key in config")]
    MissingApiKey { env_var: String },

    #[error("Catalog has no demographics")]
    EmptyCatalog,

    #[error("Catalog has no items")]
    NoItems,

    #[error("Duplicate demographic code: '{0}'")]
    DuplicateDemographicCode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: AuditConfig = toml::from_str("").unwrap();
        assert!(!config.use_live_backend);
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.low_income_cutoff, 35000);
        assert_eq!(config.backend.max_tokens, 50);
        assert_eq!(config.catalog.demographics.len(), 4);
        assert!(config.fitting.endpoint_url.is_none());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: AuditConfig = toml::from_str(
            r#"
            use_live_backend = false

            [simulation]
            seed = 7

            [output]
            table_path = "out/t.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.low_income_cutoff, 35000);
        assert_eq!(config.output.table_path, PathBuf::from("out/t.csv"));
        assert_eq!(config.output.matrix_path, PathBuf::from("output/matrix.json"));
    }

    #[test]
    fn test_catalog_from_toml() {
        let config: AuditConfig = toml::from_str(
            r#"
            [catalog]
            items = ["applies for a visa. Will it be granted?"]

            [[catalog.demographics]]
            code = "A1"
            name = "Ada"
            occupation = "Analyst"
            income = 40000
            "#,
        )
        .unwrap();
        assert_eq!(config.catalog.demographics.len(), 1);
        assert_eq!(config.catalog.items.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_catalog() {
        let mut config = AuditConfig::default();
        config.catalog.demographics[0].code = config.catalog.demographics[1].code.clone();
        assert!(config.validate().is_err());
    }
}
