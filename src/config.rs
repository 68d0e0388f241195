//! Configuration system.
//!
//! Hierarchical configuration with environment variable overrides and
//! up-front validation: defaults, then the global user config, then the
//! workspace file, then PROFORMA_* environment variables.

use crate::logging::LoggingConfig;
use crate::orchestrator::validate_ladder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use crate::provider::{ProviderConfig, ProviderType};

mod merge;
mod sources;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProformaConfig {
    /// Directory holding proposal source records (flat, one JSON per record)
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory artifacts and the run summary are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Generation instructions document sent with every record
    #[serde(default = "default_instructions_path")]
    pub instructions_path: PathBuf,

    /// Base URL prepended to artifact names for display-only references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_base_url: Option<String>,

    /// Name of the provider entry used when the CLI does not pick one
    #[serde(default = "default_provider_name")]
    pub default_provider: String,

    /// Descending output-ceiling ladder; one generation attempt per rung
    #[serde(default = "default_output_token_ladder")]
    pub output_token_ladder: Vec<u32>,

    /// Wall-clock bound on each generation attempt, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Remove source records after their artifact is written. Destructive;
    /// off unless explicitly enabled.
    #[serde(default)]
    pub delete_inputs_after_success: bool,

    /// Model provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("proposals")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("published")
}

fn default_instructions_path() -> PathBuf {
    PathBuf::from("instructions.md")
}

fn default_provider_name() -> String {
    "anthropic".to_string()
}

fn default_output_token_ladder() -> Vec<u32> {
    vec![65000, 32000, 16000]
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for ProformaConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            instructions_path: default_instructions_path(),
            publish_base_url: None,
            default_provider: default_provider_name(),
            output_token_ladder: default_output_token_ladder(),
            request_timeout_secs: default_request_timeout_secs(),
            delete_inputs_after_success: false,
            providers: HashMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String, String),
    Run(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(name, msg) => {
                write!(f, "Provider '{}': {}", name, msg)
            }
            ValidationError::Run(msg) => {
                write!(f, "Run settings: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ProformaConfig {
    /// Validate the entire configuration, collecting every problem instead of
    /// stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, provider) in &self.providers {
            if let Err(e) = provider.validate() {
                errors.push(ValidationError::Provider(name.clone(), e));
            }
        }

        if let Err(e) = validate_ladder(&self.output_token_ladder) {
            errors.push(ValidationError::Run(e));
        }

        if self.request_timeout_secs == 0 {
            errors.push(ValidationError::Run(
                "request_timeout_secs must be positive".to_string(),
            ));
        }

        if self.providers.is_empty() {
            errors.push(ValidationError::Run(
                "at least one provider must be configured".to_string(),
            ));
        } else if !self.providers.contains_key(&self.default_provider) {
            errors.push(ValidationError::Run(format!(
                "default_provider '{}' is not a configured provider (have: {})",
                self.default_provider,
                self.provider_names().join(", ")
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Resolve a provider entry by name, or the configured default.
    pub fn provider(&self, name: Option<&str>) -> Option<(&str, &ProviderConfig)> {
        let wanted = name.unwrap_or(&self.default_provider);
        self.providers
            .get_key_value(wanted)
            .map(|(k, v)| (k.as_str(), v))
    }

    fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Layered configuration loader.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full layering:
    /// defaults < global file < workspace file < PROFORMA_* environment.
    pub fn load(workspace_root: &Path) -> Result<ProformaConfig, config::ConfigError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder)?;
        builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        builder = builder.add_source(
            config::Environment::with_prefix("PROFORMA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load configuration from a single explicit file, skipping the layered
    /// sources. Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<ProformaConfig, config::ConfigError> {
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path).required(true))
            .add_source(
                config::Environment::with_prefix("PROFORMA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Path the global user config is read from, when HOME is known.
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }
}
