//! Workspace initialization for the `init` command.
//!
//! Scaffolds a workspace: the config file, a starter instructions document,
//! and the input/output directories. The instructions template is embedded in
//! the binary at build time.

use crate::config::{ProformaConfig, ProviderConfig, ProviderType};
use crate::error::RunError;
use std::path::Path;

/// Starter instructions document embedded at compile time
pub const DEFAULT_INSTRUCTIONS: &str = include_str!("../templates/instructions.md");

/// Result of one initialization pass
#[derive(Debug, Clone)]
pub struct InitResult {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
}

impl InitResult {
    fn new() -> Self {
        Self {
            created: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Preview of what `init` would create
#[derive(Debug, Clone)]
pub struct InitPreview {
    pub pending: Vec<String>,
}

fn starter_config() -> ProformaConfig {
    let mut config = ProformaConfig::default();
    config.providers.insert(
        "anthropic".to_string(),
        ProviderConfig {
            provider_type: ProviderType::Anthropic,
            model: "claude-sonnet-4-5".to_string(),
            // Resolved from ANTHROPIC_API_KEY at run time.
            api_key: None,
            endpoint: None,
            temperature: None,
        },
    );
    config
}

/// Planned scaffolding relative to the workspace root.
fn scaffold_entries(workspace_root: &Path) -> Vec<(std::path::PathBuf, ScaffoldKind)> {
    let config = starter_config();
    vec![
        (workspace_root.join("proforma.toml"), ScaffoldKind::Config),
        (
            workspace_root.join(&config.instructions_path),
            ScaffoldKind::Instructions,
        ),
        (workspace_root.join(&config.input_dir), ScaffoldKind::Dir),
        (workspace_root.join(&config.output_dir), ScaffoldKind::Dir),
    ]
}

#[derive(Debug, Clone, Copy)]
enum ScaffoldKind {
    Config,
    Instructions,
    Dir,
}

/// Initialize the workspace. Existing files are skipped unless `force`;
/// directories are never clobbered.
pub fn initialize_all(workspace_root: &Path, force: bool) -> Result<InitResult, RunError> {
    let mut result = InitResult::new();

    let config_toml = toml::to_string_pretty(&starter_config())
        .map_err(|e| RunError::ConfigError(format!("Failed to serialize default config: {}", e)))?;

    for (path, kind) in scaffold_entries(workspace_root) {
        let display = path.display().to_string();
        match kind {
            ScaffoldKind::Dir => {
                if path.is_dir() {
                    result.skipped.push(display);
                    continue;
                }
                match std::fs::create_dir_all(&path) {
                    Ok(()) => result.created.push(display),
                    Err(e) => result
                        .errors
                        .push(format!("Failed to create directory {}: {}", display, e)),
                }
            }
            ScaffoldKind::Config | ScaffoldKind::Instructions => {
                if path.exists() && !force {
                    result.skipped.push(display);
                    continue;
                }
                let content: &str = match kind {
                    ScaffoldKind::Config => &config_toml,
                    _ => DEFAULT_INSTRUCTIONS,
                };
                match std::fs::write(&path, content) {
                    Ok(()) => result.created.push(display),
                    Err(e) => result
                        .errors
                        .push(format!("Failed to write {}: {}", display, e)),
                }
            }
        }
    }

    Ok(result)
}

/// List what would be created without touching the filesystem.
pub fn list_initialization(workspace_root: &Path) -> InitPreview {
    let pending = scaffold_entries(workspace_root)
        .into_iter()
        .filter(|(path, _)| !path.exists())
        .map(|(path, _)| path.display().to_string())
        .collect();
    InitPreview { pending }
}
