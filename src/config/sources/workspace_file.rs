//! Workspace config file source: proforma.toml at the workspace root.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;

pub const WORKSPACE_CONFIG_FILENAME: &str = "proforma.toml";

/// Add the workspace config file to the builder when present. The workspace
/// file overrides the global one.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let workspace_config_path = workspace_root.join(WORKSPACE_CONFIG_FILENAME);

    let mut builder = builder;
    if workspace_config_path.exists() {
        builder = builder
            .add_source(File::with_name(workspace_config_path.to_str().unwrap()).required(false));
    }

    Ok(builder)
}
