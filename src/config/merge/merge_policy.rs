//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("input_dir", "proposals")?
        .set_default("output_dir", "published")?
        .set_default("instructions_path", "instructions.md")?
        .set_default("default_provider", "anthropic")
}
