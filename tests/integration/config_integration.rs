//! Layered configuration loading against real files and environment.

use proforma::config::{ConfigLoader, ProviderType};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

// Serialize environment mutation across parallel tests.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_workspace_file_layers_over_defaults() {
    let workspace = TempDir::new().unwrap();
    std::fs::write(
        workspace.path().join("proforma.toml"),
        r#"
output_dir = "site"
output_token_ladder = [50000, 20000, 8000]
request_timeout_secs = 120

[providers.claude]
type = "anthropic"
model = "claude-sonnet-4-5"
api_key = "k"

[providers.local]
type = "openai"
model = "llama3"
endpoint = "http://localhost:8080/v1"
api_key = "unused"

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load(workspace.path()).unwrap();

    assert_eq!(config.output_dir, PathBuf::from("site"));
    assert_eq!(config.input_dir, PathBuf::from("proposals"));
    assert_eq!(config.output_token_ladder, vec![50000, 20000, 8000]);
    assert_eq!(config.request_timeout_secs, 120);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");

    let local = config.providers.get("local").unwrap();
    assert!(matches!(local.provider_type, ProviderType::OpenAI));
    assert_eq!(local.endpoint.as_deref(), Some("http://localhost:8080/v1"));
}

#[test]
fn test_environment_overrides_workspace_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let workspace = TempDir::new().unwrap();
    std::fs::write(
        workspace.path().join("proforma.toml"),
        "request_timeout_secs = 120\n",
    )
    .unwrap();

    std::env::set_var("PROFORMA_REQUEST_TIMEOUT_SECS", "45");
    let config = ConfigLoader::load(workspace.path());
    std::env::remove_var("PROFORMA_REQUEST_TIMEOUT_SECS");

    assert_eq!(config.unwrap().request_timeout_secs, 45);
}

#[test]
fn test_invalid_provider_config_fails_validation_not_loading() {
    let workspace = TempDir::new().unwrap();
    std::fs::write(
        workspace.path().join("proforma.toml"),
        r#"
default_provider = "broken"

[providers.broken]
type = "anthropic"
model = ""
"#,
    )
    .unwrap();

    // Loading succeeds; validation reports the empty model.
    let config = ConfigLoader::load(workspace.path()).unwrap();
    let errors = config.validate().unwrap_err();
    assert!(errors.iter().any(|e| e.to_string().contains("broken")));
}

#[test]
fn test_explicit_file_skips_workspace_layering() {
    let workspace = TempDir::new().unwrap();
    std::fs::write(workspace.path().join("proforma.toml"), "input_dir = \"ws\"\n").unwrap();

    let explicit = workspace.path().join("other.toml");
    std::fs::write(&explicit, "input_dir = \"explicit\"\n").unwrap();

    let config = ConfigLoader::load_from_file(&explicit).unwrap();
    assert_eq!(config.input_dir, PathBuf::from("explicit"));
}
