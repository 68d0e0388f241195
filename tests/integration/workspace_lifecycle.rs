//! Init-then-use lifecycle: a scaffolded workspace is immediately plannable
//! and valid.

use proforma::cli::{Cli, RunContext};
use proforma::config::ConfigLoader;
use proforma::init;
use clap::Parser;
use std::path::Path;
use tempfile::TempDir;

fn write_record(dir: &Path, id: &str, org: &str) {
    std::fs::write(
        dir.join(format!("{id}.json")),
        format!(r#"{{"identifier": "{id}", "organization_name": "{org}", "body": "text"}}"#),
    )
    .unwrap();
}

#[test]
fn test_init_then_plan_and_validate() {
    let workspace = TempDir::new().unwrap();

    let result = init::initialize_all(workspace.path(), false).unwrap();
    assert!(!result.has_errors());

    write_record(&workspace.path().join("proposals"), "first", "First Org");

    let context = RunContext::new(workspace.path().to_path_buf(), None).unwrap();

    let ws = workspace.path().to_string_lossy();
    let cli = Cli::try_parse_from([
        "proforma",
        "--workspace",
        ws.as_ref(),
        "plan",
        "--mode",
        "all",
    ])
    .unwrap();
    let plan = context.execute(&cli.command).unwrap();
    assert!(plan.contains("first"));

    let cli = Cli::try_parse_from(["proforma", "--workspace", ws.as_ref(), "validate"]).unwrap();
    assert!(context.execute(&cli.command).is_ok());
}

#[test]
fn test_second_init_is_a_noop_without_force() {
    let workspace = TempDir::new().unwrap();
    init::initialize_all(workspace.path(), false).unwrap();

    // Customize the config, then init again.
    std::fs::write(
        workspace.path().join("proforma.toml"),
        r#"
input_dir = "custom-in"

[providers.anthropic]
type = "anthropic"
model = "claude-sonnet-4-5"
"#,
    )
    .unwrap();

    let second = init::initialize_all(workspace.path(), false).unwrap();
    assert!(second.created.is_empty());

    let config = ConfigLoader::load(workspace.path()).unwrap();
    assert_eq!(config.input_dir, std::path::PathBuf::from("custom-in"));
}

#[test]
fn test_cli_parses_run_flags() {
    let cli = Cli::try_parse_from([
        "proforma",
        "run",
        "--mode",
        "missing-output",
        "--provider",
        "fast",
    ])
    .unwrap();

    match cli.command {
        proforma::cli::Commands::Run { provider, .. } => {
            assert_eq!(provider.as_deref(), Some("fast"));
        }
        _ => panic!("expected run command"),
    }
}
