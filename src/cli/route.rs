//! CLI route: single route table and run context. Dispatches to domain
//! services and presentation.

use crate::cli::parse::{Commands, ModeArg};
use crate::cli::presentation::{
    format_init_preview, format_init_result, format_plan_json, format_plan_text,
    format_run_tally, format_validate_result, ConsoleReporter,
};
use crate::config::{ConfigLoader, ProformaConfig};
use crate::error::{RunError, StoreError};
use crate::init;
use crate::orchestrator::{Orchestrator, RunOptions};
use crate::provider::BackendFactory;
use crate::record::FsRecordStore;
use crate::selector::{select_records, SelectionMode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Runtime context for CLI execution: workspace root and loaded config.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ProformaConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, RunError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };

        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &ProformaConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, RunError> {
        match command {
            Commands::Run {
                mode,
                changed_list,
                provider,
            } => self.handle_run(*mode, changed_list.as_deref(), provider.as_deref()),
            Commands::Plan {
                mode,
                changed_list,
                format,
            } => self.handle_plan(*mode, changed_list.as_deref(), format),
            Commands::Validate => self.handle_validate(),
            Commands::Init { force, list } => self.handle_init(*force, *list),
        }
    }

    fn handle_run(
        &self,
        mode: ModeArg,
        changed_list: Option<&Path>,
        provider: Option<&str>,
    ) -> Result<String, RunError> {
        let selection = self.selection_mode(mode, changed_list)?;
        let input_dir = self.resolve(&self.config.input_dir);
        let output_dir = self.resolve(&self.config.output_dir);
        let instructions_path = self.resolve(&self.config.instructions_path);

        let store = FsRecordStore::open(&input_dir)?;
        let identifiers = select_records(&store, &selection)?;

        let instructions = std::fs::read_to_string(&instructions_path).map_err(|e| {
            RunError::InstructionsUnreadable {
                path: instructions_path.clone(),
                reason: e.to_string(),
            }
        })?;

        std::fs::create_dir_all(&output_dir)
            .map_err(|e| RunError::StoreError(StoreError::IoError(e)))?;

        let (provider_name, provider_config) =
            self.config.provider(provider).ok_or_else(|| {
                RunError::ProviderNotConfigured(
                    provider.unwrap_or(&self.config.default_provider).to_string(),
                )
            })?;
        let request_timeout = Duration::from_secs(self.config.request_timeout_secs);
        let backend = BackendFactory::create(provider_name, provider_config, request_timeout)?;

        let options = RunOptions {
            ceiling_ladder: self.config.output_token_ladder.clone(),
            // The HTTP client enforces the request timeout; the outer bound is
            // a backstop so a wedged attempt still counts as retryable.
            attempt_timeout: request_timeout + Duration::from_secs(5),
            output_dir: output_dir.clone(),
            publish_base_url: self.config.publish_base_url.clone(),
            delete_inputs_after_success: self.config.delete_inputs_after_success,
        };
        let orchestrator = Orchestrator::new(backend.as_ref(), instructions, options)?;

        info!(
            provider = provider_name,
            model = backend.model_name(),
            mode = selection.name(),
            records = identifiers.len(),
            "Starting run"
        );

        let runtime = tokio::runtime::Runtime::new().map_err(|e| {
            RunError::ConfigError(format!("Failed to start async runtime: {}", e))
        })?;
        let summary = runtime.block_on(orchestrator.run(
            &store,
            &identifiers,
            selection.name(),
            &ConsoleReporter,
        ));

        let summary_path = summary.write(&output_dir)?;
        orchestrator.cleanup_sources(&store, &summary);

        let tally = format!(
            "{}\nSummary written to {}",
            format_run_tally(&summary),
            summary_path.display()
        );

        if summary.has_failures() {
            // The tally still goes to stdout; the error drives the exit code.
            println!("{}", tally);
            Err(RunError::CompletedWithFailures {
                failed: summary.failed,
                processed: summary.processed,
            })
        } else {
            Ok(tally)
        }
    }

    fn handle_plan(
        &self,
        mode: ModeArg,
        changed_list: Option<&Path>,
        format: &str,
    ) -> Result<String, RunError> {
        let selection = self.selection_mode(mode, changed_list)?;
        let store = FsRecordStore::open(&self.resolve(&self.config.input_dir))?;
        let identifiers = select_records(&store, &selection)?;

        if format == "json" {
            Ok(format_plan_json(selection.name(), &identifiers))
        } else {
            Ok(format_plan_text(selection.name(), &identifiers))
        }
    }

    fn handle_validate(&self) -> Result<String, RunError> {
        let mut problems = Vec::new();

        if let Err(errors) = self.config.validate() {
            problems.extend(errors.iter().map(|e| e.to_string()));
        }

        let input_dir = self.resolve(&self.config.input_dir);
        if !input_dir.is_dir() {
            problems.push(format!(
                "Input directory does not exist: {}",
                input_dir.display()
            ));
        }

        let instructions_path = self.resolve(&self.config.instructions_path);
        if !instructions_path.is_file() {
            problems.push(format!(
                "Instructions file does not exist: {}",
                instructions_path.display()
            ));
        }

        if problems.is_empty() {
            Ok(format_validate_result(&problems))
        } else {
            println!("{}", format_validate_result(&problems));
            Err(RunError::ConfigError(format!(
                "validation found {} problem(s)",
                problems.len()
            )))
        }
    }

    fn handle_init(&self, force: bool, list: bool) -> Result<String, RunError> {
        if list {
            let preview = init::list_initialization(&self.workspace_root);
            return Ok(format_init_preview(&preview));
        }

        let result = init::initialize_all(&self.workspace_root, force)?;
        let formatted = format_init_result(&result);
        if result.has_errors() {
            println!("{}", formatted);
            Err(RunError::ConfigError(format!(
                "initialization completed with {} error(s)",
                result.errors.len()
            )))
        } else {
            Ok(formatted)
        }
    }

    fn selection_mode(
        &self,
        mode: ModeArg,
        changed_list: Option<&Path>,
    ) -> Result<SelectionMode, RunError> {
        match mode {
            ModeArg::All => Ok(SelectionMode::All),
            ModeArg::MissingOutput => Ok(SelectionMode::MissingOutput {
                output_dir: self.resolve(&self.config.output_dir),
            }),
            ModeArg::Changed => {
                let list_path = changed_list.ok_or_else(|| {
                    RunError::ConfigError(
                        "--changed-list is required with --mode changed".to_string(),
                    )
                })?;
                let raw = std::fs::read_to_string(list_path).map_err(|e| {
                    RunError::ConfigError(format!(
                        "Failed to read changed-path list {}: {}",
                        list_path.display(),
                        e
                    ))
                })?;
                let changed_paths = raw
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(PathBuf::from)
                    .collect();
                Ok(SelectionMode::Changed { changed_paths })
            }
        }
    }

    /// Resolve a configured path against the workspace root.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}
