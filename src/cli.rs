//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_init_preview, format_init_result, format_plan_json, format_plan_text,
    format_run_tally, format_validate_result, ConsoleReporter,
};
pub use route::RunContext;
