//! Proforma: Batch Proposal Rendering
//!
//! Selects proposal records from a workspace, renders each to a publishable
//! HTML artifact through a configured generation backend, and reports the
//! outcome of every record in a machine-readable run summary.

pub mod cli;
pub mod config;
pub mod error;
pub mod init;
pub mod logging;
pub mod naming;
pub mod orchestrator;
pub mod provider;
pub mod record;
pub mod selector;
pub mod summary;
