//! Integration tests for the proforma batch rendering pipeline

mod batch_run;
mod config_integration;
mod selection;
mod workspace_lifecycle;
