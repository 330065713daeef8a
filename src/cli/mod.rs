//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, logging, Ctrl-C handling
//! and the command runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod history_cmd;
pub mod logging;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{
    load_merged_config, run_listen, run_probe, EXIT_ERROR, EXIT_MIC_BLOCKED, EXIT_SUCCESS,
    EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction, ListenArgs, ListenOptions};
pub use presenter::Presenter;
