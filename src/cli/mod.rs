//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, keyboard input,
//! logging setup and the interactive identify runner.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod input;
pub mod logging;
pub mod presenter;

// Re-export commonly used types
pub use app::{load_merged_config, run_identify, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, IdentifyOptions};
pub use logging::init_logging;
pub use presenter::Presenter;
