//! Process-level plumbing shared by the server binary: layered
//! configuration and logging setup.

pub mod config;
pub mod logging;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, LogSection, ServerConfig};
pub use logging::{init_logging_from_config, LoggingError};
