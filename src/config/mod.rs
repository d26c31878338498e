//! Configuration of the evaluator and its diagnostic output.

#[expect(clippy::module_inception, reason = "The module holds the Config type")]
mod config;
mod log_level;

pub use config::{CONFIG_FILE_STEM, Config, DEFAULT_CONFIG_TOML};
pub use log_level::{LogLevel, init_logging};
