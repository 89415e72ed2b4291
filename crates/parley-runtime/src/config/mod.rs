//! Configuration module for the Parley runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for logging, event dispatch and the fixed texts of the conversation engine.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DispatchConfig, DispatchMode, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    ParleyConfig, SpanEventConfig,
};
pub use validation::validate_config;
