//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{DispatchConfig, LogOutput, LoggingConfig, ParleyConfig};
use parley_framework::Messages;

/// Validates the entire configuration.
pub fn validate_config(config: &ParleyConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_dispatch_config(&config.dispatch)?;
    validate_messages(&config.messages)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation(
            "Log filter module names must not be empty",
        ));
    }

    Ok(())
}

fn validate_dispatch_config(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if dispatch.queue_capacity == 0 {
        return Err(ConfigError::validation(
            "Dispatch queue capacity must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_messages(messages: &Messages) -> ConfigResult<()> {
    if messages.not_understood.trim().is_empty() {
        return Err(ConfigError::missing_field("messages.not_understood"));
    }
    if messages.menu_prompt.trim().is_empty() {
        return Err(ConfigError::missing_field("messages.menu_prompt"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&ParleyConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut config = ParleyConfig::default();
        config.dispatch.queue_capacity = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_blank_messages() {
        let mut config = ParleyConfig::default();
        config.messages.menu_prompt = "  ".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "messages.menu_prompt"
        ));
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = ParleyConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("parley.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_filter_module() {
        let mut config = ParleyConfig::default();
        config.logging.filters.insert(String::new(), LogLevel::Debug);
        assert!(validate_config(&config).is_err());
    }
}
