//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables TOML configuration files (`parley.toml`, `config.toml`)
//! - `yaml-config`: enables YAML configuration files (`parley.yaml`, `parley.yml`, etc.)
//!
//! Both features can be enabled simultaneously; if so, both file formats are searched and loaded.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults, then any configuration passed to [`ConfigLoader::merge`]
//! 2. Profile-specific config file (`parley.{profile}.toml` / `parley.{profile}.yaml`)
//! 3. Main config file (`parley.toml` / `parley.yaml`)
//! 4. Environment variables (`PARLEY_*`)
//! 5. Single values passed to [`ConfigLoader::set`]
//!
//! # Environment Variable Mapping
//!
//! Environment variables are mapped using the `PARLEY_` prefix with `__` as separator:
//!
//! - `PARLEY_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `PARLEY_DISPATCH__MODE=sequential` → `dispatch.mode = "sequential"`
//! - `PARLEY_MESSAGES__MENU_PROMPT=More?` → `messages.menu_prompt = "More?"`
//!
//! # Example
//!
//! ```rust,ignore
//! use parley_runtime::config::ConfigLoader;
//!
//! // Simple loading from default locations
//! let config = ConfigLoader::new().load()?;
//!
//! // Specific file, production profile, one value pinned in code
//! let config = ConfigLoader::new()
//!     .file("./config/parley.toml")
//!     .profile("production")
//!     .set("dispatch.mode", "sequential")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use figment::value::Value;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::ParleyConfig;

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name; `prod` and `dev` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `PARLEY_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var("PARLEY_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic base layered over the defaults.
    figment: Figment,
    /// Single values applied after every other source.
    overrides: Vec<(String, Value)>,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            overrides: Vec::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds user config directory to search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("parley"))
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Uses `config` as the base that files and environment refine.
    pub fn merge(mut self, config: ParleyConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Pins a single value at a dotted key path, above every other source.
    ///
    /// Values that cannot be represented are ignored with a warning.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        match Value::serialize(value) {
            Ok(value) => self.overrides.push((key.to_string(), value)),
            Err(e) => warn!(key, error = %e, "Ignoring unserializable configuration override"),
        }
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<ParleyConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: ParleyConfig = figment.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            dispatch_mode = ?config.dispatch.mode,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(ParleyConfig::default()));

        let base = std::mem::take(&mut self.figment);
        figment = figment.merge(base);

        if let Some(path) = self.config_file.take() {
            if path.exists() {
                info!(path = %path.display(), "Loading configuration file");
                figment = Self::merge_config_file(figment, &path)?;
            } else {
                return Err(ConfigError::FileNotFound(path));
            }
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with PARLEY_ prefix");
            figment = figment.merge(Env::prefixed("PARLEY_").split("__"));
        }

        for (key, value) in self.overrides {
            figment = figment.merge(Serialized::default(&key, value));
        }

        Ok(figment)
    }

    /// Merges a single config file into the figment, dispatching on file extension.
    ///
    /// Only extensions enabled via feature flags are accepted.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::ParseError(format!(
                "Unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            let mut paths = Vec::new();
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
            if let Some(config_dir) = dirs::config_dir() {
                paths.push(config_dir.join("parley"));
            }
            paths
        } else {
            self.search_paths.clone()
        }
    }

    /// Searches `search_paths × base_names` for one format.
    ///
    /// The profile-specific variant of a base file is merged before the base
    /// file itself; the first base file found ends the search.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    figment = merge_fn(figment, &base_path);
                    return (figment, true);
                }
            }
        }
        (figment, false)
    }

    #[cfg_attr(
        not(any(feature = "toml-config", feature = "yaml-config")),
        allow(unused_mut)
    )]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["parley.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["parley.yaml", "parley.yml", "config.yaml", "config.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!(
                paths = ?search_paths,
                "No configuration file found, using defaults"
            );
        }
        figment
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<ParleyConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path`, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<ParleyConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;
    use crate::config::{DispatchMode, LogLevel};

    #[test]
    fn test_defaults_without_files() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config, ParleyConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "parley.toml",
                r#"
                    [dispatch]
                    mode = "sequential"
                    queue_capacity = 16

                    [messages]
                    not_understood = "Sorry?"
                "#,
            )?;
            jail.set_env("PARLEY_DISPATCH__QUEUE_CAPACITY", "32");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.dispatch.mode, DispatchMode::Sequential);
            assert_eq!(config.dispatch.queue_capacity, 32);
            assert_eq!(config.messages.not_understood, "Sorry?");
            assert_eq!(config.messages.menu_prompt, "Anything else?");
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_is_overridden_by_main_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "parley.production.toml",
                r#"
                    [logging]
                    level = "warn"
                    format = "full"
                "#,
            )?;
            jail.create_file(
                "parley.toml",
                r#"
                    [logging]
                    level = "debug"
                "#,
            )?;

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .profile("prod")
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.logging.format, crate::config::LogFormat::Full);
            Ok(())
        });
    }

    #[test]
    fn test_overrides_win() {
        Jail::expect_with(|jail| {
            jail.create_file("parley.toml", "[dispatch]\nmode = \"concurrent\"\n")?;
            jail.set_env("PARLEY_LOGGING__LEVEL", "error");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .set("dispatch.mode", "sequential")
                .set("logging.level", "trace")
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.dispatch.mode, DispatchMode::Sequential);
            assert_eq!(config.logging.level, LogLevel::Trace);
            Ok(())
        });
    }

    #[test]
    fn test_merge_is_refined_by_files() {
        Jail::expect_with(|jail| {
            jail.create_file("parley.toml", "[dispatch]\nqueue_capacity = 8\n")?;

            let mut base = ParleyConfig::default();
            base.dispatch.mode = DispatchMode::Sequential;
            base.dispatch.queue_capacity = 1024;

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .merge(base)
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.dispatch.mode, DispatchMode::Sequential);
            assert_eq!(config.dispatch.queue_capacity, 8);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|jail| {
            let result = ConfigLoader::new()
                .file(jail.directory().join("absent.toml"))
                .load();
            assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_value_is_parse_error() {
        Jail::expect_with(|jail| {
            jail.create_file("parley.toml", "[dispatch]\nmode = \"sideways\"\n")?;
            let result = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load();
            assert!(matches!(result, Err(ConfigError::ParseError(_))));
            Ok(())
        });
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }
}
