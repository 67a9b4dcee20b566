//! Settings loading.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `portcullis.toml` (or an explicit file), if present
//! 3. `PORTCULLIS_*` environment variables, e.g. `PORTCULLIS_AUTH_BASE_URL`

use std::path::Path;

use config::{Config, Environment, File, Map};
use portcullis_domain::SessionSettings;

/// Default settings file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "portcullis.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "PORTCULLIS";

/// Error type for settings loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or merged.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// An explicitly requested file does not exist.
    #[error("settings file not found: {0}")]
    MissingFile(String),
}

/// Loads settings from defaults, an optional file and the environment.
///
/// With `path == None` the default file is used when it exists. An explicit
/// path must exist.
///
/// # Errors
///
/// Returns an error if a source is malformed or a value has the wrong type.
pub fn load_settings(path: Option<&Path>) -> Result<SessionSettings, ConfigError> {
    load_with_env(path, None)
}

fn load_with_env(
    path: Option<&Path>,
    env: Option<Map<String, String>>,
) -> Result<SessionSettings, ConfigError> {
    let file = match path {
        Some(path) if !path.exists() => {
            return Err(ConfigError::MissingFile(path.display().to_string()));
        }
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let settings = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        )
        .build()?
        .try_deserialize()?;
    Ok(settings)
}
