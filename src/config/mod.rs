//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

pub use parser::load_config;
pub use types::*;

use crate::common::error::ConfigError;

/// Load a config file, apply environment overrides and validate the result.
pub fn load_and_validate(path: &str) -> Result<Config, ConfigError> {
    let empty = env::check_empty_env_vars();
    if !empty.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: empty.join(", "),
            message: "environment variable is set but empty".to_string(),
        });
    }

    let config = env::apply_env_overrides(load_config(path)?);
    validate::validate_config(&config)?;
    Ok(config)
}
