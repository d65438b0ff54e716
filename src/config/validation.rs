//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::identity::{Identity, ParseIdentityError};
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("server.identity is invalid: {0}")]
    InvalidIdentity(ParseIdentityError),
    #[error("listen.preamble_timeout must be greater than zero")]
    ZeroPreambleTimeout,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    if let Err(e) = config.server.identity.parse::<Identity>() {
        errors.push(ValidationError::InvalidIdentity(e));
    }

    if config.listen.preamble_timeout == 0 {
        errors.push(ValidationError::ZeroPreambleTimeout);
    }

    // Database path validation
    let db_path = Path::new(&config.database.path);
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::DatabasePathInvalid(
            config.database.path.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(body: &str) -> Config {
        toml::from_str(body).unwrap()
    }

    #[test]
    fn test_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("room.db");
        let config = config(&format!(
            r#"
            [server]
            name = "lobby"
            identity = "@x7iOLUcq3o+sjGeAnipvWeGzfuYgrXl8L4LYlxIhwDc=.ed25519"

            [database]
            path = "{}"
            "#,
            db.display()
        ));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let config = config(
            r#"
            [server]
            name = " "
            identity = "alice"

            [listen]
            preamble_timeout = 0

            [database]
            path = "/definitely/not/here/room.db"
            "#,
        );

        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], ValidationError::MissingServerName));
        assert!(matches!(
            errors[1],
            ValidationError::InvalidIdentity(ParseIdentityError::MissingSigil)
        ));
        assert!(matches!(errors[2], ValidationError::ZeroPreambleTimeout));
        assert!(matches!(errors[3], ValidationError::DatabasePathInvalid(_)));
    }
}
