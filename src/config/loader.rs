//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServiceConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [timeouts]
            request_ms = 1500
            fetch_ms = 800
            persist_ms = 50

            [fault_policy]
            shutdown_on_internal_error = true
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.timeouts.fetch_ms, 800);
        assert!(config.fault_policy.shutdown_on_internal_error);
    }

    #[test]
    fn test_load_rejects_invalid_budget() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts]\nrequest_ms = 100\npersist_ms = 500").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 2));
        assert!(err.to_string().contains("persist_ms"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/quotation.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
