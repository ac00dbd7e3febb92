//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
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

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [[triggers]]
            id = "t"
            settings = {{ port = 9000 }}

            [[triggers.handlers]]
            action_id = "a"
            settings = {{ method = "GET", path = "/a" }}
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.triggers[0].id, "t");
        assert_eq!(config.triggers[0].handlers.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_validation_error_message_lists_all() {
        let err = parse_config("[[triggers]]\nid = \"a\"\n[[triggers]]\nid = \"b\"\nsettings = {}\n")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("no settings found for trigger 'a'"));
        assert!(message.contains("no port found for trigger 'b'"));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = parse_config("[[triggers]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
