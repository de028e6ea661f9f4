//! Configuration loading from disk.

use std::fs;
use std::io;
use std::path::Path;

use crate::config::schema::DiagnosticsConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Json(serde_json::Error),
    Toml(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "Parse error: {}", e),
            ConfigError::Toml(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate an options file. `.toml` files are parsed as TOML,
/// everything else as JSON.
pub fn load_config(path: &Path) -> Result<DiagnosticsConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let config: DiagnosticsConfig = if is_toml {
        toml::from_str(&content).map_err(ConfigError::Toml)?
    } else {
        serde_json::from_str(&content).map_err(ConfigError::Json)?
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<DiagnosticsConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No options file found, using defaults");
            Ok(DiagnosticsConfig::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::{TriggerSet, TriggerSource};
    use std::io::Write;

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_json() {
        let file = write_file(".json", r#"{"heapdump": "signal", "log_json": true}"#);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.heapdump, TriggerSet::NONE.with(TriggerSource::Signal));
        assert!(config.log_json);
        assert_eq!(config.coredump, TriggerSet::API_AND_SIGNAL);
    }

    #[test]
    fn test_load_toml() {
        let file = write_file(".toml", "coredump = \"none\"\nlog_level = \"debug\"\n");
        let config = load_config(file.path()).unwrap();
        assert!(config.coredump.is_empty());
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_bad_trigger_is_parse_error() {
        let file = write_file(".json", r#"{"nodereport": "api+telepathy"}"#);
        assert!(matches!(load_config(file.path()), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_semantic_errors_are_reported() {
        let file = write_file(".json", r#"{"coredump": "exception"}"#);
        match load_config(file.path()) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&dir.path().join("cloud-diagnostics.json")).unwrap();
        assert_eq!(config, DiagnosticsConfig::default());
    }
}
