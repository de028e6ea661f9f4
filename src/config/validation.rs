//! Configuration validation.
//!
//! Serde handles syntax (including trigger tokens); this module checks the
//! combinations that parse but make no sense. All errors are reported, not
//! just the first.

use std::fmt;

use crate::config::schema::DiagnosticsConfig;
use crate::signals::action::DiagnosticAction;
use crate::triggers::TriggerSource;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Only a report can be requested by a panic.
    ExceptionTrigger(DiagnosticAction),
    UnknownLogLevel(String),
    EmptyName,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ExceptionTrigger(action) => {
                write!(f, "{}: the exception trigger is only supported for nodereport", action)
            }
            ValidationError::UnknownLogLevel(level) => write!(f, "unknown log level {:?}", level),
            ValidationError::EmptyName => write!(f, "name must not be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &DiagnosticsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for action in [DiagnosticAction::HeapDump, DiagnosticAction::CoreDump] {
        if config.triggers_for(action).contains(TriggerSource::Exception) {
            errors.push(ValidationError::ExceptionTrigger(action));
        }
    }

    if !LOG_LEVELS.contains(&config.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.log_level.clone()));
    }

    if config.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
