// src/error.rs
//! Crate level error type
//!
//! Component errors (`ConfigError`, `HalError`, console I/O) are wrapped
//! together with an [`ErrorContext`] naming where the failure surfaced, so a
//! message printed by the binary points at the component and operation that
//! failed.

use crate::config::ConfigError;
use crate::hal::HalError;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Where an error surfaced
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub additional_info: BTreeMap<String, String>,
}

impl ErrorContext {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
            additional_info: BTreeMap::new(),
        }
    }

    /// Create error context with file and line information
    pub fn with_location(component: &str, operation: &str, file: &'static str, line: u32) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

    pub fn add_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.component, self.operation)?;
        for (key, value) in &self.additional_info {
            write!(f, " {}={}", key, value)?;
        }
        if let (Some(file), Some(line)) = (self.file, self.line) {
            write!(f, " at {}:{}", file, line)?;
        }
        Ok(())
    }
}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

/// Unified error type of the validator
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("[CONFIG] {source} ({context})")]
    Configuration {
        #[source]
        source: ConfigError,
        context: ErrorContext,
    },

    #[error("[BUS] {source} ({context})")]
    Bus {
        #[source]
        source: HalError,
        context: ErrorContext,
    },

    #[error("[CONSOLE] {source} ({context})")]
    Console {
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },

    #[error("[USAGE] {0}")]
    Usage(String),
}

impl ValidateError {
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ValidateError::Configuration { context, .. }
            | ValidateError::Bus { context, .. }
            | ValidateError::Console { context, .. } => Some(context),
            ValidateError::Usage(_) => None,
        }
    }
}

impl From<ConfigError> for ValidateError {
    fn from(source: ConfigError) -> Self {
        ValidateError::Configuration {
            source,
            context: error_context!("config", "load"),
        }
    }
}

impl From<HalError> for ValidateError {
    fn from(source: HalError) -> Self {
        ValidateError::Bus {
            source,
            context: error_context!("hal", "bus_operation"),
        }
    }
}

impl From<std::io::Error> for ValidateError {
    fn from(source: std::io::Error) -> Self {
        ValidateError::Console {
            source,
            context: error_context!("orchestrator", "console"),
        }
    }
}

/// Result type alias for validator operations
pub type ValidateResult<T> = Result<T, ValidateError>;

/// Attach a component and operation to a foreign error
pub trait ResultExt<T> {
    fn in_context(self, component: &str, operation: &str) -> ValidateResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<ValidateError>,
{
    fn in_context(self, component: &str, operation: &str) -> ValidateResult<T> {
        self.map_err(|err| {
            let mut err = err.into();
            match &mut err {
                ValidateError::Configuration { context, .. }
                | ValidateError::Bus { context, .. }
                | ValidateError::Console { context, .. } => {
                    context.component = component.to_string();
                    context.operation = operation.to_string();
                }
                ValidateError::Usage(_) => {}
            }
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("test_component", "test_operation");
        assert_eq!(context.component, "test_component");
        assert_eq!(context.operation, "test_operation");
        assert!(context.file.is_none());
    }

    #[test]
    fn test_context_macro_records_location() {
        let context = error_context!("config", "load");
        assert_eq!(context.file, Some(file!()));
        assert!(context.line.is_some());
        assert!(context.to_string().starts_with("config::load"));
    }

    #[test]
    fn test_context_info_is_rendered() {
        let context = ErrorContext::new("config", "load").add_info("path", "/etc/leo.toml");
        assert_eq!(context.to_string(), "config::load path=/etc/leo.toml");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: ValidateError = ConfigError::FileNotFound("imu.yaml".to_string()).into();
        let display = err.to_string();
        assert!(display.starts_with("[CONFIG]"));
        assert!(display.contains("imu.yaml"));
        assert_eq!(err.context().map(|c| c.component.as_str()), Some("config"));
    }

    #[test]
    fn test_in_context_overrides_location() {
        let result: Result<(), HalError> = Err(HalError::MasterOffline);
        let err = result.in_context("orchestrator", "init_node").unwrap_err();

        match &err {
            ValidateError::Bus { source, context } => {
                assert_eq!(*source, HalError::MasterOffline);
                assert_eq!(context.operation, "init_node");
            }
            other => panic!("Expected bus error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ValidateError>();
    }
}
