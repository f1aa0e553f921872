//! Configuration error types.

/// Configuration error with source location.
///
/// Raised when a configuration file cannot be read or parsed, or when a
/// loaded configuration fails validation.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Offending field, when the error is a validation failure
    pub field: Option<&'static str>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use somnia_error::ConfigError;
    ///
    /// let err = ConfigError::new("Missing required field");
    /// assert!(err.message.contains("Missing required"));
    /// assert!(err.field.is_none());
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            field: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create a validation error for a specific configuration field.
    ///
    /// # Examples
    ///
    /// ```
    /// use somnia_error::ConfigError;
    ///
    /// let err = ConfigError::invalid_field("beats", "must be at least 1");
    /// assert_eq!(err.field, Some("beats"));
    /// assert!(err.to_string().contains("beats"));
    /// ```
    #[track_caller]
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            field: Some(field),
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.field {
            Some(field) => write!(
                f,
                "Configuration Error: field '{}' {} at line {} in {}",
                field, self.message, self.line, self.file
            ),
            None => write!(
                f,
                "Configuration Error: {} at line {} in {}",
                self.message, self.line, self.file
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
