use std::fmt;

// === SyncError ===

/// Errors raised while fetching, normalizing, or persisting history records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A page request exceeded its deadline.
    UpstreamTimeout(String),
    /// Transport or API-level failure other than a timeout.
    UpstreamError(String),
    /// A raw entry is missing a required field or carries an unusable value.
    MalformedRecord(String),
    /// The storage layer rejected a read or write.
    PersistenceError(String),
    /// Invalid settings detected at startup.
    ConfigurationError(String),
}

impl SyncError {
    /// Returns true for failures that only abort the current cycle.
    ///
    /// Configuration errors are fatal; everything else is retried on the next tick.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SyncError::ConfigurationError(_))
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::UpstreamTimeout(msg) => write!(f, "Upstream request timed out: {}", msg),
            SyncError::UpstreamError(msg) => write!(f, "Upstream error: {}", msg),
            SyncError::MalformedRecord(msg) => write!(f, "Malformed record: {}", msg),
            SyncError::PersistenceError(msg) => write!(f, "Persistence error: {}", msg),
            SyncError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

// === SettingsError ===

/// Errors related to loading and updating settings.
#[derive(Debug)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    IoError(String),
    /// The settings file could not be parsed or written as JSON.
    SerializationError(String),
    /// The dot-notation key does not exist.
    InvalidKey(String),
    /// The new value does not fit the target field, or fails validation.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => write!(f, "Invalid settings value: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<SettingsError> for SyncError {
    fn from(err: SettingsError) -> Self {
        SyncError::ConfigurationError(err.to_string())
    }
}
