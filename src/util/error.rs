// BirthWindow - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation. Every rejected operation surfaces as
// one of these variants and leaves session state untouched.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all BirthWindow operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum BirthWindowError {
    /// A timeline command was rejected.
    Timeline(TimelineError),

    /// Reference data could not be loaded or a lookup missed.
    Reference(ReferenceError),

    /// A session (wizard) command was rejected.
    Session(SessionError),

    /// Export operation failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// A session script could not be loaded or replayed.
    Script(ScriptError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for BirthWindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeline(e) => write!(f, "Timeline error: {e}"),
            Self::Reference(e) => write!(f, "Reference data error: {e}"),
            Self::Session(e) => write!(f, "Session error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Script(e) => write!(f, "Script error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for BirthWindowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeline(e) => Some(e),
            Self::Reference(e) => Some(e),
            Self::Session(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Script(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Timeline errors
// ---------------------------------------------------------------------------

/// Errors raised by slot timeline commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// A transition (or window end) was not strictly after the time it must follow.
    OutOfOrder { time: String, previous: String },

    /// A slot start fell at or after the declared window end.
    PastWindowEnd { time: String, window_end: String },

    /// The command is not valid for the current timeline shape.
    InvalidState { reason: &'static str },
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfOrder { time, previous } => {
                write!(f, "{time} must be after {previous}")
            }
            Self::PastWindowEnd { time, window_end } => {
                write!(f, "{time} must be before the window end {window_end}")
            }
            Self::InvalidState { reason } => write!(f, "invalid timeline state: {reason}"),
        }
    }
}

impl std::error::Error for TimelineError {}

impl From<TimelineError> for BirthWindowError {
    fn from(e: TimelineError) -> Self {
        Self::Timeline(e)
    }
}

// ---------------------------------------------------------------------------
// Reference data errors
// ---------------------------------------------------------------------------

/// Errors related to question reference data.
#[derive(Debug)]
pub enum ReferenceError {
    /// A question lookup found no text for the key.
    MissingQuestion { table: &'static str, key: String },

    /// A table key is not a recognised sign, hour lord, or house.
    UnknownKey { table: &'static str, key: String },

    /// A table entry exists but its text is empty.
    EmptyText { table: &'static str, key: String },

    /// TOML document could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Reference file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// I/O error reading a reference file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingQuestion { table, key } => {
                write!(f, "no question text in '{table}' for '{key}'")
            }
            Self::UnknownKey { table, key } => {
                write!(f, "'{table}': unrecognised key '{key}'")
            }
            Self::EmptyText { table, key } => {
                write!(f, "'{table}': question text for '{key}' is empty")
            }
            Self::TomlParse { path, source } => {
                write!(f, "Failed to parse TOML '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Reference file '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::Io { path, source } => {
                write!(
                    f,
                    "I/O error reading reference file '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ReferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ReferenceError> for BirthWindowError {
    fn from(e: ReferenceError) -> Self {
        Self::Reference(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Errors raised by the step-by-step session.
#[derive(Debug)]
pub enum SessionError {
    /// The underlying timeline rejected the command.
    Timeline(TimelineError),

    /// Question text could not be resolved.
    Reference(ReferenceError),

    /// The command belongs to a different step than the current one.
    WrongStep {
        expected: &'static str,
        actual: &'static str,
    },

    /// The command is not valid in the current session state.
    InvalidState { reason: &'static str },

    /// Advancing was attempted while required answers are still missing.
    IncompleteAnswers { step: &'static str, missing: usize },

    /// An answer was recorded for a question that is not being asked.
    UnknownQuestion { step: &'static str, key: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeline(e) => write!(f, "{e}"),
            Self::Reference(e) => write!(f, "{e}"),
            Self::WrongStep { expected, actual } => write!(
                f,
                "command belongs to step '{expected}' but the session is at '{actual}'"
            ),
            Self::InvalidState { reason } => write!(f, "invalid session state: {reason}"),
            Self::IncompleteAnswers { step, missing } => write!(
                f,
                "{missing} question(s) in step '{step}' are unanswered. \
                 Answer all questions before continuing."
            ),
            Self::UnknownQuestion { step, key } => {
                write!(f, "step '{step}' has no question for '{key}'")
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeline(e) => Some(e),
            Self::Reference(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TimelineError> for SessionError {
    fn from(e: TimelineError) -> Self {
        Self::Timeline(e)
    }
}

impl From<ReferenceError> for SessionError {
    fn from(e: ReferenceError) -> Self {
        Self::Reference(e)
    }
}

impl From<SessionError> for BirthWindowError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for BirthWindowError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for BirthWindowError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Script errors
// ---------------------------------------------------------------------------

/// Errors related to loading and replaying a session script.
#[derive(Debug)]
pub enum ScriptError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A script key could not be interpreted.
    InvalidKey {
        section: &'static str,
        key: String,
        reason: String,
    },

    /// I/O error reading the script file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Script parse error '{}': {source}", path.display())
            }
            Self::InvalidKey {
                section,
                key,
                reason,
            } => write!(f, "Script [{section}] key '{key}': {reason}"),
            Self::Io { path, source } => {
                write!(f, "Script I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ScriptError> for BirthWindowError {
    fn from(e: ScriptError) -> Self {
        Self::Script(e)
    }
}

/// Convenience type alias for BirthWindow results.
pub type Result<T> = std::result::Result<T, BirthWindowError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_session_error_preserves_timeline_source() {
        let inner = TimelineError::OutOfOrder {
            time: "05:00".to_string(),
            previous: "08:00".to_string(),
        };
        let err: BirthWindowError = SessionError::from(inner.clone()).into();
        assert_eq!(err.to_string(), "Session error: 05:00 must be after 08:00");

        let session = err.source().unwrap();
        let timeline = session.source().unwrap();
        assert_eq!(timeline.to_string(), inner.to_string());
    }

    #[test]
    fn test_incomplete_answers_message_names_step() {
        let err = SessionError::IncompleteAnswers {
            step: "ascendant questions",
            missing: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("2 question(s)"));
        assert!(msg.contains("ascendant questions"));
    }
}
