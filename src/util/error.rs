// CarScope - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Only structural failures live here: row-level data-quality problems are
// never errors, they are excluded by the cleaner and show up as counts.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all CarScope operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum CarScopeError {
    /// Reading the listings store failed.
    Load(LoadError),

    /// The cleaning pipeline rejected its input table.
    Clean(CleanError),

    /// Export operation failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for CarScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "Load error: {e}"),
            Self::Clean(e) => write!(f, "Cleaning error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
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

impl std::error::Error for CarScopeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Clean(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Load errors
// ---------------------------------------------------------------------------

/// Errors raised while reading the listings store.
#[derive(Debug)]
pub enum LoadError {
    /// The store could not be opened (missing file, unreadable, not SQLite,
    /// or the listings relation does not exist).
    StoreUnavailable {
        path: PathBuf,
        reason: String,
        source: Option<rusqlite::Error>,
    },

    /// One or more projected columns are absent from the listings relation.
    SchemaMismatch {
        path: PathBuf,
        table: &'static str,
        missing: Vec<String>,
    },

    /// The projection query failed after the store was opened.
    Query {
        path: PathBuf,
        source: rusqlite::Error,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreUnavailable { path, reason, .. } => {
                write!(f, "Store '{}' is unavailable: {reason}", path.display())
            }
            Self::SchemaMismatch {
                path,
                table,
                missing,
            } => write!(
                f,
                "Store '{}': relation '{table}' is missing column(s) {}",
                path.display(),
                missing.join(", ")
            ),
            Self::Query { path, source } => {
                write!(f, "Store '{}': query failed: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StoreUnavailable {
                source: Some(source),
                ..
            } => Some(source),
            Self::Query { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<LoadError> for CarScopeError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

// ---------------------------------------------------------------------------
// Clean errors
// ---------------------------------------------------------------------------

/// Errors raised by the cleaning pipeline. Malformed rows never produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanError {
    /// A column the pipeline reads is not part of the input table.
    MissingRequiredColumn { column: &'static str },
}

impl fmt::Display for CleanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredColumn { column } => {
                write!(f, "Input table has no '{column}' column")
            }
        }
    }
}

impl std::error::Error for CleanError {}

impl From<CleanError> for CarScopeError {
    fn from(e: CleanError) -> Self {
        Self::Clean(e)
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
    Csv { source: csv::Error },

    /// Spreadsheet serialisation error.
    Xlsx {
        source: rust_xlsxwriter::XlsxError,
    },

    /// Export would exceed maximum row count.
    TooManyRows { count: usize, max: usize },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { source } => write!(f, "CSV export error: {source}"),
            Self::Xlsx { source } => write!(f, "Spreadsheet export error: {source}"),
            Self::TooManyRows { count, max } => write!(
                f,
                "Export of {count} rows exceeds maximum of {max}. \
                 Apply filters to reduce the result set."
            ),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source } => Some(source),
            Self::Xlsx { source } => Some(source),
            Self::TooManyRows { .. } => None,
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(source: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx { source }
    }
}

impl From<ExportError> for CarScopeError {
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
            Self::ValueOutOfRange { .. } => None,
        }
    }
}

impl From<ConfigError> for CarScopeError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for CarScope results.
pub type Result<T> = std::result::Result<T, CarScopeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_schema_mismatch_lists_missing_columns() {
        let err = LoadError::SchemaMismatch {
            path: PathBuf::from("cars.sqlite"),
            table: "cars",
            missing: vec!["wilaya".to_string(), "date".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'cars'"), "{msg}");
        assert!(msg.contains("wilaya, date"), "{msg}");
    }

    #[test]
    fn test_top_level_error_keeps_chain() {
        let err: CarScopeError = CleanError::MissingRequiredColumn { column: "price" }.into();
        assert!(err.to_string().starts_with("Cleaning error:"));
        let source = err.source().expect("clean error is the source");
        assert_eq!(source.to_string(), "Input table has no 'price' column");
    }
}
