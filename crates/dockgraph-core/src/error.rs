use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigReadFailed,
    ConfigParseError,
    EmptyInput,
    NoValidRecords,
    InputNotFound,
    InputUnreadable,
    MissingColumn,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigReadFailed => "E1001",
            Self::ConfigParseError => "E1002",
            Self::EmptyInput => "E2001",
            Self::NoValidRecords => "E2002",
            Self::InputNotFound => "E3001",
            Self::InputUnreadable => "E3002",
            Self::MissingColumn => "E3003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigReadFailed => "Config file could not be read",
            Self::ConfigParseError => "Config file parse error",
            Self::EmptyInput => "No trip records supplied",
            Self::NoValidRecords => "Every trip record is missing a station id",
            Self::InputNotFound => "Trip file not found",
            Self::InputUnreadable => "Trip file could not be parsed",
            Self::MissingColumn => "Required column missing from trip file",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigReadFailed => Some("Check the path and permissions of the config file."),
            Self::ConfigParseError => Some("Fix the named config file and retry."),
            Self::EmptyInput => Some("Supply at least one trip record."),
            Self::NoValidRecords => {
                Some("Check that start_station_id and end_station_id are populated.")
            }
            Self::InputNotFound => Some("Pass the path of an existing trip CSV export."),
            Self::InputUnreadable => Some("Verify the file is a comma-separated trip export."),
            Self::MissingColumn => Some(
                "Exports need start_station_id, end_station_id, started_at and member_casual.",
            ),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// AnalysisError
// ---------------------------------------------------------------------------

/// Failures raised while turning trip records into a station graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// Zero records were supplied.
    #[error("no trip records supplied")]
    EmptyInput,
    /// Records were supplied but none named both stations.
    #[error("all {skipped} trip records are missing a station id")]
    NoValidRecords { skipped: usize },
}

impl AnalysisError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyInput => ErrorCode::EmptyInput,
            Self::NoValidRecords { .. } => ErrorCode::NoValidRecords,
        }
    }

    #[must_use]
    pub fn suggestion(&self) -> String {
        self.error_code().hint().unwrap_or_default().to_string()
    }
}

// ---------------------------------------------------------------------------
// LoadError
// ---------------------------------------------------------------------------

/// Failures raised by the CSV loader and config reader.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("trip file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("missing required column `{column}` in {}", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("failed to parse {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl LoadError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::InputNotFound,
            Self::MissingColumn { .. } => ErrorCode::MissingColumn,
            Self::Csv { .. } => ErrorCode::InputUnreadable,
            Self::Io { .. } => ErrorCode::ConfigReadFailed,
            Self::Config { .. } => ErrorCode::ConfigParseError,
        }
    }

    #[must_use]
    pub fn suggestion(&self) -> String {
        self.error_code().hint().unwrap_or_default().to_string()
    }
}
