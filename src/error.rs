//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the DejaText application.
///
/// - 0: Success (scan completed, findings reported)
/// - 1: General error (unexpected failure)
/// - 2: No findings (scan completed, nothing duplicated or similar)
/// - 3: Partial success (completed with some non-fatal warnings)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed and findings were reported.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No findings: Scan completed but nothing qualified for a report.
    NoFindings = 2,
    /// Partial success: Scan completed but some documents or stages were skipped.
    PartialSuccess = 3,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DT000",
            Self::GeneralError => "DT001",
            Self::NoFindings => "DT002",
            Self::PartialSuccess => "DT003",
            Self::Interrupted => "DT130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DT001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
