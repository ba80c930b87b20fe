pub mod errors;

pub use errors::{CaseCheckError, ErrorCategory};

use std::fmt::{Display, Formatter};

/// Expectation fields of a case, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckField {
    Error,
    Stdout,
    Stderr,
    InStdout,
    CloseValues,
}

impl CheckField {
    pub const ORDER: [CheckField; 5] = [
        Self::Error,
        Self::Stdout,
        Self::Stderr,
        Self::InStdout,
        Self::CloseValues,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::InStdout => "in_stdout",
            Self::CloseValues => "close_values",
        }
    }
}

impl Display for CheckField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// What a finished child process left behind, already decoded to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn new(exit_code: Option<i32>, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub message: String,
    /// Extra context shown only in verbose mode.
    pub diagnostics: Option<String>,
}

impl CheckFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diagnostics: None,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: impl Into<String>) -> Self {
        self.diagnostics = Some(diagnostics.into());
        self
    }
}

impl Display for CheckFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
