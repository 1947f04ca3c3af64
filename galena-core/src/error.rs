//! Error types for the SMT-LIB front end.

use std::fmt;
use thiserror::Error;

/// A 1-based source coordinate (line, column) of a byte in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coo {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub col: u32,
}

impl Coo {
    /// Coordinate of the first byte of the input.
    pub fn start() -> Self {
        Coo { line: 1, col: 1 }
    }

    /// True if this coordinate has been set (0:0 marks "unknown").
    pub fn is_set(&self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for Coo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Errors produced by the front end.
///
/// The parser stores positions for every lexical, syntactic and semantic
/// failure; the rendered form is `<file>:<line>:<col>: <message>`, which is
/// what callers print.
#[derive(Debug, Error)]
pub enum GalenaError {
    /// Lexical, syntactic or semantic error in the input script.
    #[error("{file}:{coo}: {msg}")]
    Parse {
        /// Name of the input (file name or `<stdin>`).
        file: String,
        /// Source coordinate of the offending token or form.
        coo: Coo,
        /// Human-readable description.
        msg: String,
    },
    /// Failure on the output channel or while redirecting it.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Failure reported by the solver backend.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, GalenaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_rendering() {
        let err = GalenaError::Parse {
            file: "t.smt2".to_string(),
            coo: Coo { line: 3, col: 14 },
            msg: "expected ')'".to_string(),
        };
        assert_eq!(err.to_string(), "t.smt2:3:14: expected ')'");
    }
}
