//! Error types for script loading and instruction decoding.

use std::fmt;

/// An error tied to a line of a script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    /// 1-based source line (0 when the command was built in code).
    pub line: usize,
    pub kind: ScriptErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptErrorKind {
    /// The script source could not be read.
    Io(String),
    /// A required token is absent.
    MissingToken { index: usize },
    /// A token that must be numeric isn't.
    InvalidNumber { token: String },
    /// A waveform selector that isn't a hex digit.
    InvalidHex { token: String },
}

impl ScriptError {
    pub fn io(message: impl Into<String>, line: usize) -> Self {
        Self {
            line,
            kind: ScriptErrorKind::Io(message.into()),
        }
    }

    pub fn missing_token(index: usize, line: usize) -> Self {
        Self {
            line,
            kind: ScriptErrorKind::MissingToken { index },
        }
    }

    pub fn invalid_number(token: impl Into<String>, line: usize) -> Self {
        Self {
            line,
            kind: ScriptErrorKind::InvalidNumber {
                token: token.into(),
            },
        }
    }

    pub fn invalid_hex(token: impl Into<String>, line: usize) -> Self {
        Self {
            line,
            kind: ScriptErrorKind::InvalidHex {
                token: token.into(),
            },
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] ", self.line)?;
        match &self.kind {
            ScriptErrorKind::Io(e) => write!(f, "cannot read script: {e}"),
            ScriptErrorKind::MissingToken { index } => write!(f, "missing token #{index}"),
            ScriptErrorKind::InvalidNumber { token } => write!(f, "not a number: '{token}'"),
            ScriptErrorKind::InvalidHex { token } => write!(f, "not a hex digit: '{token}'"),
        }
    }
}

impl std::error::Error for ScriptError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_line_and_token() {
        let err = ScriptError::invalid_number("loud", 7);
        assert_eq!(err.to_string(), "[line 7] not a number: 'loud'");
    }

    #[test]
    fn display_missing_token() {
        assert_eq!(
            ScriptError::missing_token(2, 3).to_string(),
            "[line 3] missing token #2"
        );
    }
}
