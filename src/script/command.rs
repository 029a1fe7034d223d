//! A single parsed script line.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker that ends the one-time intro segment.
pub const END: &str = "end";

/// One instruction line, split into lower-cased tokens.
///
/// Equality and hashing look only at the tokens, so two commands parsed from
/// different lines (or different scripts) with the same text are the same
/// cache key. The source line is carried for error reporting.
#[derive(Debug, Clone)]
pub struct Command {
    tokens: Vec<String>,
    line: usize,
}

impl Command {
    /// Wrap already split tokens parsed from `line`.
    pub fn new(tokens: Vec<String>, line: usize) -> Self {
        Self { tokens, line }
    }

    /// Build a command from space-separated text, without a source line.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split(' ').map(str::to_lowercase).collect(), 0)
    }

    /// All tokens, in order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Token at `index`, if present.
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// The first token, or `""` for an empty command.
    pub fn head(&self) -> &str {
        self.token(0).unwrap_or("")
    }

    /// Source line, 1-based. Zero when built with [`Command::from_text`].
    pub fn line(&self) -> usize {
        self.line
    }

    /// Whether this is the `end` marker.
    pub fn is_end(&self) -> bool {
        self.head() == END
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl Eq for Command {}

impl Hash for Command {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tokens.hash(state);
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}
