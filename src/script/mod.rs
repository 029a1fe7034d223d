//! Script loading — text → [`Command`] list → intro and loop segments.

pub mod command;
pub mod error;
pub mod instruction;
pub mod parser;

use std::io::{BufReader, Read};
use std::sync::Arc;

pub use command::Command;
pub use error::{ScriptError, ScriptErrorKind};
pub use instruction::{hex_nibble, Instruction, Noise, Tone};

/// A parsed script, split once at load time at the first `end` marker.
///
/// The intro (everything before `end`) plays only on a generator's first run;
/// the loop segment (everything after) plays on every run. A script without
/// `end` has an empty intro. Both segments are immutable and cheap to clone.
#[derive(Debug, Clone)]
pub struct Script {
    intro: Arc<[Command]>,
    body: Arc<[Command]>,
    has_end: bool,
}

impl Script {
    pub fn from_commands(mut commands: Vec<Command>) -> Self {
        match commands.iter().position(Command::is_end) {
            Some(end) => {
                let body = commands.split_off(end + 1);
                commands.pop();
                Self {
                    intro: commands.into(),
                    body: body.into(),
                    has_end: true,
                }
            }
            None => Self {
                intro: Vec::new().into(),
                body: commands.into(),
                has_end: false,
            },
        }
    }

    /// Parse a script held in memory.
    pub fn parse(source: &str) -> Self {
        Self::from_commands(parser::parse_str(source))
    }

    /// Read and parse a script source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ScriptError> {
        parser::parse_reader(BufReader::new(reader)).map(Self::from_commands)
    }

    /// Commands played once, before the loop segment.
    pub fn intro(&self) -> &[Command] {
        &self.intro
    }

    /// Commands played on every run.
    pub fn body(&self) -> &[Command] {
        &self.body
    }

    /// Whether the script has an `end`-delimited intro.
    pub fn has_intro(&self) -> bool {
        self.has_end
    }

    /// The full command list as written: intro, `end`, loop segment.
    pub fn commands(&self) -> Vec<Command> {
        let mut all = self.intro.to_vec();
        if self.has_end {
            all.push(Command::from_text(command::END));
        }
        all.extend(self.body.iter().cloned());
        all
    }

    /// Total number of commands as written, including the `end` marker.
    pub fn len(&self) -> usize {
        self.intro.len() + usize::from(self.has_end) + self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
