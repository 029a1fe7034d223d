//! Waveform names — `square`, `combine(square,sine)`, `dissolve(square,triangle)`.

use std::fmt;
use std::str::FromStr;

use super::Waveform;

/// Error returned when a waveform name cannot be parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWaveformError {
    /// The name is not a known shape.
    Unknown(String),
    /// `dissolve` needs exactly two members.
    DissolveArity(usize),
    /// Parentheses don't balance.
    Unbalanced(String),
}

impl fmt::Display for ParseWaveformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWaveformError::Unknown(name) => write!(f, "unknown waveform: '{name}'"),
            ParseWaveformError::DissolveArity(n) => {
                write!(f, "dissolve takes 2 waveforms, got {n}")
            }
            ParseWaveformError::Unbalanced(s) => write!(f, "unbalanced parentheses in '{s}'"),
        }
    }
}

impl std::error::Error for ParseWaveformError {}

impl FromStr for Waveform {
    type Err = ParseWaveformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let Some(open) = s.find('(') else {
            return match s.as_str() {
                "square" => Ok(Waveform::Square),
                "triangle" => Ok(Waveform::Triangle),
                "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
                "sine" | "sin" => Ok(Waveform::Sine),
                "kick" => Ok(Waveform::Kick),
                "snare" => Ok(Waveform::Snare),
                _ => Err(ParseWaveformError::Unknown(s)),
            };
        };

        let inner = s[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| ParseWaveformError::Unbalanced(s.clone()))?;
        let members = split_top_level(inner)
            .ok_or_else(|| ParseWaveformError::Unbalanced(s.clone()))?
            .into_iter()
            .map(str::parse)
            .collect::<Result<Vec<Waveform>, _>>()?;

        match s[..open].trim() {
            "combine" => Ok(Waveform::Combine(members)),
            "dissolve" => {
                let [from, to]: [Waveform; 2] = members
                    .try_into()
                    .map_err(|m: Vec<Waveform>| ParseWaveformError::DissolveArity(m.len()))?;
                Ok(Waveform::dissolve(from, to))
            }
            other => Err(ParseWaveformError::Unknown(other.to_string())),
        }
    }
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(s: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    if !s[start..].trim().is_empty() || !parts.is_empty() {
        parts.push(&s[start..]);
    }
    Some(parts)
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Waveform::Square => f.write_str("square"),
            Waveform::Triangle => f.write_str("triangle"),
            Waveform::Sawtooth => f.write_str("sawtooth"),
            Waveform::Sine => f.write_str("sine"),
            Waveform::Kick => f.write_str("kick"),
            Waveform::Snare => f.write_str("snare"),
            Waveform::Combine(members) => {
                f.write_str("combine(")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{m}")?;
                }
                f.write_str(")")
            }
            Waveform::Dissolve { from, to } => write!(f, "dissolve({from},{to})"),
        }
    }
}
