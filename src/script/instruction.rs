//! Instruction decoding — turns a [`Command`]'s tokens into typed parameters.
//!
//! Grammar:
//! - `c <hex>` selects the active waveform slot
//! - `<freq> <amp> <ms> [mods]` plays a tone (`a` = attenuate, `v` = vibrato)
//! - `w[<step>] <amp> <ms> [mods]` plays white noise (any mods token attenuates)
//! - `end` closes the intro segment

use super::command::Command;
use super::error::ScriptError;

/// Frequency used for percussion hits that carry no modifier token.
pub const PERCUSSION_FREQ: f64 = 440.0;

/// Tone parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f64,
    pub amp: f64,
    pub ms: f64,
    pub attenuate: bool,
    pub vibrato: bool,
}

/// White-noise parameters. `step_down` holds each random draw for that many
/// samples, lowering the perceived pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Noise {
    pub step_down: i64,
    pub amp: f64,
    pub ms: f64,
    pub attenuate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    SelectWaveform(u8),
    Tone(Tone),
    Noise(Noise),
    End,
}

impl Instruction {
    /// Decode a command. In percussion mode a tone without modifiers ignores
    /// its first token and plays at [`PERCUSSION_FREQ`].
    pub fn decode(command: &Command, percussion: bool) -> Result<Self, ScriptError> {
        let line = command.line();
        let head = command.head();

        if command.is_end() {
            return Ok(Instruction::End);
        }

        if head.starts_with('c') {
            let token = command
                .token(1)
                .ok_or_else(|| ScriptError::missing_token(1, line))?;
            let slot = token
                .chars()
                .next()
                .and_then(hex_nibble)
                .ok_or_else(|| ScriptError::invalid_hex(token, line))?;
            return Ok(Instruction::SelectWaveform(slot));
        }

        let amp = number(command, 1)?;
        let ms = number(command, 2)?;
        let mods = command.token(3);
        let has_mod = |m: char| mods.is_some_and(|s| s.contains(m));

        if let Some(step) = head.strip_prefix('w') {
            let step_down: i64 = if step.is_empty() {
                1
            } else {
                step.parse()
                    .map_err(|_| ScriptError::invalid_number(step, line))?
            };
            return Ok(Instruction::Noise(Noise {
                step_down,
                amp,
                ms,
                attenuate: mods.is_some(),
            }));
        }

        let freq = if percussion && mods.is_none() {
            PERCUSSION_FREQ
        } else {
            number(command, 0)?
        };
        Ok(Instruction::Tone(Tone {
            freq,
            amp,
            ms,
            attenuate: has_mod('a'),
            vibrato: has_mod('v'),
        }))
    }
}

/// Parse a single hex digit (`0-9`, `a-f`, case-insensitive).
pub fn hex_nibble(c: char) -> Option<u8> {
    c.to_digit(16).map(|d| d as u8)
}

fn number(command: &Command, index: usize) -> Result<f64, ScriptError> {
    let token = command
        .token(index)
        .ok_or_else(|| ScriptError::missing_token(index, command.line()))?;
    token
        .parse()
        .map_err(|_| ScriptError::invalid_number(token, command.line()))
}
