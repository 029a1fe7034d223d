//! Line parser — script text → ordered [`Command`] list.
//!
//! Empty lines and lines starting with `//` are skipped, trailing `//`
//! comments are stripped, and the remainder is lower-cased, trimmed and split
//! on single spaces. Runs of spaces leave empty tokens, which fail to decode.

use std::io::BufRead;

use super::command::Command;
use super::error::ScriptError;

/// Comment marker.
pub const COMMENT: &str = "//";

/// Parse one line. Returns `None` for blank and comment-only lines.
pub fn parse_line(raw: &str, line: usize) -> Option<Command> {
    if raw.is_empty() || raw.starts_with(COMMENT) {
        return None;
    }
    let text = match raw.find(COMMENT) {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    let tokens = text.split(' ').map(str::to_string).collect();
    Some(Command::new(tokens, line))
}

/// Parse a whole script held in memory.
pub fn parse_str(source: &str) -> Vec<Command> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| parse_line(raw, i + 1))
        .collect()
}

/// Parse a script from a reader. Read failures are reported with the line
/// they occurred on.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<Command>, ScriptError> {
    let mut commands = Vec::new();
    for (i, raw) in reader.lines().enumerate() {
        let raw = raw.map_err(|e| ScriptError::io(e.to_string(), i + 1))?;
        commands.extend(parse_line(&raw, i + 1));
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};

    fn texts(commands: &[Command]) -> Vec<String> {
        commands.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let cmds = parse_str("// intro riff\n\n440 1 100\n   \n  // indented note\n");
        assert_eq!(texts(&cmds), ["440 1 100"]);
    }

    #[test]
    fn strips_trailing_comment() {
        let cmds = parse_str("440 1 100 av // vibrato A4");
        assert_eq!(cmds[0].tokens(), ["440", "1", "100", "av"]);
    }

    #[test]
    fn lowercases_and_trims() {
        let cmds = parse_str("  C A  \nW4 0.5 20 A");
        assert_eq!(texts(&cmds), ["c a", "w4 0.5 20 a"]);
    }

    #[test]
    fn double_space_leaves_empty_token() {
        let cmds = parse_str("440  1  10");
        assert_eq!(cmds[0].tokens(), ["440", "", "1", "", "10"]);
        assert_ne!(cmds[0], Command::from_text("440 1 10"));
    }

    #[test]
    fn keeps_order_and_duplicates() {
        let cmds = parse_str("a 1 10\nend\na 1 10\nb 1 10");
        assert_eq!(texts(&cmds), ["a 1 10", "end", "a 1 10", "b 1 10"]);
        assert_eq!(cmds[0], cmds[2]);
    }

    #[test]
    fn records_source_lines() {
        let cmds = parse_str("// header\n440 1 100\n\n220 1 50");
        assert_eq!(cmds[0].line(), 2);
        assert_eq!(cmds[1].line(), 4);
    }

    #[test]
    fn reader_matches_str() {
        let src = "440 1 100\n// skip\nw 1 10 a\n";
        let from_reader = parse_reader(Cursor::new(src)).unwrap();
        assert_eq!(from_reader, parse_str(src));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }
    }

    #[test]
    fn reader_failure_is_an_error() {
        let err = parse_reader(io::BufReader::new(FailingReader)).unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.to_string().contains("disk gone"));
    }
}
