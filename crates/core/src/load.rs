//! Readers for session records, hook records and live events.
//!
//! Input may be a single JSON array or JSONL (one object per line, blank
//! lines skipped). Errors carry the 1-based line they were found on.

use crate::event::WireEvent;
use crate::hooks::HookEventRecord;
use crate::normalize::SessionRecord;
use serde::de::DeserializeOwned;
use std::io::{self, BufRead, Read};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error at line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
}

pub fn read_session_records<R: BufRead>(reader: R) -> Result<Vec<SessionRecord>, LoadError> {
    read_records(reader)
}

pub fn read_hook_records<R: BufRead>(reader: R) -> Result<Vec<HookEventRecord>, LoadError> {
    read_records(reader)
}

pub fn read_live_events<R: BufRead>(reader: R) -> Result<Vec<WireEvent>, LoadError> {
    read_records(reader)
}

pub fn read_records<T, R>(mut reader: R) -> Result<Vec<T>, LoadError>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    if text.trim_start().starts_with('[') {
        return serde_json::from_str(&text).map_err(|source| LoadError::Json {
            line: source.line(),
            source,
        });
    }

    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| LoadError::Json {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_jsonl_and_skips_blank_lines() {
        let input = "{\"role\":\"user\",\"content\":\"hi\"}\n\n{\"role\":\"assistant\",\"content\":\"yo\"}\n";
        let records = read_session_records(Cursor::new(input)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].role, "assistant");
    }

    #[test]
    fn reads_json_array() {
        let input = r#"
            [
              {"id": "h1", "timestamp": 1, "event_name": "Stop"},
              {"id": 2, "event_name": "PreToolUse", "label": "guard"}
            ]
        "#;
        let records = read_hook_records(Cursor::new(input)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "2");
    }

    #[test]
    fn reports_failing_line() {
        let input = "{\"kind\":\"user\",\"content\":\"a\"}\n{\"kind\":\"bogus\"}\n";
        match read_live_events(Cursor::new(input)) {
            Err(LoadError::Json { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected json error, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(read_session_records(Cursor::new("")).unwrap().is_empty());
    }
}
