//! Input records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub action: String,
    pub marker: String,
    pub source_id: String,
    pub user_id: String,
    /// `None`, `null` and `""` all mean no segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
}

impl Event {
    /// The segment, if present and non-empty.
    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref().filter(|s| !s.is_empty())
    }
}

/// A line that is not a JSON object with the required string fields.
#[derive(Debug, Error)]
#[error("malformed record: {source}")]
pub struct DecodeError {
    /// The raw line, lossily decoded as UTF-8.
    pub line: String,
    #[source]
    pub source: serde_json::Error,
}

/// Decodes one line.
pub fn decode(line: &str) -> Result<Event, DecodeError> {
    decode_bytes(line.as_bytes())
}

/// Decodes one raw line; a trailing `\n` or `\r\n` is ignored.
pub fn decode_bytes(line: &[u8]) -> Result<Event, DecodeError> {
    let line = trim_line_ending(line);
    serde_json::from_slice(line).map_err(|source| DecodeError {
        line: String::from_utf8_lossy(line).into_owned(),
        source,
    })
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
