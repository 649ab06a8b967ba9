use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::num::ParseIntError;
use std::sync::Arc;

use crate::interner::Field;

/// Level assigned to records whose group carries the `++` marker.
pub const SEPARATOR_LEVEL: u8 = 0;

/// Level assigned to records that carry a version or command banner.
pub const BANNER_LEVEL: u8 = 7;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One finalized log entry, possibly spanning several physical lines.
///
/// Repeated fields share storage through the run's interning caches, so
/// cloning a record is cheap apart from its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub date: Arc<str>,
    pub time: Arc<str>,
    pub level: u8,
    pub host: Arc<str>,
    pub pid: u32,
    pub group: Option<Arc<str>>,
    pub file: Option<Arc<str>>,
    pub function: Option<Arc<str>>,
    pub line_number: u32,
    pub thread: Option<Arc<str>>,
    pub text: String,
    pub text_line_count: usize,

    // Rendered columns as they appeared in the log.
    pub level_field: Arc<str>,
    pub host_field: Arc<str>,
    pub group_field: Arc<str>,
    pub file_field: Arc<str>,
    pub thread_field: Option<Arc<str>>,
}

impl LogRecord {
    /// Date and time combined, when they form a valid calendar value.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.date, &self.time)
    }

    pub fn is_multiline(&self) -> bool {
        self.text_line_count > 1
    }

    /// Appends one continuation line to the record's text.
    pub(crate) fn push_continuation(&mut self, line: &str) {
        self.text.push('\n');
        self.text.push_str(line);
        self.text_line_count += 1;
    }
}

/// Aggregate of all records sharing one process id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub pid: u32,
    pub date: Option<Arc<str>>,
    pub time: Option<Arc<str>>,
    pub version: Option<String>,
    pub command_name: Option<String>,
    pub line_count: usize,
    #[serde(skip)]
    pub(crate) scan_done: bool,
}

impl Command {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            date: None,
            time: None,
            version: None,
            command_name: None,
            line_count: 0,
            scan_done: false,
        }
    }

    /// Number of derived properties (date, time, version, command) still unknown.
    pub fn missing(&self) -> usize {
        [
            self.date.is_none(),
            self.time.is_none(),
            self.version.is_none(),
            self.command_name.is_none(),
        ]
        .into_iter()
        .filter(|missing| *missing)
        .count()
    }

    pub fn started_at(&self) -> Option<NaiveDateTime> {
        match (&self.date, &self.time) {
            (Some(date), Some(time)) => parse_timestamp(date, time),
            _ => None,
        }
    }
}

/// Widest rendered value seen per display column during one parse run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWidths {
    pub group: usize,
    pub file: usize,
    pub thread: usize,
}

/// Non-fatal report about input that could not be attributed to any record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub source: String,
    pub line: usize,
    pub text: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: leading garbage: {}", self.source, self.line, self.text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{path}:{line}: I/O error: {cause}")]
    Source {
        path: String,
        line: usize,
        #[source]
        cause: std::io::Error,
    },
    #[error("{path}:{line}: field {field:?} value {value:?} does not fit: {cause}")]
    Grammar {
        path: String,
        line: usize,
        field: Field,
        value: String,
        #[source]
        cause: ParseIntError,
    },
}

fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_missing_counts_unknown_properties() {
        let mut cmd = Command::new(42);
        assert_eq!(cmd.missing(), 4);

        cmd.date = Some("2020-04-14".into());
        cmd.time = Some("10:58:37".into());
        assert_eq!(cmd.missing(), 2);

        cmd.version = Some("1.14.36".to_string());
        cmd.command_name = Some("install foo".to_string());
        assert_eq!(cmd.missing(), 0);
    }

    #[test]
    fn test_command_started_at() {
        let mut cmd = Command::new(1);
        assert!(cmd.started_at().is_none());

        cmd.date = Some("2020-04-14".into());
        cmd.time = Some("10:58:37".into());
        let ts = cmd.started_at().unwrap();
        assert_eq!(ts.to_string(), "2020-04-14 10:58:37");

        cmd.time = Some("99:99:99".into());
        assert!(cmd.started_at().is_none());
    }

    #[test]
    fn test_command_serializes_without_scan_state() {
        let mut cmd = Command::new(1198);
        cmd.version = Some("1.14.36".to_string());
        cmd.scan_done = true;

        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["pid"], 1198);
        assert_eq!(json["version"], "1.14.36");
        assert!(json["date"].is_null());
        assert!(json.get("scan_done").is_none());

        let back: Command = serde_json::from_value(json).unwrap();
        assert!(!back.scan_done);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic {
            source: "z.log".to_string(),
            line: 3,
            text: "junk".to_string(),
        };
        assert_eq!(diag.to_string(), "z.log:3: leading garbage: junk");
    }
}
