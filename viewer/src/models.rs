use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use zlog_parser::{Command, Diagnostic, FieldWidths, LogData, LogRecord};

/// One row of the command table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRow {
    pub pid: u32,
    pub started_at: Option<NaiveDateTime>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub version: Option<String>,
    pub command: Option<String>,
    pub lines: usize,
}

impl From<&Command> for CommandRow {
    fn from(cmd: &Command) -> Self {
        Self {
            pid: cmd.pid,
            started_at: cmd.started_at(),
            date: cmd.date.as_deref().map(str::to_string),
            time: cmd.time.as_deref().map(str::to_string),
            version: cmd.version.clone(),
            command: cmd.command_name.clone(),
            lines: cmd.line_count,
        }
    }
}

/// Flat record layout used for CSV export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRow {
    pub date: String,
    pub time: String,
    pub level: u8,
    pub host: String,
    pub pid: u32,
    pub group: String,
    pub file: String,
    pub function: String,
    pub line: u32,
    pub thread: String,
    pub text_lines: usize,
    pub text: String,
}

impl From<&LogRecord> for RecordRow {
    fn from(r: &LogRecord) -> Self {
        let owned = |v: &Option<std::sync::Arc<str>>| v.as_deref().unwrap_or_default().to_string();
        Self {
            date: r.date.to_string(),
            time: r.time.to_string(),
            level: r.level,
            host: r.host.to_string(),
            pid: r.pid,
            group: owned(&r.group),
            file: owned(&r.file),
            function: owned(&r.function),
            line: r.line_number,
            thread: owned(&r.thread),
            text_lines: r.text_line_count,
            text: r.text.clone(),
        }
    }
}

/// Summary printed by `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub sources: usize,
    pub records: usize,
    pub widths: FieldWidths,
    pub commands: Vec<CommandRow>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn new(data: &LogData, sources: usize, widths: FieldWidths, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            sources,
            records: data.record_count(),
            widths,
            commands: data.commands().iter().map(CommandRow::from).collect(),
            diagnostics,
        }
    }
}
