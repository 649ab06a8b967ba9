use std::collections::BTreeSet;
use std::fmt::Write as _;
use tracing::{debug, warn};
use zlog_parser::{Diagnostic, Event, FieldWidths, LogData, LogRecord};

// Fixed column widths of the command table: date, time, pid, version.
const DATE_WIDTH: usize = 11;
const TIME_WIDTH: usize = 9;
const PID_WIDTH: usize = 8;
const VERSION_WIDTH: usize = 10;

/// The file column never grows past this.
const MAX_FILE_WIDTH: usize = 30;

/// Consumer-side view kept in sync with [`LogData`] through its events.
///
/// It only tracks row counts and which command rows need repainting, so it
/// never rescans the model.
#[derive(Debug, Default)]
pub struct ViewState {
    command_rows: usize,
    record_rows: usize,
    pending: Option<Pending>,
    dirty: BTreeSet<usize>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Commands(usize),
    Records(usize),
}

impl ViewState {
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::BeginInsertCommands { first, last } => {
                self.begin(Pending::Commands(last + 1 - first));
            }
            Event::EndInsertCommands => {
                if let Some(Pending::Commands(n)) = self.pending.take() {
                    self.command_rows += n;
                } else {
                    warn!("Unbalanced end of command insertion");
                }
            }
            Event::BeginInsertRecords { first, last } => {
                self.begin(Pending::Records(last + 1 - first));
            }
            Event::EndInsertRecords => {
                if let Some(Pending::Records(n)) = self.pending.take() {
                    self.record_rows += n;
                } else {
                    warn!("Unbalanced end of record insertion");
                }
            }
            Event::CommandChanged { index } => {
                self.dirty.insert(index);
            }
            Event::Diagnostic(diagnostic) => {
                self.diagnostics.push(diagnostic);
            }
        }
    }

    fn begin(&mut self, pending: Pending) {
        if let Some(previous) = self.pending.replace(pending) {
            warn!("Insertion {:?} started before {:?} ended", pending, previous);
        }
    }

    pub fn command_rows(&self) -> usize {
        self.command_rows
    }

    pub fn record_rows(&self) -> usize {
        self.record_rows
    }

    /// Command rows changed since the last call.
    pub fn take_dirty(&mut self) -> Vec<usize> {
        let dirty: Vec<usize> = std::mem::take(&mut self.dirty).into_iter().collect();
        if !dirty.is_empty() {
            debug!("{} command rows need repainting", dirty.len());
        }
        dirty
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

fn cell(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// Renders the command table as plain text.
pub fn render_commands(data: &LogData) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<DATE_WIDTH$}{:<TIME_WIDTH$}{:>PID_WIDTH$}  {:^VERSION_WIDTH$}  {}",
        "Date", "Time", "PID", "Version", "Command"
    );
    for cmd in data.commands() {
        let _ = writeln!(
            out,
            "{:<DATE_WIDTH$}{:<TIME_WIDTH$}{:>PID_WIDTH$}  {:^VERSION_WIDTH$}  {}",
            cell(cmd.date.as_deref()),
            cell(cmd.time.as_deref()),
            cmd.pid,
            cell(cmd.version.as_deref()),
            cell(cmd.command_name.as_deref()),
        );
    }
    out
}

/// Renders records with the group and file columns sized from the run's widths.
pub fn render_records<'a, I>(records: I, widths: &FieldWidths) -> String
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    let group_width = widths.group;
    let file_width = widths.file.min(MAX_FILE_WIDTH);

    let mut out = String::new();
    for r in records {
        let _ = writeln!(
            out,
            "{} {} {:<group_width$} {:<file_width$} {} {}",
            r.time,
            r.level_field,
            r.group_field,
            r.file_field,
            r.thread.as_deref().unwrap_or(""),
            r.text,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use zlog_parser::LogParser;

    const INPUT: &str = "\
2020-04-14 10:58:37 <1> hobbes(1198) [zypper++] main.cc(main):97 {T:Zypp-main} ===== Hi, me zypper 1.14.36
2020-04-14 10:58:37 <1> hobbes(1198) [zypper] main.cc(main):98 ===== 'zypper' 'ref' =====
2020-04-14 10:59:00 <2> hobbes(2000) [zypp] Repo.cc:12 refreshing
";

    fn load(view: &mut ViewState) -> LogData {
        let mut data = LogData::new();
        let mut worker_events = Vec::new();
        LogParser::default()
            .parse_reader(
                "view.log",
                Cursor::new(format!("garbage\n{INPUT}")),
                |batch| data.add_records(batch, &mut |e: Event| view.apply(e)),
                &mut |e: Event| worker_events.push(e),
            )
            .unwrap();
        for event in worker_events {
            view.apply(event);
        }
        data
    }

    #[test]
    fn test_view_tracks_model_through_events() {
        let mut view = ViewState::default();
        let data = load(&mut view);

        assert_eq!(view.command_rows(), data.command_count());
        assert_eq!(view.record_rows(), data.record_count());
        assert_eq!(view.take_dirty(), vec![0, 1]);
        assert!(view.take_dirty().is_empty());
        assert_eq!(view.diagnostics().len(), 1);
        assert_eq!(view.diagnostics()[0].text, "garbage");
    }

    #[test]
    fn test_render_commands() {
        let data = load(&mut ViewState::default());
        let table = render_commands(&data);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Date"));
        assert!(lines[1].contains("1198"));
        assert!(lines[1].contains("1.14.36"));
        assert!(lines[1].ends_with("zypper ref"));
        assert!(lines[2].contains("2000"));
        assert!(lines[2].ends_with('-'));
    }

    #[test]
    fn test_render_records_pads_columns() {
        let data = load(&mut ViewState::default());
        let widths = FieldWidths {
            group: 10,
            file: 40,
            thread: 13,
        };
        let text = render_records(data.command_records(1).unwrap(), &widths);
        let expected_file = format!("{:<30}", "Repo.cc:12");

        assert!(text.starts_with("10:59:00 <2> [zypp]     "));
        assert!(text.contains(&expected_file));
        assert!(text.ends_with("refreshing\n"));
    }
}
