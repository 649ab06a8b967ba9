use std::collections::HashMap;
use tracing::debug;

use crate::banner::{match_command, match_version, BANNER_FILE};
use crate::events::{Event, EventSink};
use crate::types::{Command, LogRecord, BANNER_LEVEL, SEPARATOR_LEVEL};

/// In-memory model of everything ingested so far.
///
/// Records are kept grouped by command: each command owns one contiguous
/// block of the record sequence, and blocks appear in command order.
/// Within a block records keep their arrival order.
#[derive(Debug, Default)]
pub struct LogData {
    commands: Vec<Command>,
    by_pid: HashMap<u32, usize>,
    records: Vec<LogRecord>,
}

impl LogData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn command(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    pub fn command_index(&self, pid: u32) -> Option<usize> {
        self.by_pid.get(&pid).copied()
    }

    /// Commands for which `predicate(index, command)` holds, with their index.
    pub fn commands_matching<'a, F>(&'a self, mut predicate: F) -> impl Iterator<Item = (usize, &'a Command)> + 'a
    where
        F: FnMut(usize, &Command) -> bool + 'a,
    {
        self.commands
            .iter()
            .enumerate()
            .filter(move |(i, c)| predicate(*i, *c))
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&LogRecord> {
        self.records.get(index)
    }

    /// Records for which `predicate(index, record)` holds, with their index.
    pub fn records_matching<'a, F>(&'a self, mut predicate: F) -> impl Iterator<Item = (usize, &'a LogRecord)> + 'a
    where
        F: FnMut(usize, &LogRecord) -> bool + 'a,
    {
        self.records
            .iter()
            .enumerate()
            .filter(move |(i, r)| predicate(*i, *r))
    }

    /// `(index, text_line_count)` of every multi-line record in `first..=last`.
    pub fn multiline_records(&self, first: usize, last: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let end = last.saturating_add(1).min(self.records.len());
        let start = first.min(end);
        self.records[start..end]
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_multiline())
            .map(move |(i, r)| (start + i, r.text_line_count))
    }

    /// The contiguous block of records belonging to the command at `index`.
    pub fn command_records(&self, index: usize) -> Option<&[LogRecord]> {
        let command = self.commands.get(index)?;
        let end = self.block_end(index);
        Some(&self.records[end - command.line_count..end])
    }

    /// Ingests one delivered batch.
    ///
    /// Records are bucketed by pid (buckets in order of first appearance in
    /// the batch) and each bucket is appended to its command's block.
    pub fn add_records<S>(&mut self, batch: Vec<LogRecord>, events: &mut S)
    where
        S: EventSink + ?Sized,
    {
        let mut buckets: Vec<(u32, Vec<LogRecord>)> = Vec::new();
        for record in batch {
            let pid = record.pid;
            match buckets.iter_mut().rev().find(|(p, _)| *p == pid) {
                Some((_, bucket)) => bucket.push(record),
                None => buckets.push((pid, vec![record])),
            }
        }

        for (pid, mut bucket) in buckets {
            let index = self.ensure_command(pid, events);
            let first = self.block_end(index);
            let last = first + bucket.len() - 1;

            let command = &mut self.commands[index];
            let changed = command.see_records(&mut bucket);
            command.line_count += bucket.len();

            events.emit(Event::BeginInsertRecords { first, last });
            self.records.splice(first..first, bucket);
            events.emit(Event::EndInsertRecords);

            if changed {
                debug!("Properties of command {} (pid {}) changed", index, pid);
                events.emit(Event::CommandChanged { index });
            }
        }
    }

    fn ensure_command<S>(&mut self, pid: u32, events: &mut S) -> usize
    where
        S: EventSink + ?Sized,
    {
        if let Some(index) = self.command_index(pid) {
            return index;
        }

        let index = self.commands.len();
        debug!("New command {} for pid {}", index, pid);
        events.emit(Event::BeginInsertCommands { first: index, last: index });
        self.commands.push(Command::new(pid));
        self.by_pid.insert(pid, index);
        events.emit(Event::EndInsertCommands);
        index
    }

    /// One past the last record of the command at `index`.
    fn block_end(&self, index: usize) -> usize {
        self.commands[..=index].iter().map(|c| c.line_count).sum()
    }
}

impl Command {
    /// Picks up start time and banners from newly attributed records.
    ///
    /// Returns true when fewer properties are missing than before.
    pub(crate) fn see_records(&mut self, records: &mut [LogRecord]) -> bool {
        if self.scan_done || records.is_empty() {
            return false;
        }
        let before = self.missing();

        if self.date.is_none() {
            self.date = Some(records[0].date.clone());
            self.time = Some(records[0].time.clone());
        }

        for record in records
            .iter_mut()
            .filter(|r| r.file.as_deref() == Some(BANNER_FILE))
        {
            if let Some(version) = match_version(&record.text) {
                self.version = Some(version.to_string());
                mark_banner(record);
            }
            if let Some(name) = match_command(&record.text) {
                self.command_name = Some(name);
                mark_banner(record);
            }
        }

        let after = self.missing();
        if after == 0 {
            self.scan_done = true;
        }
        after < before
    }
}

// Separator records keep their level.
fn mark_banner(record: &mut LogRecord) {
    if record.level != SEPARATOR_LEVEL {
        record.level = BANNER_LEVEL;
    }
}
