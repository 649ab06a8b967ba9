use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::ParseIntError;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::events::{Event, EventSink};
use crate::interner::{Field, FieldCache};
use crate::tokenizer::{tokenize, LineMatch};
use crate::types::{Diagnostic, FieldWidths, LogRecord, ParseError, SEPARATOR_LEVEL};

/// Records are delivered once more than this many are pending.
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    pub batch_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Outcome of a completed parse run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub widths: FieldWidths,
    pub records: usize,
    pub sources: usize,
}

/// Turns physical lines into finalized [`LogRecord`]s.
///
/// Lines that match the grammar open a new record; lines that don't are
/// appended to the open record's text. Finalized records collect in a
/// pending batch which is handed to `on_batch` once it grows past the batch
/// size, and unconditionally by [`RecordAssembler::finish`].
#[derive(Debug)]
pub struct RecordAssembler {
    cache: FieldCache,
    open: Option<LogRecord>,
    pending: Vec<LogRecord>,
    batch_size: usize,
    finalized: usize,
}

impl RecordAssembler {
    pub fn new() -> Self {
        Self::with_batch_size(DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            cache: FieldCache::new(),
            open: None,
            pending: Vec::new(),
            batch_size,
            finalized: 0,
        }
    }

    pub fn has_open_record(&self) -> bool {
        self.open.is_some()
    }

    /// Number of records finalized so far, delivered or not.
    pub fn finalized(&self) -> usize {
        self.finalized
    }

    /// Feeds one line (without its trailing newline).
    ///
    /// `source` and `line_no` only label diagnostics and errors.
    pub fn push_line<F, S>(
        &mut self,
        source: &str,
        line_no: usize,
        line: &str,
        on_batch: &mut F,
        events: &mut S,
    ) -> Result<(), ParseError>
    where
        F: FnMut(Vec<LogRecord>),
        S: EventSink + ?Sized,
    {
        if let Some(m) = tokenize(line) {
            let record = self.build_record(&m, source, line_no)?;
            self.finalize_open(on_batch);
            self.open = Some(record);
        } else if let Some(open) = self.open.as_mut() {
            open.push_continuation(line);
        } else {
            let diagnostic = Diagnostic {
                source: source.to_string(),
                line: line_no,
                text: line.to_string(),
            };
            warn!("{}", diagnostic);
            events.emit(Event::Diagnostic(diagnostic));
        }
        Ok(())
    }

    /// Finalizes the open record, delivers whatever is pending and returns
    /// the run's column widths.
    pub fn finish<F>(mut self, on_batch: &mut F) -> FieldWidths
    where
        F: FnMut(Vec<LogRecord>),
    {
        self.finalize_open(on_batch);
        if !self.pending.is_empty() {
            debug!("Delivering final batch of {} records", self.pending.len());
            on_batch(std::mem::take(&mut self.pending));
        }
        self.cache.field_widths()
    }

    fn finalize_open<F>(&mut self, on_batch: &mut F)
    where
        F: FnMut(Vec<LogRecord>),
    {
        let Some(record) = self.open.take() else {
            return;
        };
        self.pending.push(record);
        self.finalized += 1;

        if self.pending.len() > self.batch_size {
            debug!("Delivering batch of {} records", self.pending.len());
            on_batch(std::mem::take(&mut self.pending));
        }
    }

    fn build_record(
        &mut self,
        m: &LineMatch<'_>,
        source: &str,
        line_no: usize,
    ) -> Result<LogRecord, ParseError> {
        let level: u8 = self.numeric(Field::Level, m.level, source, line_no)?;
        let pid = self.numeric(Field::Pid, m.pid, source, line_no)?;
        let line_number = self.numeric(Field::Line, m.line, source, line_no)?;

        let cache = &mut self.cache;
        Ok(LogRecord {
            date: cache.intern_previous(Field::Date, m.date),
            time: cache.intern_previous(Field::Time, m.time),
            level: if m.separator { SEPARATOR_LEVEL } else { level },
            host: cache.intern_previous(Field::Host, m.host),
            pid,
            group: non_empty(m.group).map(|g| cache.intern_all(Field::Group, g)),
            file: non_empty(m.file).map(|f| cache.intern_all(Field::File, f)),
            function: m
                .function
                .and_then(non_empty)
                .map(|f| cache.intern_all(Field::Function, f)),
            line_number,
            thread: m.thread.map(|t| cache.intern_all(Field::Thread, t)),
            text: m.text.to_string(),
            text_line_count: 1,
            level_field: cache.intern_all(Field::LevelField, m.level_field),
            host_field: cache.intern_previous(Field::HostField, m.host_field),
            group_field: cache.intern_all(Field::GroupField, m.group_field),
            file_field: cache.intern_all(Field::FileField, m.file_field),
            thread_field: m
                .thread_field
                .map(|t| cache.intern_all(Field::ThreadField, t)),
        })
    }

    fn numeric<T>(&self, field: Field, raw: &str, source: &str, line_no: usize) -> Result<T, ParseError>
    where
        T: FromStr<Err = ParseIntError>,
    {
        // The grammar bounds these to digits that fit, so a failure means the
        // grammar and the record types disagree.
        self.cache
            .intern_numeric(field, raw)
            .map_err(|cause| ParseError::Grammar {
                path: source.to_string(),
                line: line_no,
                field,
                value: raw.to_string(),
                cause,
            })
    }
}

impl Default for RecordAssembler {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

/// Background side of a run: reads sources in order and feeds an assembler.
#[derive(Debug, Clone, Default)]
pub struct LogParser {
    options: ParserOptions,
}

impl LogParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parses the files in the order given.
    ///
    /// A record still open at the end of one file continues into the next.
    /// On failure everything parsed so far is delivered before the error is
    /// returned, and no further files are read.
    pub fn parse_files<P, F, S>(
        &self,
        paths: &[P],
        mut on_batch: F,
        events: &mut S,
    ) -> Result<RunSummary, ParseError>
    where
        P: AsRef<Path>,
        F: FnMut(Vec<LogRecord>),
        S: EventSink + ?Sized,
    {
        let mut assembler = RecordAssembler::with_batch_size(self.options.batch_size);

        for path in paths {
            let path = path.as_ref();
            let name = path.display().to_string();
            info!("Parsing log file: {}", name);

            let result = match File::open(path) {
                Ok(file) => feed(&mut assembler, &name, BufReader::new(file), &mut on_batch, events),
                Err(cause) => Err(ParseError::Source {
                    path: name.clone(),
                    line: 0,
                    cause,
                }),
            };

            if let Err(e) = result {
                return Err(abort(assembler, e, &mut on_batch));
            }
        }

        let summary = complete(assembler, paths.len(), &mut on_batch);
        info!("Parsed {} records from {} files", summary.records, summary.sources);
        Ok(summary)
    }

    /// Parses a single already opened source named `name`.
    pub fn parse_reader<R, F, S>(
        &self,
        name: &str,
        reader: R,
        mut on_batch: F,
        events: &mut S,
    ) -> Result<RunSummary, ParseError>
    where
        R: BufRead,
        F: FnMut(Vec<LogRecord>),
        S: EventSink + ?Sized,
    {
        let mut assembler = RecordAssembler::with_batch_size(self.options.batch_size);

        if let Err(e) = feed(&mut assembler, name, reader, &mut on_batch, events) {
            return Err(abort(assembler, e, &mut on_batch));
        }

        let summary = complete(assembler, 1, &mut on_batch);
        debug!("Parsed {} records from {}", summary.records, name);
        Ok(summary)
    }
}

/// Delivers everything still held by `assembler` and summarizes the run.
fn complete<F>(assembler: RecordAssembler, sources: usize, on_batch: &mut F) -> RunSummary
where
    F: FnMut(Vec<LogRecord>),
{
    let records = assembler.finalized() + usize::from(assembler.has_open_record());
    let widths = assembler.finish(on_batch);
    RunSummary {
        widths,
        records,
        sources,
    }
}

/// Delivers what was parsed before `error` so it stands, then hands the error back.
fn abort<F>(assembler: RecordAssembler, error: ParseError, on_batch: &mut F) -> ParseError
where
    F: FnMut(Vec<LogRecord>),
{
    warn!("Aborting run: {}", error);
    assembler.finish(on_batch);
    error
}

/// Reads `reader` line by line into `assembler`. Returns the number of lines read.
fn feed<R, F, S>(
    assembler: &mut RecordAssembler,
    name: &str,
    mut reader: R,
    on_batch: &mut F,
    events: &mut S,
) -> Result<usize, ParseError>
where
    R: BufRead,
    F: FnMut(Vec<LogRecord>),
    S: EventSink + ?Sized,
{
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|cause| ParseError::Source {
                path: name.to_string(),
                line: line_no,
                cause,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        let line = String::from_utf8_lossy(&buf);
        assembler.push_line(name, line_no, &line, on_batch, events)?;
    }

    debug!("Read {} lines from {}", line_no, name);
    Ok(line_no)
}
