use std::path::PathBuf;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::debug;
use zlog_parser::{Event, LogParser, LogRecord, ParseError, ParserOptions, RunSummary};

/// What the parse worker hands over to the consumer.
#[derive(Debug)]
pub enum WorkerMessage {
    Batch(Vec<LogRecord>),
    Event(Event),
}

/// Runs a parse of `paths` on the blocking pool.
///
/// Messages arrive in production order. If the receiver is dropped the
/// worker keeps going and its sends are discarded.
pub fn spawn_parser(
    paths: Vec<PathBuf>,
    options: ParserOptions,
) -> (
    UnboundedReceiver<WorkerMessage>,
    JoinHandle<Result<RunSummary, ParseError>>,
) {
    let (tx, rx) = unbounded_channel();

    let handle = tokio::task::spawn_blocking(move || {
        let parser = LogParser::new(options);
        parser.parse_files(
            paths.as_slice(),
            |batch| {
                debug!("Worker sending batch of {} records", batch.len());
                let _ = tx.send(WorkerMessage::Batch(batch));
            },
            &mut |event: Event| {
                let _ = tx.send(WorkerMessage::Event(event));
            },
        )
    });

    (rx, handle)
}
