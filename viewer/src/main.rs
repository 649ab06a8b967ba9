mod args;
mod error;
mod export;
mod models;
mod table;
mod worker;

use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zlog_parser::{Event, FieldWidths, LogData};

use crate::args::Args;
use crate::error::ViewerError;
use crate::models::RunReport;
use crate::table::ViewState;
use crate::worker::{spawn_parser, WorkerMessage};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zlog_viewer=info,zlog_parser=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ViewerError> {
    let stdout = std::io::stdout();
    run_with(args, &mut stdout.lock()).await
}

/// Parses, then writes the requested output to `out`.
///
/// A failed parse still renders whatever was delivered before the failure,
/// and the failure is returned afterwards.
async fn run_with<W: Write>(args: Args, out: &mut W) -> Result<(), ViewerError> {
    let paths = args.resolve_paths(Path::new("."));
    let source_count = paths.len();
    tracing::info!("Starting parse of {:?}", paths);
    let started = Instant::now();

    let (mut rx, handle) = spawn_parser(paths, args.parser_options());

    let mut data = LogData::new();
    let mut view = ViewState::default();
    while let Some(msg) = rx.recv().await {
        match msg {
            WorkerMessage::Batch(batch) => {
                data.add_records(batch, &mut |e: Event| view.apply(e));
                let dirty = view.take_dirty();
                if !dirty.is_empty() {
                    tracing::debug!("Commands updated: {:?}", dirty);
                }
            }
            WorkerMessage::Event(event) => view.apply(event),
        }
    }

    let outcome = handle
        .await
        .map_err(|e| ViewerError::Worker(e.to_string()))?;

    tracing::info!(
        "done parsing {} commands ({} records, {} skipped lines) in {:.2?}",
        view.command_rows(),
        view.record_rows(),
        view.diagnostics().len(),
        started.elapsed()
    );

    // Widths are only known for a completed run.
    let (sources, widths) = match &outcome {
        Ok(summary) => (summary.sources, summary.widths),
        Err(_) => (source_count, FieldWidths::default()),
    };

    if let Some(path) = &args.csv {
        export::export_records_csv(&data, path)?;
    }

    if args.json {
        let report = RunReport::new(&data, sources, widths, view.into_diagnostics());
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        match args.pid {
            Some(pid) => {
                let index = data.command_index(pid).ok_or(ViewerError::UnknownPid(pid))?;
                let records = data.command_records(index).unwrap_or_default();
                write!(out, "{}", table::render_records(records, &widths))?;
            }
            None => write!(out, "{}", table::render_commands(&data))?,
        }
    }

    outcome?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use zlog_parser::ParseError;

    #[tokio::test]
    async fn test_failed_run_still_renders_delivered_commands() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("z.log");
        std::fs::write(
            &good,
            "2020-04-14 10:58:37 <1> hobbes(1198) [zypper] main.cc(main):98 ===== 'zypper' 'ref' =====\n",
        )
        .unwrap();
        let missing = dir.path().join("gone.log");

        let args = Args::parse_from([OsStr::new("zlog-viewer"), good.as_os_str(), missing.as_os_str()]);
        let mut out = Vec::new();
        let err = run_with(args, &mut out).await.unwrap_err();

        assert!(matches!(err, ViewerError::Parse(ParseError::Source { line: 0, .. })));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1198"));
        assert!(text.contains("zypper ref"));
    }
}
