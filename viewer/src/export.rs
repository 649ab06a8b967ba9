use std::io::Write;
use std::path::Path;
use tracing::info;
use zlog_parser::LogData;

use crate::error::ViewerError;
use crate::models::RecordRow;

/// Writes every record, in model order, as CSV with a header row.
pub fn write_records_csv<W: Write>(data: &LogData, writer: W) -> Result<usize, ViewerError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in data.records() {
        csv_writer.serialize(RecordRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(data.record_count())
}

pub fn export_records_csv(data: &LogData, path: &Path) -> Result<(), ViewerError> {
    let file = std::fs::File::create(path)?;
    let written = write_records_csv(data, std::io::BufWriter::new(file))?;
    info!("Exported {} records to {}", written, path.display());
    Ok(())
}
