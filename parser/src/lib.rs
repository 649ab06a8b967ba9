// Ingestion engine for libzypp-style structured log files
// Lines -> tokenizer -> interner -> assembler (batches) -> LogData (commands)

pub mod types;
pub mod tokenizer;
pub mod interner;
pub mod assembler;
pub mod banner;
pub mod events;
pub mod model;

// Re-export main types
pub use types::*;
pub use tokenizer::{tokenize, LineMatch};
pub use interner::{Field, FieldCache};
pub use assembler::{LogParser, ParserOptions, RecordAssembler, RunSummary, DEFAULT_BATCH_SIZE};
pub use events::{Event, EventSink, IgnoreEvents};
pub use model::LogData;
