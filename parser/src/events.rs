use crate::types::Diagnostic;

/// Notifications produced while a run is ingested.
///
/// Insertion ranges are inclusive and refer to positions in the sequence
/// after the insertion. A `Begin*` event is always followed by its `End*`
/// counterpart before any other structural change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BeginInsertCommands { first: usize, last: usize },
    EndInsertCommands,
    /// Derived properties of the command at `index` changed.
    CommandChanged { index: usize },
    BeginInsertRecords { first: usize, last: usize },
    EndInsertRecords,
    Diagnostic(Diagnostic),
}

/// Receiver of [`Event`]s.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl<F> EventSink for F
where
    F: FnMut(Event),
{
    fn emit(&mut self, event: Event) {
        self(event)
    }
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreEvents;

impl EventSink for IgnoreEvents {
    fn emit(&mut self, _event: Event) {}
}
