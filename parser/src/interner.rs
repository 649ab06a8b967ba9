use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use crate::types::FieldWidths;

/// Every field the assembler reads from a matched line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Time,
    LevelField,
    Level,
    HostField,
    Host,
    Pid,
    GroupField,
    Group,
    FileField,
    File,
    Function,
    Line,
    ThreadField,
    Thread,
}

impl Field {
    pub const COUNT: usize = 15;

    fn slot(self) -> usize {
        self as usize
    }
}

/// Per-run interning caches.
///
/// Each [`Field`] owns one "all values" set and one "previous value" slot.
/// A cache belongs to a single parse run and is not meant to be shared
/// between concurrent tokenization streams.
#[derive(Debug)]
pub struct FieldCache {
    all: [HashSet<Arc<str>>; Field::COUNT],
    previous: [Option<Arc<str>>; Field::COUNT],
}

impl FieldCache {
    pub fn new() -> Self {
        Self {
            all: std::array::from_fn(|_| HashSet::new()),
            previous: std::array::from_fn(|_| None),
        }
    }

    /// Returns the stored instance for `raw`, storing it on first sight.
    pub fn intern_all(&mut self, field: Field, raw: &str) -> Arc<str> {
        let values = &mut self.all[field.slot()];
        if let Some(value) = values.get(raw) {
            return Arc::clone(value);
        }
        let value: Arc<str> = Arc::from(raw);
        values.insert(Arc::clone(&value));
        value
    }

    /// Parses a numeric field. Values are not canonicalized.
    pub fn intern_numeric<T>(&self, _field: Field, raw: &str) -> Result<T, T::Err>
    where
        T: FromStr,
    {
        raw.parse()
    }

    /// Reuses the last value handed out for `field` when `raw` is unchanged.
    pub fn intern_previous(&mut self, field: Field, raw: &str) -> Arc<str> {
        let slot = &mut self.previous[field.slot()];
        if let Some(prev) = slot {
            if &**prev == raw {
                return Arc::clone(prev);
            }
        }
        let value: Arc<str> = Arc::from(raw);
        *slot = Some(Arc::clone(&value));
        value
    }

    /// Distinct values seen so far for `field` by [`FieldCache::intern_all`].
    pub fn distinct(&self, field: Field) -> impl Iterator<Item = &str> {
        self.all[field.slot()].iter().map(|v| v.as_ref())
    }

    pub fn widest(&self, field: Field) -> usize {
        self.distinct(field)
            .map(|v| v.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Column widths for the rendered group, file-position and thread fields.
    pub fn field_widths(&self) -> FieldWidths {
        FieldWidths {
            group: self.widest(Field::GroupField),
            file: self.widest(Field::FileField),
            thread: self.widest(Field::ThreadField),
        }
    }
}

impl Default for FieldCache {
    fn default() -> Self {
        Self::new()
    }
}
