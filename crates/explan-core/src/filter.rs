//! Per-record predicate applied after the importance gate.

use crate::record::Record;

/// Decides whether a record is forwarded to handlers.
///
/// Applied to every emitted record, leaves and block open/close alike,
/// after the importance threshold. Expected to be a pure function of the
/// record; the engine may call it any number of times.
pub trait Filter: Send + Sync {
    /// `true` to forward the record, `false` to drop it.
    fn accept(&self, record: &Record) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Record) -> bool + Send + Sync,
{
    fn accept(&self, record: &Record) -> bool {
        self(record)
    }
}
