//! Immutable value describing one emitted event.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::value::Value;

/// One emitted explanation event.
///
/// Records are built exclusively by the engine; handlers and filters only
/// read them. `importance` is the *effective* importance after the
/// default/inheritance rules, i.e. the value the gate actually used.
#[derive(Clone, Debug)]
pub struct Record {
    objects: Vec<Value>,
    nesting_depth: usize,
    importance: f64,
    timestamp: Option<DateTime<Utc>>,
    block_time: Option<Duration>,
}

impl Record {
    pub(crate) fn new(
        objects: Vec<Value>,
        nesting_depth: usize,
        importance: f64,
        timestamp: Option<DateTime<Utc>>,
        block_time: Option<Duration>,
    ) -> Self {
        Self { objects, nesting_depth, importance, timestamp, block_time }
    }

    /// Ordered sequence of renderable items.
    #[must_use]
    pub fn objects(&self) -> &[Value] {
        &self.objects
    }

    /// Depth of the block stack at emission time (0 = top level).
    #[must_use]
    pub fn nesting_depth(&self) -> usize {
        self.nesting_depth
    }

    /// Effective importance used for gating.
    #[must_use]
    pub fn importance(&self) -> f64 {
        self.importance
    }

    /// Emission wall-clock time, if captured.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Duration of the just-closed block; only set on block-close records.
    #[must_use]
    pub fn block_time(&self) -> Option<Duration> {
        self.block_time
    }

    /// Force every object and concatenate with no separator.
    #[must_use]
    pub fn text(&self) -> String {
        self.objects.iter().map(Value::force).collect()
    }
}
