//! The engine: block stack, importance gating, dispatch, block combinator.
//!
//! One [`Logger`] instance belongs to one thread of control. It owns its
//! block stack outright and is **not** safe for concurrent mutation; the
//! [`crate::thread`] registry gives each thread its own instance instead of
//! locking.
//!
//! ## Gating
//!
//! Every record (leaf, block open, block close) passes through the same
//! gate: it must not sit inside a suppressed block, its *effective*
//! importance must reach the threshold, and the filter (if any) must accept
//! it. Effective importance multiplies the explicit weight (default 1.0)
//! into the enclosing block's effective importance, so an unweighted record
//! inherits its parent's weight verbatim and suppression propagates
//! downward until the matching close.

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

use chrono::Utc;
use std::any::type_name;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Instant;

use crate::config;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::handler::{FileHandler, Handler};
use crate::record::Record;
use crate::value::Value;

/// Importance assigned when the caller gives none and no block encloses the
/// record.
pub const DEFAULT_IMPORTANCE: f64 = 1.0;

/// Ephemeral bookkeeping for one open block.
struct BlockEntry {
    /// Effective importance declared at open; inherited by descendants.
    effective_importance: f64,
    started_at: Instant,
    /// Whether the open record survived gating. Children of a suppressed
    /// block only stay suppressed, they never resurrect the parent.
    passed: bool,
}

/// Hierarchical explanation logger.
pub struct Logger {
    handlers: Vec<Box<dyn Handler>>,
    stack: Vec<BlockEntry>,
    threshold: f64,
    filter: Option<Box<dyn Filter>>,
    active: bool,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Fresh logger with no handlers, an always-pass threshold, and the
    /// `active` state seeded from [`config::active_by_default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            stack: Vec::new(),
            threshold: 0.0,
            filter: None,
            active: config::active_by_default(),
        }
    }

    /// Logger whose output goes to `path` through a lazily-opened
    /// [`FileHandler`]; remember to [`Logger::close`] it.
    #[must_use]
    pub fn to_file<P: Into<PathBuf>>(path: P) -> Self {
        let mut logger = Self::new();
        logger.add_handler(FileHandler::create(path));
        logger
    }

    /// Register a sink. The engine does not deduplicate handlers.
    pub fn add_handler<H: Handler + 'static>(&mut self, handler: H) {
        self.handlers.push(Box::new(handler));
    }

    /// Drop records whose effective importance is below `threshold`.
    /// Takes effect for subsequent emissions only.
    pub fn set_importance_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    /// Current importance threshold.
    #[must_use]
    pub fn importance_threshold(&self) -> f64 {
        self.threshold
    }

    /// Install a record predicate, replacing any previous one.
    /// Takes effect for subsequent emissions only.
    pub fn set_filter<F: Filter + 'static>(&mut self, filter: F) {
        self.filter = Some(Box::new(filter));
    }

    /// Remove the record predicate.
    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    /// Whole-logger switch. When inactive, every operation is a no-op
    /// beyond this flag check and lazy arguments are never forced.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether this logger emits at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current depth of the block stack.
    #[must_use]
    pub fn nesting_depth(&self) -> usize {
        self.stack.len()
    }

    /// Close every handler, releasing their sinks. Idempotent per handler.
    pub fn close(&mut self) -> Result<()> {
        for handler in &mut self.handlers {
            handler.close()?;
        }
        Ok(())
    }

    /* ------------------------------ leaves ------------------------------ */

    /// Emit a leaf record at the current depth, inheriting the enclosing
    /// block's effective importance.
    pub fn explain<I>(&mut self, objects: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        self.leaf(None, objects)
    }

    /// Emit a leaf record with an explicit importance weight.
    pub fn explain_at<I>(&mut self, importance: f64, objects: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        self.leaf(Some(importance), objects)
    }

    fn leaf<I>(&mut self, importance: Option<f64>, objects: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        if !self.active {
            return Ok(());
        }
        let effective = self.effective_importance(importance);
        let record = Record::new(
            objects.into_iter().collect(),
            self.stack.len(),
            effective,
            Some(Utc::now()),
            None,
        );
        if self.passes(&record, effective, self.in_live_block()) {
            self.dispatch(&record)?;
        }
        Ok(())
    }

    /* ------------------------------ blocks ------------------------------ */

    /// Open a block: emit the open record at the pre-increment depth, then
    /// deepen the stack.
    pub fn start<I>(&mut self, objects: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        self.open(None, objects)
    }

    /// Open a block with an explicit importance weight.
    pub fn start_at<I>(&mut self, importance: f64, objects: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        self.open(Some(importance), objects)
    }

    fn open<I>(&mut self, importance: Option<f64>, objects: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        if !self.active {
            return Ok(());
        }
        let effective = self.effective_importance(importance);
        let record = Record::new(
            objects.into_iter().collect(),
            self.stack.len(),
            effective,
            Some(Utc::now()),
            None,
        );
        let passed = self.passes(&record, effective, self.in_live_block());
        if passed {
            self.dispatch(&record)?;
        }
        self.stack.push(BlockEntry {
            effective_importance: effective,
            started_at: Instant::now(),
            passed,
        });
        Ok(())
    }

    /// Close the innermost block: emit the close record at the post-pop
    /// depth, carrying the block duration and gated with the popped entry's
    /// effective importance.
    ///
    /// # Errors
    /// [`Error::ImbalancedBlock`] when no block is open: a caller-contract
    /// violation, never silently ignored.
    pub fn end<I>(&mut self, objects: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        if !self.active {
            return Ok(());
        }
        let entry = self.stack.pop().ok_or(Error::ImbalancedBlock)?;
        let block_time = entry.started_at.elapsed();
        let record = Record::new(
            objects.into_iter().collect(),
            self.stack.len(),
            entry.effective_importance,
            Some(Utc::now()),
            Some(block_time),
        );
        if self.passes(&record, entry.effective_importance, entry.passed) {
            self.dispatch(&record)?;
        }
        Ok(())
    }

    /// Annotated abort used when a block body fails: pop the entry and emit
    /// `message` at the post-pop depth, gated like a close record.
    pub(crate) fn abort_block(&mut self, message: String) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        let entry = self.stack.pop().ok_or(Error::ImbalancedBlock)?;
        let record = Record::new(
            vec![Value::Text(message)],
            self.stack.len(),
            entry.effective_importance,
            Some(Utc::now()),
            None,
        );
        if self.passes(&record, entry.effective_importance, entry.passed) {
            self.dispatch(&record)?;
        }
        Ok(())
    }

    /* ---------------------------- combinator ---------------------------- */

    /// Run `body` inside a block: `start(open)`, the body, then `end` with
    /// every [`crate::RESULT`] placeholder in `close` replaced by the body's
    /// return value rendered as text.
    ///
    /// When `body` fails, the caller-supplied close objects are **not**
    /// emitted; instead one `Throwable thrown: <type>: <message>` line is
    /// rendered at this block's depth, the stack entry is popped, and the
    /// original error is returned unchanged. Nested combinators therefore
    /// each add exactly one line as the error unwinds, innermost first.
    pub fn block<R, E, F>(
        &mut self,
        open: Vec<Value>,
        body: F,
        close: Vec<Value>,
    ) -> std::result::Result<R, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<R, E>,
        R: Display,
        E: From<Error> + Display,
    {
        self.block_impl(None, open, body, close)
    }

    /// [`Logger::block`] with an explicit importance weight on the open.
    pub fn block_at<R, E, F>(
        &mut self,
        importance: f64,
        open: Vec<Value>,
        body: F,
        close: Vec<Value>,
    ) -> std::result::Result<R, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<R, E>,
        R: Display,
        E: From<Error> + Display,
    {
        self.block_impl(Some(importance), open, body, close)
    }

    fn block_impl<R, E, F>(
        &mut self,
        importance: Option<f64>,
        open: Vec<Value>,
        body: F,
        close: Vec<Value>,
    ) -> std::result::Result<R, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<R, E>,
        R: Display,
        E: From<Error> + Display,
    {
        if !self.active {
            return body(self);
        }
        self.open(importance, open).map_err(E::from)?;
        match body(self) {
            Ok(result) => {
                self.end(substitute_result(close, &result)).map_err(E::from)?;
                Ok(result)
            }
            Err(error) => {
                self.abort_block(throwable_line::<E>(&error)).map_err(E::from)?;
                Err(error)
            }
        }
    }

    /* ------------------------------ gating ------------------------------ */

    fn in_live_block(&self) -> bool {
        self.stack.last().map_or(true, |entry| entry.passed)
    }

    fn effective_importance(&self, explicit: Option<f64>) -> f64 {
        let inherited = self
            .stack
            .last()
            .map_or(DEFAULT_IMPORTANCE, |entry| entry.effective_importance);
        explicit.map_or(inherited, |importance| importance * inherited)
    }

    fn passes(&self, record: &Record, effective: f64, in_live_block: bool) -> bool {
        in_live_block
            && effective >= self.threshold
            && self.filter.as_ref().map_or(true, |f| f.accept(record))
    }

    fn dispatch(&mut self, record: &Record) -> Result<()> {
        // Fail-fast: the first handler error aborts this emission.
        for handler in &mut self.handlers {
            handler.handle(record)?;
        }
        Ok(())
    }
}

/// Replace every `RESULT` placeholder with the rendered body result.
pub(crate) fn substitute_result<R: Display>(objects: Vec<Value>, result: &R) -> Vec<Value> {
    objects
        .into_iter()
        .map(|value| {
            if value.is_result() {
                Value::Text(result.to_string())
            } else {
                value
            }
        })
        .collect()
}

/// Annotation line for a failed block body.
pub(crate) fn throwable_line<E: Display>(error: &E) -> String {
    format!("Throwable thrown: {}: {}", type_name::<E>(), error)
}
