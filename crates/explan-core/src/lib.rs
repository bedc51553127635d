//! explan-core — hierarchical, filterable explanation logging.
//!
//! Instrumented code narrates its own execution as nested **blocks** of
//! weighted statements; one or more [`Handler`]s render the surviving
//! records as text. The building blocks:
//!
//! - [`Value`]: a renderable item, either eager text or a lazily forced thunk.
//! - [`Record`]: one emitted event (objects, depth, effective importance,
//!   timestamp, block duration).
//! - [`Handler`]: a sink that renders records (string buffer, file, NDJSON).
//! - [`Filter`]: a per-record predicate applied after the importance gate.
//! - [`Logger`]: the engine: block stack, gating, dispatch, and the
//!   scoped [`Logger::block`] combinator.
//! - [`thread`]: a per-thread logger slot with pass-through operations for
//!   call sites that cannot thread a logger through explicitly.
//!
//! ```
//! use explan_core::{objects, Logger, StringHandler};
//!
//! let handler = StringHandler::new();
//! let view = handler.buffer();
//!
//! let mut logger = Logger::new();
//! logger.set_active(true);
//! logger.add_handler(handler);
//!
//! logger.start(objects!["Starting block ", 1])?;
//! logger.explain(objects!["I'm explanation 1.1"])?;
//! logger.end(objects!["End of block ", 1])?;
//!
//! assert_eq!(
//!     view.contents(),
//!     "* Starting block 1\n\
//!      ** I'm explanation 1.1\n\
//!      * End of block 1\n"
//! );
//! # Ok::<(), explan_core::Error>(())
//! ```
//!
//! Loggers are inactive unless the process-wide default ([`config`]) or the
//! instance itself says otherwise; an inactive logger never forces lazy
//! arguments. One logger instance belongs to one thread of control; the
//! [`thread`] registry exists precisely so that no locking is needed.

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
// Small, explicit allowlist to keep docs readable and APIs ergonomic.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Process-wide activation default, read at logger construction.
pub mod config;
/// Crate error type: unbalanced blocks and sink I/O failures.
pub mod error;
/// Per-record predicate applied after the importance gate.
pub mod filter;
/// Sink contract and the writer-backed handler family.
pub mod handler;
/// NDJSON sink: one JSON object per surviving record.
pub mod jsonl;
/// The engine: block stack, gating, dispatch, block combinator.
pub mod logger;
/// Immutable emitted-event value.
pub mod record;
/// Per-thread logger slot with pass-through operations.
pub mod thread;
/// Renderable items: eager text, lazy thunks, the `RESULT` placeholder.
pub mod value;

// ---- Re-exports for the common surface ----
pub use error::{Error, Result};
pub use filter::Filter;
pub use handler::{FileHandler, Handler, StringBuffer, StringHandler, WriterHandler};
pub use jsonl::JsonlHandler;
pub use logger::{Logger, DEFAULT_IMPORTANCE};
pub use record::Record;
pub use value::{lazy, Value, RESULT};

/// Commonly-used items for quick imports.
///
/// ```rust
/// use explan_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::handler::{FileHandler, Handler, StringHandler, WriterHandler};
    pub use crate::logger::Logger;
    pub use crate::value::{lazy, Value, RESULT};
    pub use crate::{objects, Error, Result};
}
