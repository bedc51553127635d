//! Per-thread logger slot with pass-through operations.
//!
//! Call sites that cannot thread a [`Logger`] through explicitly install one
//! here and use the free functions; each thread of control sees only its own
//! instance, so no locking is involved. Every pass-through is a no-op when
//! the calling thread has no logger installed (block bodies still run and
//! their values are still returned).

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

use std::cell::RefCell;
use std::fmt::Display;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::logger::{self, Logger};
use crate::value::Value;

thread_local! {
    static LOGGER: RefCell<Option<Logger>> = const { RefCell::new(None) };
}

/// Install `logger` for the calling thread, returning the displaced one.
pub fn set_thread_logger(logger: Logger) -> Option<Logger> {
    LOGGER.with(|slot| slot.borrow_mut().replace(logger))
}

/// Remove and return the calling thread's logger.
pub fn take_thread_logger() -> Option<Logger> {
    LOGGER.with(|slot| slot.borrow_mut().take())
}

/// Run `f` against the calling thread's logger, if any.
///
/// The slot is borrowed for the duration of `f`; do not re-enter the
/// pass-through functions from inside it.
pub fn with_thread_logger<T>(f: impl FnOnce(&mut Logger) -> T) -> Option<T> {
    LOGGER.with(|slot| slot.borrow_mut().as_mut().map(f))
}

/// Pass-through for [`Logger::explain`].
pub fn explain<I>(objects: I) -> Result<()>
where
    I: IntoIterator<Item = Value>,
{
    with_thread_logger(|logger| logger.explain(objects)).unwrap_or(Ok(()))
}

/// Pass-through for [`Logger::explain_at`].
pub fn explain_at<I>(importance: f64, objects: I) -> Result<()>
where
    I: IntoIterator<Item = Value>,
{
    with_thread_logger(|logger| logger.explain_at(importance, objects)).unwrap_or(Ok(()))
}

/// Pass-through for [`Logger::start`].
pub fn start<I>(objects: I) -> Result<()>
where
    I: IntoIterator<Item = Value>,
{
    with_thread_logger(|logger| logger.start(objects)).unwrap_or(Ok(()))
}

/// Pass-through for [`Logger::start_at`].
pub fn start_at<I>(importance: f64, objects: I) -> Result<()>
where
    I: IntoIterator<Item = Value>,
{
    with_thread_logger(|logger| logger.start_at(importance, objects)).unwrap_or(Ok(()))
}

/// Pass-through for [`Logger::end`].
pub fn end<I>(objects: I) -> Result<()>
where
    I: IntoIterator<Item = Value>,
{
    with_thread_logger(|logger| logger.end(objects)).unwrap_or(Ok(()))
}

/// Pass-through for [`Logger::block`].
///
/// Unlike the method, the body takes no logger argument: it is expected to
/// use these pass-through functions itself. The slot is never borrowed
/// while the body runs, so re-entrant use is fine.
pub fn block<R, E, F>(open: Vec<Value>, body: F, close: Vec<Value>) -> std::result::Result<R, E>
where
    F: FnOnce() -> std::result::Result<R, E>,
    R: Display,
    E: From<Error> + Display,
{
    block_impl(None, open, body, close)
}

/// Pass-through for [`Logger::block_at`].
pub fn block_at<R, E, F>(
    importance: f64,
    open: Vec<Value>,
    body: F,
    close: Vec<Value>,
) -> std::result::Result<R, E>
where
    F: FnOnce() -> std::result::Result<R, E>,
    R: Display,
    E: From<Error> + Display,
{
    block_impl(Some(importance), open, body, close)
}

fn block_impl<R, E, F>(
    importance: Option<f64>,
    open: Vec<Value>,
    body: F,
    close: Vec<Value>,
) -> std::result::Result<R, E>
where
    F: FnOnce() -> std::result::Result<R, E>,
    R: Display,
    E: From<Error> + Display,
{
    let engaged = with_thread_logger(|logger| logger.is_active()).unwrap_or(false);
    if !engaged {
        return body();
    }
    match importance {
        Some(importance) => start_at(importance, open),
        None => start(open),
    }
    .map_err(E::from)?;
    match body() {
        Ok(result) => {
            end(logger::substitute_result(close, &result)).map_err(E::from)?;
            Ok(result)
        }
        Err(error) => {
            let message = logger::throwable_line::<E>(&error);
            with_thread_logger(|installed| installed.abort_block(message))
                .unwrap_or(Ok(()))
                .map_err(E::from)?;
            Err(error)
        }
    }
}

/// Run one top-level block whose output goes to a fresh file-backed logger.
///
/// A new [`Logger::to_file`] instance is installed for the duration of the
/// call; on exit, normal or failed, the previous logger is restored and
/// the file handler is closed. The fresh instance seeds its `active` state
/// from [`crate::config`] like any other.
pub fn block_to_file<P, R, E, F>(
    path: P,
    open: Vec<Value>,
    body: F,
    close: Vec<Value>,
) -> std::result::Result<R, E>
where
    P: Into<PathBuf>,
    F: FnOnce() -> std::result::Result<R, E>,
    R: Display,
    E: From<Error> + Display,
{
    let previous = set_thread_logger(Logger::to_file(path));
    let outcome = block(open, body, close);
    let file_logger = match previous {
        Some(previous) => set_thread_logger(previous),
        None => take_thread_logger(),
    };
    let closed = file_logger.map_or(Ok(()), |mut logger| logger.close());
    match (outcome, closed) {
        (Ok(result), Ok(())) => Ok(result),
        (Ok(_), Err(error)) => Err(E::from(error)),
        (Err(error), _) => Err(error),
    }
}
