//! Sink contract and the writer-backed handler family.
//!
//! A handler renders surviving records as a side effect. The writer-backed
//! base defers acquisition of its sink until the first record arrives, then
//! owns it exclusively until [`Handler::close`] flushes and releases it.
//!
//! Rendered line format, in fixed order:
//!
//! ```text
//! <marker>{depth+1} <objects, forced and concatenated> [ (<timestamp>)] [ (<N> ms)]\n
//! ```

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

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::record::Record;

const DEFAULT_NESTING_STRING: &str = "*";
const DEFAULT_INCLUDE_TIMESTAMP: bool = false;
const DEFAULT_INCLUDE_BLOCK_TIME: bool = true;

/// Destination for rendered explanation records.
///
/// A failing `handle` aborts the current emission: the engine does not
/// retry, swallow, or continue with the remaining handlers. Callers wanting
/// resilience wrap individual handlers.
pub trait Handler: Send {
    /// Render one record as a side effect.
    fn handle(&mut self, record: &Record) -> Result<()>;

    /// Flush and release the underlying sink. Safe to call repeatedly.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Shared text rendering for the line-oriented handlers.
fn render_line(
    record: &Record,
    nesting_string: &str,
    include_timestamp: bool,
    include_block_time: bool,
) -> String {
    let mut line = String::new();
    for _ in 0..=record.nesting_depth() {
        line.push_str(nesting_string);
    }
    line.push(' ');
    line.push_str(&record.text());
    if include_timestamp {
        if let Some(timestamp) = record.timestamp() {
            line.push_str(&format!(" ({})", timestamp.format("%Y-%m-%d %H:%M:%S%.3f")));
        }
    }
    if include_block_time {
        if let Some(block_time) = record.block_time() {
            line.push_str(&format!(" ({} ms)", block_time.as_millis()));
        }
    }
    line.push('\n');
    line
}

/// One-shot sink constructor used for deferred acquisition.
pub type SinkMaker<W> = Box<dyn FnOnce() -> io::Result<W> + Send>;

/// Lazily acquired, exclusively owned sink. `None` + no maker means closed.
pub(crate) struct LazySink<W: Write + Send> {
    maker: Option<SinkMaker<W>>,
    writer: Option<W>,
}

impl<W: Write + Send> LazySink<W> {
    pub(crate) fn ready(writer: W) -> Self {
        Self { maker: None, writer: Some(writer) }
    }

    pub(crate) fn deferred(maker: SinkMaker<W>) -> Self {
        Self { maker: Some(maker), writer: None }
    }

    pub(crate) fn created(&self) -> bool {
        self.writer.is_some()
    }

    pub(crate) fn get(&mut self) -> Result<&mut W> {
        if self.writer.is_none() {
            if let Some(maker) = self.maker.take() {
                self.writer = Some(maker()?);
            }
        }
        self.writer.as_mut().ok_or_else(|| {
            Error::Sink(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "explanation sink already closed",
            ))
        })
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        self.maker = None;
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Writer-backed handler base: renders the line format above into any
/// [`io::Write`] sink.
///
/// The sink may be handed over ready-made ([`WriterHandler::new`]) or built
/// on the first record ([`WriterHandler::with_maker`]); either way the
/// handler owns it exclusively afterwards, and [`Handler::close`] flushes
/// and releases it exactly once.
pub struct WriterHandler<W: Write + Send> {
    sink: LazySink<W>,
    nesting_string: String,
    include_timestamp: bool,
    include_block_time: bool,
}

impl<W: Write + Send> WriterHandler<W> {
    /// Handler over an already-open sink.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self::from_sink(LazySink::ready(writer))
    }

    /// Handler whose sink is created by `maker` on the first record.
    #[must_use]
    pub fn with_maker(maker: impl FnOnce() -> io::Result<W> + Send + 'static) -> Self {
        Self::from_sink(LazySink::deferred(Box::new(maker)))
    }

    fn from_sink(sink: LazySink<W>) -> Self {
        Self {
            sink,
            nesting_string: DEFAULT_NESTING_STRING.to_owned(),
            include_timestamp: DEFAULT_INCLUDE_TIMESTAMP,
            include_block_time: DEFAULT_INCLUDE_BLOCK_TIME,
        }
    }

    /// Whether the underlying sink has been created yet.
    #[must_use]
    pub fn writer_created(&self) -> bool {
        self.sink.created()
    }

    /// Marker string repeated `depth + 1` times per line.
    #[must_use]
    pub fn nesting_string(&self) -> &str {
        &self.nesting_string
    }

    /// Replace the nesting marker (default `"*"`).
    pub fn set_nesting_string(&mut self, nesting_string: impl Into<String>) {
        self.nesting_string = nesting_string.into();
    }

    /// Whether record timestamps are appended (default off).
    #[must_use]
    pub fn include_timestamp(&self) -> bool {
        self.include_timestamp
    }

    /// Toggle timestamp rendering.
    pub fn set_include_timestamp(&mut self, include_timestamp: bool) {
        self.include_timestamp = include_timestamp;
    }

    /// Whether block durations are appended to close records (default on).
    #[must_use]
    pub fn include_block_time(&self) -> bool {
        self.include_block_time
    }

    /// Toggle block-duration rendering.
    pub fn set_include_block_time(&mut self, include_block_time: bool) {
        self.include_block_time = include_block_time;
    }
}

impl<W: Write + Send> Handler for WriterHandler<W> {
    fn handle(&mut self, record: &Record) -> Result<()> {
        let line = render_line(
            record,
            &self.nesting_string,
            self.include_timestamp,
            self.include_block_time,
        );
        let writer = self.sink.get()?;
        writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.sink.close()
    }
}

/// File-backed handler; the file is created when the first record arrives.
pub type FileHandler = WriterHandler<BufWriter<File>>;

impl FileHandler {
    /// Handler that creates (truncates) `path` on the first record.
    #[must_use]
    pub fn create<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        Self::with_maker(move || Ok(BufWriter::new(File::create(&path)?)))
    }
}

/// Clonable view over a [`StringHandler`]'s accumulated text.
///
/// The handler is moved into the logger; keep a buffer handle around to read
/// what was rendered.
#[derive(Clone, Debug, Default)]
pub struct StringBuffer(Arc<Mutex<String>>);

impl StringBuffer {
    fn append(&self, line: &str) {
        let mut guard = match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push_str(line);
    }

    /// Snapshot of everything rendered so far.
    #[must_use]
    pub fn contents(&self) -> String {
        match self.0.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl fmt::Display for StringBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.contents())
    }
}

/// In-memory capture handler.
///
/// Unlike the writer-backed handlers, block durations are **off** by default:
/// the captured text is usually compared verbatim, and millisecond suffixes
/// would make that nondeterministic.
pub struct StringHandler {
    buffer: StringBuffer,
    nesting_string: String,
    include_timestamp: bool,
    include_block_time: bool,
}

impl StringHandler {
    /// Fresh handler with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: StringBuffer::default(),
            nesting_string: DEFAULT_NESTING_STRING.to_owned(),
            include_timestamp: false,
            include_block_time: false,
        }
    }

    /// Clonable handle onto the accumulated text.
    #[must_use]
    pub fn buffer(&self) -> StringBuffer {
        self.buffer.clone()
    }

    /// Snapshot of everything rendered so far.
    #[must_use]
    pub fn contents(&self) -> String {
        self.buffer.contents()
    }

    /// Replace the nesting marker (default `"*"`).
    pub fn set_nesting_string(&mut self, nesting_string: impl Into<String>) {
        self.nesting_string = nesting_string.into();
    }

    /// Toggle timestamp rendering (default off).
    pub fn set_include_timestamp(&mut self, include_timestamp: bool) {
        self.include_timestamp = include_timestamp;
    }

    /// Toggle block-duration rendering (default off).
    pub fn set_include_block_time(&mut self, include_block_time: bool) {
        self.include_block_time = include_block_time;
    }
}

impl Default for StringHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for StringHandler {
    fn handle(&mut self, record: &Record) -> Result<()> {
        let line = render_line(
            record,
            &self.nesting_string,
            self.include_timestamp,
            self.include_block_time,
        );
        self.buffer.append(&line);
        Ok(())
    }
}
