//! JSON Lines (NDJSON) sink for the record feed.
//!
//! One JSON object per surviving record, written line-by-line so downstream
//! tooling can stream the feed without loading it whole. This is the
//! machine-readable twin of the text format in [`crate::handler`]; the
//! objects are forced to their concatenated text, not exposed as fields.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::error::Result;
use crate::handler::{Handler, LazySink};
use crate::record::Record;

/// Line layout for the NDJSON feed.
#[derive(Debug, Serialize)]
struct Line<'a> {
    depth: usize,
    importance: f64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_time_ms: Option<u64>,
}

/// Handler writing one JSON object per record.
pub struct JsonlHandler<W: Write + Send> {
    sink: LazySink<W>,
}

impl<W: Write + Send> JsonlHandler<W> {
    /// Handler over an already-open sink.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { sink: LazySink::ready(writer) }
    }

    /// Handler whose sink is created by `maker` on the first record.
    #[must_use]
    pub fn with_maker(maker: impl FnOnce() -> io::Result<W> + Send + 'static) -> Self {
        Self { sink: LazySink::deferred(Box::new(maker)) }
    }

    /// Whether the underlying sink has been created yet.
    #[must_use]
    pub fn writer_created(&self) -> bool {
        self.sink.created()
    }
}

impl JsonlHandler<BufWriter<File>> {
    /// Handler that creates (truncates) `path` on the first record.
    #[must_use]
    pub fn create<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        Self::with_maker(move || Ok(BufWriter::new(File::create(&path)?)))
    }
}

impl<W: Write + Send> Handler for JsonlHandler<W> {
    fn handle(&mut self, record: &Record) -> Result<()> {
        let text = record.text();
        let line = Line {
            depth: record.nesting_depth(),
            importance: record.importance(),
            text: &text,
            timestamp_ms: record.timestamp().map(|t| t.timestamp_millis()),
            block_time_ms: record
                .block_time()
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        };
        let writer = self.sink.get()?;
        serde_json::to_writer(&mut *writer, &line).map_err(io::Error::from)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.sink.close()
    }
}
