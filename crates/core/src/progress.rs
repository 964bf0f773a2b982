//! Output sink for user-facing progress messages.
//!
//! Library crates never print. Long-running operations report progress through
//! a [`ProgressSink`] supplied by the caller; the CLI hands in a stderr sink,
//! tests hand in a [`RecordingSink`].

use std::io::Write;
use std::sync::Mutex;

/// Receiver for human-readable progress lines.
pub trait ProgressSink: Send + Sync {
    /// Report a single progress line.
    fn message(&self, message: &str);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn message(&self, _message: &str) {}
}

/// Sink writing one line per message to any [`Write`] implementation.
#[derive(Debug)]
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwrap the writer, e.g. to inspect a buffer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> ProgressSink for WriterSink<W> {
    fn message(&self, message: &str) {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // Progress output is best effort; a closed pipe must not fail an install.
        if let Err(e) = writeln!(writer, "{message}") {
            tracing::debug!(error = %e, "Failed to write progress message");
        }
    }
}

/// Sink that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for RecordingSink {
    fn message(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink_appends_lines() {
        let sink = WriterSink::new(Vec::new());
        sink.message("Cloning demo");
        sink.message("Installed demo 1.0.0");
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "Cloning demo\nInstalled demo 1.0.0\n");
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.message("a");
        sink.message("b");
        assert_eq!(sink.messages(), vec!["a", "b"]);
    }

    #[test]
    fn test_null_sink_is_object_safe() {
        let sink: &dyn ProgressSink = &NullSink;
        sink.message("ignored");
    }
}
