//! Event sink for pipeline status lines.
//!
//! The pipeline never writes to a global logger directly; it reports
//! through the [`EventSink`] handed to [`Pipeline::new`](super::Pipeline::new).

use std::error::Error;

/// Receiver of informational and error events from a sync run.
pub trait EventSink: Send + Sync {
    /// A progress or result line.
    fn info(&self, message: &str);

    /// Something unexpected that did not fail the operation.
    fn warn(&self, message: &str) {
        self.info(message);
    }

    /// A failed operation and its cause.
    fn error(&self, message: &str, err: &dyn Error);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn info(&self, message: &str) {
        log::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        log::warn!("{}", message);
    }

    fn error(&self, message: &str, err: &dyn Error) {
        log::error!("{}: {}", message, err);
    }
}
