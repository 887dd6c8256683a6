//! Destinations for journal records.

use std::sync::{Mutex, PoisonError};

use tracing::Level;

use crate::error::Result;
use crate::formatter::JournalFormatter;
use crate::record::JournalRecord;

/// Target of the tracing events emitted by [`TracingSink`].
pub const JOURNAL_TARGET: &str = "journal";

/// Receives one record per journaled call, at INFO for results and ERROR for
/// failures. Called synchronously on the caller's thread; implementations
/// must tolerate concurrent calls.
pub trait Sink: Send + Sync {
    fn emit(&self, level: Level, record: &JournalRecord) -> Result<()>;
}

/// Formats records and emits them as `tracing` events on the `journal`
/// target. Routing, filtering and output belong to the installed subscriber.
#[derive(Debug, Default)]
pub struct TracingSink {
    formatter: JournalFormatter,
}

impl TracingSink {
    pub fn new(formatter: JournalFormatter) -> Self {
        Self { formatter }
    }
}

impl Sink for TracingSink {
    fn emit(&self, level: Level, record: &JournalRecord) -> Result<()> {
        let message = self.formatter.format(record)?;
        if level == Level::ERROR {
            tracing::error!(target: JOURNAL_TARGET, objective = %record.objective, "{message}");
        } else {
            tracing::info!(target: JOURNAL_TARGET, objective = %record.objective, "{message}");
        }
        Ok(())
    }
}

/// Keeps formatted records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    formatter: JournalFormatter,
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new(formatter: JournalFormatter) -> Self {
        Self {
            formatter,
            lines: Mutex::default(),
        }
    }

    /// Everything emitted so far, oldest first.
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns everything emitted so far.
    pub fn drain(&self) -> Vec<(Level, String)> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Sink for MemorySink {
    fn emit(&self, level: Level, record: &JournalRecord) -> Result<()> {
        let message = self.formatter.format(record)?;
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{Datum, DatumMap};
    use crate::formatter::FormatMode;
    use crate::record::Outcome;

    fn record() -> JournalRecord {
        JournalRecord {
            objective: "emit".into(),
            context: None,
            arguments: DatumMap::new(),
            outcome: Outcome::Results(Datum::Null),
        }
    }

    #[test]
    fn memory_sink_keeps_levels_in_order() {
        let sink = MemorySink::new(JournalFormatter::new("T", FormatMode::Json));
        sink.emit(Level::INFO, &record()).unwrap();
        sink.emit(Level::ERROR, &record()).unwrap();

        let lines = sink.drain();
        assert_eq!(
            lines.iter().map(|(level, _)| *level).collect::<Vec<_>>(),
            [Level::INFO, Level::ERROR]
        );
        assert_eq!(
            lines[0].1,
            r#"{"tag":"T","format":"0.2.0","objective":"emit","arguments":{},"results":null}"#
        );
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn tracing_sink_propagates_format_errors() {
        let mut record = record();
        record.arguments.insert("opaque", Datum::Opaque("Handle"));
        assert!(TracingSink::default().emit(Level::INFO, &record).is_err());
    }
}
