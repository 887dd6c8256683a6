//! The journal handle shared by every journaled call.
//!
//! [`init`] sets the process-wide [`Journaler`] exactly once, before any
//! journaled call runs; it is read-only afterwards. There is no lock and no
//! way to replace it: initialize from a single thread before the readers
//! start. Until then [`global`] hands out a default journaler with no context
//! that emits JSON records through `tracing`.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{JournalError, Result};
use crate::exception::install_panic_hook;
use crate::record::JournalRecord;
use crate::settings::{JournalSettings, SubscriberSettings};
use crate::sink::{Sink, TracingSink};

static GLOBAL: OnceLock<Journaler> = OnceLock::new();
static UNINITIALIZED: OnceLock<Journaler> = OnceLock::new();

/// Context and sink for journal records.
pub struct Journaler {
    context: Option<Arc<serde_json::Value>>,
    sink: Arc<dyn Sink>,
}

impl Journaler {
    pub fn new<S: Sink + 'static>(context: Option<serde_json::Value>, sink: S) -> Self {
        Self::with_shared_sink(context, Arc::new(sink))
    }

    /// Journaler emitting into a sink the caller keeps a handle to.
    pub fn with_shared_sink(context: Option<serde_json::Value>, sink: Arc<dyn Sink>) -> Self {
        Self {
            context: context.map(Arc::new),
            sink,
        }
    }

    pub fn context(&self) -> Option<&serde_json::Value> {
        self.context.as_deref()
    }

    pub(crate) fn shared_context(&self) -> Option<Arc<serde_json::Value>> {
        self.context.clone()
    }

    pub fn emit(&self, level: Level, record: &JournalRecord) -> Result<()> {
        self.sink.emit(level, record)
    }
}

impl Default for Journaler {
    fn default() -> Self {
        Self::new(None, TracingSink::default())
    }
}

impl fmt::Debug for Journaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Journaler")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Initializes the process-wide journaler from `settings`.
///
/// `context` takes precedence over the settings' `[context]` table. Installs
/// the configured log subscriber, if any.
pub fn init(
    settings: &JournalSettings,
    context: Option<serde_json::Value>,
) -> Result<&'static Journaler> {
    if GLOBAL.get().is_some() {
        return Err(JournalError::AlreadyInitialized);
    }
    if let Some(subscriber) = &settings.subscriber {
        install_subscriber(subscriber)?;
    }
    let context = context.or_else(|| settings.context.clone());
    init_with_sink(context, TracingSink::new(settings.formatter()))
}

/// Initializes the process-wide journaler with a custom sink.
pub fn init_with_sink<S: Sink + 'static>(
    context: Option<serde_json::Value>,
    sink: S,
) -> Result<&'static Journaler> {
    install(Journaler::new(context, sink))
}

/// Makes `journaler` the process-wide journaler.
pub fn install(journaler: Journaler) -> Result<&'static Journaler> {
    install_panic_hook();
    GLOBAL
        .set(journaler)
        .map_err(|_| JournalError::AlreadyInitialized)?;
    Ok(global())
}

/// The process-wide journaler.
pub fn global() -> &'static Journaler {
    GLOBAL
        .get()
        .unwrap_or_else(|| UNINITIALIZED.get_or_init(Journaler::default))
}

fn install_subscriber(settings: &SubscriberSettings) -> Result<()> {
    let filter = EnvFilter::try_new(&settings.filter)
        .map_err(|err| JournalError::Subscriber(err.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(settings.ansi)
        .try_init()
        .map_err(|err| JournalError::Subscriber(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{Datum, DatumMap};
    use crate::record::Outcome;
    use crate::sink::MemorySink;
    use serde_json::json;

    #[test]
    fn journaler_emits_into_its_sink() {
        let sink = Arc::new(MemorySink::default());
        let journaler = Journaler::with_shared_sink(Some(json!({"app": "test"})), sink.clone());
        let record = JournalRecord {
            objective: "emit".into(),
            context: journaler.shared_context(),
            arguments: DatumMap::new(),
            outcome: Outcome::Results(Datum::Int(1)),
        };

        journaler.emit(Level::INFO, &record).unwrap();

        assert_eq!(journaler.context(), Some(&json!({"app": "test"})));
        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.contains(r#""context":{"app":"test"}"#));
    }

    #[test]
    fn invalid_filter_is_reported() {
        let settings = SubscriberSettings {
            filter: "journal=[".into(),
            ansi: false,
        };
        assert!(matches!(
            install_subscriber(&settings),
            Err(JournalError::Subscriber(_))
        ));
    }
}
