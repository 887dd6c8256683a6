//! Journaling of individual calls.
//!
//! A [`Journal`] is the configuration of one journaled callable. Each call
//! goes through binding, execution and emission:
//!
//! ```text
//! Journal::begin ─► Entry ─► callable ─┬─► Entry::succeed ─► INFO record
//!                                      └─► Entry::fail    ─► ERROR record
//! ```
//!
//! [`Journal::call`] and [`Journal::try_call`] run the whole sequence around a
//! closure and are what the `#[journal]` attribute expands to.

use std::fmt;
use std::panic::{self, AssertUnwindSafe, Location};

use tracing::Level;

use crate::binder::{Call, CopyArgs, Signature, map_args};
use crate::datum::{Datum, DatumMap, ToDatum};
use crate::error::{JournalError, Result};
use crate::exception::{ExceptionDescriptor, clear_panic_location, install_panic_hook};
use crate::record::{JournalRecord, Outcome};
use crate::results::{ResultNames, map_results};
use crate::runtime::Journaler;

/// Journal configuration of one callable.
///
/// ```
/// use callable_journal::{Call, Journal, Journaler, MemorySink, Signature, ToDatum};
/// use std::sync::Arc;
///
/// let sink = Arc::new(MemorySink::default());
/// let journaler = Journaler::with_shared_sink(None, sink.clone());
/// let journal = Journal::new(Signature::new("add").param("a").param("b"))
///     .result_names("sum");
///
/// let (a, b) = (2, 3);
/// let call = Call::new().arg(a.to_datum()).arg(b.to_datum());
/// assert_eq!(journal.call(&journaler, call, || a + b), 5);
///
/// let (_, line) = &sink.lines()[0];
/// assert!(line.contains(r#""arguments":{"a":2,"b":3},"results":{"sum":5}"#));
/// ```
#[derive(Debug, Clone)]
pub struct Journal {
    signature: Signature,
    objective: String,
    result_names: ResultNames,
    copy_args: CopyArgs,
    drop_args: Vec<String>,
}

impl Journal {
    /// The objective defaults to the signature's name.
    pub fn new(signature: Signature) -> Self {
        Self {
            objective: signature.name().to_owned(),
            signature,
            result_names: ResultNames::default(),
            copy_args: CopyArgs::default(),
            drop_args: Vec::new(),
        }
    }

    pub fn objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = objective.into();
        self
    }

    pub fn result_names(mut self, names: impl Into<ResultNames>) -> Self {
        self.result_names = names.into();
        self
    }

    pub fn copy_args(mut self, copy_args: impl Into<CopyArgs>) -> Self {
        self.copy_args = copy_args.into();
        self
    }

    pub fn drop_args<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_args = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn objective_name(&self) -> &str {
        &self.objective
    }

    /// Binds the call's arguments and opens an entry for it.
    pub fn begin<'j>(&'j self, journaler: &'j Journaler, call: Call) -> Result<Entry<'j>> {
        let arguments = map_args(&self.signature, call, &self.copy_args, &self.drop_args)?;
        Ok(Entry {
            journal: self,
            journaler,
            arguments,
        })
    }

    /// Journals an infallible callable. A panic is journaled as an ERROR
    /// record and then resumed.
    ///
    /// # Panics
    ///
    /// Panics with the [`JournalError`] if the call cannot be journaled.
    pub fn call<R, F>(&self, journaler: &Journaler, call: Call, f: F) -> R
    where
        R: ToDatum,
        F: FnOnce() -> R,
    {
        let entry = self.begin(journaler, call).unwrap_or_else(|err| fatal(err));
        let results = entry.observe(f);
        let emitted = entry.succeed(results.to_datum());
        emitted.unwrap_or_else(|err| fatal(err));
        results
    }

    /// Journals a callable returning `Result`. `Ok` values are journaled as
    /// results, `Err` values as an exception located at the caller of this
    /// method, and both are returned unchanged.
    ///
    /// # Panics
    ///
    /// Panics with the [`JournalError`] if the call cannot be journaled.
    #[track_caller]
    pub fn try_call<R, E, F>(&self, journaler: &Journaler, call: Call, f: F) -> std::result::Result<R, E>
    where
        R: ToDatum,
        E: fmt::Display + fmt::Debug,
        F: FnOnce() -> std::result::Result<R, E>,
    {
        let location = Location::caller();
        let entry = self.begin(journaler, call).unwrap_or_else(|err| fatal(err));
        let outcome = entry.observe(f);
        let emitted = match &outcome {
            Ok(results) => entry.succeed(results.to_datum()),
            Err(error) => entry.fail(ExceptionDescriptor::from_error(error, location)),
        };
        emitted.unwrap_or_else(|err| fatal(err));
        outcome
    }
}

/// A bound call waiting for its outcome.
#[derive(Debug)]
pub struct Entry<'j> {
    journal: &'j Journal,
    journaler: &'j Journaler,
    arguments: DatumMap,
}

impl Entry<'_> {
    pub fn arguments(&self) -> &DatumMap {
        &self.arguments
    }

    /// Maps `results` onto the result names and emits an INFO record.
    /// Nothing is emitted if the mapping fails.
    pub fn succeed(self, results: Datum) -> Result<()> {
        let results = map_results(results, &self.journal.result_names)?;
        self.record(Level::INFO, Outcome::Results(results))
    }

    /// Emits an ERROR record for `exception`.
    pub fn fail(self, exception: ExceptionDescriptor) -> Result<()> {
        self.record(Level::ERROR, Outcome::Exception(exception))
    }

    /// Runs `f`; if it panics, emits the failure and resumes the panic.
    fn observe<T, F: FnOnce() -> T>(&self, f: F) -> T {
        install_panic_hook();
        clear_panic_location();
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => value,
            Err(payload) => {
                let exception = ExceptionDescriptor::from_panic(payload.as_ref());
                self.record(Level::ERROR, Outcome::Exception(exception))
                    .unwrap_or_else(|err| fatal(err));
                panic::resume_unwind(payload)
            }
        }
    }

    fn record(&self, level: Level, outcome: Outcome) -> Result<()> {
        let record = JournalRecord {
            objective: self.journal.objective.clone(),
            context: self.journaler.shared_context(),
            arguments: self.arguments.clone(),
            outcome,
        };
        self.journaler.emit(level, &record)
    }
}

#[cold]
#[track_caller]
fn fatal(err: JournalError) -> ! {
    panic!("callable journal: {err}")
}
