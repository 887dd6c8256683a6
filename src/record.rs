use std::sync::Arc;

use crate::datum::{Datum, DatumMap};
use crate::exception::ExceptionDescriptor;

/// How a journaled call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Results as returned, or mapped onto result names.
    Results(Datum),
    Exception(ExceptionDescriptor),
}

/// The structured unit emitted for one journaled call.
#[derive(Debug, Clone)]
pub struct JournalRecord {
    pub objective: String,
    pub context: Option<Arc<serde_json::Value>>,
    pub arguments: DatumMap,
    pub outcome: Outcome,
}

impl JournalRecord {
    pub fn results(&self) -> Option<&Datum> {
        match &self.outcome {
            Outcome::Results(results) => Some(results),
            Outcome::Exception(_) => None,
        }
    }

    pub fn exception(&self) -> Option<&ExceptionDescriptor> {
        match &self.outcome {
            Outcome::Exception(exception) => Some(exception),
            Outcome::Results(_) => None,
        }
    }
}
