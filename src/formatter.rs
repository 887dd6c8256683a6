//! Conversion of journal records into log message text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::datum::{Datum, ToDatum};
use crate::encoder::{Encoder, ObjectEncoder};
use crate::error::{JournalError, Result};
use crate::record::{JournalRecord, Outcome};

/// Version of the emitted record layout.
pub const FORMAT_VERSION: &str = "0.2.0";

pub const DEFAULT_TAG: &str = "JOURNAL_MSG_JSON";

/// Output layout of a formatted record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatMode {
    /// One JSON object with nested `arguments`, `results` and `exception`.
    #[default]
    #[serde(rename = "JSON", alias = "json")]
    Json,
    /// Like `Json`, but `arguments`, `results` and `exception` hold their JSON
    /// text, so stores that expand nested objects into columns keep them
    /// as single string columns.
    #[serde(rename = "STRINGY", alias = "stringy")]
    Stringy,
}

impl FromStr for FormatMode {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "JSON" => Ok(FormatMode::Json),
            "STRINGY" => Ok(FormatMode::Stringy),
            _ => Err(JournalError::FormatMode(s.to_owned())),
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    tag: &'a str,
    format: &'static str,
    objective: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a serde_json::Value>,
    arguments: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<T>,
}

pub struct JournalFormatter {
    tag: String,
    mode: FormatMode,
    encoder: Box<dyn Encoder>,
}

impl JournalFormatter {
    /// Formatter using the [`ObjectEncoder`].
    pub fn new(tag: impl Into<String>, mode: FormatMode) -> Self {
        Self {
            tag: tag.into(),
            mode,
            encoder: Box::new(ObjectEncoder),
        }
    }

    pub fn with_encoder<E: Encoder + 'static>(mut self, encoder: E) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn mode(&self) -> FormatMode {
        self.mode
    }

    /// Encodes `record` and serializes it as a single JSON object.
    ///
    /// Fails if a value the encoder left unnormalized reaches serialization.
    pub fn format(&self, record: &JournalRecord) -> Result<String> {
        let arguments = Datum::Map(self.encoder.encode_map(&record.arguments));
        let (results, exception) = match &record.outcome {
            Outcome::Results(results) => (Some(self.encoder.encode(results)), None),
            Outcome::Exception(exception) => {
                (None, Some(self.encoder.encode(&exception.to_datum())))
            }
        };
        let context = record
            .context
            .as_deref()
            .filter(|context| !is_empty_context(context));

        let text = match self.mode {
            FormatMode::Json => serde_json::to_string(&Envelope {
                tag: &self.tag,
                format: FORMAT_VERSION,
                objective: &record.objective,
                context,
                arguments,
                results,
                exception,
            })?,
            FormatMode::Stringy => {
                let stringify = |datum: &Datum| serde_json::to_string(datum);
                serde_json::to_string(&Envelope {
                    tag: &self.tag,
                    format: FORMAT_VERSION,
                    objective: &record.objective,
                    context,
                    arguments: stringify(&arguments)?,
                    results: results.as_ref().map(stringify).transpose()?,
                    exception: exception.as_ref().map(stringify).transpose()?,
                })?
            }
        };
        Ok(text)
    }
}

impl Default for JournalFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TAG, FormatMode::Json)
    }
}

impl fmt::Debug for JournalFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JournalFormatter")
            .field("tag", &self.tag)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

fn is_empty_context(context: &serde_json::Value) -> bool {
    use serde_json::Value;

    match context {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
