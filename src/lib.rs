//! Journaling of function calls.
//!
//! Decorating a function with [`journal`] emits one structured record per
//! call with the call's objective, the process-wide context, the bound
//! arguments and either the results or a description of the failure:
//!
//! ```rust
//! use callable_journal::journal;
//!
//! #[journal(result_names = ["total_sum", "multiplied_values"])]
//! fn named_results(a: i32, b: Vec<i32>) -> (i32, Vec<i32>) {
//!     let multiplied: Vec<i32> = b.iter().map(|item| a * item).collect();
//!     (multiplied.iter().sum(), multiplied)
//! }
//!
//! assert_eq!(named_results(2, vec![1, 2]), (6, vec![2, 4]));
//! ```
//!
//! which logs, on the `journal` tracing target:
//!
//! ```json
//! {"tag": "JOURNAL_MSG_JSON", "format": "0.2.0", "objective": "named_results",
//!  "arguments": {"a": 2, "b": [1, 2]},
//!  "results": {"total_sum": 6, "multiplied_values": [2, 4]}}
//! ```
//!
//! # Attribute arguments
//!
//! - `objective = "name"`: label of the record, the function name by default.
//! - `result_names = "x"` or `["x", "y", _]`: names for the results, matched
//!   positionally; `_` leaves a result out.
//! - `copy_args = "a"`, `["a", "b"]` or `*`: arguments journaled as a
//!   snapshot taken before the call. Matters for shared handles such as
//!   `Rc<RefCell<T>>`, which are otherwise read after the call.
//! - `drop_args = "a"` or `["a", "b"]`: arguments left out of the record,
//!   for large or sensitive values. Dropped arguments need no [`ToDatum`].
//!
//! Functions returning a `Result` journal `Err` values as exceptions. Panics
//! are journaled and resumed. Either way the caller sees exactly what the
//! function produced.
//!
//! # Setup
//!
//! [`init`] installs the process-wide context and output settings once at
//! startup. Without it records go to `tracing` in JSON mode, with no context.

mod binder;
mod datum;
mod encoder;
mod error;
mod exception;
mod formatter;
mod journal;
mod record;
mod results;
mod runtime;
mod settings;
mod sink;

pub use binder::{COPY_ALL, Call, CopyArgs, Param, ParamKind, RECEIVER_NAMES, Signature, map_args};
pub use callable_journal_macro::journal;
pub use datum::{Datum, DatumMap, Mappable, ToDatum};
pub use encoder::{BaseEncoder, Encoder, ObjectEncoder};
pub use error::{BindingError, JournalError, Result};
pub use exception::{ExceptionDescriptor, PANIC_KIND, install_panic_hook};
pub use formatter::{DEFAULT_TAG, FORMAT_VERSION, FormatMode, JournalFormatter};
pub use journal::{Entry, Journal};
pub use record::{JournalRecord, Outcome};
pub use results::{IGNORE, ResultName, ResultNames, map_results};
pub use runtime::{Journaler, global, init, init_with_sink, install};
pub use settings::{JournalSettings, SubscriberSettings};
pub use sink::{JOURNAL_TARGET, MemorySink, Sink, TracingSink};
