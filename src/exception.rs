//! Serializable summary of a failed call.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, Location};
use std::sync::Once;

use serde::{Deserialize, Serialize};

use crate::datum::{Datum, ToDatum};

/// Kind name recorded for panics.
pub const PANIC_KIND: &str = "panic";

const UNKNOWN_FILE: &str = "<unknown>";

static PANIC_HOOK: Once = Once::new();

thread_local! {
    static PANIC_LOCATION: RefCell<Option<(String, u32)>> = const { RefCell::new(None) };
}

/// Kind, message and innermost source location of one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionDescriptor {
    #[serde(rename = "type")]
    kind: String,
    msg: String,
    file: String,
    line: String,
}

impl ExceptionDescriptor {
    pub fn new(
        kind: impl Into<String>,
        msg: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            kind: kind.into(),
            msg: msg.into(),
            file: file.into(),
            line: line.to_string(),
        }
    }

    /// Describes an error value returned at `location`.
    ///
    /// The kind is the error's type name without its module path or generic
    /// arguments. `Box`, `Arc` and `Rc` are looked through; behind a trait
    /// object the kind is read from the value's `Debug` output. A bare
    /// `Error` keeps its module, as in `io::Error`.
    pub fn from_error<E>(error: &E, location: &Location<'_>) -> Self
    where
        E: fmt::Display + fmt::Debug,
    {
        Self::new(
            error_kind(error),
            error.to_string(),
            location.file(),
            location.line(),
        )
    }

    /// Describes a caught panic.
    ///
    /// The location is the one the panic hook installed by
    /// [`install_panic_hook`] saw last on the current thread, so the call must
    /// be made on the panicking thread. Resumed unwinds keep the location of
    /// the original panic.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let (file, line) = last_panic_location().unwrap_or_else(|| (UNKNOWN_FILE.to_owned(), 0));
        Self::new(PANIC_KIND, panic_message(payload), file, line)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> &str {
        &self.line
    }
}

impl ToDatum for ExceptionDescriptor {
    fn to_datum(&self) -> Datum {
        Datum::Map(
            [
                ("type", self.kind.to_datum()),
                ("msg", self.msg.to_datum()),
                ("file", self.file.to_datum()),
                ("line", self.line.to_datum()),
            ]
            .into_iter()
            .collect(),
        )
    }
}

/// Chains a panic hook that records the location of every panic for
/// [`ExceptionDescriptor::from_panic`]. The previous hook still runs.
/// Installing more than once is a no-op.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if let Some(location) = info.location() {
                PANIC_LOCATION.with(|slot| {
                    *slot.borrow_mut() = Some((location.file().to_owned(), location.line()));
                });
            }
            previous(info);
        }));
    });
}

fn last_panic_location() -> Option<(String, u32)> {
    PANIC_LOCATION.with(|slot| slot.borrow().clone())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Forgets the last panic location of the current thread, so that a later
/// capture without a hooked panic reports an unknown location.
pub(crate) fn clear_panic_location() {
    PANIC_LOCATION.with(|slot| slot.borrow_mut().take());
}

const POINTERS: [&str; 3] = ["Box", "Arc", "Rc"];

fn error_kind<E: fmt::Debug + ?Sized>(error: &E) -> String {
    let pointee = strip_pointers(std::any::type_name::<E>());
    match pointee.strip_prefix("dyn ") {
        Some(bounds) => debug_type_name(error).unwrap_or_else(|| {
            let principal = bounds.split(" + ").next().unwrap_or(bounds);
            last_segment(principal).to_owned()
        }),
        None => short_type_name(pointee),
    }
}

/// `alloc::boxed::Box<alloc::sync::Arc<T>>` becomes `T`.
fn strip_pointers(full: &str) -> &str {
    let mut name = full.trim();
    while let Some(open) = name.find('<') {
        if !POINTERS.contains(&last_segment(&name[..open])) {
            break;
        }
        let Some(inner) = name[open + 1..].strip_suffix('>') else {
            break;
        };
        name = first_generic_argument(inner).trim();
    }
    name
}

fn first_generic_argument(arguments: &str) -> &str {
    let mut depth = 0usize;
    for (index, c) in arguments.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return &arguments[..index],
            _ => {}
        }
    }
    arguments
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    let mut segments = base.rsplit("::");
    let name = segments.next().unwrap_or(base);
    if name != "Error" {
        return name.to_owned();
    }
    match segments.find(|segment| *segment != "error") {
        Some(module) => format!("{module}::{name}"),
        None => name.to_owned(),
    }
}

/// Leading type name of a `Debug` rendering such as `ParseIntError { .. }`.
fn debug_type_name<E: fmt::Debug + ?Sized>(error: &E) -> Option<String> {
    let text = format!("{error:?}");
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let (name, rest) = text.split_at(end);
    let shaped = rest.is_empty() || rest.starts_with(" {") || rest.starts_with('(');
    (name.starts_with(|c: char| c.is_ascii_uppercase()) && shaped).then(|| name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_descriptor() {
        let error = "x".parse::<i32>().unwrap_err();
        let location = Location::caller();
        let descriptor = ExceptionDescriptor::from_error(&error, location);

        assert_eq!(descriptor.kind(), "ParseIntError");
        assert_eq!(descriptor.msg(), "invalid digit found in string");
        assert!(descriptor.file().ends_with("exception.rs"));
        assert_eq!(descriptor.line(), location.line().to_string());
    }

    #[test]
    fn panic_descriptor_points_at_the_panic() {
        install_panic_hook();
        let divisor = std::hint::black_box(0);
        let expected_line = line!() + 1;
        let payload = panic::catch_unwind(|| 1 / divisor).unwrap_err();
        let descriptor = ExceptionDescriptor::from_panic(payload.as_ref());

        assert_eq!(descriptor.kind(), PANIC_KIND);
        assert_eq!(descriptor.msg(), "attempt to divide by zero");
        assert!(descriptor.file().ends_with("exception.rs"));
        assert_eq!(descriptor.line(), expected_line.to_string());
    }

    #[test]
    fn resumed_panic_keeps_its_location() {
        install_panic_hook();
        let inner = panic::catch_unwind(|| panic!("{}", String::from("boom"))).unwrap_err();
        let first = ExceptionDescriptor::from_panic(inner.as_ref());

        let outer = panic::catch_unwind(panic::AssertUnwindSafe(move || {
            panic::resume_unwind(inner);
        }))
        .unwrap_err();
        let second = ExceptionDescriptor::from_panic(outer.as_ref());

        assert_eq!(first.msg(), "boom");
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_location_without_a_hooked_panic() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let descriptor = std::thread::spawn(move || ExceptionDescriptor::from_panic(payload.as_ref()))
            .join()
            .unwrap();

        assert_eq!(descriptor.msg(), "boom");
        assert_eq!(descriptor.file(), UNKNOWN_FILE);
        assert_eq!(descriptor.line(), "0");
    }

    #[test]
    fn type_names_are_shortened() {
        assert_eq!(short_type_name("core::num::error::ParseIntError"), "ParseIntError");
        assert_eq!(short_type_name("std::io::error::Error"), "io::Error");
        assert_eq!(short_type_name("serde_json::error::Error"), "serde_json::Error");
        assert_eq!(short_type_name("my_crate::Wrapper<u8>"), "Wrapper");
        assert_eq!(short_type_name("MyError"), "MyError");
    }

    #[test]
    fn pointers_are_looked_through() {
        assert_eq!(
            strip_pointers("alloc::boxed::Box<alloc::sync::Arc<std::io::error::Error>>"),
            "std::io::error::Error"
        );
        assert_eq!(
            strip_pointers("alloc::boxed::Box<dyn core::error::Error + core::marker::Send>"),
            "dyn core::error::Error + core::marker::Send"
        );
        assert_eq!(
            strip_pointers("alloc::boxed::Box<my_crate::Pair<u8, u8>, alloc::alloc::Global>"),
            "my_crate::Pair<u8, u8>"
        );
        assert_eq!(strip_pointers("my_crate::Wrapper<u8>"), "my_crate::Wrapper<u8>");
    }

    #[test]
    fn boxed_errors_report_the_inner_kind() {
        let location = Location::caller();

        let boxed: Box<dyn std::error::Error> = "x".parse::<i32>().unwrap_err().into();
        let descriptor = ExceptionDescriptor::from_error(&boxed, location);
        assert_eq!(descriptor.kind(), "ParseIntError");
        assert_eq!(descriptor.msg(), "invalid digit found in string");

        let io = std::io::Error::other("disk on fire");
        assert_eq!(ExceptionDescriptor::from_error(&io, location).kind(), "io::Error");

        let shared = std::sync::Arc::new(std::io::Error::other("disk on fire"));
        assert_eq!(ExceptionDescriptor::from_error(&shared, location).kind(), "io::Error");

        let message: Box<dyn std::error::Error + Send + Sync> = "plain text".into();
        assert_eq!(ExceptionDescriptor::from_error(&message, location).kind(), "Error");
    }

    #[test]
    fn cleared_location_is_unknown() {
        install_panic_hook();
        let payload = panic::catch_unwind(|| panic!("hooked")).unwrap_err();
        clear_panic_location();

        let descriptor = ExceptionDescriptor::from_panic(payload.as_ref());
        assert_eq!(descriptor.file(), UNKNOWN_FILE);
        assert_eq!(descriptor.line(), "0");
    }

    #[test]
    fn serialized_with_type_key() {
        let descriptor = ExceptionDescriptor::new("ZeroDivision", "division by zero", "lib.rs", 170);
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({"type": "ZeroDivision", "msg": "division by zero", "file": "lib.rs", "line": "170"})
        );
        assert_eq!(
            serde_json::to_value(descriptor.to_datum()).unwrap(),
            serde_json::to_value(&descriptor).unwrap()
        );
    }
}
