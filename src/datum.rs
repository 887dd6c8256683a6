//! Dynamic value model for journaled arguments and results.
//!
//! Arguments and results of arbitrary Rust types are captured as a [`Datum`]
//! before an encoder normalizes them into JSON primitives. Capture is cheap
//! for owned values and deferred for shared mutable handles: an
//! `Rc<RefCell<T>>` or `Arc<Mutex<T>>` argument becomes a [`Datum::Live`] view
//! that is only read when the record is encoded, after the call returned.
//! [`Datum::deep_copy`] resolves those views into an independent snapshot.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};

/// A captured value.
///
/// Only `Null`, `Bool`, the numbers, `Str`, `Seq` and `Map` serialize to JSON.
/// Every other variant must be normalized by an [`Encoder`](crate::Encoder)
/// first; serializing it directly is an error.
#[derive(Clone)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Seq(Vec<Datum>),
    Map(DatumMap),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Date and time without an offset.
    DateTime(NaiveDateTime),
    /// Date and time with a UTC offset.
    Timestamp(DateTime<FixedOffset>),
    Path(PathBuf),
    /// An object that describes its own serialization.
    Model(Rc<dyn Mappable>),
    /// A view over shared state, read when the datum is encoded.
    Live(Rc<dyn Fn() -> Datum>),
    /// A value with no representation, identified by its type name.
    Opaque(&'static str),
}

impl Datum {
    pub fn model<M: Mappable + 'static>(model: M) -> Self {
        Datum::Model(Rc::new(model))
    }

    pub fn live<F: Fn() -> Datum + 'static>(read: F) -> Self {
        Datum::Live(Rc::new(read))
    }

    /// Placeholder for a value that is never journaled, e.g. a dropped
    /// argument or a method receiver.
    pub fn opaque_of<T: ?Sized>(_value: &T) -> Self {
        Datum::Opaque(std::any::type_name::<T>())
    }

    /// Short name of the variant, or the type name for opaque values.
    pub fn kind(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Bool(_) => "bool",
            Datum::Int(_) | Datum::UInt(_) => "int",
            Datum::Float(_) => "float",
            Datum::Str(_) => "str",
            Datum::Seq(_) => "seq",
            Datum::Map(_) => "map",
            Datum::Date(_) => "date",
            Datum::Time(_) => "time",
            Datum::DateTime(_) => "datetime",
            Datum::Timestamp(_) => "timestamp",
            Datum::Path(_) => "path",
            Datum::Model(_) => "model",
            Datum::Live(_) => "live",
            Datum::Opaque(type_name) => *type_name,
        }
    }

    /// Independent copy of the current state. Live views are read now and
    /// replaced by their snapshot, recursively.
    pub fn deep_copy(&self) -> Datum {
        match self {
            Datum::Live(read) => read().deep_copy(),
            Datum::Seq(items) => Datum::Seq(items.iter().map(Datum::deep_copy).collect()),
            Datum::Map(map) => Datum::Map(
                map.iter()
                    .map(|(key, value)| (key.to_owned(), value.deep_copy()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn as_integer(&self) -> Option<i128> {
        match self {
            Datum::Int(v) => Some(i128::from(*v)),
            Datum::UInt(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Datum::Int(v) => Some(*v as f64),
            Datum::UInt(v) => Some(*v as f64),
            Datum::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_integer(), other.as_integer()) {
            return a == b;
        }
        if matches!(self, Datum::Float(_)) || matches!(other, Datum::Float(_)) {
            return match (self.as_float(), other.as_float()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
        }
        match (self, other) {
            (Datum::Null, Datum::Null) => true,
            (Datum::Bool(a), Datum::Bool(b)) => a == b,
            (Datum::Str(a), Datum::Str(b)) => a == b,
            (Datum::Seq(a), Datum::Seq(b)) => a == b,
            (Datum::Map(a), Datum::Map(b)) => a == b,
            (Datum::Date(a), Datum::Date(b)) => a == b,
            (Datum::Time(a), Datum::Time(b)) => a == b,
            (Datum::DateTime(a), Datum::DateTime(b)) => a == b,
            (Datum::Timestamp(a), Datum::Timestamp(b)) => a == b,
            (Datum::Path(a), Datum::Path(b)) => a == b,
            (Datum::Model(a), Datum::Model(b)) => Rc::ptr_eq(a, b),
            (Datum::Live(a), Datum::Live(b)) => Rc::ptr_eq(a, b),
            (Datum::Opaque(a), Datum::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("Null"),
            Datum::Bool(v) => write!(f, "{v}"),
            Datum::Int(v) => write!(f, "{v}"),
            Datum::UInt(v) => write!(f, "{v}"),
            Datum::Float(v) => write!(f, "{v:?}"),
            Datum::Str(v) => write!(f, "{v:?}"),
            Datum::Seq(items) => f.debug_list().entries(items).finish(),
            Datum::Map(map) => fmt::Debug::fmt(map, f),
            Datum::Date(v) => write!(f, "Date({v})"),
            Datum::Time(v) => write!(f, "Time({v})"),
            Datum::DateTime(v) => write!(f, "DateTime({v})"),
            Datum::Timestamp(v) => write!(f, "Timestamp({v})"),
            Datum::Path(v) => write!(f, "Path({})", v.display()),
            Datum::Model(model) => write!(f, "Model({:?})", model.to_mapping()),
            Datum::Live(read) => write!(f, "Live({:?})", read()),
            Datum::Opaque(type_name) => write!(f, "Opaque({type_name})"),
        }
    }
}

impl Serialize for Datum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Datum::Null => serializer.serialize_unit(),
            Datum::Bool(v) => serializer.serialize_bool(*v),
            Datum::Int(v) => serializer.serialize_i64(*v),
            Datum::UInt(v) => serializer.serialize_u64(*v),
            Datum::Float(v) => serializer.serialize_f64(*v),
            Datum::Str(v) => serializer.serialize_str(v),
            Datum::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Datum::Map(map) => map.serialize(serializer),
            other => Err(S::Error::custom(format!(
                "`{}` value is not JSON serializable",
                other.kind()
            ))),
        }
    }
}

impl From<serde_json::Value> for Datum {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Datum::Null,
            Value::Bool(v) => Datum::Bool(v),
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Datum::Int(v)
                } else if let Some(v) = n.as_u64() {
                    Datum::UInt(v)
                } else {
                    n.as_f64().map_or(Datum::Null, Datum::Float)
                }
            }
            Value::String(v) => Datum::Str(v),
            Value::Array(items) => Datum::Seq(items.into_iter().map(Datum::from).collect()),
            Value::Object(map) => Datum::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Datum::from(value)))
                    .collect(),
            ),
        }
    }
}

/// String-keyed mapping that keeps insertion order.
///
/// Equality ignores order, like a JSON object.
#[derive(Clone, Default)]
pub struct DatumMap {
    entries: Vec<(String, Datum)>,
}

impl DatumMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces in place; a replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: Datum) -> Option<Datum> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Datum> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Datum> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Datum> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Datum)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Datum> {
        self.entries.iter_mut().map(|(_, v)| v)
    }
}

impl PartialEq for DatumMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl fmt::Debug for DatumMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Serialize for DatumMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>> FromIterator<(K, Datum)> for DatumMap {
    fn from_iter<I: IntoIterator<Item = (K, Datum)>>(iter: I) -> Self {
        let mut map = DatumMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for DatumMap {
    type Item = (String, Datum);
    type IntoIter = std::vec::IntoIter<(String, Datum)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Capability of an object to describe itself as a plain mapping.
///
/// ```
/// use callable_journal::{Datum, DatumMap, Mappable, ToDatum};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Mappable for Point {
///     fn to_mapping(&self) -> DatumMap {
///         [("x", self.x.to_datum()), ("y", self.y.to_datum())]
///             .into_iter()
///             .collect()
///     }
/// }
///
/// let point = Datum::model(Point { x: 1, y: 2 });
/// assert_eq!(point.kind(), "model");
/// ```
pub trait Mappable {
    fn to_mapping(&self) -> DatumMap;
}

/// Conversion of a Rust value into a [`Datum`].
pub trait ToDatum {
    fn to_datum(&self) -> Datum;
}

impl ToDatum for Datum {
    fn to_datum(&self) -> Datum {
        self.clone()
    }
}

impl ToDatum for DatumMap {
    fn to_datum(&self) -> Datum {
        Datum::Map(self.clone())
    }
}

impl ToDatum for serde_json::Value {
    fn to_datum(&self) -> Datum {
        Datum::from(self.clone())
    }
}

impl ToDatum for () {
    fn to_datum(&self) -> Datum {
        Datum::Null
    }
}

impl ToDatum for bool {
    fn to_datum(&self) -> Datum {
        Datum::Bool(*self)
    }
}

macro_rules! impl_to_datum_as {
    ($variant:ident, $target:ty: $($t:ty),*) => {
        $(
            impl ToDatum for $t {
                fn to_datum(&self) -> Datum {
                    Datum::$variant(*self as $target)
                }
            }
        )*
    };
}

impl_to_datum_as!(Int, i64: i8, i16, i32, i64, isize);
impl_to_datum_as!(UInt, u64: u8, u16, u32, u64, usize);
impl_to_datum_as!(Float, f64: f32, f64);

impl ToDatum for char {
    fn to_datum(&self) -> Datum {
        Datum::Str(self.to_string())
    }
}

impl ToDatum for str {
    fn to_datum(&self) -> Datum {
        Datum::Str(self.to_owned())
    }
}

impl ToDatum for String {
    fn to_datum(&self) -> Datum {
        Datum::Str(self.clone())
    }
}

impl<T: ToDatum + ?Sized> ToDatum for &T {
    fn to_datum(&self) -> Datum {
        (**self).to_datum()
    }
}

impl<T: ToDatum + ?Sized> ToDatum for &mut T {
    fn to_datum(&self) -> Datum {
        (**self).to_datum()
    }
}

impl<T: ToDatum + ?Sized> ToDatum for Box<T> {
    fn to_datum(&self) -> Datum {
        (**self).to_datum()
    }
}

impl<T: ToDatum> ToDatum for Option<T> {
    fn to_datum(&self) -> Datum {
        self.as_ref().map_or(Datum::Null, ToDatum::to_datum)
    }
}

impl<T: ToDatum> ToDatum for [T] {
    fn to_datum(&self) -> Datum {
        Datum::Seq(self.iter().map(ToDatum::to_datum).collect())
    }
}

impl<T: ToDatum, const N: usize> ToDatum for [T; N] {
    fn to_datum(&self) -> Datum {
        self.as_slice().to_datum()
    }
}

impl<T: ToDatum> ToDatum for Vec<T> {
    fn to_datum(&self) -> Datum {
        self.as_slice().to_datum()
    }
}

impl<T: ToDatum> ToDatum for VecDeque<T> {
    fn to_datum(&self) -> Datum {
        Datum::Seq(self.iter().map(ToDatum::to_datum).collect())
    }
}

impl<K: fmt::Display, V: ToDatum> ToDatum for BTreeMap<K, V> {
    fn to_datum(&self) -> Datum {
        Datum::Map(
            self.iter()
                .map(|(key, value)| (key.to_string(), value.to_datum()))
                .collect(),
        )
    }
}

impl<K: fmt::Display, V: ToDatum, S: BuildHasher> ToDatum for HashMap<K, V, S> {
    fn to_datum(&self) -> Datum {
        Datum::Map(
            self.iter()
                .map(|(key, value)| (key.to_string(), value.to_datum()))
                .collect(),
        )
    }
}

macro_rules! impl_to_datum_tuple {
    ($($name:ident)+) => {
        impl<$($name: ToDatum),+> ToDatum for ($($name,)+) {
            #[allow(non_snake_case)]
            fn to_datum(&self) -> Datum {
                let ($($name,)+) = self;
                Datum::Seq(vec![$($name.to_datum()),+])
            }
        }
    };
}

impl_to_datum_tuple!(A);
impl_to_datum_tuple!(A B);
impl_to_datum_tuple!(A B C);
impl_to_datum_tuple!(A B C D);
impl_to_datum_tuple!(A B C D E);
impl_to_datum_tuple!(A B C D E F);

impl ToDatum for NaiveDate {
    fn to_datum(&self) -> Datum {
        Datum::Date(*self)
    }
}

impl ToDatum for NaiveTime {
    fn to_datum(&self) -> Datum {
        Datum::Time(*self)
    }
}

impl ToDatum for NaiveDateTime {
    fn to_datum(&self) -> Datum {
        Datum::DateTime(*self)
    }
}

impl<Tz: TimeZone> ToDatum for DateTime<Tz> {
    fn to_datum(&self) -> Datum {
        Datum::Timestamp(self.fixed_offset())
    }
}

impl ToDatum for Path {
    fn to_datum(&self) -> Datum {
        Datum::Path(self.to_path_buf())
    }
}

impl ToDatum for PathBuf {
    fn to_datum(&self) -> Datum {
        Datum::Path(self.clone())
    }
}

impl<T: ToDatum + 'static> ToDatum for Rc<RefCell<T>> {
    fn to_datum(&self) -> Datum {
        let handle = Rc::clone(self);
        Datum::live(move || handle.borrow().to_datum())
    }
}

impl<T: ToDatum + 'static> ToDatum for Arc<Mutex<T>> {
    fn to_datum(&self) -> Datum {
        let handle = Arc::clone(self);
        Datum::live(move || {
            handle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .to_datum()
        })
    }
}

impl<T: ToDatum + 'static> ToDatum for Arc<RwLock<T>> {
    fn to_datum(&self) -> Datum {
        let handle = Arc::clone(self);
        Datum::live(move || {
            handle
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .to_datum()
        })
    }
}
