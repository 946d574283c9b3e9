//! The underlying value domain.
//!
//! A [`Datum`] is what a property produces on deserialize and consumes on
//! serialize. It is dynamic on purpose: properties check at runtime that a
//! value is one of their underlying kinds, so that a boolean handed to an
//! integer field is rejected instead of being silently accepted.
//!
//! Typed Rust values move in and out through [`IntoDatum`] and [`FromDatum`].
//!
//! # Examples
//!
//! ```
//! use tx_property::{Datum, DatumKinds, FromDatum, IntoDatum};
//!
//! let datum = vec![1_i64, 2, 3].into_datum();
//! assert_eq!(datum.kinds(), DatumKinds::LIST);
//!
//! let back = Vec::<i64>::from_datum(datum).unwrap();
//! assert_eq!(back, [1, 2, 3]);
//! ```

// -----------------------------------------------------------------------------
// Modules

mod collections;
mod convert;
mod hash;
mod kinds;
mod object;

// -----------------------------------------------------------------------------
// Exports

pub use collections::{DatumMap, DatumSet};
pub use convert::{FromDatum, IntoDatum};
pub use kinds::{DatumKinds, ValueKinds};
pub use object::{DataObject, ObjectBox};

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::model::Model;
use crate::property::{LinkByUid, SymbolValue};
use crate::{PropertyError, PropertyResult};

// -----------------------------------------------------------------------------
// Datum

/// A dynamically typed underlying value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Uuid(uuid::Uuid),
    DateTime(DateTime<Utc>),
    /// Caller-controlled JSON, passed through unchanged.
    Json(Value),
    List(Vec<Datum>),
    Set(DatumSet),
    Map(DatumMap),
    Symbol(SymbolValue),
    Link(LinkByUid),
    Object(ObjectBox),
}

impl Datum {
    /// Wraps a model object.
    #[inline]
    pub fn object<T: DataObject>(object: T) -> Self {
        Self::Object(ObjectBox::new(object))
    }

    /// Returns the single kind of this value.
    pub fn kinds(&self) -> DatumKinds {
        match self {
            Self::Null => DatumKinds::NULL,
            Self::Bool(_) => DatumKinds::BOOL,
            Self::Int(_) => DatumKinds::INT,
            Self::Float(_) => DatumKinds::FLOAT,
            Self::Str(_) => DatumKinds::STR,
            Self::Uuid(_) => DatumKinds::UUID,
            Self::DateTime(_) => DatumKinds::DATETIME,
            Self::Json(_) => DatumKinds::JSON,
            Self::List(_) => DatumKinds::LIST,
            Self::Set(_) => DatumKinds::SET,
            Self::Map(_) => DatumKinds::MAP,
            Self::Symbol(_) => DatumKinds::SYMBOL,
            Self::Link(_) => DatumKinds::LINK,
            Self::Object(_) => DatumKinds::OBJECT,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Python-style truthiness: empty, zero and null values are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(x) => *x != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Json(v) => value_is_truthy(v),
            Self::List(items) => !items.is_empty(),
            Self::Set(set) => !set.is_empty(),
            Self::Map(map) => !map.is_empty(),
            Self::Uuid(_) | Self::DateTime(_) | Self::Symbol(_) | Self::Link(_) | Self::Object(_) => {
                true
            }
        }
    }

    /// Returns the elements of a list or set.
    pub fn elements(&self) -> Option<&[Datum]> {
        match self {
            Self::List(items) => Some(items),
            Self::Set(set) => Some(set.as_slice()),
            _ => None,
        }
    }

    /// Converts plain data (null, scalars, raw JSON, lists and string-keyed
    /// maps) to JSON. Returns `None` for anything else.
    pub fn to_plain_json(&self) -> Option<Value> {
        Some(match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(x) => Value::from(*x),
            Self::Str(s) => Value::String(s.clone()),
            Self::Json(v) => v.clone(),
            Self::List(_) | Self::Set(_) => {
                let items = self.elements().unwrap_or_default();
                Value::Array(items.iter().map(Self::to_plain_json).collect::<Option<_>>()?)
            }
            Self::Map(map) => {
                let mut out = Map::new();
                for (key, value) in map.iter() {
                    let Self::Str(key) = key else { return None };
                    out.insert(key.clone(), value.to_plain_json()?);
                }
                Value::Object(out)
            }
            _ => return None,
        })
    }

    /// Takes a model object out of this value.
    ///
    /// Objects of a registered subtype of a polymorphic `M` are wrapped
    /// into `M`.
    pub fn take_object<M: Model>(self) -> PropertyResult<M> {
        match self {
            Self::Object(object) => object.downcast::<M>(),
            other => Err(PropertyError::mismatch(other, M::schema().name())),
        }
    }
}

impl Default for Datum {
    #[inline]
    fn default() -> Self {
        Self::Null
    }
}

/// Python-style truthiness of a serialized value.
pub(crate) fn value_is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Uuid(id) => write!(f, "{id}"),
            Self::DateTime(at) => f.write_str(&at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Json(v) => write!(f, "{v}"),
            Self::List(items) => write_seq(f, "[", items, "]"),
            Self::Set(set) => write_seq(f, "{", set.as_slice(), "}"),
            Self::Map(map) => {
                f.write_str("{")?;
                for (index, (key, value)) in map.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Symbol(symbol) => write!(f, "{symbol}"),
            Self::Link(link) => write!(f, "{link}"),
            Self::Object(object) => write!(f, "{object:?}"),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Datum], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}
