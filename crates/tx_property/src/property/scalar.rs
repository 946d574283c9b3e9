use alloc::string::{String, ToString};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::{PropertyMeta, expected, expected_serialized, impl_meta_builder, meta_accessors};
use crate::datum::value_is_truthy;
use crate::{Datum, DatumKinds, FieldPath, Property, PropertyError, PropertyResult, ValueKinds};

// -----------------------------------------------------------------------------
// Scalar kinds

macro_rules! scalar_kind {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            meta: PropertyMeta,
        }

        impl $name {
            /// A property located at `path`.
            #[inline]
            pub fn at(path: impl Into<FieldPath>) -> Self {
                Self {
                    meta: PropertyMeta::new(Some(path.into())),
                }
            }

            /// A path-less property, for use inside another property.
            #[inline]
            pub fn new() -> Self {
                Self {
                    meta: PropertyMeta::new(None),
                }
            }
        }

        impl_meta_builder!($name);
    };
}

scalar_kind! {
    /// A 64-bit integer.
    ///
    /// Numeric strings are parsed. Booleans are rejected both ways, and so
    /// are fractional numbers.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use tx_property::property::{Integer, Property};
    /// use tx_property::Datum;
    ///
    /// let prop = Integer::new();
    /// assert_eq!(prop.deserialize(&json!(" 42 ")).unwrap(), Datum::Int(42));
    /// assert!(prop.deserialize(&json!(true)).is_err());
    /// assert!(prop.serialize(&Datum::Bool(true)).is_err());
    /// ```
    Integer
}

scalar_kind! {
    /// A finite 64-bit float. Integers and numeric strings are accepted on
    /// decode; NaN and infinities are rejected both ways.
    Float
}

scalar_kind! {
    /// A string.
    ///
    /// Deserializing null yields the default, and fails without one.
    Str
}

scalar_kind! {
    /// A boolean coerced by truthiness.
    ///
    /// Any value is accepted: empty, zero and null values are `false`,
    /// everything else is `true`. Note that the string `"false"` is `true`.
    Boolean
}

scalar_kind! {
    /// A UUID in its canonical hyphenated string form.
    Uuid
}

scalar_kind! {
    /// A UTC timestamp, serialized as milliseconds since the epoch.
    ///
    /// Decoding accepts integer or float milliseconds, RFC 3339 strings,
    /// naive `YYYY-MM-DDTHH:MM:SS[.f]` strings taken as UTC, and plain
    /// dates.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use tx_property::property::{Datetime, Property};
    ///
    /// let prop = Datetime::new();
    /// let at = prop.deserialize(&json!("2020-01-01T00:00:00+00:00")).unwrap();
    /// assert_eq!(prop.serialize(&at).unwrap(), json!(1577836800000_i64));
    /// ```
    Datetime
}

scalar_kind! {
    /// Caller-controlled JSON, passed through unchanged.
    Raw
}

// -----------------------------------------------------------------------------
// Integer

impl Property for Integer {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::INT
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::INT | ValueKinds::STRING
    }

    fn describe(&self) -> String {
        "Integer".into()
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        match value {
            Datum::Int(i) => Ok(Value::from(*i)),
            other => Err(PropertyError::mismatch(other, expected(self))),
        }
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Datum::Int)
                .ok_or_else(|| PropertyError::malformed(n, "Integer", "out of range")),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Datum::Int)
                .map_err(|e| PropertyError::malformed(s, "Integer", e)),
            other => Err(PropertyError::mismatch(other, "int")),
        }
    }
}

// -----------------------------------------------------------------------------
// Float

impl Property for Float {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::FLOAT
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::FLOAT | ValueKinds::INT | ValueKinds::STRING
    }

    fn describe(&self) -> String {
        "Float".into()
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        match value {
            Datum::Float(x) if x.is_finite() => Ok(Value::from(*x)),
            Datum::Float(x) => Err(PropertyError::malformed(x, "Float", "not finite")),
            other => Err(PropertyError::mismatch(other, expected(self))),
        }
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(Datum::Float)
                .ok_or_else(|| PropertyError::malformed(n, "Float", "not representable")),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(Datum::Float(x)),
                Ok(_) => Err(PropertyError::malformed(s, "Float", "not finite")),
                Err(e) => Err(PropertyError::malformed(s, "Float", e)),
            },
            other => Err(PropertyError::mismatch(other, "float")),
        }
    }
}

// -----------------------------------------------------------------------------
// Str

impl Property for Str {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::STR
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::STRING
    }

    fn describe(&self) -> String {
        "String".into()
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        match value {
            Datum::Str(s) => Ok(Value::String(s.clone())),
            other => Err(PropertyError::mismatch(other, expected(self))),
        }
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        match value {
            Value::String(s) => Ok(Datum::Str(s.clone())),
            other => Err(PropertyError::mismatch(other, "string")),
        }
    }

    fn deserialize(&self, value: &Value) -> PropertyResult<Datum> {
        if value.is_null()
            && let Some(default) = self.meta.default_value()
        {
            return Ok(default.clone());
        }
        if !self.admits_serialized(value) {
            return Err(PropertyError::mismatch(value, expected_serialized(self)));
        }
        self.decode(value)
    }
}

// -----------------------------------------------------------------------------
// Boolean

impl Property for Boolean {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::all()
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::all()
    }

    fn describe(&self) -> String {
        "Boolean".into()
    }

    #[inline]
    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        Ok(Value::Bool(value.is_truthy()))
    }

    #[inline]
    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        Ok(Datum::Bool(value_is_truthy(value)))
    }
}

// -----------------------------------------------------------------------------
// Uuid

impl Property for Uuid {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::UUID
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::STRING
    }

    fn describe(&self) -> String {
        "UUID".into()
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        match value {
            Datum::Uuid(id) => Ok(Value::String(id.hyphenated().to_string())),
            other => Err(PropertyError::mismatch(other, expected(self))),
        }
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        match value {
            Value::String(s) => uuid::Uuid::parse_str(s)
                .map(Datum::Uuid)
                .map_err(|e| PropertyError::malformed(s, "UUID", e)),
            other => Err(PropertyError::mismatch(other, "string")),
        }
    }
}

// -----------------------------------------------------------------------------
// Datetime

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// `round(seconds * 1000)` without going through a float.
fn epoch_millis(at: &DateTime<Utc>) -> i64 {
    let rounded = (i64::from(at.timestamp_subsec_nanos()) + 500_000) / 1_000_000;
    at.timestamp() * 1000 + rounded
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(at.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(s, format) {
            return Some(at.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

fn from_float_millis(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    let micros = (ms * 1000.0).round() as i64;
    DateTime::from_timestamp_micros(micros)
}

impl Property for Datetime {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::DATETIME
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::INT | ValueKinds::FLOAT | ValueKinds::STRING
    }

    fn describe(&self) -> String {
        "Datetime".into()
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        match value {
            Datum::DateTime(at) => Ok(Value::from(epoch_millis(at))),
            other => Err(PropertyError::mismatch(other, expected(self))),
        }
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        let at = match value {
            Value::Number(n) => match n.as_i64() {
                Some(ms) => DateTime::from_timestamp_millis(ms),
                None => n.as_f64().and_then(from_float_millis),
            },
            Value::String(s) => parse_timestamp(s),
            other => return Err(PropertyError::mismatch(other, "epoch milliseconds or timestamp")),
        };
        at.map(Datum::DateTime).ok_or_else(|| {
            PropertyError::malformed(value, "Datetime", "not a valid timestamp")
        })
    }
}

// -----------------------------------------------------------------------------
// Raw

impl Property for Raw {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::NULL
            | DatumKinds::BOOL
            | DatumKinds::INT
            | DatumKinds::FLOAT
            | DatumKinds::STR
            | DatumKinds::JSON
            | DatumKinds::LIST
            | DatumKinds::MAP
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::all()
    }

    fn describe(&self) -> String {
        "Raw".into()
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        value
            .to_plain_json()
            .ok_or_else(|| PropertyError::mismatch(value, "plain data"))
    }

    #[inline]
    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        Ok(match value {
            Value::Null => Datum::Null,
            other => Datum::Json(other.clone()),
        })
    }
}

// -----------------------------------------------------------------------------
// Tests
