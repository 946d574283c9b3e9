//! Dot-separated serialization paths.
//!
//! A [`FieldPath`] such as `"data.instance.name"` locates a value inside
//! nested mappings. Keys containing a literal `.` cannot be addressed.

use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use serde_json::{Map, Value};

use crate::property::Property;
use crate::{Datum, PropertyError, PropertyResult};

// -----------------------------------------------------------------------------
// FieldPath

/// A dot-separated sequence of mapping keys.
///
/// # Examples
///
/// ```
/// use tx_property::FieldPath;
///
/// let path = FieldPath::new("data.instance.name");
/// assert_eq!(path.segments().collect::<Vec<_>>(), ["data", "instance", "name"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: Cow<'static, str>,
}

impl FieldPath {
    #[inline]
    pub fn new(raw: impl Into<Cow<'static, str>>) -> Self {
        Self { raw: raw.into() }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Iterates the keys from the outermost mapping inwards.
    #[inline]
    pub fn segments(&self) -> core::str::Split<'_, char> {
        self.raw.split('.')
    }
}

impl From<&'static str> for FieldPath {
    #[inline]
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldPath {
    #[inline]
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for FieldPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// -----------------------------------------------------------------------------
// Container access

/// Reads `prop` out of `container` by walking its path.
///
/// A missing or null segment, intermediate or terminal, ends the walk: the
/// property's default (or null, for optional properties) is returned, or
/// [`PropertyError::MissingField`] if it has neither.
pub(crate) fn read<P>(prop: &P, container: &Map<String, Value>) -> PropertyResult<Datum>
where
    P: Property + ?Sized,
{
    let meta = prop.meta();
    let path = meta.path().ok_or(PropertyError::MissingPath { class: None })?;
    let segments: Vec<&str> = path.segments().collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(PropertyError::MissingPath { class: None });
    };

    let missing = |segment: &str| {
        meta.fallback().ok_or_else(|| PropertyError::MissingField {
            segment: segment.to_string(),
            path: path.to_string(),
            container: Value::Object(container.clone()).to_string(),
        })
    };

    let mut current = container;
    for segment in parents {
        match current.get(*segment) {
            None | Some(Value::Null) => return missing(segment),
            Some(Value::Object(inner)) => current = inner,
            Some(other) => return Err(PropertyError::mismatch(other, "a mapping")),
        }
    }

    match current.get(*last) {
        None | Some(Value::Null) => missing(last),
        Some(value) => prop.deserialize(value),
    }
}

/// Serializes `value` and writes it at the path of `prop`, creating
/// intermediate mappings as needed.
pub(crate) fn write<'a, P>(
    prop: &P,
    container: &'a mut Map<String, Value>,
    value: &Datum,
) -> PropertyResult<&'a mut Map<String, Value>>
where
    P: Property + ?Sized,
{
    let path = prop
        .meta()
        .path()
        .ok_or(PropertyError::MissingPath { class: None })?;
    let serialized = prop.serialize(value)?;
    let segments: Vec<&str> = path.segments().collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(PropertyError::MissingPath { class: None });
    };

    let mut current = &mut *container;
    for segment in parents {
        let slot = current.entry(*segment).or_insert(Value::Null);
        if slot.is_null() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(inner) => inner,
            _ => {
                return Err(PropertyError::PathConflict {
                    segment: segment.to_string(),
                    path: path.to_string(),
                });
            }
        };
    }
    current.insert(last.to_string(), serialized);

    Ok(container)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use crate::property::{Integer, Property, Str};
    use crate::{Datum, PropertyError};

    fn object(value: serde_json::Value) -> Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn read_nested() {
        let prop = Str::at("data.instance.name");
        let container = object(json!({ "data": { "instance": { "name": "x" } } }));
        assert_eq!(
            prop.read_from_container(&container).unwrap(),
            Datum::Str("x".into())
        );
    }

    #[test]
    fn missing_segment_uses_default() {
        let prop = Integer::at("data.count").default(3_i64);
        let container = object(json!({ "data": null }));
        assert_eq!(prop.read_from_container(&container).unwrap(), Datum::Int(3));
    }

    #[test]
    fn missing_segment_is_named() {
        let prop = Integer::at("data.count");
        let container = object(json!({ "data": { "other": 1 } }));
        let err = prop.read_from_container(&container).unwrap_err();
        assert!(matches!(
            err,
            PropertyError::MissingField { ref segment, .. } if segment == "count"
        ));
    }

    #[test]
    fn null_default_is_not_a_default() {
        let prop = Integer::at("count").default(Datum::Null);
        assert!(prop.read_from_container(&Map::new()).is_err());

        let prop = Integer::at("count").optional();
        assert_eq!(prop.read_from_container(&Map::new()).unwrap(), Datum::Null);
    }

    #[test]
    fn write_creates_intermediates() {
        let prop = Integer::at("a.b.c");
        let mut container = object(json!({ "a": { "x": 1 } }));
        prop.write_into_container(&mut container, &Datum::Int(5))
            .unwrap();
        assert_eq!(
            serde_json::Value::Object(container),
            json!({ "a": { "x": 1, "b": { "c": 5 } } })
        );
    }

    #[test]
    fn write_refuses_scalar_intermediate() {
        let prop = Integer::at("a.b");
        let mut container = object(json!({ "a": 1 }));
        let err = prop
            .write_into_container(&mut container, &Datum::Int(5))
            .unwrap_err();
        assert!(matches!(err, PropertyError::PathConflict { .. }));
    }

    #[test]
    fn write_requires_path() {
        let prop = Integer::new();
        let err = prop
            .write_into_container(&mut Map::new(), &Datum::Int(5))
            .unwrap_err();
        assert!(matches!(err, PropertyError::MissingPath { .. }));
    }
}
