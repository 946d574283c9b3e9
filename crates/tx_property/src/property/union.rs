use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use serde_json::Value;

use super::{Member, PropertyMeta, impl_meta_builder, meta_accessors};
use crate::{Datum, DatumKinds, FieldPath, Property, PropertyError, PropertyResult, ValueKinds};

/// One of several alternative properties, tried in declared order.
///
/// The first alternative whose type check passes and whose conversion
/// succeeds wins. If none does, the value is rejected with
/// [`PropertyError::ExhaustedAlternatives`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tx_property::property::{Integer, Property, Str, Union};
/// use tx_property::Datum;
///
/// let prop = Union::new().or(Integer::new()).or(Str::new());
/// assert_eq!(prop.deserialize(&json!("12")).unwrap(), Datum::Int(12));
/// assert_eq!(prop.deserialize(&json!("twelve")).unwrap(), Datum::Str("twelve".into()));
/// ```
#[derive(Debug)]
pub struct Union {
    meta: PropertyMeta,
    alternatives: Vec<Box<dyn Property>>,
}

impl Union {
    /// A union without alternatives, see [`or`](Union::or).
    #[inline]
    pub fn at(path: impl Into<FieldPath>) -> Self {
        Self {
            meta: PropertyMeta::new(Some(path.into())),
            alternatives: Vec::new(),
        }
    }

    #[inline]
    pub fn new() -> Self {
        Self {
            meta: PropertyMeta::new(None),
            alternatives: Vec::new(),
        }
    }

    /// Appends an alternative.
    #[inline]
    pub fn or(mut self, alternative: impl Property) -> Self {
        self.alternatives.push(Box::new(alternative));
        self
    }

    #[inline]
    pub fn alternatives(&self) -> impl ExactSizeIterator<Item = &dyn Property> {
        self.alternatives.iter().map(|alt| &**alt)
    }

    fn exhausted(&self, value: impl core::fmt::Display) -> PropertyError {
        PropertyError::ExhaustedAlternatives {
            value: value.to_string(),
            attempted: self.describe(),
        }
    }
}

impl_meta_builder!(Union);

impl Property for Union {
    meta_accessors!();

    fn underlying_kinds(&self) -> DatumKinds {
        self.alternatives
            .iter()
            .fold(DatumKinds::empty(), |kinds, alt| kinds | alt.underlying_kinds())
    }

    fn serialized_kinds(&self) -> ValueKinds {
        self.alternatives
            .iter()
            .fold(ValueKinds::empty(), |kinds, alt| kinds | alt.serialized_kinds())
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self.alternatives.iter().map(|alt| alt.describe()).collect();
        format!("Union({})", names.join(", "))
    }

    fn admits(&self, value: &Datum) -> bool {
        self.alternatives.iter().any(|alt| alt.admits(value))
    }

    fn admits_serialized(&self, value: &Value) -> bool {
        self.alternatives.iter().any(|alt| alt.admits_serialized(value))
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        self.alternatives
            .iter()
            .filter(|alt| alt.admits(value))
            .find_map(|alt| alt.serialize(value).ok())
            .ok_or_else(|| self.exhausted(value))
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        self.alternatives
            .iter()
            .filter(|alt| alt.admits_serialized(value))
            .find_map(|alt| alt.deserialize(value).ok())
            .ok_or_else(|| self.exhausted(value))
    }

    fn serialize(&self, value: &Datum) -> PropertyResult<Value> {
        self.encode(value)
    }

    fn deserialize(&self, value: &Value) -> PropertyResult<Datum> {
        self.decode(value)
    }

    fn assign(&self, member: Member) -> PropertyResult<Datum> {
        let shown = member.to_string();
        self.alternatives
            .iter()
            .find_map(|alt| alt.assign(member.clone()).ok())
            .ok_or_else(|| self.exhausted(shown))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Union;
    use crate::property::{Float, Integer, Member, Str};
    use crate::{Datum, Property, PropertyError};

    #[test]
    fn first_alternative_wins() {
        let prop = Union::new().or(Float::new()).or(Integer::new());
        assert_eq!(prop.deserialize(&json!(3)).unwrap(), Datum::Float(3.0));

        let prop = Union::new().or(Integer::new()).or(Float::new());
        assert_eq!(prop.deserialize(&json!(3)).unwrap(), Datum::Int(3));
        assert_eq!(prop.deserialize(&json!(3.5)).unwrap(), Datum::Float(3.5));
    }

    #[test]
    fn failing_alternative_is_skipped() {
        let prop = Union::new().or(Integer::new()).or(Str::new());
        assert_eq!(
            prop.deserialize(&json!("3.5")).unwrap(),
            Datum::Str("3.5".into())
        );
        assert_eq!(
            prop.assign(Member::Typed(Datum::Str("x".into()))).unwrap(),
            Datum::Str("x".into())
        );
    }

    #[test]
    fn exhausted_alternatives() {
        let prop = Union::new().or(Integer::new()).or(Str::new());
        let err = prop.serialize(&Datum::Bool(true)).unwrap_err();
        assert!(matches!(err, PropertyError::ExhaustedAlternatives { .. }));
        assert!(err.to_string().contains("Union(Integer, String)"));
    }
}
