use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;

use serde_json::Value;

use super::{Member, PropertyMeta, impl_meta_builder, meta_accessors};
use crate::{Datum, DatumKinds, FieldPath, Property, PropertyResult, ValueKinds};

/// A child property that also accepts null.
///
/// Null short-circuits both ways without reaching the child. An absent
/// field reads as null.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tx_property::property::{Integer, Optional, Property};
/// use tx_property::Datum;
///
/// let prop = Optional::new(Integer::new());
/// assert_eq!(prop.deserialize(&json!(null)).unwrap(), Datum::Null);
/// assert_eq!(prop.serialize(&Datum::Int(3)).unwrap(), json!(3));
/// ```
#[derive(Debug)]
pub struct Optional {
    meta: PropertyMeta,
    inner: Box<dyn Property>,
}

impl Optional {
    #[inline]
    pub fn at(path: impl Into<FieldPath>, inner: impl Property) -> Self {
        let mut meta = PropertyMeta::new(Some(path.into()));
        meta.set_optional();
        Self {
            meta,
            inner: Box::new(inner),
        }
    }

    #[inline]
    pub fn new(inner: impl Property) -> Self {
        let mut meta = PropertyMeta::new(None);
        meta.set_optional();
        Self {
            meta,
            inner: Box::new(inner),
        }
    }

    #[inline]
    pub fn inner(&self) -> &dyn Property {
        &*self.inner
    }
}

impl_meta_builder!(Optional);

impl Property for Optional {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        self.inner.underlying_kinds() | DatumKinds::NULL
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        self.inner.serialized_kinds() | ValueKinds::NULL
    }

    fn describe(&self) -> String {
        format!("Optional({})", self.inner.describe())
    }

    #[inline]
    fn admits(&self, value: &Datum) -> bool {
        value.is_null() || self.inner.admits(value)
    }

    #[inline]
    fn admits_serialized(&self, value: &Value) -> bool {
        value.is_null() || self.inner.admits_serialized(value)
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        match value {
            Datum::Null => Ok(Value::Null),
            other => self.inner.serialize(other),
        }
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        match value {
            Value::Null => Ok(Datum::Null),
            other => self.inner.deserialize(other),
        }
    }

    fn assign(&self, member: Member) -> PropertyResult<Datum> {
        match member {
            Member::Typed(Datum::Null) | Member::Serialized(Value::Null) => Ok(Datum::Null),
            other => self.inner.assign(other),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::Optional;
    use crate::property::{Integer, Member};
    use crate::{Datum, Property};

    #[test]
    fn optional_is_always_optional() {
        let prop = Optional::at("count", Integer::new());
        assert!(prop.meta().is_optional());
        assert_eq!(prop.read_from_container(&Map::new()).unwrap(), Datum::Null);
    }

    #[test]
    fn non_null_reaches_child() {
        let prop = Optional::new(Integer::new());
        assert!(prop.deserialize(&json!(true)).is_err());
        assert_eq!(
            prop.assign(Member::Serialized(json!("4"))).unwrap(),
            Datum::Int(4)
        );
        assert_eq!(prop.assign(Member::Typed(Datum::Null)).unwrap(), Datum::Null);
    }
}
