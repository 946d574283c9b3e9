use alloc::string::{String, ToString};

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{PropertyMeta, expected, impl_meta_builder, meta_accessors};
use crate::model::Model;
use crate::{Datum, DatumKinds, FieldPath, FromDatum, IntoDatum, Property, PropertyError, PropertyResult, ValueKinds};

// -----------------------------------------------------------------------------
// LinkByUid

/// A lightweight reference to an object by scope and id.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tx_property::property::LinkByUid;
///
/// let link = LinkByUid::new("id", "7");
/// assert_eq!(
///     serde_json::to_value(&link).unwrap(),
///     json!({ "type": "link_by_uid", "scope": "id", "id": "7" }),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename = "link_by_uid")]
pub struct LinkByUid {
    pub scope: String,
    pub id: String,
}

impl LinkByUid {
    /// The discriminator value of a serialized link.
    pub const TYPE: &'static str = "link_by_uid";

    #[inline]
    pub fn new(scope: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for LinkByUid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link({}: {})", self.scope, self.id)
    }
}

impl IntoDatum for LinkByUid {
    #[inline]
    fn into_datum(self) -> Datum {
        Datum::Link(self)
    }
}

impl FromDatum for LinkByUid {
    fn from_datum(datum: Datum) -> PropertyResult<Self> {
        match datum {
            Datum::Link(link) => Ok(link),
            other => Err(PropertyError::mismatch(other, "link")),
        }
    }
}

// -----------------------------------------------------------------------------
// LinkOr

/// Either a link or a full object of `M`, the typed value of a
/// [`LinkOrElse`] field.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkOr<M> {
    Link(LinkByUid),
    Object(M),
}

impl<M: Model> IntoDatum for LinkOr<M> {
    #[inline]
    fn into_datum(self) -> Datum {
        match self {
            Self::Link(link) => Datum::Link(link),
            Self::Object(object) => Datum::object(object),
        }
    }
}

impl<M: Model> FromDatum for LinkOr<M> {
    fn from_datum(datum: Datum) -> PropertyResult<Self> {
        match datum {
            Datum::Link(link) => Ok(Self::Link(link)),
            Datum::Object(object) => object.downcast::<M>().map(Self::Object),
            other => Err(PropertyError::mismatch(other, "link or object")),
        }
    }
}

// -----------------------------------------------------------------------------
// LinkOrElse

/// A field holding either a full object or a [`LinkByUid`].
///
/// Both serialize: a link to its reference form, an object through its own
/// serialization method. Only links deserialize. Anything that is not a
/// link is rejected with [`PropertyError::NotLinkable`]; rebuilding the
/// full object is left to the caller's own build logic.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tx_property::property::{LinkByUid, LinkOrElse, Property};
/// use tx_property::{Datum, PropertyError};
///
/// let prop = LinkOrElse::new();
/// let link = prop
///     .deserialize(&json!({ "type": "link_by_uid", "scope": "id", "id": "7" }))
///     .unwrap();
/// assert_eq!(link, Datum::Link(LinkByUid::new("id", "7")));
///
/// let err = prop.deserialize(&json!({ "type": "material_run" })).unwrap_err();
/// assert!(matches!(err, PropertyError::NotLinkable { .. }));
/// ```
#[derive(Debug)]
pub struct LinkOrElse {
    meta: PropertyMeta,
}

impl LinkOrElse {
    #[inline]
    pub fn at(path: impl Into<FieldPath>) -> Self {
        Self {
            meta: PropertyMeta::new(Some(path.into())),
        }
    }

    #[inline]
    pub fn new() -> Self {
        Self {
            meta: PropertyMeta::new(None),
        }
    }
}

impl_meta_builder!(LinkOrElse);

impl Property for LinkOrElse {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::LINK | DatumKinds::OBJECT
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::OBJECT
    }

    fn describe(&self) -> String {
        "LinkOrElse".into()
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        match value {
            Datum::Link(link) => serde_json::to_value(link)
                .map_err(|e| PropertyError::malformed(link, "LinkByUid", e)),
            Datum::Object(object) => object.dump_object(),
            other => Err(PropertyError::mismatch(other, expected(self))),
        }
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        let Value::Object(map) = value else {
            return Err(PropertyError::mismatch(value, "object"));
        };
        if map.get("type").and_then(Value::as_str) != Some(LinkByUid::TYPE) {
            return Err(PropertyError::NotLinkable {
                value: value.to_string(),
            });
        }
        for field in ["scope", "id"] {
            if map.get(field).is_none_or(Value::is_null) {
                return Err(PropertyError::MissingReference {
                    field,
                    value: value.to_string(),
                });
            }
        }
        serde_json::from_value::<LinkByUid>(value.clone())
            .map(Datum::Link)
            .map_err(|e| PropertyError::malformed(value, "LinkByUid", e))
    }
}

// -----------------------------------------------------------------------------
// Tests
