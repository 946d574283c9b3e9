//! Field descriptors.
//!
//! A [`Property`] pairs a serialization path with type-checked conversion
//! between a [`Datum`] and its serialized [`Value`]. Properties never hold
//! instance data: a schema keeps one property per field, shared by every
//! object of the model.
//!
//! ## Kinds
//!
//! | Kind | Underlying | Serialized |
//! |------|------------|------------|
//! | [`Integer`] | int | int, numeric string |
//! | [`Float`] | float | float, int, numeric string |
//! | [`Str`] | str | string |
//! | [`Boolean`] | any value (truthiness) | any value |
//! | [`Uuid`] | uuid | string |
//! | [`Datetime`] | datetime | epoch milliseconds, ISO-8601 string |
//! | [`Raw`] | plain data | any value |
//! | [`List`], [`Set`] | list, set | array |
//! | [`Mapping`] | map | object, array of pairs |
//! | [`Optional`] | child or null | child or null |
//! | [`Union`] | any alternative | any alternative |
//! | [`SpecifiedMixedList`] | list | array |
//! | [`Enumeration`] | symbol | string |
//! | [`Object`] | object | object |
//! | [`LinkOrElse`] | link, object | object |
//!
//! ## Configuration
//!
//! Every kind is configured with the same chain of builder methods:
//!
//! ```
//! use tx_property::property::{Integer, Property};
//!
//! let count = Integer::at("data.count").default(0_i64).read_only();
//! assert_eq!(count.meta().path().unwrap().as_str(), "data.count");
//! assert!(!count.meta().is_serializable());
//! assert!(count.meta().is_deserializable());
//! ```

// -----------------------------------------------------------------------------
// Modules

mod enumeration;
mod link;
mod list;
mod mapping;
mod mixed;
mod object;
mod optional;
mod scalar;
mod union;

// -----------------------------------------------------------------------------
// Exports

pub use enumeration::{Enumeration, Symbol, SymbolValue};
pub use link::{LinkByUid, LinkOr, LinkOrElse};
pub use list::{List, Set};
pub use mapping::Mapping;
pub use mixed::SpecifiedMixedList;
pub use object::Object;
pub use optional::Optional;
pub use scalar::{Boolean, Datetime, Float, Integer, Raw, Str, Uuid};
pub use union::Union;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde_json::{Map, Value};

use crate::{Datum, DatumKinds, FieldPath, IntoDatum, PropertyError, PropertyResult, ValueKinds};

// -----------------------------------------------------------------------------
// Member

/// A value handed to an assignment.
///
/// Callers state up front whether they hold a typed value or its serialized
/// form, so a property never has to guess. Collections may mix both.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tx_property::property::{Integer, List, Member, Property};
/// use tx_property::Datum;
///
/// let numbers = List::at("numbers", Integer::new());
/// let value = numbers
///     .assign(Member::Elements(vec![
///         Member::Typed(Datum::Int(1)),
///         Member::Serialized(json!("2")),
///     ]))
///     .unwrap();
/// assert_eq!(value, Datum::List(vec![Datum::Int(1), Datum::Int(2)]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// An already typed value, used as is.
    Typed(Datum),
    /// A serialized value, deserialized on assignment.
    Serialized(Value),
    /// Elements of a list, set or mixed list.
    Elements(Vec<Member>),
    /// Entries of a mapping.
    Entries(Vec<(Member, Member)>),
}

impl Member {
    /// Shorthand for [`Member::Typed`].
    #[inline]
    pub fn typed(value: impl IntoDatum) -> Self {
        Self::Typed(value.into_datum())
    }
}

impl From<Datum> for Member {
    #[inline]
    fn from(value: Datum) -> Self {
        Self::Typed(value)
    }
}

impl From<Value> for Member {
    #[inline]
    fn from(value: Value) -> Self {
        Self::Serialized(value)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typed(value) => write!(f, "{value}"),
            Self::Serialized(value) => write!(f, "{value}"),
            Self::Elements(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Entries(entries) => {
                f.write_str("{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

// -----------------------------------------------------------------------------
// PropertyMeta

/// Configuration shared by every property kind.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMeta {
    path: Option<FieldPath>,
    serializable: bool,
    deserializable: bool,
    default: Option<Datum>,
    optional: bool,
    overrides: bool,
}

impl Default for PropertyMeta {
    #[inline]
    fn default() -> Self {
        Self::new(None)
    }
}

impl PropertyMeta {
    #[inline]
    pub const fn new(path: Option<FieldPath>) -> Self {
        Self {
            path,
            serializable: true,
            deserializable: true,
            default: None,
            optional: false,
            overrides: false,
        }
    }

    #[inline]
    pub fn path(&self) -> Option<&FieldPath> {
        self.path.as_ref()
    }

    /// Sets the path unless one is configured already.
    pub fn path_or(&mut self, path: impl Into<FieldPath>) {
        if self.path.is_none() {
            self.path = Some(path.into());
        }
    }

    #[inline]
    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    #[inline]
    pub fn is_deserializable(&self) -> bool {
        self.deserializable
    }

    /// The configured default. A null default counts as no default.
    #[inline]
    pub fn default_value(&self) -> Option<&Datum> {
        self.default.as_ref().filter(|d| !d.is_null())
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether accessors should delegate to a single base declaring the
    /// same field.
    #[inline]
    pub fn is_override(&self) -> bool {
        self.overrides
    }

    /// The value substituted for an absent or null field: the default, or
    /// null for optional properties.
    pub fn fallback(&self) -> Option<Datum> {
        match self.default_value() {
            Some(value) => Some(value.clone()),
            None if self.optional => Some(Datum::Null),
            None => None,
        }
    }

    pub(crate) fn set_default(&mut self, value: Datum) {
        self.default = Some(value);
    }

    pub(crate) fn set_optional(&mut self) {
        self.optional = true;
    }

    pub(crate) fn set_serializable(&mut self, value: bool) {
        self.serializable = value;
    }

    pub(crate) fn set_deserializable(&mut self, value: bool) {
        self.deserializable = value;
    }

    pub(crate) fn set_overrides(&mut self) {
        self.overrides = true;
    }
}

/// Implements the configuration chain on a property kind.
macro_rules! impl_meta_builder {
    ($(@ $($g:ident: $bound:path),*;)? $ty:ty) => {
        impl $(<$($g: $bound),*>)? $ty {
            /// Sets the value used when the field is absent or null.
            #[inline]
            pub fn default(mut self, value: impl $crate::IntoDatum) -> Self {
                self.meta.set_default($crate::IntoDatum::into_datum(value));
                self
            }

            /// Accepts an absent or null field as null.
            #[inline]
            pub fn optional(mut self) -> Self {
                self.meta.set_optional();
                self
            }

            /// Serialized on dump, never read on build.
            #[inline]
            pub fn write_only(mut self) -> Self {
                self.meta.set_deserializable(false);
                self
            }

            /// Read on build, never serialized on dump.
            #[inline]
            pub fn read_only(mut self) -> Self {
                self.meta.set_serializable(false);
                self
            }

            /// Delegates accessors to the single base declaring this field.
            #[inline]
            pub fn overrides(mut self) -> Self {
                self.meta.set_overrides();
                self
            }
        }
    };
}

/// Implements [`Property::meta`] and [`Property::meta_mut`].
macro_rules! meta_accessors {
    () => {
        #[inline]
        fn meta(&self) -> &$crate::property::PropertyMeta {
            &self.meta
        }

        #[inline]
        fn meta_mut(&mut self) -> &mut $crate::property::PropertyMeta {
            &mut self.meta
        }
    };
}

pub(crate) use {impl_meta_builder, meta_accessors};

// -----------------------------------------------------------------------------
// Property

/// A type-checked converter between a [`Datum`] and its serialized form,
/// located at a path inside nested mappings.
///
/// Kinds implement [`encode`](Property::encode) and
/// [`decode`](Property::decode); the checked entry points
/// [`serialize`](Property::serialize) and
/// [`deserialize`](Property::deserialize) verify the input against the
/// kind's type sets first.
pub trait Property: Send + Sync + fmt::Debug + 'static {
    fn meta(&self) -> &PropertyMeta;

    fn meta_mut(&mut self) -> &mut PropertyMeta;

    /// The underlying kinds this property accepts.
    fn underlying_kinds(&self) -> DatumKinds;

    /// The serialized kinds this property accepts.
    fn serialized_kinds(&self) -> ValueKinds;

    /// A short name for diagnostics, such as `List(Integer)`.
    fn describe(&self) -> String;

    /// Returns `true` if `value` is an instance of the underlying type.
    ///
    /// Containers check their elements too.
    #[inline]
    fn admits(&self, value: &Datum) -> bool {
        self.underlying_kinds().contains(value.kinds())
    }

    /// Returns `true` if `value` is an instance of the serialized type.
    #[inline]
    fn admits_serialized(&self, value: &Value) -> bool {
        self.serialized_kinds().contains(ValueKinds::of(value))
    }

    /// Converts an admitted value to its serialized form.
    fn encode(&self, value: &Datum) -> PropertyResult<Value>;

    /// Converts an admitted serialized value to its underlying form.
    fn decode(&self, value: &Value) -> PropertyResult<Datum>;

    fn serialize(&self, value: &Datum) -> PropertyResult<Value> {
        if !self.admits(value) {
            return Err(PropertyError::mismatch(value, expected(self)));
        }
        self.encode(value)
    }

    fn deserialize(&self, value: &Value) -> PropertyResult<Datum> {
        if !self.admits_serialized(value) {
            return Err(PropertyError::mismatch(value, expected_serialized(self)));
        }
        self.decode(value)
    }

    /// Turns a member into a typed value, deserializing only what is not
    /// typed yet.
    fn assign(&self, member: Member) -> PropertyResult<Datum> {
        assign_member(self, member)
    }

    /// Reads this property out of `container` at its path.
    ///
    /// See [`FieldPath`] for addressing.
    fn read_from_container(&self, container: &Map<String, Value>) -> PropertyResult<Datum> {
        crate::path::read(self, container)
    }

    /// Serializes `value` into `container` at this property's path.
    fn write_into_container<'a>(
        &self,
        container: &'a mut Map<String, Value>,
        value: &Datum,
    ) -> PropertyResult<&'a mut Map<String, Value>> {
        crate::path::write(self, container, value)
    }
}

/// A container property whose elements may arrive partly typed.
pub trait PropertyCollection: Property {
    /// Builds the typed collection from [`Member::Elements`] or
    /// [`Member::Entries`], deserializing only the serialized members.
    fn assign_elements(&self, member: Member) -> PropertyResult<Datum>;
}

/// The assignment rule shared by every kind: typed values must be
/// admitted, serialized values are deserialized.
pub(crate) fn assign_member<P>(prop: &P, member: Member) -> PropertyResult<Datum>
where
    P: Property + ?Sized,
{
    match member {
        Member::Typed(value) if prop.admits(&value) => Ok(value),
        Member::Typed(value) => Err(PropertyError::mismatch(value, expected(prop))),
        Member::Serialized(value) => prop.deserialize(&value),
        other => Err(PropertyError::mismatch(other, expected(prop))),
    }
}

pub(crate) fn expected<P: Property + ?Sized>(prop: &P) -> String {
    format!("{} ({})", prop.describe(), prop.underlying_kinds())
}

pub(crate) fn expected_serialized<P: Property + ?Sized>(prop: &P) -> String {
    format!("serialized {} ({})", prop.describe(), prop.serialized_kinds())
}
