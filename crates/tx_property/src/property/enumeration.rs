use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use serde_json::Value;

use super::{PropertyMeta, expected, impl_meta_builder, meta_accessors};
use crate::{Datum, DatumKinds, FieldPath, Property, PropertyError, PropertyResult, ValueKinds};

// -----------------------------------------------------------------------------
// Symbol

/// A closed set of symbolic values with canonical string forms.
///
/// Usually declared with [`symbol_enum!`](crate::symbol_enum).
pub trait Symbol: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// The name of the enumeration, used in diagnostics.
    const FAMILY: &'static str;

    /// Every symbol, in declaration order.
    fn symbols() -> &'static [Self];

    /// The canonical string form.
    fn value(self) -> &'static str;

    fn from_value(value: &str) -> Option<Self> {
        Self::symbols().iter().copied().find(|s| s.value() == value)
    }
}

/// A type-erased [`Symbol`], as carried by [`Datum::Symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolValue {
    family: &'static str,
    value: &'static str,
}

impl SymbolValue {
    #[inline]
    pub fn of<E: Symbol>(symbol: E) -> Self {
        Self {
            family: E::FAMILY,
            value: symbol.value(),
        }
    }

    #[inline]
    pub fn family(&self) -> &'static str {
        self.family
    }

    #[inline]
    pub fn value(&self) -> &'static str {
        self.value
    }

    /// Recovers the typed symbol if this value belongs to `E`.
    #[inline]
    pub fn get<E: Symbol>(&self) -> Option<E> {
        if self.family == E::FAMILY {
            E::from_value(self.value)
        } else {
            None
        }
    }

    /// Converts a datum holding a symbol of `E`.
    pub fn from_datum<E: Symbol>(datum: Datum) -> PropertyResult<E> {
        match &datum {
            Datum::Symbol(symbol) => symbol.get::<E>(),
            _ => None,
        }
        .ok_or_else(|| PropertyError::mismatch(datum, E::FAMILY))
    }
}

impl fmt::Display for SymbolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.family, self.value)
    }
}

/// Declares a [`Symbol`] enum with its [`IntoDatum`] and [`FromDatum`]
/// conversions.
///
/// # Examples
///
/// ```
/// use tx_property::property::Symbol;
///
/// tx_property::symbol_enum! {
///     /// Whether a column is used as an input or an output.
///     pub enum Role: "Role" {
///         Input = "input",
///         Output = "output",
///     }
/// }
///
/// assert_eq!(Role::Input.value(), "input");
/// assert_eq!(Role::from_value("output"), Some(Role::Output));
/// ```
///
/// [`IntoDatum`]: crate::IntoDatum
/// [`FromDatum`]: crate::FromDatum
#[macro_export]
macro_rules! symbol_enum {
    (
        $(#[$attr:meta])*
        $vis:vis enum $name:ident : $family:literal {
            $($(#[$vattr:meta])* $variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vattr])* $variant),+
        }

        impl $crate::property::Symbol for $name {
            const FAMILY: &'static str = $family;

            fn symbols() -> &'static [Self] {
                &[$(Self::$variant),+]
            }

            fn value(self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }
        }

        impl $crate::IntoDatum for $name {
            #[inline]
            fn into_datum(self) -> $crate::Datum {
                $crate::Datum::Symbol($crate::property::SymbolValue::of(self))
            }
        }

        impl $crate::FromDatum for $name {
            #[inline]
            fn from_datum(datum: $crate::Datum) -> $crate::PropertyResult<Self> {
                $crate::property::SymbolValue::from_datum(datum)
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Enumeration

/// A symbol of `E`, serialized as its canonical string.
///
/// Unknown strings are rejected with
/// [`PropertyError::UnrecognizedType`], listing the valid values.
pub struct Enumeration<E> {
    meta: PropertyMeta,
    marker: PhantomData<fn() -> E>,
}

impl<E: Symbol> Enumeration<E> {
    #[inline]
    pub fn at(path: impl Into<FieldPath>) -> Self {
        Self {
            meta: PropertyMeta::new(Some(path.into())),
            marker: PhantomData,
        }
    }

    #[inline]
    pub fn new() -> Self {
        Self {
            meta: PropertyMeta::new(None),
            marker: PhantomData,
        }
    }
}

impl_meta_builder!(@ E: Symbol; Enumeration<E>);

impl<E> fmt::Debug for Enumeration<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumeration")
            .field("meta", &self.meta)
            .field("symbols", &core::any::type_name::<E>())
            .finish()
    }
}

impl<E: Symbol> Property for Enumeration<E> {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::SYMBOL
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::STRING
    }

    fn describe(&self) -> String {
        alloc::format!("Enumeration({})", E::FAMILY)
    }

    #[inline]
    fn admits(&self, value: &Datum) -> bool {
        matches!(value, Datum::Symbol(symbol) if symbol.get::<E>().is_some())
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        match value {
            Datum::Symbol(symbol) => Ok(Value::String(symbol.value().into())),
            other => Err(PropertyError::mismatch(other, expected(self))),
        }
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        let Value::String(tag) = value else {
            return Err(PropertyError::mismatch(value, "string"));
        };
        E::from_value(tag)
            .map(|symbol| Datum::Symbol(SymbolValue::of(symbol)))
            .ok_or_else(|| PropertyError::UnrecognizedType {
                tag: tag.clone(),
                family: E::FAMILY,
                valid: E::symbols().iter().map(|s| s.value()).collect::<Vec<_>>(),
            })
    }
}

// -----------------------------------------------------------------------------
// Tests
