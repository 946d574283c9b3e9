use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash};
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{Datum, DatumMap, DatumSet};
use crate::{PropertyError, PropertyResult};

// -----------------------------------------------------------------------------
// Traits

/// Conversion from a typed Rust value into a [`Datum`].
///
/// Model types get an implementation from [`model_datum!`](crate::model_datum)
/// and symbolic enums from [`symbol_enum!`](crate::symbol_enum).
pub trait IntoDatum {
    fn into_datum(self) -> Datum;
}

/// Fallible conversion from a [`Datum`] into a typed Rust value.
pub trait FromDatum: Sized {
    fn from_datum(datum: Datum) -> PropertyResult<Self>;
}

impl IntoDatum for Datum {
    #[inline]
    fn into_datum(self) -> Datum {
        self
    }
}

impl FromDatum for Datum {
    #[inline]
    fn from_datum(datum: Datum) -> PropertyResult<Self> {
        Ok(datum)
    }
}

// -----------------------------------------------------------------------------
// Scalars

macro_rules! impl_scalar {
    ($ty:ty, $variant:ident, $expected:literal) => {
        impl IntoDatum for $ty {
            #[inline]
            fn into_datum(self) -> Datum {
                Datum::$variant(self)
            }
        }

        impl FromDatum for $ty {
            fn from_datum(datum: Datum) -> PropertyResult<Self> {
                match datum {
                    Datum::$variant(value) => Ok(value),
                    other => Err(PropertyError::mismatch(other, $expected)),
                }
            }
        }
    };
}

impl_scalar!(bool, Bool, "bool");
impl_scalar!(i64, Int, "int");
impl_scalar!(f64, Float, "float");
impl_scalar!(String, Str, "str");
impl_scalar!(uuid::Uuid, Uuid, "uuid");
impl_scalar!(DateTime<Utc>, DateTime, "datetime");

macro_rules! impl_narrow_int {
    ($($ty:ty),*) => {$(
        impl IntoDatum for $ty {
            #[inline]
            fn into_datum(self) -> Datum {
                Datum::Int(i64::from(self))
            }
        }

        impl FromDatum for $ty {
            fn from_datum(datum: Datum) -> PropertyResult<Self> {
                let wide = i64::from_datum(datum)?;
                <$ty>::try_from(wide).map_err(|e| PropertyError::malformed(wide, stringify!($ty), e))
            }
        }
    )*};
}

impl_narrow_int!(i32, u32);

impl IntoDatum for f32 {
    #[inline]
    fn into_datum(self) -> Datum {
        Datum::Float(f64::from(self))
    }
}

impl FromDatum for f32 {
    fn from_datum(datum: Datum) -> PropertyResult<Self> {
        f64::from_datum(datum).map(|x| x as f32)
    }
}

impl IntoDatum for &str {
    #[inline]
    fn into_datum(self) -> Datum {
        Datum::Str(self.into())
    }
}

/// Raw JSON. Plain data (null, scalars, lists, string-keyed maps) is
/// accepted on the way out.
impl IntoDatum for Value {
    #[inline]
    fn into_datum(self) -> Datum {
        Datum::Json(self)
    }
}

impl FromDatum for Value {
    fn from_datum(datum: Datum) -> PropertyResult<Self> {
        match datum {
            Datum::Json(value) => Ok(value),
            other => other
                .to_plain_json()
                .ok_or_else(|| PropertyError::mismatch(other, "json")),
        }
    }
}

// -----------------------------------------------------------------------------
// Option

/// `None` is [`Datum::Null`].
impl<T: IntoDatum> IntoDatum for Option<T> {
    #[inline]
    fn into_datum(self) -> Datum {
        match self {
            Some(value) => value.into_datum(),
            None => Datum::Null,
        }
    }
}

impl<T: FromDatum> FromDatum for Option<T> {
    #[inline]
    fn from_datum(datum: Datum) -> PropertyResult<Self> {
        match datum {
            Datum::Null => Ok(None),
            other => T::from_datum(other).map(Some),
        }
    }
}

// -----------------------------------------------------------------------------
// Sequences

fn into_elements(datum: Datum, expected: &'static str) -> PropertyResult<Vec<Datum>> {
    match datum {
        Datum::List(items) => Ok(items),
        Datum::Set(set) => Ok(set.into_vec()),
        other => Err(PropertyError::mismatch(other, expected)),
    }
}

impl<T: IntoDatum> IntoDatum for Vec<T> {
    fn into_datum(self) -> Datum {
        Datum::List(self.into_iter().map(IntoDatum::into_datum).collect())
    }
}

impl<T: FromDatum> FromDatum for Vec<T> {
    fn from_datum(datum: Datum) -> PropertyResult<Self> {
        into_elements(datum, "list")?
            .into_iter()
            .map(T::from_datum)
            .collect()
    }
}

impl<T: IntoDatum> IntoDatum for BTreeSet<T> {
    fn into_datum(self) -> Datum {
        Datum::Set(self.into_iter().map(IntoDatum::into_datum).collect())
    }
}

impl<T: FromDatum + Ord> FromDatum for BTreeSet<T> {
    fn from_datum(datum: Datum) -> PropertyResult<Self> {
        into_elements(datum, "set")?
            .into_iter()
            .map(T::from_datum)
            .collect()
    }
}

impl<T: IntoDatum, S> IntoDatum for HashSet<T, S> {
    fn into_datum(self) -> Datum {
        Datum::Set(self.into_iter().map(IntoDatum::into_datum).collect())
    }
}

impl<T, S> FromDatum for HashSet<T, S>
where
    T: FromDatum + Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_datum(datum: Datum) -> PropertyResult<Self> {
        into_elements(datum, "set")?
            .into_iter()
            .map(T::from_datum)
            .collect()
    }
}

// -----------------------------------------------------------------------------
// Maps

fn into_entries(datum: Datum) -> PropertyResult<Vec<(Datum, Datum)>> {
    match datum {
        Datum::Map(map) => Ok(map.into_entries()),
        other => Err(PropertyError::mismatch(other, "map")),
    }
}

impl<K: IntoDatum, V: IntoDatum> IntoDatum for BTreeMap<K, V> {
    fn into_datum(self) -> Datum {
        Datum::Map(
            self.into_iter()
                .map(|(k, v)| (k.into_datum(), v.into_datum()))
                .collect::<DatumMap>(),
        )
    }
}

impl<K: FromDatum + Ord, V: FromDatum> FromDatum for BTreeMap<K, V> {
    fn from_datum(datum: Datum) -> PropertyResult<Self> {
        into_entries(datum)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_datum(k)?, V::from_datum(v)?)))
            .collect()
    }
}

impl<K: IntoDatum, V: IntoDatum, S> IntoDatum for HashMap<K, V, S> {
    fn into_datum(self) -> Datum {
        Datum::Map(
            self.into_iter()
                .map(|(k, v)| (k.into_datum(), v.into_datum()))
                .collect::<DatumMap>(),
        )
    }
}

impl<K, V, S> FromDatum for HashMap<K, V, S>
where
    K: FromDatum + Eq + Hash,
    V: FromDatum,
    S: BuildHasher + Default,
{
    fn from_datum(datum: Datum) -> PropertyResult<Self> {
        into_entries(datum)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_datum(k)?, V::from_datum(v)?)))
            .collect()
    }
}

// -----------------------------------------------------------------------------
// Tuples

macro_rules! impl_tuple {
    ($len:literal => $($name:ident),+) => {
        impl<$($name: IntoDatum),+> IntoDatum for ($($name,)+) {
            #[allow(non_snake_case, reason = "bindings are named after their types")]
            fn into_datum(self) -> Datum {
                let ($($name,)+) = self;
                Datum::List(alloc::vec![$($name.into_datum()),+])
            }
        }

        impl<$($name: FromDatum),+> FromDatum for ($($name,)+) {
            fn from_datum(datum: Datum) -> PropertyResult<Self> {
                let items = into_elements(datum, "list")?;
                if items.len() != $len {
                    return Err(PropertyError::Arity {
                        expected: $len,
                        actual: items.len(),
                        class: None,
                        path: None,
                    });
                }
                let mut items = items.into_iter();
                Ok(($($name::from_datum(items.next().unwrap_or_default())?,)+))
            }
        }
    };
}

impl_tuple!(1 => A);
impl_tuple!(2 => A, B);
impl_tuple!(3 => A, B, C);
impl_tuple!(4 => A, B, C, D);

// -----------------------------------------------------------------------------
// Tests
