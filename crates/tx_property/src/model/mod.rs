//! Model types and their schemas.
//!
//! A [`Model`] is an ordinary Rust type whose fields are described by a
//! [`Schema`]: one shared [`Property`](crate::Property) per field, plus an
//! accessor pair that reads and writes the field on a given object. The
//! schema is built once per type and cached in a [`SchemaCell`].
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use tx_property::model::{Model, Schema, SchemaCell};
//! use tx_property::property::{Integer, Str};
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Dataset {
//!     name: String,
//!     rows: i64,
//! }
//!
//! impl Model for Dataset {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: SchemaCell<Dataset> = SchemaCell::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::<Self>::builder("Dataset")
//!                 .field("name", Str::new(), |m| &m.name, |m| &mut m.name)
//!                 .field("rows", Integer::at("stats.rows"), |m| &m.rows, |m| &mut m.rows)
//!                 .build()
//!         })
//!     }
//! }
//!
//! let value = json!({ "name": "iris", "stats": { "rows": 150 } });
//! let dataset = Dataset::build(&value).unwrap();
//! assert_eq!(dataset.rows, 150);
//! assert_eq!(dataset.dump().unwrap(), value);
//! ```

// -----------------------------------------------------------------------------
// Modules

mod polymorphic;
mod schema;

// -----------------------------------------------------------------------------
// Exports

pub use polymorphic::{Polymorphic, Subtype, SubtypeRegistry};
pub use schema::{Field, FieldAccess, Schema, SchemaBuilder};

use core::fmt;
use std::sync::OnceLock;

use serde_json::Value;

use crate::PropertyResult;

// -----------------------------------------------------------------------------
// Model

/// A type whose fields are described by a [`Schema`].
///
/// [`build`](Model::build) and [`dump`](Model::dump) are the canonical
/// entry points and satisfy `build(dump(x)) == x` for well-formed models.
/// Types with custom construction logic may override them.
pub trait Model: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn schema() -> &'static Schema<Self>;

    /// Reconstructs an object from its serialized form.
    #[inline]
    fn build(value: &Value) -> PropertyResult<Self> {
        Self::schema().build(value)
    }

    /// Serializes the object into the shape [`build`](Model::build) accepts.
    #[inline]
    fn dump(&self) -> PropertyResult<Value> {
        Self::schema().dump(self)
    }
}

/// Implements [`IntoDatum`] and [`FromDatum`] for model types, so they can
/// be stored in schema fields.
///
/// [`IntoDatum`]: crate::IntoDatum
/// [`FromDatum`]: crate::FromDatum
#[macro_export]
macro_rules! model_datum {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::IntoDatum for $ty {
            #[inline]
            fn into_datum(self) -> $crate::Datum {
                $crate::Datum::object(self)
            }
        }

        impl $crate::FromDatum for $ty {
            #[inline]
            fn from_datum(datum: $crate::Datum) -> $crate::PropertyResult<Self> {
                datum.take_object::<$ty>()
            }
        }
    )+};
}

// -----------------------------------------------------------------------------
// ModelCell

/// Static storage for data built once per model type.
///
/// Internally an [`OnceLock`]: concurrent first uses build the value once.
pub struct ModelCell<T>(OnceLock<T>);

/// Static storage for a [`Schema`], see [`Model::schema`].
pub type SchemaCell<M> = ModelCell<Schema<M>>;

/// Static storage for a [`SubtypeRegistry`], see [`Polymorphic::registry`].
pub type RegistryCell<B> = ModelCell<SubtypeRegistry<B>>;

impl<T> ModelCell<T> {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored value, building it with `f` on first use.
    #[inline]
    pub fn get_or_init<F>(&self, f: F) -> &T
    where
        F: FnOnce() -> T,
    {
        self.0.get_or_init(f)
    }
}
