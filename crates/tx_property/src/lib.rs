#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Crates

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod path;
mod trail;

pub mod datum;
pub mod model;
pub mod property;

#[cfg(test)]
mod tests;

// -----------------------------------------------------------------------------
// Top-level exports

pub use datum::{
    DataObject, Datum, DatumKinds, DatumMap, DatumSet, FromDatum, IntoDatum, ObjectBox, ValueKinds,
};
pub use error::{PropertyError, PropertyResult};
pub use model::{Model, Polymorphic, Schema};
pub use path::FieldPath;
pub use property::{Member, Property, PropertyCollection, PropertyMeta};
