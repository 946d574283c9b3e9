use alloc::format;
use alloc::string::String;
use core::fmt;
use core::marker::PhantomData;

use serde_json::Value;

use super::{PropertyMeta, expected, impl_meta_builder, meta_accessors};
use crate::model::Model;
use crate::{Datum, DatumKinds, FieldPath, Property, PropertyError, PropertyResult, ValueKinds};

/// A nested model object.
///
/// Decoding goes through the model's schema: polymorphic models resolve
/// their subtype first, opaque records use their own codec, and everything
/// else is read field by field. Encoding always uses the object's own
/// serialization method, so registered subtypes of a polymorphic `M` are
/// dumped as themselves.
///
/// The schema of `M` is only consulted on use, so a model may hold an
/// `Object` of itself.
pub struct Object<M> {
    meta: PropertyMeta,
    marker: PhantomData<fn() -> M>,
}

impl<M: Model> Object<M> {
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

impl_meta_builder!(@ M: Model; Object<M>);

impl<M> fmt::Debug for Object<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("meta", &self.meta)
            .field("model", &core::any::type_name::<M>())
            .finish()
    }
}

impl<M: Model> Property for Object<M> {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::OBJECT
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::OBJECT
    }

    fn describe(&self) -> String {
        format!("Object({})", M::schema().name())
    }

    fn admits(&self, value: &Datum) -> bool {
        match value {
            Datum::Object(object) => {
                object.is::<M>() || M::schema().admits_subtype(object.type_id())
            }
            _ => false,
        }
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        let Datum::Object(object) = value else {
            return Err(PropertyError::mismatch(value, expected(self)));
        };
        if !object.is::<M>() {
            log::trace!(
                "dumping `{}` held by an `{}` field through its own method",
                object.class_name(),
                M::schema().name(),
            );
        }
        object.dump_object()
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        let schema = M::schema();
        log::trace!("building `{}` as {}", schema.name(), schema.layout_name());
        M::build(value).map(Datum::object)
    }
}
