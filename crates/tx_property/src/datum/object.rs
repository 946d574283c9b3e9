use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use serde_json::Value;

use crate::model::Model;
use crate::{PropertyError, PropertyResult};

// -----------------------------------------------------------------------------
// DataObject

/// The object-safe face of a [`Model`].
///
/// Implemented for every model type. Gives [`Datum::Object`] its own
/// serialization method, cloning, equality and downcasting.
///
/// [`Datum::Object`]: crate::Datum::Object
pub trait DataObject: Any + Send + Sync + fmt::Debug {
    /// The name of the object's schema.
    fn class_name(&self) -> &'static str;

    /// The object's own serialization method.
    fn dump_object(&self) -> PropertyResult<Value>;

    fn clone_object(&self) -> Box<dyn DataObject>;

    fn eq_object(&self, other: &dyn DataObject) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<M: Model> DataObject for M {
    #[inline]
    fn class_name(&self) -> &'static str {
        M::schema().name()
    }

    #[inline]
    fn dump_object(&self) -> PropertyResult<Value> {
        self.dump()
    }

    #[inline]
    fn clone_object(&self) -> Box<dyn DataObject> {
        Box::new(self.clone())
    }

    fn eq_object(&self, other: &dyn DataObject) -> bool {
        other
            .as_any()
            .downcast_ref::<M>()
            .is_some_and(|other| other == self)
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

// -----------------------------------------------------------------------------
// ObjectBox

/// An owned, type-erased model object.
pub struct ObjectBox(Box<dyn DataObject>);

impl ObjectBox {
    #[inline]
    pub fn new<T: DataObject>(object: T) -> Self {
        Self(Box::new(object))
    }

    #[inline]
    pub fn class_name(&self) -> &'static str {
        self.0.class_name()
    }

    /// The [`TypeId`] of the boxed object, not of the box.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.0.as_any().type_id()
    }

    #[inline]
    pub fn is<M: Model>(&self) -> bool {
        self.0.as_any().is::<M>()
    }

    #[inline]
    pub fn dump_object(&self) -> PropertyResult<Value> {
        self.0.dump_object()
    }

    #[inline]
    pub fn downcast_ref<M: Model>(&self) -> Option<&M> {
        self.0.as_any().downcast_ref::<M>()
    }

    /// Takes the object out as `M`.
    ///
    /// If `M` is polymorphic and the object is one of its registered
    /// subtypes, the object is wrapped into `M`.
    pub fn downcast<M: Model>(self) -> PropertyResult<M> {
        let class = self.class_name();
        let schema = M::schema();
        let type_id = self.type_id();

        let upcast = if type_id == TypeId::of::<M>() {
            self.0.into_any().downcast::<M>().ok().map(|object| *object)
        } else if schema.admits_subtype(type_id) {
            schema.upcast(self.0.into_any())
        } else {
            None
        };

        upcast.ok_or_else(|| PropertyError::mismatch(class, schema.name()))
    }
}

impl Clone for ObjectBox {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone_object())
    }
}

impl PartialEq for ObjectBox {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_object(&*other.0)
    }
}

impl fmt::Debug for ObjectBox {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}
