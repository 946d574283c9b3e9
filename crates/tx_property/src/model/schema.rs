use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use serde_json::{Map, Value};
use tx_utils::hash::{FixedHashState, HashMap};

use super::{Model, Polymorphic};
use crate::property::{Member, Property};
use crate::{Datum, FieldPath, FromDatum, IntoDatum, PropertyError, PropertyResult, trail};

// -----------------------------------------------------------------------------
// FieldAccess

/// Reads and writes one field on a model object.
///
/// This is where per-object state lives; the field's [`Property`] is
/// shared by every object of the model.
pub trait FieldAccess<M>: Send + Sync {
    fn get(&self, model: &M) -> Datum;

    fn set(&self, model: &mut M, value: Datum) -> PropertyResult<()>;
}

/// A plain struct field.
struct Direct<M, T> {
    get: fn(&M) -> &T,
    get_mut: fn(&mut M) -> &mut T,
}

impl<M, T> FieldAccess<M> for Direct<M, T>
where
    T: IntoDatum + FromDatum + Clone,
{
    #[inline]
    fn get(&self, model: &M) -> Datum {
        (self.get)(model).clone().into_datum()
    }

    #[inline]
    fn set(&self, model: &mut M, value: Datum) -> PropertyResult<()> {
        *(self.get_mut)(model) = T::from_datum(value)?;
        Ok(())
    }
}

/// A fixed value, such as a type discriminator. Writes are ignored.
struct Constant(Datum);

impl<M> FieldAccess<M> for Constant {
    #[inline]
    fn get(&self, _: &M) -> Datum {
        self.0.clone()
    }

    #[inline]
    fn set(&self, _: &mut M, _: Datum) -> PropertyResult<()> {
        Ok(())
    }
}

/// A field stored on an embedded base object.
struct Projected<M, B: 'static> {
    project: fn(&M) -> &B,
    project_mut: fn(&mut M) -> &mut B,
    base: &'static Field<B>,
}

impl<M, B: 'static> FieldAccess<M> for Projected<M, B> {
    #[inline]
    fn get(&self, model: &M) -> Datum {
        self.base.access.get((self.project)(model))
    }

    #[inline]
    fn set(&self, model: &mut M, value: Datum) -> PropertyResult<()> {
        self.base.access.set((self.project_mut)(model), value)
    }
}

// -----------------------------------------------------------------------------
// Field

/// A named field of a [`Schema`].
pub struct Field<M> {
    name: &'static str,
    owner: &'static str,
    property: Arc<dyn Property>,
    access: Arc<dyn FieldAccess<M>>,
}

impl<M> Clone for Field<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            owner: self.owner,
            property: self.property.clone(),
            access: self.access.clone(),
        }
    }
}

impl<M> fmt::Debug for Field<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}

impl<M> Field<M> {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The model that declared this field.
    #[inline]
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    #[inline]
    pub fn property(&self) -> &dyn Property {
        &*self.property
    }

    /// The serialization path, the field name unless configured otherwise.
    #[inline]
    pub fn path(&self) -> &str {
        self.property.meta().path().map_or(self.name, FieldPath::as_str)
    }

    /// Reads the typed value of this field.
    #[inline]
    pub fn get(&self, model: &M) -> Datum {
        self.access.get(model)
    }

    /// Assigns a typed or serialized value to this field.
    pub fn set(&self, model: &mut M, member: Member) -> PropertyResult<()> {
        let value = self.property.assign(member)?;
        self.access.set(model, value)
    }
}

// -----------------------------------------------------------------------------
// Schema

type BuildFn<M> = fn(&Value) -> PropertyResult<M>;
type DumpFn<M> = fn(&M) -> PropertyResult<Value>;

enum Layout<M> {
    Fields {
        construct: fn() -> M,
    },
    Opaque {
        build: BuildFn<M>,
        dump: DumpFn<M>,
    },
    Polymorphic {
        build: BuildFn<M>,
        dump: DumpFn<M>,
        admits: fn(TypeId) -> bool,
        upcast: fn(Box<dyn Any + Send>) -> Option<M>,
    },
}

/// The field table of a [`Model`].
///
/// A schema has one of three layouts:
/// - declared fields, read and written one by one along their paths;
/// - an opaque record with its own `build`/`dump` pair;
/// - a polymorphic base, dispatching to a registered subtype.
///
/// See [`model`](crate::model) for an example.
pub struct Schema<M> {
    name: &'static str,
    fields: Vec<Field<M>>,
    index: HashMap<&'static str, usize>,
    layout: Layout<M>,
}

impl<M: Model + Default> Schema<M> {
    /// Starts a schema whose objects are constructed with
    /// [`Default::default`] before their fields are read.
    #[inline]
    pub fn builder(name: &'static str) -> SchemaBuilder<M> {
        SchemaBuilder::new(name, M::default)
    }
}

impl<M: Polymorphic> Schema<M> {
    /// A schema dispatching through [`Polymorphic::registry`].
    pub fn polymorphic(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            index: HashMap::with_hasher(FixedHashState),
            layout: Layout::Polymorphic {
                build: |value| M::registry().build(value),
                dump: |model| M::registry().dump(model),
                admits: |type_id| M::registry().admits(type_id),
                upcast: |object| M::registry().upcast(object),
            },
        }
    }
}

impl<M: Model> Schema<M> {
    /// Starts a schema whose objects are constructed with `construct`.
    #[inline]
    pub fn builder_with(name: &'static str, construct: fn() -> M) -> SchemaBuilder<M> {
        SchemaBuilder::new(name, construct)
    }

    /// A schema without fields, serialized by its own codec.
    pub fn opaque(name: &'static str, build: BuildFn<M>, dump: DumpFn<M>) -> Self {
        Self {
            name,
            fields: Vec::new(),
            index: HashMap::with_hasher(FixedHashState),
            layout: Layout::Opaque { build, dump },
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The fields in declaration order, inherited fields first.
    #[inline]
    pub fn fields(&self) -> &[Field<M>] {
        &self.fields
    }

    #[inline]
    pub fn field(&self, name: &str) -> Option<&Field<M>> {
        self.index.get(name).map(|&index| &self.fields[index])
    }

    #[inline]
    pub fn is_polymorphic(&self) -> bool {
        matches!(self.layout, Layout::Polymorphic { .. })
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        matches!(self.layout, Layout::Opaque { .. })
    }

    pub(crate) fn layout_name(&self) -> &'static str {
        match self.layout {
            Layout::Fields { .. } => "declared fields",
            Layout::Opaque { .. } => "an opaque record",
            Layout::Polymorphic { .. } => "a polymorphic base",
        }
    }

    fn field_or_err(&self, name: &str) -> PropertyResult<&Field<M>> {
        self.field(name).ok_or_else(|| PropertyError::UnknownField {
            class: self.name,
            field: name.to_string(),
        })
    }

    fn locate(&self, err: PropertyError, field: &Field<M>) -> PropertyError {
        trail::attach(err.within(self.name, field.path()))
    }

    /// Reconstructs an object from its serialized form.
    pub fn build(&self, value: &Value) -> PropertyResult<M> {
        let _guard = trail::enter(self.name);
        match &self.layout {
            Layout::Fields { construct } => {
                if self.fields.is_empty() {
                    return Err(PropertyError::NoBuilder { class: self.name });
                }
                let Value::Object(container) = value else {
                    return Err(PropertyError::mismatch(value, self.name));
                };
                let mut model = construct();
                for field in &self.fields {
                    if !field.property.meta().is_deserializable() {
                        continue;
                    }
                    let datum = field
                        .property
                        .read_from_container(container)
                        .map_err(|e| self.locate(e, field))?;
                    field
                        .access
                        .set(&mut model, datum)
                        .map_err(|e| self.locate(e, field))?;
                }
                Ok(model)
            }
            Layout::Opaque { build, .. } | Layout::Polymorphic { build, .. } => build(value),
        }
    }

    /// Serializes an object into the shape [`build`](Schema::build) accepts.
    pub fn dump(&self, model: &M) -> PropertyResult<Value> {
        let _guard = trail::enter(self.name);
        match &self.layout {
            Layout::Fields { .. } => {
                if self.fields.is_empty() {
                    return Err(PropertyError::NoSerializer { class: self.name });
                }
                let mut container = Map::new();
                for field in &self.fields {
                    if !field.property.meta().is_serializable() {
                        continue;
                    }
                    let datum = field.access.get(model);
                    field
                        .property
                        .write_into_container(&mut container, &datum)
                        .map_err(|e| self.locate(e, field))?;
                }
                Ok(Value::Object(container))
            }
            Layout::Opaque { dump, .. } | Layout::Polymorphic { dump, .. } => dump(model),
        }
    }

    /// Reads a field by name.
    pub fn get(&self, model: &M, name: &str) -> PropertyResult<Datum> {
        self.field_or_err(name).map(|field| field.get(model))
    }

    /// Reads a field by name as `T`.
    pub fn get_as<T: FromDatum>(&self, model: &M, name: &str) -> PropertyResult<T> {
        let field = self.field_or_err(name)?;
        T::from_datum(field.get(model)).map_err(|e| e.within(self.name, field.path()))
    }

    /// Assigns a field by name. Typed members are checked, serialized
    /// members are deserialized first.
    pub fn set(&self, model: &mut M, name: &str, member: Member) -> PropertyResult<()> {
        let field = self.field_or_err(name)?;
        field
            .set(model, member)
            .map_err(|e| e.within(self.name, field.path()))
    }

    /// Assigns a typed value to a field by name.
    #[inline]
    pub fn set_value(&self, model: &mut M, name: &str, value: impl IntoDatum) -> PropertyResult<()> {
        self.set(model, name, Member::Typed(value.into_datum()))
    }

    /// Assigns a serialized value to a field by name.
    #[inline]
    pub fn set_serialized(&self, model: &mut M, name: &str, value: &Value) -> PropertyResult<()> {
        self.set(model, name, Member::Serialized(value.clone()))
    }

    /// Returns `true` if objects of `type_id` can stand in for `M`.
    #[inline]
    pub fn admits_subtype(&self, type_id: TypeId) -> bool {
        match self.layout {
            Layout::Polymorphic { admits, .. } => admits(type_id),
            _ => false,
        }
    }

    /// Wraps an object of a registered subtype into `M`.
    #[inline]
    pub fn upcast(&self, object: Box<dyn Any + Send>) -> Option<M> {
        match self.layout {
            Layout::Polymorphic { upcast, .. } => upcast(object),
            _ => None,
        }
    }
}

impl<M> fmt::Debug for Schema<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// SchemaBuilder

struct Base<M> {
    name: &'static str,
    fields: Vec<Field<M>>,
}

/// Declares the fields of a [`Schema`].
///
/// Fields inherited through [`extends`](SchemaBuilder::extends) come
/// first, and the first base declaring a name wins. A local field replaces
/// an inherited one of the same name. If the local field
/// [`overrides`](crate::property::Integer::overrides) and exactly one base
/// declares the name, it keeps the local property but reads and writes the
/// base's storage; with two or more such bases it stays local.
pub struct SchemaBuilder<M> {
    name: &'static str,
    construct: fn() -> M,
    local: Vec<Field<M>>,
    bases: Vec<Base<M>>,
}

impl<M: Model> SchemaBuilder<M> {
    fn new(name: &'static str, construct: fn() -> M) -> Self {
        Self {
            name,
            construct,
            local: Vec::new(),
            bases: Vec::new(),
        }
    }

    /// Declares a field stored in a struct member.
    ///
    /// The property's path defaults to `name`.
    pub fn field<P, T>(
        mut self,
        name: &'static str,
        mut property: P,
        get: fn(&M) -> &T,
        get_mut: fn(&mut M) -> &mut T,
    ) -> Self
    where
        P: Property,
        T: IntoDatum + FromDatum + Clone + 'static,
    {
        property.meta_mut().path_or(name);
        self.local.push(Field {
            name,
            owner: self.name,
            property: Arc::new(property),
            access: Arc::new(Direct { get, get_mut }),
        });
        self
    }

    /// Declares a fixed value, serialized on dump and never read on build.
    ///
    /// Typically the type discriminator of a polymorphic subtype.
    pub fn constant<P: Property>(mut self, name: &'static str, mut property: P, value: impl IntoDatum) -> Self {
        let meta = property.meta_mut();
        meta.path_or(name);
        meta.set_deserializable(false);
        self.local.push(Field {
            name,
            owner: self.name,
            property: Arc::new(property),
            access: Arc::new(Constant(value.into_datum())),
        });
        self
    }

    /// Inherits the fields of an embedded base model.
    pub fn extends<B: Model>(mut self, project: fn(&M) -> &B, project_mut: fn(&mut M) -> &mut B) -> Self {
        let base = B::schema();
        let fields = base
            .fields()
            .iter()
            .map(|field| Field {
                name: field.name,
                owner: field.owner,
                property: field.property.clone(),
                access: Arc::new(Projected {
                    project,
                    project_mut,
                    base: field,
                }) as Arc<dyn FieldAccess<M>>,
            })
            .collect();
        self.bases.push(Base {
            name: base.name(),
            fields,
        });
        self
    }

    /// Resolves inheritance and overrides.
    pub fn build(mut self) -> Schema<M> {
        let locals = core::mem::take(&mut self.local);
        let mut fields: Vec<Field<M>> = Vec::new();
        for base in &self.bases {
            for field in &base.fields {
                if !fields.iter().any(|f| f.name == field.name) {
                    fields.push(field.clone());
                }
            }
        }

        for local in locals {
            let access = if local.property.meta().is_override() {
                self.override_access(&local)
            } else {
                local.access.clone()
            };
            let field = Field { access, ..local };
            match fields.iter_mut().find(|f| f.name == field.name) {
                Some(slot) => *slot = field,
                None => fields.push(field),
            }
        }

        let mut index = HashMap::with_hasher(FixedHashState);
        for (position, field) in fields.iter().enumerate() {
            index.insert(field.name, position);
        }

        Schema {
            name: self.name,
            fields,
            index,
            layout: Layout::Fields {
                construct: self.construct,
            },
        }
    }

    fn override_access(&self, local: &Field<M>) -> Arc<dyn FieldAccess<M>> {
        let declaring: Vec<(&str, &Field<M>)> = self
            .bases
            .iter()
            .filter_map(|base| {
                let field = base.fields.iter().find(|f| f.name == local.name)?;
                Some((base.name, field))
            })
            .collect();

        match declaring.as_slice() {
            [(_, only)] => only.access.clone(),
            [] => local.access.clone(),
            many => {
                let names: Vec<&str> = many.iter().map(|(name, _)| *name).collect();
                log::warn!(
                    "`{}.{}` overrides a field declared by several bases ({}); keeping it in local storage",
                    self.name,
                    local.name,
                    names.join(", "),
                );
                local.access.clone()
            }
        }
    }
}
