use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use serde_json::Value;
use tx_utils::hash::{FixedHashState, HashMap};
use tx_utils::{TagLookup, TagTable};

use super::Model;
use crate::{PropertyError, PropertyResult};

// -----------------------------------------------------------------------------
// Polymorphic

/// A model base whose serialized form names its concrete subtype.
///
/// The base is a closed set of subtypes, usually an enum with one variant
/// per subtype, and its schema is [`Schema::polymorphic`]. Building reads
/// the discriminator, resolves the subtype through the
/// [`SubtypeRegistry`] and lets the subtype build itself.
///
/// [`Schema::polymorphic`]: super::Schema::polymorphic
pub trait Polymorphic: Model {
    /// The dispatch table, built once and kept for the process lifetime.
    fn registry() -> &'static SubtypeRegistry<Self>;

    /// Resolves the subtype named by a serialized value.
    #[inline]
    fn get_type(value: &Value) -> PropertyResult<&'static Subtype<Self>> {
        Self::registry().get_type(value)
    }
}

// -----------------------------------------------------------------------------
// Subtype

type BuildFn<B> = Box<dyn Fn(&Value) -> PropertyResult<B> + Send + Sync>;
type DumpFn<B> = Box<dyn Fn(&B) -> Option<PropertyResult<Value>> + Send + Sync>;
type UpcastFn<B> = Box<dyn Fn(Box<dyn Any + Send>) -> Option<B> + Send + Sync>;

/// One concrete subtype of a polymorphic base `B`.
pub struct Subtype<B> {
    tag: &'static str,
    type_id: TypeId,
    class_name: fn() -> &'static str,
    build: BuildFn<B>,
    dump: DumpFn<B>,
    upcast: UpcastFn<B>,
}

impl<B: Model> Subtype<B> {
    /// Registers `S` under `tag`.
    ///
    /// `wrap` turns an `S` into the base, `project` finds the `S` inside a
    /// base, if any.
    pub fn of<S: Model>(tag: &'static str, wrap: fn(S) -> B, project: fn(&B) -> Option<&S>) -> Self {
        Self {
            tag,
            type_id: TypeId::of::<S>(),
            class_name: || S::schema().name(),
            build: Box::new(move |value: &Value| S::build(value).map(wrap)),
            dump: Box::new(move |base: &B| project(base).map(S::dump)),
            upcast: Box::new(move |object: Box<dyn Any + Send>| object.downcast::<S>().ok().map(|s| wrap(*s))),
        }
    }
}

impl<B> Subtype<B> {
    #[inline]
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The schema name of the subtype.
    #[inline]
    pub fn class_name(&self) -> &'static str {
        (self.class_name)()
    }

    /// Builds the subtype through its own schema and wraps it.
    #[inline]
    pub fn build(&self, value: &Value) -> PropertyResult<B> {
        (self.build)(value)
    }
}

impl<B> fmt::Debug for Subtype<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subtype")
            .field("tag", &self.tag)
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// SubtypeRegistry

/// The dispatch table of a polymorphic base: discriminator tags to
/// subtypes.
///
/// A tag registered twice is ambiguous. It is reported with a warning when
/// registered, and resolving it fails with
/// [`PropertyError::AmbiguousType`].
pub struct SubtypeRegistry<B> {
    family: &'static str,
    discriminator: &'static str,
    subtypes: Vec<Subtype<B>>,
    tags: TagTable<usize>,
    by_type: HashMap<TypeId, usize>,
}

impl<B: Model> SubtypeRegistry<B> {
    /// An empty registry reading the `"type"` key.
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            discriminator: "type",
            subtypes: Vec::new(),
            tags: TagTable::new(),
            by_type: HashMap::with_hasher(FixedHashState),
        }
    }

    /// Reads the tag from `key` instead of `"type"`.
    #[inline]
    pub fn with_discriminator(mut self, key: &'static str) -> Self {
        self.discriminator = key;
        self
    }

    pub fn register(mut self, subtype: Subtype<B>) -> Self {
        let index = self.subtypes.len();
        if self.tags.insert(subtype.tag, index) {
            log::debug!("registered `{}` type `{}`", self.family, subtype.tag);
        } else {
            log::warn!(
                "`{}` type `{}` is registered more than once and cannot be resolved",
                self.family,
                subtype.tag,
            );
        }
        self.by_type.entry(subtype.type_id).or_insert(index);
        self.subtypes.push(subtype);
        self
    }

    #[inline]
    pub fn family(&self) -> &'static str {
        self.family
    }

    #[inline]
    pub fn discriminator(&self) -> &'static str {
        self.discriminator
    }

    /// The resolvable tags, in registration order.
    pub fn tags(&self) -> Vec<&'static str> {
        self.subtypes
            .iter()
            .map(|subtype| subtype.tag)
            .filter(|tag| !self.tags.is_ambiguous(tag))
            .collect()
    }

    /// Resolves the subtype named by the discriminator of `value`.
    pub fn get_type(&self, value: &Value) -> PropertyResult<&Subtype<B>> {
        let tag = value
            .get(self.discriminator)
            .and_then(Value::as_str)
            .ok_or_else(|| PropertyError::MissingField {
                segment: self.discriminator.to_string(),
                path: self.discriminator.to_string(),
                container: value.to_string(),
            })?;
        match self.tags.lookup(tag) {
            TagLookup::Found(&index) => Ok(&self.subtypes[index]),
            TagLookup::Ambiguous => Err(PropertyError::AmbiguousType {
                tag: tag.to_string(),
                family: self.family,
            }),
            TagLookup::Missing => Err(PropertyError::UnrecognizedType {
                tag: tag.to_string(),
                family: self.family,
                valid: self.tags(),
            }),
        }
    }

    /// Resolves the subtype and lets it build itself.
    #[inline]
    pub fn build(&self, value: &Value) -> PropertyResult<B> {
        self.get_type(value)?.build(value)
    }

    /// Dumps the subtype held by `base`.
    pub fn dump(&self, base: &B) -> PropertyResult<Value> {
        self.subtypes
            .iter()
            .find_map(|subtype| (subtype.dump)(base))
            .unwrap_or(Err(PropertyError::NoSerializer { class: self.family }))
    }

    /// Returns `true` if objects of `type_id` are a registered subtype.
    #[inline]
    pub fn admits(&self, type_id: TypeId) -> bool {
        self.by_type.contains_key(&type_id)
    }

    /// Wraps an object of a registered subtype into the base.
    pub fn upcast(&self, object: Box<dyn Any + Send>) -> Option<B> {
        let index = *self.by_type.get(&(*object).type_id())?;
        (self.subtypes[index].upcast)(object)
    }
}

impl<B> fmt::Debug for SubtypeRegistry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubtypeRegistry")
            .field("family", &self.family)
            .field("discriminator", &self.discriminator)
            .field("subtypes", &self.subtypes)
            .finish_non_exhaustive()
    }
}
