use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use serde_json::Value;

use super::{Member, PropertyCollection, PropertyMeta, assign_member, expected, impl_meta_builder, meta_accessors};
use crate::{Datum, DatumKinds, DatumSet, FieldPath, Property, PropertyError, PropertyResult, ValueKinds};

fn array_items<'a>(value: &'a Value, prop: &dyn Property) -> PropertyResult<&'a [Value]> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(PropertyError::mismatch(other, format!("array of {}", prop.describe()))),
    }
}

fn assign_each(element: &dyn Property, member: Member) -> PropertyResult<Vec<Datum>> {
    match member {
        Member::Elements(members) => members.into_iter().map(|m| element.assign(m)).collect(),
        other => Err(PropertyError::mismatch(other, "elements")),
    }
}

// -----------------------------------------------------------------------------
// List

/// An ordered sequence whose elements go through a child property.
///
/// Sets and tuples are accepted as input; deserializing always yields a
/// list, in order.
#[derive(Debug)]
pub struct List {
    meta: PropertyMeta,
    element: Box<dyn Property>,
}

impl List {
    #[inline]
    pub fn at(path: impl Into<FieldPath>, element: impl Property) -> Self {
        Self {
            meta: PropertyMeta::new(Some(path.into())),
            element: Box::new(element),
        }
    }

    #[inline]
    pub fn new(element: impl Property) -> Self {
        Self {
            meta: PropertyMeta::new(None),
            element: Box::new(element),
        }
    }

    #[inline]
    pub fn element(&self) -> &dyn Property {
        &*self.element
    }
}

impl_meta_builder!(List);

impl Property for List {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::LIST | DatumKinds::SET
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::ARRAY
    }

    fn describe(&self) -> String {
        format!("List({})", self.element.describe())
    }

    fn admits(&self, value: &Datum) -> bool {
        value
            .elements()
            .is_some_and(|items| items.iter().all(|item| self.element.admits(item)))
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        let items = value
            .elements()
            .ok_or_else(|| PropertyError::mismatch(value, expected(self)))?;
        items
            .iter()
            .map(|item| self.element.serialize(item))
            .collect::<PropertyResult<Vec<_>>>()
            .map(Value::Array)
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        array_items(value, self)?
            .iter()
            .map(|item| self.element.deserialize(item))
            .collect::<PropertyResult<Vec<_>>>()
            .map(Datum::List)
    }

    fn assign(&self, member: Member) -> PropertyResult<Datum> {
        match member {
            Member::Elements(_) => self.assign_elements(member),
            other => assign_member(self, other),
        }
    }
}

impl PropertyCollection for List {
    fn assign_elements(&self, member: Member) -> PropertyResult<Datum> {
        assign_each(&*self.element, member).map(Datum::List)
    }
}

// -----------------------------------------------------------------------------
// Set

/// An unordered collection without duplicates.
///
/// Serializes to an array. Arrays of all numbers, all strings or all
/// booleans are sorted; anything else keeps insertion order.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tx_property::property::{Integer, Property, Set};
///
/// let prop = Set::new(Integer::new());
/// let set = prop.deserialize(&json!([3, 1, 2, 1])).unwrap();
/// assert_eq!(prop.serialize(&set).unwrap(), json!([1, 2, 3]));
/// ```
#[derive(Debug)]
pub struct Set {
    meta: PropertyMeta,
    element: Box<dyn Property>,
}

impl Set {
    #[inline]
    pub fn at(path: impl Into<FieldPath>, element: impl Property) -> Self {
        Self {
            meta: PropertyMeta::new(Some(path.into())),
            element: Box::new(element),
        }
    }

    #[inline]
    pub fn new(element: impl Property) -> Self {
        Self {
            meta: PropertyMeta::new(None),
            element: Box::new(element),
        }
    }

    #[inline]
    pub fn element(&self) -> &dyn Property {
        &*self.element
    }
}

impl_meta_builder!(Set);

/// Integers compare exactly, beyond the range of `f64`.
fn integer_key(item: &Value) -> i128 {
    match (item.as_i64(), item.as_u64()) {
        (Some(i), _) => i128::from(i),
        (None, Some(u)) => i128::from(u),
        (None, None) => 0,
    }
}

/// Sorts homogeneous arrays of numbers, strings or booleans. Returns
/// `false`, leaving the order untouched, for anything else.
fn sort_serialized(items: &mut [Value]) -> bool {
    if items.iter().all(|item| item.is_i64() || item.is_u64()) {
        items.sort_by_key(integer_key);
    } else if items.iter().all(Value::is_number) {
        items.sort_by(|a, b| {
            let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        });
    } else if items.iter().all(Value::is_string) {
        items.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
    } else if items.iter().all(Value::is_boolean) {
        items.sort_by_key(|item| item.as_bool());
    } else {
        return false;
    }
    true
}

impl Property for Set {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::SET | DatumKinds::LIST
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::ARRAY
    }

    fn describe(&self) -> String {
        format!("Set({})", self.element.describe())
    }

    fn admits(&self, value: &Datum) -> bool {
        value
            .elements()
            .is_some_and(|items| items.iter().all(|item| self.element.admits(item)))
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        let items = value
            .elements()
            .ok_or_else(|| PropertyError::mismatch(value, expected(self)))?;
        let unique: DatumSet = items.iter().cloned().collect();
        let mut out = unique
            .iter()
            .map(|item| self.element.serialize(item))
            .collect::<PropertyResult<Vec<_>>>()?;
        sort_serialized(&mut out);
        Ok(Value::Array(out))
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        array_items(value, self)?
            .iter()
            .map(|item| self.element.deserialize(item))
            .collect::<PropertyResult<DatumSet>>()
            .map(Datum::Set)
    }

    fn assign(&self, member: Member) -> PropertyResult<Datum> {
        match member {
            Member::Elements(_) => self.assign_elements(member),
            other => match assign_member(self, other)? {
                Datum::List(items) => Ok(Datum::Set(items.into_iter().collect())),
                set => Ok(set),
            },
        }
    }
}

impl PropertyCollection for Set {
    fn assign_elements(&self, member: Member) -> PropertyResult<Datum> {
        assign_each(&*self.element, member).map(|items| Datum::Set(items.into_iter().collect()))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::vec;
    use serde_json::json;

    use super::{List, Set, sort_serialized};
    use crate::property::{Float, Integer, Member, Str};
    use crate::{Datum, Property, PropertyCollection};

    #[test]
    fn list_keeps_order_and_checks_elements() {
        let prop = List::new(Str::new());
        let value = json!(["b", "a"]);
        let datum = prop.deserialize(&value).unwrap();
        assert_eq!(
            datum,
            Datum::List(vec![Datum::Str("b".into()), Datum::Str("a".into())])
        );
        assert_eq!(prop.serialize(&datum).unwrap(), value);

        let mixed = Datum::List(vec![Datum::Str("a".into()), Datum::Int(1)]);
        assert!(prop.serialize(&mixed).is_err());
    }

    #[test]
    fn list_accepts_set_input() {
        let prop = List::new(Integer::new());
        let set = Datum::Set([Datum::Int(1), Datum::Int(2)].into_iter().collect());
        assert_eq!(prop.serialize(&set).unwrap(), json!([1, 2]));
    }

    #[test]
    fn assign_elements_skips_typed_members() {
        let prop = List::new(Float::new());
        let value = prop
            .assign_elements(Member::Elements(vec![
                Member::Typed(Datum::Float(1.5)),
                Member::Serialized(json!(2)),
            ]))
            .unwrap();
        assert_eq!(value, Datum::List(vec![Datum::Float(1.5), Datum::Float(2.0)]));

        let err = prop.assign_elements(Member::Elements(vec![Member::Typed(Datum::Int(1))]));
        assert!(err.is_err());
    }

    #[test]
    fn set_drops_duplicates() {
        let prop = Set::new(Str::new());
        let datum = prop.deserialize(&json!(["x", "y", "x"])).unwrap();
        let Datum::Set(set) = &datum else { panic!("expected a set") };
        assert_eq!(set.len(), 2);
        assert_eq!(prop.serialize(&datum).unwrap(), json!(["x", "y"]));
    }

    #[test]
    fn heterogeneous_sets_keep_insertion_order() {
        let mut items = vec![json!("b"), json!(1), json!("a")];
        assert!(!sort_serialized(&mut items));
        assert_eq!(items, [json!("b"), json!(1), json!("a")]);

        let mut items = vec![json!(2.5), json!(-1), json!(2)];
        assert!(sort_serialized(&mut items));
        assert_eq!(items, [json!(-1), json!(2), json!(2.5)]);
    }

    #[test]
    fn large_integers_sort_exactly() {
        let big = 1_u64 << 60;
        let mut items = vec![json!(big + 1), json!(-3), json!(big), json!(u64::MAX)];
        assert!(sort_serialized(&mut items));
        assert_eq!(items, [json!(-3), json!(big), json!(big + 1), json!(u64::MAX)]);
    }

    #[test]
    fn large_set_round_trip() {
        let prop = Set::new(Integer::new());
        let value = serde_json::Value::Array((0..40_000_i64).rev().map(|i| json!(i)).collect());
        let datum = prop.deserialize(&value).unwrap();
        let out = prop.serialize(&datum).unwrap();

        let items = out.as_array().unwrap();
        assert_eq!(items.len(), 40_000);
        assert_eq!(items[0], json!(0));
        assert_eq!(items[39_999], json!(39_999));
    }
}
