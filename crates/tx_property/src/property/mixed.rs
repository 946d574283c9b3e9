use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use serde_json::Value;

use super::{Member, PropertyCollection, PropertyMeta, assign_member, expected, impl_meta_builder, meta_accessors};
use crate::{Datum, DatumKinds, FieldPath, Property, PropertyError, PropertyResult, ValueKinds};

/// A fixed-arity heterogeneous list with one property per position.
///
/// More elements than positions is an [`Arity`] error. Missing trailing
/// positions are filled with each position's own default, or null when it
/// has none.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tx_property::property::{Integer, Property, SpecifiedMixedList, Str};
/// use tx_property::Datum;
///
/// let prop = SpecifiedMixedList::new()
///     .with(Str::new())
///     .with(Integer::new().default(0_i64));
/// let value = prop.deserialize(&json!(["a"])).unwrap();
/// assert_eq!(value, Datum::List(vec![Datum::Str("a".into()), Datum::Int(0)]));
/// ```
///
/// [`Arity`]: PropertyError::Arity
#[derive(Debug)]
pub struct SpecifiedMixedList {
    meta: PropertyMeta,
    positions: Vec<Box<dyn Property>>,
}

impl SpecifiedMixedList {
    #[inline]
    pub fn at(path: impl Into<FieldPath>) -> Self {
        Self {
            meta: PropertyMeta::new(Some(path.into())),
            positions: Vec::new(),
        }
    }

    #[inline]
    pub fn new() -> Self {
        Self {
            meta: PropertyMeta::new(None),
            positions: Vec::new(),
        }
    }

    /// Appends a position.
    #[inline]
    pub fn with(mut self, position: impl Property) -> Self {
        self.positions.push(Box::new(position));
        self
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.positions.len()
    }

    fn check_arity(&self, actual: usize) -> PropertyResult<()> {
        if actual > self.positions.len() {
            return Err(PropertyError::Arity {
                expected: self.positions.len(),
                actual,
                class: None,
                path: None,
            });
        }
        Ok(())
    }

    /// The typed padding for positions past `len`.
    fn padding(&self, len: usize) -> impl Iterator<Item = Datum> + '_ {
        self.positions[len..]
            .iter()
            .map(|pos| pos.meta().default_value().cloned().unwrap_or_default())
    }
}

impl_meta_builder!(SpecifiedMixedList);

impl Property for SpecifiedMixedList {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::LIST
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::ARRAY
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self.positions.iter().map(|pos| pos.describe()).collect();
        format!("SpecifiedMixedList({})", names.join(", "))
    }

    fn admits(&self, value: &Datum) -> bool {
        match value {
            Datum::List(items) => items
                .iter()
                .zip(&self.positions)
                .all(|(item, pos)| pos.admits(item)),
            _ => false,
        }
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        let Datum::List(items) = value else {
            return Err(PropertyError::mismatch(value, expected(self)));
        };
        self.check_arity(items.len())?;
        let mut out = items
            .iter()
            .zip(&self.positions)
            .map(|(item, pos)| pos.serialize(item))
            .collect::<PropertyResult<Vec<_>>>()?;
        for pos in &self.positions[items.len()..] {
            out.push(match pos.meta().default_value() {
                Some(default) => pos.serialize(default)?,
                None => Value::Null,
            });
        }
        Ok(Value::Array(out))
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        let Value::Array(items) = value else {
            return Err(PropertyError::mismatch(value, "array"));
        };
        self.check_arity(items.len())?;
        let mut out = items
            .iter()
            .zip(&self.positions)
            .map(|(item, pos)| pos.deserialize(item))
            .collect::<PropertyResult<Vec<_>>>()?;
        out.extend(self.padding(items.len()));
        Ok(Datum::List(out))
    }

    fn assign(&self, member: Member) -> PropertyResult<Datum> {
        match member {
            Member::Elements(_) => self.assign_elements(member),
            other => assign_member(self, other),
        }
    }
}

impl PropertyCollection for SpecifiedMixedList {
    fn assign_elements(&self, member: Member) -> PropertyResult<Datum> {
        let members = match member {
            Member::Elements(members) => members,
            other => return Err(PropertyError::mismatch(other, "elements")),
        };
        self.check_arity(members.len())?;
        let len = members.len();
        let mut out = members
            .into_iter()
            .zip(&self.positions)
            .map(|(member, pos)| pos.assign(member))
            .collect::<PropertyResult<Vec<_>>>()?;
        out.extend(self.padding(len));
        Ok(Datum::List(out))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::vec;
    use serde_json::json;

    use super::SpecifiedMixedList;
    use crate::property::{Float, Integer, Member, Str};
    use crate::{Datum, Property, PropertyCollection, PropertyError};

    fn triple() -> SpecifiedMixedList {
        SpecifiedMixedList::new()
            .with(Integer::new())
            .with(Str::new().default("b"))
            .with(Float::new().default(2.5))
    }

    #[test]
    fn pads_with_each_positions_default() {
        let prop = triple();
        let value = prop.deserialize(&json!([1])).unwrap();
        assert_eq!(
            value,
            Datum::List(vec![Datum::Int(1), Datum::Str("b".into()), Datum::Float(2.5)])
        );

        let short = Datum::List(vec![Datum::Int(1), Datum::Str("x".into())]);
        assert_eq!(prop.serialize(&short).unwrap(), json!([1, "x", 2.5]));
    }

    #[test]
    fn pads_with_null_without_default() {
        let prop = SpecifiedMixedList::new().with(Integer::new()).with(Integer::new());
        let value = prop.deserialize(&json!([])).unwrap();
        assert_eq!(value, Datum::List(vec![Datum::Null, Datum::Null]));
    }

    #[test]
    fn too_many_elements() {
        let err = triple().deserialize(&json!([1, "a", 1.0, 4])).unwrap_err();
        assert!(matches!(
            err,
            PropertyError::Arity {
                expected: 3,
                actual: 4,
                ..
            }
        ));
    }

    #[test]
    fn assign_pads_too() {
        let value = triple()
            .assign_elements(Member::Elements(vec![Member::Serialized(json!("7"))]))
            .unwrap();
        assert_eq!(
            value,
            Datum::List(vec![Datum::Int(7), Datum::Str("b".into()), Datum::Float(2.5)])
        );
    }
}
