use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde_json::{Map, Value};

use super::{Member, PropertyCollection, PropertyMeta, assign_member, expected, impl_meta_builder, meta_accessors};
use crate::{Datum, DatumKinds, DatumMap, FieldPath, Property, PropertyError, PropertyResult, ValueKinds};

/// A map whose keys and values go through their own child properties.
///
/// By default a mapping serializes to an object, with number and boolean
/// keys written as strings. Keys that cannot be object keys need
/// [`ser_as_list_of_pairs`](Mapping::ser_as_list_of_pairs). Both wire
/// forms are accepted on decode.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tx_property::property::{Float, Integer, Mapping, Property};
///
/// let prop = Mapping::new(Integer::new(), Float::new());
/// let map = prop.deserialize(&json!({ "1": 0.5 })).unwrap();
/// assert_eq!(map, prop.deserialize(&json!([[1, 0.5]])).unwrap());
/// assert_eq!(prop.serialize(&map).unwrap(), json!({ "1": 0.5 }));
/// ```
#[derive(Debug)]
pub struct Mapping {
    meta: PropertyMeta,
    keys: Box<dyn Property>,
    values: Box<dyn Property>,
    as_pairs: bool,
}

impl Mapping {
    #[inline]
    pub fn at(path: impl Into<FieldPath>, keys: impl Property, values: impl Property) -> Self {
        Self {
            meta: PropertyMeta::new(Some(path.into())),
            keys: Box::new(keys),
            values: Box::new(values),
            as_pairs: false,
        }
    }

    #[inline]
    pub fn new(keys: impl Property, values: impl Property) -> Self {
        Self {
            meta: PropertyMeta::new(None),
            keys: Box::new(keys),
            values: Box::new(values),
            as_pairs: false,
        }
    }

    /// Serializes as an array of `[key, value]` pairs.
    #[inline]
    pub fn ser_as_list_of_pairs(mut self) -> Self {
        self.as_pairs = true;
        self
    }

    #[inline]
    pub fn keys(&self) -> &dyn Property {
        &*self.keys
    }

    #[inline]
    pub fn values(&self) -> &dyn Property {
        &*self.values
    }

    fn decode_pair(&self, pair: &Value) -> PropertyResult<(Datum, Datum)> {
        match pair.as_array().map(Vec::as_slice) {
            Some([key, value]) => Ok((self.keys.deserialize(key)?, self.values.deserialize(value)?)),
            _ => Err(PropertyError::mismatch(pair, "a [key, value] pair")),
        }
    }
}

impl_meta_builder!(Mapping);

fn object_key(key: Value) -> PropertyResult<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(PropertyError::mismatch(
            other,
            "a string, number or boolean key (use ser_as_list_of_pairs)",
        )),
    }
}

impl Property for Mapping {
    meta_accessors!();

    #[inline]
    fn underlying_kinds(&self) -> DatumKinds {
        DatumKinds::MAP
    }

    #[inline]
    fn serialized_kinds(&self) -> ValueKinds {
        ValueKinds::OBJECT | ValueKinds::ARRAY
    }

    fn describe(&self) -> String {
        format!("Mapping({}, {})", self.keys.describe(), self.values.describe())
    }

    fn admits(&self, value: &Datum) -> bool {
        match value {
            Datum::Map(map) => map
                .iter()
                .all(|(k, v)| self.keys.admits(k) && self.values.admits(v)),
            _ => false,
        }
    }

    fn encode(&self, value: &Datum) -> PropertyResult<Value> {
        let Datum::Map(map) = value else {
            return Err(PropertyError::mismatch(value, expected(self)));
        };
        if self.as_pairs {
            let pairs = map
                .iter()
                .map(|(k, v)| {
                    Ok(Value::Array(alloc::vec![
                        self.keys.serialize(k)?,
                        self.values.serialize(v)?,
                    ]))
                })
                .collect::<PropertyResult<Vec<_>>>()?;
            return Ok(Value::Array(pairs));
        }
        let mut out = Map::new();
        for (k, v) in map.iter() {
            out.insert(object_key(self.keys.serialize(k)?)?, self.values.serialize(v)?);
        }
        Ok(Value::Object(out))
    }

    fn decode(&self, value: &Value) -> PropertyResult<Datum> {
        let map = match value {
            Value::Object(entries) => entries
                .iter()
                .map(|(k, v)| {
                    let key = self.keys.deserialize(&Value::String(k.clone()))?;
                    Ok((key, self.values.deserialize(v)?))
                })
                .collect::<PropertyResult<DatumMap>>()?,
            Value::Array(pairs) => pairs
                .iter()
                .map(|pair| self.decode_pair(pair))
                .collect::<PropertyResult<DatumMap>>()?,
            other => return Err(PropertyError::mismatch(other, "an object or array of pairs")),
        };
        Ok(Datum::Map(map))
    }

    fn assign(&self, member: Member) -> PropertyResult<Datum> {
        match member {
            Member::Entries(_) => self.assign_elements(member),
            other => assign_member(self, other),
        }
    }
}

impl PropertyCollection for Mapping {
    fn assign_elements(&self, member: Member) -> PropertyResult<Datum> {
        let entries = match member {
            Member::Entries(entries) => entries,
            other => return Err(PropertyError::mismatch(other, "entries")),
        };
        entries
            .into_iter()
            .map(|(k, v)| Ok((self.keys.assign(k)?, self.values.assign(v)?)))
            .collect::<PropertyResult<DatumMap>>()
            .map(Datum::Map)
    }
}

// -----------------------------------------------------------------------------
// Tests
