//! Structural hashing of [`Datum`]s, consistent with their equality.

use core::hash::{BuildHasher, Hash, Hasher};
use core::mem::discriminant;

use serde_json::{Number, Value};
use tx_utils::hash::{FixedHashState, FixedHasher};

use super::Datum;

/// Hashes `datum` so that equal values hash alike.
///
/// Floats hash by their bits with both zeros and every NaN folded
/// together. Sets, maps and JSON objects combine their members without
/// regard to order. Objects hash by class only.
pub(crate) fn datum_hash(datum: &Datum) -> u64 {
    let mut hasher = FixedHashState.build_hasher();
    write_datum(datum, &mut hasher);
    hasher.finish()
}

fn value_hash(value: &Value) -> u64 {
    let mut hasher = FixedHashState.build_hasher();
    write_value(value, &mut hasher);
    hasher.finish()
}

#[inline]
fn write_float(x: f64, hasher: &mut FixedHasher) {
    let bits = if x.is_nan() {
        f64::NAN.to_bits()
    } else if x == 0.0 {
        0
    } else {
        x.to_bits()
    };
    hasher.write_u64(bits);
}

/// Sums member hashes, so order does not matter.
#[inline]
fn unordered(hashes: impl Iterator<Item = u64>) -> u64 {
    hashes.fold(0, u64::wrapping_add)
}

fn write_datum(datum: &Datum, hasher: &mut FixedHasher) {
    discriminant(datum).hash(hasher);
    match datum {
        Datum::Null => {}
        Datum::Bool(b) => b.hash(hasher),
        Datum::Int(i) => i.hash(hasher),
        Datum::Float(x) => write_float(*x, hasher),
        Datum::Str(s) => s.hash(hasher),
        Datum::Uuid(id) => id.hash(hasher),
        Datum::DateTime(at) => at.hash(hasher),
        Datum::Json(value) => write_value(value, hasher),
        Datum::List(items) => {
            items.len().hash(hasher);
            for item in items {
                write_datum(item, hasher);
            }
        }
        Datum::Set(set) => {
            set.len().hash(hasher);
            hasher.write_u64(unordered(set.iter().map(datum_hash)));
        }
        Datum::Map(map) => {
            map.len().hash(hasher);
            hasher.write_u64(unordered(map.iter().map(|(k, v)| {
                let mut entry = FixedHashState.build_hasher();
                write_datum(k, &mut entry);
                write_datum(v, &mut entry);
                entry.finish()
            })));
        }
        Datum::Symbol(symbol) => symbol.hash(hasher),
        Datum::Link(link) => link.hash(hasher),
        Datum::Object(object) => object.class_name().hash(hasher),
    }
}

fn write_number(n: &Number, hasher: &mut FixedHasher) {
    if let Some(i) = n.as_i64() {
        i.hash(hasher);
    } else if let Some(u) = n.as_u64() {
        u.hash(hasher);
    } else if let Some(x) = n.as_f64() {
        write_float(x, hasher);
    }
}

fn write_value(value: &Value, hasher: &mut FixedHasher) {
    discriminant(value).hash(hasher);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(hasher),
        Value::Number(n) => write_number(n, hasher),
        Value::String(s) => s.hash(hasher),
        Value::Array(items) => {
            items.len().hash(hasher);
            for item in items {
                write_value(item, hasher);
            }
        }
        Value::Object(map) => {
            map.len().hash(hasher);
            hasher.write_u64(unordered(map.iter().map(|(k, v)| {
                let mut entry = FixedHashState.build_hasher();
                k.hash(&mut entry);
                entry.write_u64(value_hash(v));
                entry.finish()
            })));
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::datum_hash;
    use crate::{Datum, DatumMap, DatumSet};

    #[test]
    fn signed_zeros_hash_alike() {
        assert_eq!(Datum::Float(0.0), Datum::Float(-0.0));
        assert_eq!(datum_hash(&Datum::Float(0.0)), datum_hash(&Datum::Float(-0.0)));
    }

    #[test]
    fn unordered_members_hash_alike() {
        let a: DatumSet = [Datum::Int(1), Datum::Int(2)].into_iter().collect();
        let b: DatumSet = [Datum::Int(2), Datum::Int(1)].into_iter().collect();
        assert_eq!(datum_hash(&Datum::Set(a)), datum_hash(&Datum::Set(b)));

        let a: DatumMap = [(Datum::Int(1), Datum::Null), (Datum::Int(2), Datum::Null)]
            .into_iter()
            .collect();
        let b: DatumMap = [(Datum::Int(2), Datum::Null), (Datum::Int(1), Datum::Null)]
            .into_iter()
            .collect();
        assert_eq!(datum_hash(&Datum::Map(a)), datum_hash(&Datum::Map(b)));

        let a = Datum::Json(json!({ "x": 1, "y": [true] }));
        let b = Datum::Json(json!({ "y": [true], "x": 1 }));
        assert_eq!(datum_hash(&a), datum_hash(&b));
    }

    #[test]
    fn variants_are_distinguished() {
        assert_ne!(datum_hash(&Datum::Int(1)), datum_hash(&Datum::Float(1.0)));
        assert_ne!(datum_hash(&Datum::Null), datum_hash(&Datum::Bool(false)));
    }
}
