use alloc::vec::Vec;
use core::fmt;

use serde_json::Value;

// -----------------------------------------------------------------------------
// DatumKinds

bitflags::bitflags! {
    /// A set of underlying value kinds, see [`Datum::kinds`].
    ///
    /// [`Datum::kinds`]: crate::Datum::kinds
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DatumKinds: u16 {
        const NULL = 1 << 0;
        const BOOL = 1 << 1;
        const INT = 1 << 2;
        const FLOAT = 1 << 3;
        const STR = 1 << 4;
        const UUID = 1 << 5;
        const DATETIME = 1 << 6;
        const JSON = 1 << 7;
        const LIST = 1 << 8;
        const SET = 1 << 9;
        const MAP = 1 << 10;
        const SYMBOL = 1 << 11;
        const LINK = 1 << 12;
        const OBJECT = 1 << 13;
    }
}

const DATUM_NAMES: [(DatumKinds, &str); 14] = [
    (DatumKinds::NULL, "null"),
    (DatumKinds::BOOL, "bool"),
    (DatumKinds::INT, "int"),
    (DatumKinds::FLOAT, "float"),
    (DatumKinds::STR, "str"),
    (DatumKinds::UUID, "uuid"),
    (DatumKinds::DATETIME, "datetime"),
    (DatumKinds::JSON, "json"),
    (DatumKinds::LIST, "list"),
    (DatumKinds::SET, "set"),
    (DatumKinds::MAP, "map"),
    (DatumKinds::SYMBOL, "symbol"),
    (DatumKinds::LINK, "link"),
    (DatumKinds::OBJECT, "object"),
];

impl fmt::Display for DatumKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("any value");
        }
        write_names(f, DATUM_NAMES.iter().filter(|(k, _)| self.contains(*k)).map(|(_, n)| *n))
    }
}

// -----------------------------------------------------------------------------
// ValueKinds

bitflags::bitflags! {
    /// A set of serialized value kinds.
    ///
    /// Booleans are their own kind; a JSON `true` is never an integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use tx_property::ValueKinds;
    ///
    /// assert_eq!(ValueKinds::of(&json!(1)), ValueKinds::INT);
    /// assert_eq!(ValueKinds::of(&json!(1.5)), ValueKinds::FLOAT);
    /// assert_eq!(ValueKinds::of(&json!(true)), ValueKinds::BOOL);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ValueKinds: u8 {
        const NULL = 1 << 0;
        const BOOL = 1 << 1;
        const INT = 1 << 2;
        const FLOAT = 1 << 3;
        const STRING = 1 << 4;
        const ARRAY = 1 << 5;
        const OBJECT = 1 << 6;
    }
}

impl ValueKinds {
    /// Returns the kind of a serialized value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::NULL,
            Value::Bool(_) => Self::BOOL,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::INT,
            Value::Number(_) => Self::FLOAT,
            Value::String(_) => Self::STRING,
            Value::Array(_) => Self::ARRAY,
            Value::Object(_) => Self::OBJECT,
        }
    }
}

const VALUE_NAMES: [(ValueKinds, &str); 7] = [
    (ValueKinds::NULL, "null"),
    (ValueKinds::BOOL, "bool"),
    (ValueKinds::INT, "int"),
    (ValueKinds::FLOAT, "float"),
    (ValueKinds::STRING, "string"),
    (ValueKinds::ARRAY, "array"),
    (ValueKinds::OBJECT, "object"),
];

impl fmt::Display for ValueKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("any value");
        }
        write_names(f, VALUE_NAMES.iter().filter(|(k, _)| self.contains(*k)).map(|(_, n)| *n))
    }
}

fn write_names<'a>(
    f: &mut fmt::Formatter<'_>,
    names: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    let names: Vec<&str> = names.collect();
    match names.as_slice() {
        [] => f.write_str("nothing"),
        [one] => f.write_str(one),
        many => write!(f, "one of ({})", many.join(", ")),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::{DatumKinds, ValueKinds};

    #[test]
    fn display() {
        assert_eq!(DatumKinds::INT.to_string(), "int");
        assert_eq!(
            (DatumKinds::INT | DatumKinds::NULL).to_string(),
            "one of (null, int)"
        );
        assert_eq!(DatumKinds::all().to_string(), "any value");
        assert_eq!(
            (ValueKinds::INT | ValueKinds::STRING).to_string(),
            "one of (int, string)"
        );
    }
}
