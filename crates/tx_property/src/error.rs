#[cfg(all(debug_assertions, feature = "debug"))]
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;

/// Shorthand for results produced by this crate.
pub type PropertyResult<T> = Result<T, PropertyError>;

// -----------------------------------------------------------------------------
// Error

/// Every failure raised while converting between models, [`Datum`]s and
/// serialized values.
///
/// Errors are returned to the immediate caller; nothing here is retried,
/// logged or swallowed.
///
/// [`Datum`]: crate::Datum
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum PropertyError {
    #[error("`{value}` is not an instance of {expected}{}", Location(.class, .path))]
    TypeMismatch {
        value: String,
        expected: String,
        class: Option<&'static str>,
        path: Option<String>,
    },

    #[error("cannot read `{value}` as {target}: {reason}{}", Location(.class, .path))]
    Malformed {
        value: String,
        target: &'static str,
        reason: String,
        class: Option<&'static str>,
        path: Option<String>,
    },

    #[error("unable to deserialize {container}, missing a required field `{segment}` of path `{path}`")]
    MissingField {
        segment: String,
        path: String,
        container: String,
    },

    #[error("property has no serialization path{}", Location(.class, &None))]
    MissingPath { class: Option<&'static str> },

    #[error("cannot write path `{path}`: segment `{segment}` holds a non-mapping value")]
    PathConflict { segment: String, path: String },

    #[error("expected at most {expected} elements, found {actual}{}", Location(.class, .path))]
    Arity {
        expected: usize,
        actual: usize,
        class: Option<&'static str>,
        path: Option<String>,
    },

    #[error("reference `{value}` is missing required field `{field}`")]
    MissingReference { field: &'static str, value: String },

    #[error("no alternative accepted `{value}`; attempted {attempted}")]
    ExhaustedAlternatives { value: String, attempted: String },

    #[error("unrecognized {family} type `{tag}`; valid types: {}", TagList(.valid))]
    UnrecognizedType {
        tag: String,
        family: &'static str,
        valid: Vec<&'static str>,
    },

    #[error("{family} type `{tag}` is registered by more than one subtype")]
    AmbiguousType { tag: String, family: &'static str },

    #[error("only links can be deserialized here, build `{value}` through its own type instead")]
    NotLinkable { value: String },

    #[error("`{class}` declares no fields and has no serialization method")]
    NoSerializer { class: &'static str },

    #[error("`{class}` declares no fields and has no build method")]
    NoBuilder { class: &'static str },

    #[error("`{class}` has no field named `{field}`")]
    UnknownField { class: &'static str, field: String },

    #[cfg(all(debug_assertions, feature = "debug"))]
    #[error("{source} (trail: {trail})")]
    Traced {
        trail: String,
        source: Box<PropertyError>,
    },
}

impl PropertyError {
    /// A [`TypeMismatch`](Self::TypeMismatch) without location.
    #[cold]
    pub fn mismatch(value: impl fmt::Display, expected: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            value: value.to_string(),
            expected: expected.to_string(),
            class: None,
            path: None,
        }
    }

    /// A [`Malformed`](Self::Malformed) without location.
    #[cold]
    pub fn malformed(
        value: impl fmt::Display,
        target: &'static str,
        reason: impl fmt::Display,
    ) -> Self {
        Self::Malformed {
            value: value.to_string(),
            target,
            reason: reason.to_string(),
            class: None,
            path: None,
        }
    }

    /// Attaches the owning class and field path to an error that
    /// does not carry a location yet.
    ///
    /// The innermost location wins: an error raised inside a nested
    /// object keeps the nested class and path.
    pub fn within(self, owner: &'static str, field_path: &str) -> Self {
        match self {
            #[cfg(all(debug_assertions, feature = "debug"))]
            Self::Traced { trail, source } => Self::Traced {
                trail,
                source: Box::new((*source).within(owner, field_path)),
            },
            mut other => {
                other.locate(owner, field_path);
                other
            }
        }
    }

    fn locate(&mut self, owner: &'static str, field_path: &str) {
        match self {
            Self::TypeMismatch { class, path, .. }
            | Self::Malformed { class, path, .. }
            | Self::Arity { class, path, .. } => {
                if class.is_none() && path.is_none() {
                    *class = Some(owner);
                    *path = Some(field_path.to_string());
                }
            }
            Self::MissingPath { class } => {
                class.get_or_insert(owner);
            }
            _ => {}
        }
    }

    /// Returns the error with any debug trail removed.
    #[inline]
    pub fn root(&self) -> &Self {
        #[cfg(all(debug_assertions, feature = "debug"))]
        if let Self::Traced { source, .. } = self {
            return source.root();
        }
        self
    }
}

// -----------------------------------------------------------------------------
// Display helpers

struct Location<'a>(&'a Option<&'static str>, &'a Option<String>);

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.0, self.1) {
            (Some(class), Some(path)) => write!(f, " (field `{path}` of `{class}`)"),
            (Some(class), None) => write!(f, " (in `{class}`)"),
            (None, Some(path)) => write!(f, " (field `{path}`)"),
            (None, None) => Ok(()),
        }
    }
}

struct TagList<'a>(&'a [&'static str]);

impl fmt::Display for TagList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        for (index, tag) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "`{tag}`")?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::PropertyError;

    #[test]
    fn innermost_location_wins() {
        let err = PropertyError::mismatch("true", "int")
            .within("Inner", "value")
            .within("Outer", "inner");
        assert_eq!(
            err.to_string(),
            "`true` is not an instance of int (field `value` of `Inner`)"
        );
    }

    #[test]
    fn unrecognized_type_lists_tags() {
        let err = PropertyError::UnrecognizedType {
            tag: "NoSuchType".into(),
            family: "Descriptor",
            valid: vec!["Real", "Integer"],
        };
        let msg = err.to_string();
        assert!(msg.contains("`NoSuchType`"));
        assert!(msg.contains("`Real`, `Integer`"));
    }
}
