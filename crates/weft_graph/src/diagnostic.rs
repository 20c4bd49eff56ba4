use alloc::string::String;
use core::fmt;

// -----------------------------------------------------------------------------
// Diagnostic

/// A recoverable condition met while parsing.
///
/// Diagnostics never interrupt a parse. They are collected in order and
/// returned next to the materialized graph, and each one is logged with
/// [`log::warn!`] when it is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Diagnostic {
    /// A class met a tag it does not declare; reported once per class and tag.
    UnknownTag { class: String, tag: String },
    /// A container tag is not an allowed class of the field it fills.
    UnknownSubtype { field: String, tag: String },
    /// A map value of class `class` cannot compute its own key.
    UnkeyedMapElement { field: String, class: String },
    /// A value has a shape the field cannot hold.
    ShapeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    /// A reference token never met its identity declaration.
    DanglingReference { token: String },
}

impl Diagnostic {
    /// Returns `true` for conditions that may leave the graph incomplete.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Diagnostic::DanglingReference { .. } | Diagnostic::UnkeyedMapElement { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownTag { class, tag } => {
                write!(f, "class `{class}` has no field for tag `{tag}`; ignored")
            }
            Diagnostic::UnknownSubtype { field, tag } => {
                write!(f, "`{tag}` is not an allowed class for field `{field}`; ignored")
            }
            Diagnostic::UnkeyedMapElement { field, class } => {
                write!(f, "`{class}` in map `{field}` does not compute a key; dropped")
            }
            Diagnostic::ShapeMismatch {
                field,
                expected,
                found,
            } => write!(f, "field `{field}` expects {expected} but found {found}; ignored"),
            Diagnostic::DanglingReference { token } => {
                write!(f, "reference `{token}` has no matching identity")
            }
        }
    }
}
