use core::fmt;

// -----------------------------------------------------------------------------
// FieldKind

/// Wire representation of a field.
///
/// The kind of a [`FieldDescriptor`](crate::info::FieldDescriptor) is fixed
/// at construction and selects how the engine consumes the events of the
/// field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A single scalar decoded by the field's scalar codec.
    Scalar,
    /// A single nested object.
    Composite,
    /// An ordered sequence of nested objects.
    CompositeCollection,
    /// An ordered sequence of scalars.
    ScalarCollection,
    /// Nested objects stored under the key they compute themselves.
    CompositeMap,
    /// A shell around exactly one other field.
    Wrapper,
    /// Consumed and discarded.
    Ignored,
}

impl FieldKind {
    /// Returns `true` for kinds whose values are nested objects.
    #[inline]
    pub const fn holds_objects(self) -> bool {
        matches!(
            self,
            FieldKind::Composite | FieldKind::CompositeCollection | FieldKind::CompositeMap
        )
    }

    /// Returns `true` for kinds whose value is a sequence.
    #[inline]
    pub const fn is_sequence(self) -> bool {
        matches!(
            self,
            FieldKind::CompositeCollection | FieldKind::ScalarCollection | FieldKind::CompositeMap
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            FieldKind::Scalar => "scalar",
            FieldKind::Composite => "composite",
            FieldKind::CompositeCollection => "collection",
            FieldKind::ScalarCollection => "scalar collection",
            FieldKind::CompositeMap => "map",
            FieldKind::Wrapper => "wrapper",
            FieldKind::Ignored => "ignored",
        }
    }
}

impl fmt::Display for FieldKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// Hint

/// Markup shape of a scalar field.
///
/// Only the XML dialect distinguishes these; JSON always writes a named member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Hint {
    /// `<owner tag="text"/>`
    #[default]
    Attribute,
    /// `<owner><tag>text</tag></owner>`
    Leaf,
    /// `<owner>text</owner>`, at most one per class.
    Text,
}
