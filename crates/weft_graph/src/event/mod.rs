//! The structural events shared by every wire dialect.
//!
//! Tokenizers normalize their syntax into this grammar:
//!
//! ```text
//! document  := container EndDocument
//! container := StartContainer member* EndContainer
//! member    := FieldName value | container | ScalarText
//! value     := ScalarText | container | StartSequence item* EndSequence
//! item      := ScalarText | container | StartSequence item* EndSequence
//! ```
//!
//! Identity and reference markers travel either on the [`Event::StartContainer`]
//! event itself or, for streaming tokenizers, as leading `FieldName`/`ScalarText`
//! pairs named by [`Marker`].

mod listener;
mod source;

pub use listener::{EventListener, PullTokenizer, Pump, PushTokenizer, pump};
pub use source::{Origin, TextPosition};

use alloc::string::String;

/// Default bound on open containers and sequences while reading or writing.
///
/// Exceeding it fails with [`ErrorKind::DepthLimit`](crate::ErrorKind::DepthLimit).
pub const DEFAULT_MAX_DEPTH: usize = 256;

// -----------------------------------------------------------------------------
// Markers

/// The identity and reference tokens carried by a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markers {
    pub id: Option<String>,
    pub reference: Option<String>,
}

impl Markers {
    #[inline]
    pub const fn new() -> Self {
        Self {
            id: None,
            reference: None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.reference.is_none()
    }

    /// Records `token` for `marker`, replacing a previous value.
    pub fn set(&mut self, marker: Marker, token: impl Into<String>) {
        match marker {
            Marker::Id => self.id = Some(token.into()),
            Marker::Ref => self.reference = Some(token.into()),
        }
    }
}

/// Names of the identity and reference markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Id,
    Ref,
}

impl Marker {
    /// Attribute names in the markup dialect.
    pub const XML_ID: &'static str = "graph:id";
    pub const XML_REF: &'static str = "graph:ref";
    /// Member names in the key-value dialect.
    pub const JSON_ID: &'static str = "graph.id";
    pub const JSON_REF: &'static str = "graph.ref";

    /// Recognizes a marker name of either dialect.
    pub fn from_name(name: &str) -> Option<Marker> {
        match name {
            Self::XML_ID | Self::JSON_ID => Some(Marker::Id),
            Self::XML_REF | Self::JSON_REF => Some(Marker::Ref),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Event

/// One structural event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StartContainer { tag: String, markers: Markers },
    FieldName(String),
    ScalarText(String),
    EndContainer,
    StartSequence,
    EndSequence,
    EndDocument,
}

impl Event {
    /// A short description used in error messages.
    pub const fn describe(&self) -> &'static str {
        match self {
            Event::StartContainer { .. } => "container",
            Event::FieldName(_) => "field name",
            Event::ScalarText(_) => "text",
            Event::EndContainer => "end of container",
            Event::StartSequence => "sequence",
            Event::EndSequence => "end of sequence",
            Event::EndDocument => "end of document",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Marker, Markers};

    #[test]
    fn marker_names_of_both_dialects() {
        assert_eq!(Marker::from_name("graph:id"), Some(Marker::Id));
        assert_eq!(Marker::from_name("graph.ref"), Some(Marker::Ref));
        assert_eq!(Marker::from_name("id"), None);

        let mut markers = Markers::new();
        assert!(markers.is_empty());
        markers.set(Marker::Ref, "7");
        assert_eq!(markers.reference.as_deref(), Some("7"));
    }
}
