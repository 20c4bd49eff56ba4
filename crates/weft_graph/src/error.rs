//! Error types.
//!
//! Fatal conditions surface as one [`TranslationError`] whose
//! [`source`](core::error::Error::source) is the [`ErrorKind`] that stopped
//! the document. Recoverable conditions never become errors; see
//! [`Diagnostic`](crate::Diagnostic).

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;

use crate::event::{Origin, TextPosition};
use crate::graph::ObjectId;
use crate::scalar::ScalarError;

// -----------------------------------------------------------------------------
// TokenError

/// A syntax error reported by a tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TokenError {
    pub message: String,
    pub position: Option<TextPosition>,
}

impl TokenError {
    #[inline]
    pub fn new(message: impl Into<String>, position: Option<TextPosition>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

// -----------------------------------------------------------------------------
// ErrorKind

/// The low-level cause of a failed parse or write.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("no class is registered for root tag `{tag}`")]
    UnknownRoot { tag: String },

    #[error("syntax error: {0}")]
    Syntax(#[from] TokenError),

    #[error("container `{tag}` carries both an identity and a reference marker")]
    IdentityAndReference { tag: String },

    #[error("identity `{token}` is declared more than once")]
    DuplicateIdentity { token: String },

    #[error("identity `{token}` was referenced as `{expected}` but declared as `{found}`")]
    ReferenceTypeMismatch {
        token: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("marker `{marker}` of container `{tag}` follows the container's content")]
    MisplacedMarker { marker: String, tag: String },

    #[error("unexpected {found} {context}")]
    Unexpected {
        found: &'static str,
        context: &'static str,
    },

    #[error(transparent)]
    Scalar(#[from] ScalarError),

    #[error("type `{type_name}` has no class in scope `{scope}`")]
    UnregisteredType {
        type_name: &'static str,
        scope: String,
    },

    #[error("object {0:?} is not part of the graph")]
    MissingObject(ObjectId),

    #[error("nesting exceeds the limit of {limit} levels")]
    DepthLimit { limit: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Fmt(#[from] fmt::Error),
}

impl ErrorKind {
    #[inline]
    pub(crate) const fn unexpected(found: &'static str, context: &'static str) -> Self {
        ErrorKind::Unexpected { found, context }
    }

    /// The text position recorded by the error itself, if any.
    pub fn position(&self) -> Option<TextPosition> {
        match self {
            ErrorKind::Syntax(err) => err.position,
            ErrorKind::Json(err) if err.line() > 0 => {
                Some(TextPosition::new(err.line(), err.column()))
            }
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// SourceLocation

/// Best-available location of a fatal error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub origin: Option<Origin>,
    pub position: Option<TextPosition>,
    /// Tags of the containers open when the error occurred, outermost first.
    pub path: Vec<String>,
}

impl SourceLocation {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.origin.is_none() && self.position.is_none() && self.path.is_empty()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(origin) = &self.origin {
            write!(f, "{origin}")?;
            sep = " ";
        }
        if let Some(position) = &self.position {
            write!(f, "{sep}at {position}")?;
            sep = " ";
        }
        if cfg!(feature = "debug") && !self.path.is_empty() {
            write!(f, "{sep}in <{}>", self.path.join("/"))?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// TranslationError

/// The single fatal error kind of parsing and writing.
#[derive(Debug, Error)]
#[error("{message}{}", located(.location))]
pub struct TranslationError {
    message: String,
    location: SourceLocation,
    #[source]
    cause: ErrorKind,
}

fn located(location: &SourceLocation) -> String {
    if location.is_empty() {
        String::new()
    } else {
        alloc::format!(" ({location})")
    }
}

impl TranslationError {
    pub fn new(cause: ErrorKind, location: SourceLocation) -> Self {
        Self {
            message: cause.to_string(),
            location,
            cause,
        }
    }

    /// Replaces the default message, which repeats the cause.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.cause
    }

    #[inline]
    pub fn into_kind(self) -> ErrorKind {
        self.cause
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{ErrorKind, SourceLocation, TokenError, TranslationError};
    use crate::event::{Origin, TextPosition};

    #[test]
    fn message_carries_location() {
        let location = SourceLocation {
            origin: Some(Origin::from("zoo.xml")),
            position: Some(TextPosition::new(3, 7)),
            path: vec!["zoo".into(), "cat".into()],
        };
        let err = TranslationError::new(
            ErrorKind::Syntax(TokenError::new("unclosed tag", None)),
            location,
        );
        let text = err.to_string();
        assert!(text.starts_with("syntax error: unclosed tag (zoo.xml at 3:7"));
        #[cfg(feature = "debug")]
        assert!(text.ends_with("in <zoo/cat>)"));
        assert!(err.source().is_some());
    }

    #[test]
    fn empty_location_is_omitted() {
        let err = TranslationError::new(
            ErrorKind::UnknownRoot { tag: "moon".into() },
            SourceLocation::default(),
        );
        assert_eq!(err.to_string(), "no class is registered for root tag `moon`");
        assert!(matches!(err.kind(), ErrorKind::UnknownRoot { tag } if tag == "moon"));
    }
}
