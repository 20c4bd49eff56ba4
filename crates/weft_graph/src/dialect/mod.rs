//! Wire dialects.
//!
//! Each dialect provides tokenizers that normalize its syntax into
//! [`Event`](crate::event::Event)s and an [`Emitter`](crate::ser::Emitter)
//! that renders the writer's output back into that syntax.

pub mod json;
pub mod xml;

use core::fmt;

use serde::{Deserialize, Serialize};

/// A supported wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Tag and attribute based markup.
    Xml,
    /// Nested key-value documents.
    Json,
}

impl Dialect {
    pub const fn name(self) -> &'static str {
        match self {
            Dialect::Xml => "xml",
            Dialect::Json => "json",
        }
    }

    /// Guesses the dialect from a file extension.
    pub fn from_extension(extension: &str) -> Option<Dialect> {
        if extension.eq_ignore_ascii_case("xml") {
            Some(Dialect::Xml)
        } else if extension.eq_ignore_ascii_case("json") {
            Some(Dialect::Json)
        } else {
            None
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
