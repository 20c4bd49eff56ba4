//! The markup dialect.
//!
//! Scalars are attributes, leaf elements or inline text according to their
//! [`Hint`](crate::info::Hint); objects are child elements. Collections have
//! no element of their own unless wrapped. Markers are the `graph:id` and
//! `graph:ref` attributes.

mod emitter;
mod tokenizer;

pub use emitter::XmlEmitter;
pub use tokenizer::{XmlScratch, XmlTokenizer};

/// Namespace bound to the `graph` marker prefix on written documents.
pub const GRAPH_NAMESPACE: &str = "urn:weft:graph";
