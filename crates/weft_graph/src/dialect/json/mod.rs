//! The nested key-value dialect.
//!
//! A document is `{"<root tag>": <body>}` and every body is an object of
//! members. An object-valued member is a single-member object naming the
//! container tag, `{"<tag>": <body>}`; sequences are arrays. Markers are the
//! leading `graph.id` and `graph.ref` members of a body. `null` members are
//! skipped.

mod emitter;
mod pull;
mod push;

pub use emitter::{JsonEmitter, write_value};
pub use pull::{JsonPullTokenizer, JsonScratch};
pub use push::JsonPushTokenizer;
