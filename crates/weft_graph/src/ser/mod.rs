//! The write path: object graph to structural output.
//!
//! [`GraphWriter`] walks the graph with the same descriptors the parse path
//! uses and drives a dialect [`Emitter`]. Shared and cyclic elements are
//! written once and referenced afterwards, so writing always terminates.

mod emitter;
mod writer;

pub use emitter::Emitter;
pub use writer::GraphWriter;
