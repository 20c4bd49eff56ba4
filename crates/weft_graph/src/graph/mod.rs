//! The in-memory object graph.
//!
//! Materialized objects live in an [`ObjectGraph`] arena and refer to each
//! other through [`ObjectId`] handles, so cycles and shared children never
//! form ownership cycles. Each node also records its structural parent as a
//! plain handle.

mod element;
mod object_graph;

pub use element::{AsAny, Element, Keyed};
pub use object_graph::{ObjectGraph, ObjectId};
