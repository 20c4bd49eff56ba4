//! Descriptor model: per-class and per-field metadata consumed by the engine.
//!
//! - [`ClassDescriptor`]: wire tag, factory and flattened field table of one type.
//! - [`FieldDescriptor`]: wire tag, [`FieldKind`], scalar type or child class
//!   resolution, and a type-erased accessor of one field.
//! - [`Lens`]: the projection from an element onto a field slot.
//!
//! Descriptors are immutable once built and are shared read-only by every
//! parse and write that uses the scope holding them.

mod access;
mod class_descriptor;
mod field_descriptor;
mod kind;

pub use access::Lens;
pub use class_descriptor::{ClassBuilder, ClassDescriptor};
pub use field_descriptor::FieldDescriptor;
pub use kind::{FieldKind, Hint};

pub(crate) use field_descriptor::IGNORED;
