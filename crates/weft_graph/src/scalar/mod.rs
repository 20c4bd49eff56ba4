//! Scalar values and the codecs translating them to and from wire text.
//!
//! - [`Scalar`]: the dynamic in-memory form of one scalar token.
//! - [`ScalarType`]: a Rust type that can live in a scalar field slot.
//! - [`ScalarCodec`]: decodes wire text into a [`Scalar`] and back; besides
//!   the primitives there are `chrono` date codecs and [`EnumCodec`] for
//!   closed sets of names with optional custom values.
//! - [`ScalarRegistry`]: codecs keyed by the declared scalar type name.
//!
//! A field descriptor names its scalar type (for example `"u32"`); the engine
//! asks the registry for that codec, decodes the text, then hands the decoded
//! [`Scalar`] to the field's typed slot which converts it with
//! [`ScalarType::from_scalar`].

// -----------------------------------------------------------------------------
// Modules

mod codec;
mod registry;
mod value;

// -----------------------------------------------------------------------------
// Exports

pub use codec::{BoolCodec, DateCodec, DateTimeCodec, EnumCodec, FromStrCodec, ScalarCodec, StringCodec};
pub use registry::ScalarRegistry;
pub use value::{Scalar, ScalarError, ScalarType};
