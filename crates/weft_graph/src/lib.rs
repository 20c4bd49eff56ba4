#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Extern crates

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod context;
mod de;
mod diagnostic;
mod error;
mod scope;
mod translator;

pub mod dialect;
pub mod event;
pub mod graph;
pub mod info;
pub mod pool;
pub mod scalar;
pub mod ser;

#[cfg(test)]
mod testing;

// -----------------------------------------------------------------------------
// Top-level exports

pub use context::{Materialized, TranslationContext};
pub use de::{Parsed, parse_pull, parse_push};
pub use diagnostic::Diagnostic;
pub use dialect::Dialect;
pub use error::{ErrorKind, SourceLocation, TokenError, TranslationError};
pub use scope::{Describe, ScopeBuilder, ScopeError, TranslationScope};
pub use translator::{Driver, Translator, TranslatorConfig};
