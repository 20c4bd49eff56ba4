//! Materialization of object graphs from structural events.
//!
//! Two drivers implement the same dispatch table:
//!
//! - the push driver is an [`EventListener`](crate::event::EventListener)
//!   state machine the tokenizer calls into;
//! - the pull driver recursively requests events from a
//!   [`PullTokenizer`](crate::event::PullTokenizer).
//!
//! Either way the outcome is a [`Parsed`] document or a fatal
//! [`TranslationError`]; no partially built graph escapes a failed parse.

mod dispatch;
mod pull;
mod push;

use alloc::string::String;
use alloc::vec::Vec;

use crate::context::TranslationContext;
use crate::diagnostic::Diagnostic;
use crate::error::{ErrorKind, SourceLocation, TranslationError};
use crate::event::{Origin, PullTokenizer, PushTokenizer, TextPosition};
use crate::graph::{Element, ObjectGraph, ObjectId};
use crate::scope::TranslationScope;

use pull::PullDriver;
use push::PushDriver;

// -----------------------------------------------------------------------------
// Parsed

/// A successfully materialized document.
#[derive(Debug)]
pub struct Parsed {
    pub graph: ObjectGraph,
    pub root: ObjectId,
    /// Recoverable conditions met while parsing, in document order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    /// The root element as `T`.
    #[inline]
    pub fn root_as<T: Element>(&self) -> Option<&T> {
        self.graph.downcast::<T>(self.root)
    }

    /// Follows `id` to an element of type `T`.
    #[inline]
    pub fn get<T: Element>(&self, id: ObjectId) -> Option<&T> {
        self.graph.downcast::<T>(id)
    }
}

// -----------------------------------------------------------------------------
// Entry points

/// Parses a document with the pull driver.
///
/// At most `max_depth` containers may be open at once.
pub fn parse_pull<T>(
    scope: &TranslationScope,
    tokenizer: &mut T,
    origin: Option<Origin>,
    max_depth: usize,
) -> Result<Parsed, TranslationError>
where
    T: PullTokenizer + ?Sized,
{
    let ctx = TranslationContext::new(scope).with_max_depth(max_depth);
    let mut driver = PullDriver::new(ctx, tokenizer);
    match driver.parse_document() {
        Ok(root) => complete(driver.into_context(), root, origin),
        Err(kind) => {
            let position = driver.tokenizer().position();
            Err(fail(kind, driver.context().path(), position, origin))
        }
    }
}

/// Parses a document with the push driver.
///
/// At most `max_depth` containers may be open at once.
pub fn parse_push<T>(
    scope: &TranslationScope,
    tokenizer: &mut T,
    origin: Option<Origin>,
    max_depth: usize,
) -> Result<Parsed, TranslationError>
where
    T: PushTokenizer + ?Sized,
{
    let mut driver = PushDriver::new(TranslationContext::new(scope).with_max_depth(max_depth));
    if let Err(kind) = tokenizer.run(&mut driver) {
        return Err(fail(kind, driver.context().path(), tokenizer.position(), origin));
    }
    match driver.into_parts() {
        (ctx, Some(root)) => complete(ctx, root, origin),
        (ctx, None) => Err(fail(
            ErrorKind::unexpected("end of input", "before the root container closed"),
            ctx.path(),
            tokenizer.position(),
            origin,
        )),
    }
}

fn complete(
    ctx: TranslationContext<'_>,
    root: ObjectId,
    origin: Option<Origin>,
) -> Result<Parsed, TranslationError> {
    match ctx.finish() {
        Ok((graph, diagnostics)) => Ok(Parsed {
            graph,
            root,
            diagnostics,
        }),
        Err(kind) => Err(fail(kind, &[], None, origin)),
    }
}

fn fail(
    kind: ErrorKind,
    path: &[String],
    position: Option<TextPosition>,
    origin: Option<Origin>,
) -> TranslationError {
    let location = SourceLocation {
        position: kind.position().or(position),
        origin,
        path: path.to_vec(),
    };
    let err = TranslationError::new(kind, location);
    log::debug!("parse failed: {err}");
    err
}
