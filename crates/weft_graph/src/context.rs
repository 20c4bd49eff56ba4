//! Per-invocation parse state and the identity/reference resolver.

use alloc::string::String;
use alloc::vec::Vec;

use weft_utils::hash::{HashMap, HashSet};

use crate::diagnostic::Diagnostic;
use crate::error::ErrorKind;
use crate::event::{DEFAULT_MAX_DEPTH, Markers};
use crate::graph::{ObjectGraph, ObjectId};
use crate::info::{ClassDescriptor, FieldDescriptor};
use crate::scope::TranslationScope;

// -----------------------------------------------------------------------------
// Materialized

/// Outcome of resolving the markers of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    /// A new instance (or the placeholder of a forward reference) whose body
    /// must be read.
    Fresh(ObjectId),
    /// An instance substituted by a reference; the body is skipped.
    Resolved(ObjectId),
}

impl Materialized {
    #[inline]
    pub const fn id(self) -> ObjectId {
        match self {
            Materialized::Fresh(id) | Materialized::Resolved(id) => id,
        }
    }

    #[inline]
    pub const fn is_fresh(self) -> bool {
        matches!(self, Materialized::Fresh(_))
    }
}

/// The field a materialized object is stored into.
#[derive(Clone, Copy)]
pub(crate) struct Link<'s> {
    pub owner: ObjectId,
    pub field: &'s FieldDescriptor,
}

/// A map insertion postponed until the placeholder it keys on is declared.
pub(crate) struct Deferred<'s> {
    pub link: Link<'s>,
    pub child: ObjectId,
}

// -----------------------------------------------------------------------------
// TranslationContext

/// State of one parse.
///
/// Owns the graph under construction, the identity map resolving
/// `graph:id`/`graph:ref` markers, the diagnostics collected so far and the
/// per-parse overlay memoizing unknown tags. A context is created for one
/// document and consumed by [`finish`](Self::finish); it is never shared.
///
/// Identity tokens are global to the document: a reference may point at any
/// container, earlier or later, at any depth.
pub struct TranslationContext<'s> {
    pub(crate) scope: &'s TranslationScope,
    pub(crate) graph: ObjectGraph,
    identities: HashMap<String, ObjectId>,
    pending: Vec<(String, ObjectId)>,
    pub(crate) deferred: Vec<Deferred<'s>>,
    pub(crate) ignored: HashSet<(&'s str, String)>,
    diagnostics: Vec<Diagnostic>,
    path: Vec<String>,
    max_depth: usize,
}

impl<'s> TranslationContext<'s> {
    pub fn new(scope: &'s TranslationScope) -> Self {
        Self {
            scope,
            graph: ObjectGraph::new(),
            identities: HashMap::default(),
            pending: Vec::new(),
            deferred: Vec::new(),
            ignored: HashSet::default(),
            diagnostics: Vec::new(),
            path: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Bounds the number of nested containers.
    #[inline]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[inline]
    pub fn scope(&self) -> &'s TranslationScope {
        self.scope
    }

    #[inline]
    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    #[inline]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Records a recoverable condition.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    // -------------------------------------------------------------------------
    // Tag path

    pub(crate) fn enter(&mut self, tag: &str) -> Result<(), ErrorKind> {
        if self.path.len() >= self.max_depth {
            return Err(ErrorKind::DepthLimit {
                limit: self.max_depth,
            });
        }
        self.path.push(tag.into());
        Ok(())
    }

    #[inline]
    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    /// Tags of the currently open containers, outermost first.
    #[inline]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    // -------------------------------------------------------------------------
    // Resolver

    /// Resolves the markers of a container of class `class`.
    ///
    /// - no marker: a new instance;
    /// - `id`: a new instance registered under the token, or the placeholder
    ///   created earlier by a forward reference to it;
    /// - `ref` to a known token: the registered instance;
    /// - `ref` to an unknown token: a placeholder registered under the token
    ///   and recorded as pending until its declaration is met.
    ///
    /// # Errors
    ///
    /// Both markers on one container, a token declared twice, or a
    /// declaration whose class differs from the placeholder created for it.
    pub fn materialize(
        &mut self,
        class: &ClassDescriptor,
        markers: &Markers,
    ) -> Result<Materialized, ErrorKind> {
        match (&markers.id, &markers.reference) {
            (Some(_), Some(_)) => Err(ErrorKind::IdentityAndReference {
                tag: class.tag().into(),
            }),
            (None, None) => Ok(Materialized::Fresh(self.graph.insert_boxed(class.instantiate()))),
            (None, Some(token)) => {
                if let Some(&id) = self.identities.get(token.as_str()) {
                    return Ok(Materialized::Resolved(id));
                }
                let id = self.graph.insert_boxed(class.instantiate());
                self.identities.insert(token.clone(), id);
                self.pending.push((token.clone(), id));
                Ok(Materialized::Resolved(id))
            }
            (Some(token), None) => {
                let Some(&id) = self.identities.get(token.as_str()) else {
                    let id = self.graph.insert_boxed(class.instantiate());
                    self.identities.insert(token.clone(), id);
                    return Ok(Materialized::Fresh(id));
                };
                let Some(index) = self.pending.iter().position(|(t, _)| t == token) else {
                    return Err(ErrorKind::DuplicateIdentity {
                        token: token.clone(),
                    });
                };
                if self.graph.type_id_of(id) != Some(class.type_id()) {
                    let referenced = self
                        .graph
                        .get(id)
                        .map_or("<removed>", |element| element.type_name());
                    return Err(ErrorKind::ReferenceTypeMismatch {
                        token: token.clone(),
                        expected: referenced,
                        found: class.type_name(),
                    });
                }
                self.pending.remove(index);
                Ok(Materialized::Fresh(id))
            }
        }
    }

    /// Returns `true` while `id` is a placeholder awaiting its declaration.
    #[inline]
    pub fn is_pending(&self, id: ObjectId) -> bool {
        self.pending.iter().any(|&(_, pending)| pending == id)
    }

    /// Completes the parse, returning the graph and every diagnostic.
    ///
    /// Postponed map insertions are performed and each reference still
    /// pending is reported as [`Diagnostic::DanglingReference`]; its
    /// placeholder stays in the graph as a default instance.
    pub fn finish(mut self) -> Result<(ObjectGraph, Vec<Diagnostic>), ErrorKind> {
        for Deferred { link, child } in core::mem::take(&mut self.deferred) {
            self.insert_keyed(link, child)?;
        }
        for (token, _) in core::mem::take(&mut self.pending) {
            self.report(Diagnostic::DanglingReference { token });
        }
        Ok((self.graph, self.diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::{Materialized, TranslationContext};
    use crate::Diagnostic;
    use crate::error::ErrorKind;
    use crate::event::Markers;
    use crate::testing::{Person, zoo_scope};

    fn markers(id: Option<&str>, reference: Option<&str>) -> Markers {
        Markers {
            id: id.map(Into::into),
            reference: reference.map(Into::into),
        }
    }

    #[test]
    fn forward_reference_reuses_placeholder() {
        let scope = zoo_scope();
        let person = scope.get("person").unwrap();
        let mut ctx = TranslationContext::new(&scope);

        let forward = ctx.materialize(person, &markers(None, Some("a"))).unwrap();
        assert!(matches!(forward, Materialized::Resolved(_)));
        assert!(ctx.is_pending(forward.id()));

        let declared = ctx.materialize(person, &markers(Some("a"), None)).unwrap();
        assert_eq!(declared, Materialized::Fresh(forward.id()));
        assert!(!ctx.is_pending(forward.id()));

        let again = ctx.materialize(person, &markers(None, Some("a"))).unwrap();
        assert_eq!(again, Materialized::Resolved(forward.id()));

        let (graph, diagnostics) = ctx.finish().unwrap();
        assert_eq!(graph.len(), 1);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn protocol_violations_are_fatal() {
        let scope = zoo_scope();
        let person = scope.get("person").unwrap();
        let cat = scope.get("cat").unwrap();
        let mut ctx = TranslationContext::new(&scope);

        assert!(matches!(
            ctx.materialize(person, &markers(Some("x"), Some("y"))),
            Err(ErrorKind::IdentityAndReference { .. })
        ));

        ctx.materialize(person, &markers(Some("x"), None)).unwrap();
        assert!(matches!(
            ctx.materialize(person, &markers(Some("x"), None)),
            Err(ErrorKind::DuplicateIdentity { .. })
        ));

        ctx.materialize(person, &markers(None, Some("later"))).unwrap();
        assert!(matches!(
            ctx.materialize(cat, &markers(Some("later"), None)),
            Err(ErrorKind::ReferenceTypeMismatch { .. })
        ));
    }

    #[test]
    fn dangling_references_are_reported_at_finish() {
        let scope = zoo_scope();
        let person = scope.get("person").unwrap();
        let mut ctx = TranslationContext::new(&scope);

        let placeholder = ctx.materialize(person, &markers(None, Some("nobody"))).unwrap();
        let (graph, diagnostics) = ctx.finish().unwrap();

        assert_eq!(
            diagnostics,
            [Diagnostic::DanglingReference {
                token: "nobody".into()
            }]
        );
        let person = graph.downcast::<Person>(placeholder.id()).unwrap();
        assert!(person.name.is_empty());
    }
}
