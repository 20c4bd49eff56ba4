//! Pull driver: recursive descent over [`PullTokenizer::advance`].

use alloc::string::String;

use super::dispatch::resolve_root;
use crate::context::{Link, Materialized, TranslationContext};
use crate::error::ErrorKind;
use crate::event::{Event, Marker, Markers, PullTokenizer};
use crate::graph::ObjectId;
use crate::info::{ClassDescriptor, FieldDescriptor, FieldKind};

/// Materializes a document by requesting events from a tokenizer.
///
/// Each container is read by one call frame that returns on the matching
/// close. Markers are taken from the opening event, so a container is
/// materialized as soon as it starts.
pub(crate) struct PullDriver<'s, 't, T: ?Sized> {
    ctx: TranslationContext<'s>,
    tokenizer: &'t mut T,
}

impl<'s, 't, T: PullTokenizer + ?Sized> PullDriver<'s, 't, T> {
    pub(crate) fn new(ctx: TranslationContext<'s>, tokenizer: &'t mut T) -> Self {
        Self { ctx, tokenizer }
    }

    #[inline]
    pub(crate) fn context(&self) -> &TranslationContext<'s> {
        &self.ctx
    }

    #[inline]
    pub(crate) fn tokenizer(&self) -> &T {
        &*self.tokenizer
    }

    #[inline]
    pub(crate) fn into_context(self) -> TranslationContext<'s> {
        self.ctx
    }

    #[inline]
    fn next(&mut self) -> Result<Event, ErrorKind> {
        self.tokenizer.advance()
    }

    /// Reads the whole document, returning the root object.
    pub(crate) fn parse_document(&mut self) -> Result<ObjectId, ErrorKind> {
        let root = match self.next()? {
            Event::StartContainer { tag, markers } => {
                let class = resolve_root(self.ctx.scope, &tag)?;
                self.read_object(class, &tag, markers, None)?
            }
            Event::ScalarText(text) if text.trim().is_empty() => return self.parse_document(),
            other => return Err(ErrorKind::unexpected(other.describe(), "before the root container")),
        };
        loop {
            match self.next()? {
                Event::EndDocument => return Ok(root),
                Event::ScalarText(text) if text.trim().is_empty() => {}
                other => {
                    return Err(ErrorKind::unexpected(other.describe(), "after the root container"));
                }
            }
        }
    }

    fn read_object(
        &mut self,
        class: &'s ClassDescriptor,
        tag: &str,
        markers: Markers,
        link: Option<Link<'s>>,
    ) -> Result<ObjectId, ErrorKind> {
        self.ctx.enter(tag)?;
        let materialized = self.ctx.materialize(class, &markers)?;
        match materialized {
            Materialized::Fresh(id) => self.read_body(class, id)?,
            Materialized::Resolved(_) => self.skip_open(1)?,
        }
        self.ctx.leave();
        self.ctx.finish_object(materialized, link)?;
        Ok(materialized.id())
    }

    fn read_body(&mut self, class: &'s ClassDescriptor, owner: ObjectId) -> Result<(), ErrorKind> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::FieldName(name) => {
                    if Marker::from_name(&name).is_some() {
                        return Err(ErrorKind::MisplacedMarker {
                            marker: name,
                            tag: class.tag().into(),
                        });
                    }
                    self.ctx.inline_text(class, owner, &core::mem::take(&mut text))?;
                    let field = self.ctx.member(class, &name);
                    if field.kind() == FieldKind::Ignored {
                        self.skip_value()?;
                    } else {
                        self.read_field_value(field.inner(), owner)?;
                    }
                }
                Event::ScalarText(fragment) => text.push_str(&fragment),
                Event::StartContainer { tag, markers } => {
                    self.ctx.inline_text(class, owner, &core::mem::take(&mut text))?;
                    let field = self.ctx.member(class, &tag);
                    self.read_member(field, &tag, markers, owner)?;
                }
                Event::EndContainer => return self.ctx.inline_text(class, owner, &text),
                other => return Err(ErrorKind::unexpected(other.describe(), "inside a container")),
            }
        }
    }

    /// The value following a field name.
    fn read_field_value(
        &mut self,
        field: &'s FieldDescriptor,
        owner: ObjectId,
    ) -> Result<(), ErrorKind> {
        match self.next()? {
            Event::ScalarText(text) => self.ctx.field_text(field, owner, &text),
            Event::StartContainer { tag, markers } => self.read_value(field, &tag, markers, owner),
            Event::StartSequence if field.kind().is_sequence() => self.read_sequence(field, owner),
            Event::StartSequence => {
                self.ctx.mismatch(field, "sequence");
                self.skip_open(1)
            }
            other => Err(ErrorKind::unexpected(other.describe(), "where a field value was expected")),
        }
    }

    /// A container given as the value of `field`.
    fn read_value(
        &mut self,
        field: &'s FieldDescriptor,
        tag: &str,
        markers: Markers,
        owner: ObjectId,
    ) -> Result<(), ErrorKind> {
        match self.ctx.child_class(field, tag) {
            Some(class) => {
                self.read_object(class, tag, markers, Some(Link { owner, field }))?;
                Ok(())
            }
            None => self.skip_open(1),
        }
    }

    fn read_sequence(&mut self, field: &'s FieldDescriptor, owner: ObjectId) -> Result<(), ErrorKind> {
        loop {
            match self.next()? {
                Event::ScalarText(text) => self.ctx.item_text(field, owner, &text)?,
                Event::StartContainer { tag, markers } => self.read_value(field, &tag, markers, owner)?,
                Event::StartSequence => {
                    self.ctx.mismatch(field, "sequence");
                    self.skip_open(1)?;
                }
                Event::EndSequence => return Ok(()),
                other => return Err(ErrorKind::unexpected(other.describe(), "inside a sequence")),
            }
        }
    }

    /// A container appearing as a tagged member, routed to `field`.
    fn read_member(
        &mut self,
        field: &'s FieldDescriptor,
        tag: &str,
        markers: Markers,
        owner: ObjectId,
    ) -> Result<(), ErrorKind> {
        match field.kind() {
            FieldKind::Wrapper => self.read_wrapper(field.inner(), owner),
            FieldKind::Scalar | FieldKind::ScalarCollection => self.read_leaf(field, owner),
            FieldKind::Ignored => self.skip_open(1),
            _ => self.read_value(field, tag, markers, owner),
        }
    }

    fn read_wrapper(&mut self, inner: &'s FieldDescriptor, owner: ObjectId) -> Result<(), ErrorKind> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::FieldName(name) if name == inner.tag() => self.read_field_value(inner, owner)?,
                Event::FieldName(_) => self.skip_value()?,
                Event::ScalarText(fragment) => text.push_str(&fragment),
                Event::StartContainer { tag, markers } => self.read_member(inner, &tag, markers, owner)?,
                Event::EndContainer => return self.ctx.wrapper_text(inner, owner, &text),
                other => return Err(ErrorKind::unexpected(other.describe(), "inside a wrapper")),
            }
        }
    }

    fn read_leaf(&mut self, field: &'s FieldDescriptor, owner: ObjectId) -> Result<(), ErrorKind> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::FieldName(_) => self.skip_value()?,
                Event::ScalarText(fragment) => text.push_str(&fragment),
                Event::StartContainer { .. } => {
                    self.ctx.mismatch(field, "container");
                    self.skip_open(1)?;
                }
                Event::EndContainer => return self.ctx.leaf_text(field, owner, &text),
                other => return Err(ErrorKind::unexpected(other.describe(), "inside a leaf")),
            }
        }
    }

    /// Drops the value following a field name.
    fn skip_value(&mut self) -> Result<(), ErrorKind> {
        match self.next()? {
            Event::ScalarText(_) => Ok(()),
            Event::StartContainer { .. } | Event::StartSequence => self.skip_open(1),
            other => Err(ErrorKind::unexpected(other.describe(), "where a field value was expected")),
        }
    }

    /// Drops events until `depth` open containers and sequences are closed.
    fn skip_open(&mut self, mut depth: usize) -> Result<(), ErrorKind> {
        while depth > 0 {
            match self.next()? {
                Event::StartContainer { .. } | Event::StartSequence => depth += 1,
                Event::EndContainer | Event::EndSequence => depth -= 1,
                Event::EndDocument => {
                    return Err(ErrorKind::unexpected("end of document", "inside skipped content"));
                }
                Event::FieldName(_) | Event::ScalarText(_) => {}
            }
        }
        Ok(())
    }
}
