//! Push driver: an explicit state machine fed by [`EventListener`] callbacks.

use alloc::string::String;
use alloc::vec::Vec;

use super::dispatch::resolve_root;
use crate::context::{Link, Materialized, TranslationContext};
use crate::error::ErrorKind;
use crate::event::{EventListener, Marker, Markers};
use crate::graph::ObjectId;
use crate::info::{ClassDescriptor, FieldDescriptor, FieldKind};

// -----------------------------------------------------------------------------
// Frames

/// An open container whose markers may still be arriving.
struct ObjectFrame<'s> {
    class: &'s ClassDescriptor,
    markers: Markers,
    /// A marker name seen, waiting for its token.
    pending_marker: Option<Marker>,
    state: Option<Materialized>,
    link: Option<Link<'s>>,
    text: String,
}

impl<'s> ObjectFrame<'s> {
    /// Materializes the container on its first content event.
    fn settle(&mut self, ctx: &mut TranslationContext<'s>) -> Result<Materialized, ErrorKind> {
        match self.state {
            Some(state) => Ok(state),
            None => {
                let state = ctx.materialize(self.class, &self.markers)?;
                self.state = Some(state);
                Ok(state)
            }
        }
    }

    fn expect_no_marker(&self, found: &'static str) -> Result<(), ErrorKind> {
        match self.pending_marker {
            Some(_) => Err(ErrorKind::unexpected(found, "where a marker token was expected")),
            None => Ok(()),
        }
    }
}

enum Frame<'s> {
    /// Bottom of the stack, before and after the root container.
    Document,
    Object(ObjectFrame<'s>),
    /// After a field name, awaiting its value.
    Field {
        field: &'s FieldDescriptor,
        owner: ObjectId,
    },
    Sequence {
        field: &'s FieldDescriptor,
        owner: ObjectId,
    },
    /// A wrapper container around the items of `inner`.
    Wrapper {
        inner: &'s FieldDescriptor,
        owner: ObjectId,
        text: String,
    },
    /// A container holding one scalar.
    Leaf {
        field: &'s FieldDescriptor,
        owner: ObjectId,
        text: String,
    },
    /// After a field name whose value is dropped.
    SkipValue,
    /// Inside dropped content, counting open containers and sequences.
    Skip(usize),
}

// -----------------------------------------------------------------------------
// PushDriver

/// Materializes a document from listener callbacks.
///
/// The driver keeps one frame per open container, sequence or pending field
/// value. Containers are materialized lazily, on their first content event,
/// so markers delivered as leading field members are honored.
pub(crate) struct PushDriver<'s> {
    ctx: TranslationContext<'s>,
    frames: Vec<Frame<'s>>,
    root: Option<ObjectId>,
}

impl<'s> PushDriver<'s> {
    pub(crate) fn new(ctx: TranslationContext<'s>) -> Self {
        Self {
            ctx,
            frames: alloc::vec![Frame::Document],
            root: None,
        }
    }

    #[inline]
    pub(crate) fn context(&self) -> &TranslationContext<'s> {
        &self.ctx
    }

    /// The context and the root object, once the document completed.
    pub(crate) fn into_parts(self) -> (TranslationContext<'s>, Option<ObjectId>) {
        (self.ctx, self.root)
    }

    fn open_object(
        &mut self,
        class: &'s ClassDescriptor,
        tag: &str,
        markers: Markers,
        link: Option<Link<'s>>,
    ) -> Result<(), ErrorKind> {
        self.ctx.enter(tag)?;
        self.frames.push(Frame::Object(ObjectFrame {
            class,
            markers,
            pending_marker: None,
            state: None,
            link,
            text: String::new(),
        }));
        Ok(())
    }

    /// A container given as the value of `field`.
    fn open_value(
        &mut self,
        field: &'s FieldDescriptor,
        owner: ObjectId,
        tag: &str,
        markers: Markers,
    ) -> Result<(), ErrorKind> {
        match self.ctx.child_class(field, tag) {
            Some(class) => self.open_object(class, tag, markers, Some(Link { owner, field }))?,
            None => self.frames.push(Frame::Skip(1)),
        }
        Ok(())
    }

    /// A container appearing as a tagged member, routed to `field`.
    fn open_member(
        &mut self,
        field: &'s FieldDescriptor,
        owner: ObjectId,
        tag: &str,
        markers: Markers,
    ) -> Result<(), ErrorKind> {
        match field.kind() {
            FieldKind::Wrapper => self.frames.push(Frame::Wrapper {
                inner: field.inner(),
                owner,
                text: String::new(),
            }),
            FieldKind::Scalar | FieldKind::ScalarCollection => self.frames.push(Frame::Leaf {
                field,
                owner,
                text: String::new(),
            }),
            FieldKind::Ignored => self.frames.push(Frame::Skip(1)),
            _ => self.open_value(field, owner, tag, markers)?,
        }
        Ok(())
    }

    fn close_object(&mut self, mut object: ObjectFrame<'s>) -> Result<(), ErrorKind> {
        object.expect_no_marker("end of container")?;
        let state = object.settle(&mut self.ctx)?;
        if let Materialized::Fresh(id) = state {
            self.ctx.inline_text(object.class, id, &object.text)?;
        }
        self.ctx.leave();
        self.ctx.finish_object(state, object.link)?;
        if object.link.is_none() {
            self.root = Some(state.id());
        }
        Ok(())
    }
}

impl<'s> EventListener for PushDriver<'s> {
    fn start_container(&mut self, tag: &str, markers: Markers) -> Result<(), ErrorKind> {
        let Some(frame) = self.frames.pop() else {
            return Err(ErrorKind::unexpected("container", "after the document ended"));
        };
        match frame {
            Frame::Document => {
                self.frames.push(Frame::Document);
                if self.root.is_some() {
                    return Err(ErrorKind::unexpected("container", "after the root container"));
                }
                let class = resolve_root(self.ctx.scope, tag)?;
                self.open_object(class, tag, markers, None)?;
            }
            Frame::Object(mut object) => {
                object.expect_no_marker("container")?;
                let state = object.settle(&mut self.ctx)?;
                let class = object.class;
                let text = core::mem::take(&mut object.text);
                self.frames.push(Frame::Object(object));
                match state {
                    Materialized::Fresh(owner) => {
                        self.ctx.inline_text(class, owner, &text)?;
                        let field = self.ctx.member(class, tag);
                        self.open_member(field, owner, tag, markers)?;
                    }
                    Materialized::Resolved(_) => self.frames.push(Frame::Skip(1)),
                }
            }
            Frame::Field { field, owner } => self.open_value(field, owner, tag, markers)?,
            Frame::Sequence { field, owner } => {
                self.frames.push(Frame::Sequence { field, owner });
                self.open_value(field, owner, tag, markers)?;
            }
            Frame::Wrapper { inner, owner, text } => {
                self.frames.push(Frame::Wrapper { inner, owner, text });
                self.open_member(inner, owner, tag, markers)?;
            }
            Frame::Leaf { field, owner, text } => {
                self.frames.push(Frame::Leaf { field, owner, text });
                self.ctx.mismatch(field, "container");
                self.frames.push(Frame::Skip(1));
            }
            Frame::SkipValue => self.frames.push(Frame::Skip(1)),
            Frame::Skip(depth) => self.frames.push(Frame::Skip(depth + 1)),
        }
        Ok(())
    }

    fn field_name(&mut self, name: &str) -> Result<(), ErrorKind> {
        let Some(frame) = self.frames.pop() else {
            return Err(ErrorKind::unexpected("field name", "after the document ended"));
        };
        match frame {
            Frame::Object(mut object) => {
                if let Some(marker) = Marker::from_name(name) {
                    if object.state.is_some() || object.pending_marker.is_some() {
                        return Err(ErrorKind::MisplacedMarker {
                            marker: name.into(),
                            tag: object.class.tag().into(),
                        });
                    }
                    object.pending_marker = Some(marker);
                    self.frames.push(Frame::Object(object));
                    return Ok(());
                }
                object.expect_no_marker("field name")?;
                let state = object.settle(&mut self.ctx)?;
                let class = object.class;
                let text = core::mem::take(&mut object.text);
                self.frames.push(Frame::Object(object));
                match state {
                    Materialized::Fresh(owner) => {
                        self.ctx.inline_text(class, owner, &text)?;
                        let field = self.ctx.member(class, name);
                        if field.kind() == FieldKind::Ignored {
                            self.frames.push(Frame::SkipValue);
                        } else {
                            self.frames.push(Frame::Field {
                                field: field.inner(),
                                owner,
                            });
                        }
                    }
                    Materialized::Resolved(_) => self.frames.push(Frame::SkipValue),
                }
            }
            Frame::Wrapper { inner, owner, text } => {
                self.frames.push(Frame::Wrapper { inner, owner, text });
                if name == inner.tag() {
                    self.frames.push(Frame::Field {
                        field: inner,
                        owner,
                    });
                } else {
                    self.frames.push(Frame::SkipValue);
                }
            }
            frame @ Frame::Leaf { .. } => {
                self.frames.push(frame);
                self.frames.push(Frame::SkipValue);
            }
            frame @ Frame::Skip(_) => self.frames.push(frame),
            _ => return Err(ErrorKind::unexpected("field name", "outside a container body")),
        }
        Ok(())
    }

    fn scalar_text(&mut self, text: &str) -> Result<(), ErrorKind> {
        match self.frames.last_mut() {
            Some(Frame::Object(object)) => match object.pending_marker.take() {
                Some(marker) => object.markers.set(marker, text),
                None if matches!(object.state, Some(Materialized::Resolved(_))) => {}
                None => object.text.push_str(text),
            },
            Some(Frame::Field { field, owner }) => {
                let (field, owner) = (*field, *owner);
                self.frames.pop();
                self.ctx.field_text(field, owner, text)?;
            }
            Some(Frame::Sequence { field, owner }) => {
                let (field, owner) = (*field, *owner);
                self.ctx.item_text(field, owner, text)?;
            }
            Some(Frame::Wrapper { text: buffer, .. } | Frame::Leaf { text: buffer, .. }) => {
                buffer.push_str(text);
            }
            Some(Frame::SkipValue) => {
                self.frames.pop();
            }
            Some(Frame::Skip(_)) => {}
            Some(Frame::Document) | None => {
                if !text.trim().is_empty() {
                    return Err(ErrorKind::unexpected("text", "outside the root container"));
                }
            }
        }
        Ok(())
    }

    fn end_container(&mut self) -> Result<(), ErrorKind> {
        match self.frames.pop() {
            Some(Frame::Object(object)) => self.close_object(object),
            Some(Frame::Leaf { field, owner, text }) => self.ctx.leaf_text(field, owner, &text),
            Some(Frame::Wrapper { inner, owner, text }) => {
                self.ctx.wrapper_text(inner, owner, &text)
            }
            Some(Frame::Skip(depth)) => {
                if depth > 1 {
                    self.frames.push(Frame::Skip(depth - 1));
                }
                Ok(())
            }
            _ => Err(ErrorKind::unexpected("end of container", "outside a container")),
        }
    }

    fn start_sequence(&mut self) -> Result<(), ErrorKind> {
        match self.frames.pop() {
            Some(Frame::Field { field, owner }) => {
                if field.kind().is_sequence() {
                    self.frames.push(Frame::Sequence { field, owner });
                } else {
                    self.ctx.mismatch(field, "sequence");
                    self.frames.push(Frame::Skip(1));
                }
                Ok(())
            }
            Some(Frame::Sequence { field, owner }) => {
                self.frames.push(Frame::Sequence { field, owner });
                self.ctx.mismatch(field, "sequence");
                self.frames.push(Frame::Skip(1));
                Ok(())
            }
            Some(Frame::SkipValue) => {
                self.frames.push(Frame::Skip(1));
                Ok(())
            }
            Some(Frame::Skip(depth)) => {
                self.frames.push(Frame::Skip(depth + 1));
                Ok(())
            }
            _ => Err(ErrorKind::unexpected("sequence", "outside a field value")),
        }
    }

    fn end_sequence(&mut self) -> Result<(), ErrorKind> {
        match self.frames.pop() {
            Some(Frame::Sequence { .. }) => Ok(()),
            Some(Frame::Skip(depth)) => {
                if depth > 1 {
                    self.frames.push(Frame::Skip(depth - 1));
                }
                Ok(())
            }
            _ => Err(ErrorKind::unexpected("end of sequence", "outside a sequence")),
        }
    }

    fn end_document(&mut self) -> Result<(), ErrorKind> {
        match (self.frames.as_slice(), self.root) {
            ([Frame::Document], Some(_)) => Ok(()),
            ([Frame::Document], None) => {
                Err(ErrorKind::unexpected("end of document", "before the root container"))
            }
            _ => Err(ErrorKind::unexpected("end of document", "inside an open container")),
        }
    }
}
