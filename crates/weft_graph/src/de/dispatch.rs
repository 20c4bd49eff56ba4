//! The dispatch table shared by the push and pull drivers.
//!
//! Both drivers decide *when* to act from their own control flow but route
//! every decision about *what* to do through these methods, so a document
//! yields the same graph and the same diagnostics whichever driver reads it.

use crate::context::{Deferred, Link, Materialized, TranslationContext};
use crate::diagnostic::Diagnostic;
use crate::error::ErrorKind;
use crate::graph::ObjectId;
use crate::info::{ClassDescriptor, FieldDescriptor, FieldKind, IGNORED};
use crate::scalar::Scalar;
use crate::scope::TranslationScope;

/// Resolves the class of the root container.
pub(crate) fn resolve_root<'s>(
    scope: &'s TranslationScope,
    tag: &str,
) -> Result<&'s ClassDescriptor, ErrorKind> {
    scope
        .get(tag)
        .ok_or_else(|| ErrorKind::UnknownRoot { tag: tag.into() })
}

impl<'s> TranslationContext<'s> {
    // -------------------------------------------------------------------------
    // Lookup

    /// The field of `class` receiving values tagged `tag`.
    ///
    /// Unknown tags yield the ignored placeholder; the first occurrence per
    /// class and tag is reported.
    pub(crate) fn member(&mut self, class: &'s ClassDescriptor, tag: &str) -> &'s FieldDescriptor {
        if let Some(field) = class.field(tag) {
            return field;
        }
        if self.ignored.insert((class.tag(), tag.into())) {
            self.report(Diagnostic::UnknownTag {
                class: class.tag().into(),
                tag: tag.into(),
            });
        }
        &IGNORED
    }

    /// The class of a container tagged `tag` filling `field`.
    ///
    /// Polymorphic fields accept their whitelisted classes; other fields
    /// accept their item tag or declared class tag.
    pub(crate) fn child_class(
        &mut self,
        field: &'s FieldDescriptor,
        tag: &str,
    ) -> Option<&'s ClassDescriptor> {
        if !field.kind().holds_objects() {
            self.mismatch(field, "container");
            return None;
        }
        let scope = self.scope;
        let class = if field.is_polymorphic() {
            field.allows(tag).then(|| scope.get(tag)).flatten()
        } else if tag == field.item_tag() || Some(tag) == field.declared_class() {
            field.declared_class().and_then(|declared| scope.get(declared))
        } else {
            None
        };
        if class.is_none() {
            self.report(Diagnostic::UnknownSubtype {
                field: field.tag().into(),
                tag: tag.into(),
            });
        }
        class
    }

    pub(crate) fn mismatch(&mut self, field: &FieldDescriptor, found: &'static str) {
        self.report(Diagnostic::ShapeMismatch {
            field: field.tag().into(),
            expected: field.kind().name(),
            found,
        });
    }

    // -------------------------------------------------------------------------
    // Scalars

    fn decode(&self, field: &FieldDescriptor, text: &str) -> Result<Scalar, ErrorKind> {
        let type_name = field.scalar_type().unwrap_or("string");
        Ok(self.scope.scalars().decode(type_name, text)?)
    }

    pub(crate) fn assign_scalar(
        &mut self,
        field: &FieldDescriptor,
        owner: ObjectId,
        text: &str,
    ) -> Result<(), ErrorKind> {
        let value = self.decode(field, text)?;
        let element = self.graph.get_mut(owner).ok_or(ErrorKind::MissingObject(owner))?;
        Ok(field.write_scalar(element, value)?)
    }

    pub(crate) fn push_scalar(
        &mut self,
        field: &FieldDescriptor,
        owner: ObjectId,
        text: &str,
    ) -> Result<(), ErrorKind> {
        let value = self.decode(field, text)?;
        let element = self.graph.get_mut(owner).ok_or(ErrorKind::MissingObject(owner))?;
        Ok(field.push_scalar(element, value)?)
    }

    /// Text given as the value of a named field.
    pub(crate) fn field_text(
        &mut self,
        field: &FieldDescriptor,
        owner: ObjectId,
        text: &str,
    ) -> Result<(), ErrorKind> {
        match field.kind() {
            FieldKind::Scalar => self.assign_scalar(field, owner, text),
            FieldKind::Ignored => Ok(()),
            _ => {
                self.mismatch(field, "text");
                Ok(())
            }
        }
    }

    /// Text given as one item of a sequence.
    pub(crate) fn item_text(
        &mut self,
        field: &FieldDescriptor,
        owner: ObjectId,
        text: &str,
    ) -> Result<(), ErrorKind> {
        match field.kind() {
            FieldKind::ScalarCollection => self.push_scalar(field, owner, text),
            _ => {
                self.mismatch(field, "text");
                Ok(())
            }
        }
    }

    /// Content of a leaf container holding one scalar or one collection item.
    pub(crate) fn leaf_text(
        &mut self,
        field: &FieldDescriptor,
        owner: ObjectId,
        text: &str,
    ) -> Result<(), ErrorKind> {
        match field.kind() {
            FieldKind::Scalar => self.assign_scalar(field, owner, text),
            FieldKind::ScalarCollection => self.push_scalar(field, owner, text),
            _ => Ok(()),
        }
    }

    /// Text found directly inside a container of `class`.
    ///
    /// Whitespace-only runs are dropped; other text goes to the class's
    /// text field.
    pub(crate) fn inline_text(
        &mut self,
        class: &ClassDescriptor,
        owner: ObjectId,
        text: &str,
    ) -> Result<(), ErrorKind> {
        if text.trim().is_empty() {
            return Ok(());
        }
        match class.text_field() {
            Some(field) => self.assign_scalar(field, owner, text),
            None => {
                self.report(Diagnostic::ShapeMismatch {
                    field: class.tag().into(),
                    expected: "no text",
                    found: "text",
                });
                Ok(())
            }
        }
    }

    /// Text found directly inside a wrapper container.
    pub(crate) fn wrapper_text(
        &mut self,
        inner: &FieldDescriptor,
        owner: ObjectId,
        text: &str,
    ) -> Result<(), ErrorKind> {
        if text.trim().is_empty() {
            return Ok(());
        }
        match inner.kind() {
            FieldKind::Scalar => self.assign_scalar(inner, owner, text),
            _ => {
                self.mismatch(inner, "text");
                Ok(())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Objects

    /// Completes a container: runs the element hook of fresh instances and
    /// stores the instance into its owning field.
    pub(crate) fn finish_object(
        &mut self,
        materialized: Materialized,
        link: Option<Link<'s>>,
    ) -> Result<(), ErrorKind> {
        let id = materialized.id();
        if materialized.is_fresh() {
            if let Some(element) = self.graph.get_mut(id) {
                element.deserialized();
            }
            if let Some(link) = link {
                self.graph.set_parent(id, Some(link.owner));
            }
        }
        match link {
            Some(link) => self.attach(link, id),
            None => Ok(()),
        }
    }

    /// Stores `child` into the field of `link`.
    ///
    /// Map values are inserted under their own key. A placeholder still
    /// awaiting its declaration has no meaningful key yet, so its insertion is
    /// postponed to [`finish`](Self::finish).
    pub(crate) fn attach(&mut self, link: Link<'s>, child: ObjectId) -> Result<(), ErrorKind> {
        match link.field.kind() {
            FieldKind::Composite | FieldKind::CompositeCollection => {
                let owner = self
                    .graph
                    .get_mut(link.owner)
                    .ok_or(ErrorKind::MissingObject(link.owner))?;
                link.field.attach_child(owner, child);
                Ok(())
            }
            FieldKind::CompositeMap if self.is_pending(child) => {
                self.deferred.push(Deferred { link, child });
                Ok(())
            }
            FieldKind::CompositeMap => self.insert_keyed(link, child),
            _ => Ok(()),
        }
    }

    pub(crate) fn insert_keyed(&mut self, link: Link<'s>, child: ObjectId) -> Result<(), ErrorKind> {
        let scope = self.scope;
        let element = self.graph.get(child).ok_or(ErrorKind::MissingObject(child))?;
        let class = scope.class_of(element);
        let Some(key) = class.and_then(|class| class.key_of(element)) else {
            let class = class.map_or(element.type_name(), |class| class.tag());
            self.report(Diagnostic::UnkeyedMapElement {
                field: link.field.tag().into(),
                class: class.into(),
            });
            return Ok(());
        };
        let owner = self
            .graph
            .get_mut(link.owner)
            .ok_or(ErrorKind::MissingObject(link.owner))?;
        Ok(link.field.insert_entry(owner, key, child)?)
    }
}
