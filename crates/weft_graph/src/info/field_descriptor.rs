use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use super::access::{Accessor, Lens, SlotOps};
use super::{FieldKind, Hint};
use crate::graph::{Element, ObjectId};
use crate::scalar::{Scalar, ScalarError, ScalarType};

// -----------------------------------------------------------------------------
// FieldDescriptor

/// Metadata of one field slot within a class.
///
/// A descriptor carries the wire tag, the [`FieldKind`], the declared scalar
/// type name (scalar kinds), the child resolution data (object kinds) and a
/// type-erased accessor into the owning element.
///
/// Descriptors are built with the kind constructors and refined with the
/// modifier methods:
///
/// | constructor | Rust slot type |
/// |---|---|
/// | [`scalar`](Self::scalar) | `T: ScalarType` |
/// | [`optional_scalar`](Self::optional_scalar) | `Option<T>` |
/// | [`composite`](Self::composite) | `Option<ObjectId>` |
/// | [`collection`](Self::collection) | `Vec<ObjectId>` |
/// | [`scalar_collection`](Self::scalar_collection) | `Vec<T>` |
/// | [`map`](Self::map) | `BTreeMap<K, ObjectId>` |
///
/// # Examples
///
/// ```
/// use weft_graph::graph::{Element, ObjectId};
/// use weft_graph::info::{FieldDescriptor, FieldKind, Hint};
///
/// #[derive(Default)]
/// struct Pen {
///     name: String,
///     animals: Vec<ObjectId>,
/// }
/// impl Element for Pen {}
///
/// let name = FieldDescriptor::scalar("name", |p: &Pen| &p.name, |p: &mut Pen| &mut p.name)
///     .hint(Hint::Leaf);
/// let animals = FieldDescriptor::collection(
///     "animals", "animal",
///     |p: &Pen| &p.animals, |p: &mut Pen| &mut p.animals,
/// )
/// .polymorphic(&["cat", "dog"])
/// .wrapped("pen-animals");
///
/// assert_eq!(name.scalar_type(), Some("string"));
/// assert_eq!(animals.kind(), FieldKind::Wrapper);
/// assert_eq!(animals.inner().kind(), FieldKind::CompositeCollection);
/// assert!(animals.inner().allows("dog"));
/// ```
#[derive(Clone)]
pub struct FieldDescriptor {
    tag: Cow<'static, str>,
    kind: FieldKind,
    hint: Hint,
    scalar_type: Option<&'static str>,
    declared: Option<Cow<'static, str>>,
    whitelist: Vec<Cow<'static, str>>,
    element_tag: Option<Cow<'static, str>>,
    wrapped: Option<Box<FieldDescriptor>>,
    access: Option<Accessor>,
}

/// The placeholder returned for tags a class does not declare.
pub(crate) static IGNORED: FieldDescriptor = FieldDescriptor::placeholder();

impl FieldDescriptor {
    const fn placeholder() -> Self {
        Self {
            tag: Cow::Borrowed(""),
            kind: FieldKind::Ignored,
            hint: Hint::Attribute,
            scalar_type: None,
            declared: None,
            whitelist: Vec::new(),
            element_tag: None,
            wrapped: None,
            access: None,
        }
    }

    fn with_access(
        tag: impl Into<Cow<'static, str>>,
        kind: FieldKind,
        scalar_type: Option<&'static str>,
        access: Accessor,
    ) -> Self {
        Self {
            tag: tag.into(),
            kind,
            scalar_type,
            access: Some(access),
            ..Self::placeholder()
        }
    }

    // -------------------------------------------------------------------------
    // Constructors

    /// A scalar field stored as `T`.
    pub fn scalar<O, T, G, M>(tag: impl Into<Cow<'static, str>>, get: G, get_mut: M) -> Self
    where
        O: Element,
        T: ScalarType,
        G: Fn(&O) -> &T + Send + Sync + 'static,
        M: Fn(&mut O) -> &mut T + Send + Sync + 'static,
    {
        let access = Accessor {
            lens: Lens::of(get, get_mut),
            ops: SlotOps::scalar::<T>(),
        };
        Self::with_access(tag, FieldKind::Scalar, Some(T::TYPE_NAME), access)
    }

    /// A scalar field stored as `Option<T>`; `None` is not written.
    pub fn optional_scalar<O, T, G, M>(
        tag: impl Into<Cow<'static, str>>,
        get: G,
        get_mut: M,
    ) -> Self
    where
        O: Element,
        T: ScalarType,
        G: Fn(&O) -> &Option<T> + Send + Sync + 'static,
        M: Fn(&mut O) -> &mut Option<T> + Send + Sync + 'static,
    {
        let access = Accessor {
            lens: Lens::of(get, get_mut),
            ops: SlotOps::optional_scalar::<T>(),
        };
        Self::with_access(tag, FieldKind::Scalar, Some(T::TYPE_NAME), access)
    }

    /// A nested object of class `class_tag`.
    pub fn composite<O, G, M>(
        tag: impl Into<Cow<'static, str>>,
        class_tag: impl Into<Cow<'static, str>>,
        get: G,
        get_mut: M,
    ) -> Self
    where
        O: Element,
        G: Fn(&O) -> &Option<ObjectId> + Send + Sync + 'static,
        M: Fn(&mut O) -> &mut Option<ObjectId> + Send + Sync + 'static,
    {
        let access = Accessor {
            lens: Lens::of(get, get_mut),
            ops: SlotOps::composite(),
        };
        let mut field = Self::with_access(tag, FieldKind::Composite, None, access);
        field.declared = Some(class_tag.into());
        field
    }

    /// An ordered collection of objects of class `class_tag`.
    pub fn collection<O, G, M>(
        tag: impl Into<Cow<'static, str>>,
        class_tag: impl Into<Cow<'static, str>>,
        get: G,
        get_mut: M,
    ) -> Self
    where
        O: Element,
        G: Fn(&O) -> &Vec<ObjectId> + Send + Sync + 'static,
        M: Fn(&mut O) -> &mut Vec<ObjectId> + Send + Sync + 'static,
    {
        let access = Accessor {
            lens: Lens::of(get, get_mut),
            ops: SlotOps::collection(),
        };
        let mut field = Self::with_access(tag, FieldKind::CompositeCollection, None, access);
        field.declared = Some(class_tag.into());
        field
    }

    /// An ordered collection of scalars stored as `Vec<T>`.
    pub fn scalar_collection<O, T, G, M>(
        tag: impl Into<Cow<'static, str>>,
        get: G,
        get_mut: M,
    ) -> Self
    where
        O: Element,
        T: ScalarType,
        G: Fn(&O) -> &Vec<T> + Send + Sync + 'static,
        M: Fn(&mut O) -> &mut Vec<T> + Send + Sync + 'static,
    {
        let access = Accessor {
            lens: Lens::of(get, get_mut),
            ops: SlotOps::scalar_collection::<T>(),
        };
        Self::with_access(tag, FieldKind::ScalarCollection, Some(T::TYPE_NAME), access)
    }

    /// Objects of class `class_tag` keyed by their [`Keyed::key`].
    ///
    /// [`Keyed::key`]: crate::graph::Keyed::key
    pub fn map<O, K, G, M>(
        tag: impl Into<Cow<'static, str>>,
        class_tag: impl Into<Cow<'static, str>>,
        get: G,
        get_mut: M,
    ) -> Self
    where
        O: Element,
        K: ScalarType + Ord,
        G: Fn(&O) -> &BTreeMap<K, ObjectId> + Send + Sync + 'static,
        M: Fn(&mut O) -> &mut BTreeMap<K, ObjectId> + Send + Sync + 'static,
    {
        let access = Accessor {
            lens: Lens::of(get, get_mut),
            ops: SlotOps::map::<K>(),
        };
        let mut field = Self::with_access(tag, FieldKind::CompositeMap, Some(K::TYPE_NAME), access);
        field.declared = Some(class_tag.into());
        field
    }

    /// A field whose values are read and dropped.
    pub fn ignored(tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::placeholder()
        }
    }

    // -------------------------------------------------------------------------
    // Modifiers

    /// Sets the markup shape of a scalar field.
    #[inline]
    pub fn hint(mut self, hint: Hint) -> Self {
        self.hint = hint;
        self
    }

    /// Translates the values of a scalar, scalar collection or map key with
    /// the codec registered as `type_name` instead of the slot type's own.
    #[inline]
    pub fn codec(mut self, type_name: &'static str) -> Self {
        if self.scalar_type.is_some() {
            self.scalar_type = Some(type_name);
        }
        self
    }

    /// Restricts the runtime class of each value to `tags`.
    ///
    /// Containers of a polymorphic field carry the concrete class tag.
    pub fn polymorphic(mut self, tags: &[&'static str]) -> Self {
        self.whitelist = tags.iter().map(|&tag| Cow::Borrowed(tag)).collect();
        self
    }

    /// Sets the container tag of the items of a collection or map.
    pub fn element_tag(mut self, tag: impl Into<Cow<'static, str>>) -> Self {
        self.element_tag = Some(tag.into());
        self
    }

    /// Wraps this field into a [`FieldKind::Wrapper`] named `tag`.
    pub fn wrapped(self, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tag: tag.into(),
            kind: FieldKind::Wrapper,
            wrapped: Some(Box::new(self)),
            ..Self::placeholder()
        }
    }

    // -------------------------------------------------------------------------
    // Getters

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[inline]
    pub fn scalar_hint(&self) -> Hint {
        self.hint
    }

    /// The declared scalar type name; the key type for maps.
    #[inline]
    pub fn scalar_type(&self) -> Option<&'static str> {
        self.scalar_type
    }

    /// The declared class tag of object-valued fields.
    #[inline]
    pub fn declared_class(&self) -> Option<&str> {
        self.declared.as_deref()
    }

    /// The tag carried by item containers, defaulting to the field tag.
    #[inline]
    pub fn item_tag(&self) -> &str {
        self.element_tag.as_deref().unwrap_or(&self.tag)
    }

    /// The allowed runtime class tags, empty unless polymorphic.
    pub fn whitelist(&self) -> impl Iterator<Item = &str> {
        self.whitelist.iter().map(|tag| &**tag)
    }

    #[inline]
    pub fn is_polymorphic(&self) -> bool {
        !self.whitelist.is_empty()
    }

    /// Returns `true` if `class_tag` is whitelisted.
    pub fn allows(&self, class_tag: &str) -> bool {
        self.whitelist.iter().any(|tag| tag == class_tag)
    }

    /// The field a wrapper wraps.
    #[inline]
    pub fn wrapped_field(&self) -> Option<&FieldDescriptor> {
        self.wrapped.as_deref()
    }

    /// Unwraps one level of wrapping; other fields return themselves.
    #[inline]
    pub fn inner(&self) -> &FieldDescriptor {
        self.wrapped.as_deref().unwrap_or(self)
    }

    /// Container tag written for an object of class `class_tag` in this field.
    pub fn container_tag<'a>(&'a self, class_tag: &'a str) -> &'a str {
        if self.is_polymorphic() {
            class_tag
        } else {
            self.item_tag()
        }
    }

    // -------------------------------------------------------------------------
    // Slot access

    pub(crate) fn rebase<C, P, U, V>(&self, up: U, up_mut: V) -> Self
    where
        C: Element,
        P: Element,
        U: Fn(&C) -> &P + Clone + Send + Sync + 'static,
        V: Fn(&mut C) -> &mut P + Clone + Send + Sync + 'static,
    {
        let mut field = self.clone();
        field.access = self
            .access
            .as_ref()
            .map(|access| access.through(up.clone(), up_mut.clone()));
        if let Some(inner) = &self.wrapped {
            field.wrapped = Some(Box::new(inner.rebase(up, up_mut)));
        }
        field
    }

    #[inline]
    fn ops(&self) -> Option<(&Lens, SlotOps)> {
        self.access.as_ref().map(|access| (&access.lens, access.ops))
    }

    /// Reads a scalar field; `None` for an empty optional.
    pub fn read_scalar(&self, owner: &dyn Element) -> Option<Scalar> {
        match self.ops()? {
            (lens, SlotOps::Scalar { read, .. }) => read(lens.get(owner)?),
            _ => None,
        }
    }

    pub fn write_scalar(&self, owner: &mut dyn Element, value: Scalar) -> Result<(), ScalarError> {
        match self.ops() {
            Some((lens, SlotOps::Scalar { write, .. })) => match lens.get_mut(owner) {
                Some(slot) => write(slot, value),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    pub fn read_scalars(&self, owner: &dyn Element) -> Vec<Scalar> {
        match self.ops() {
            Some((lens, SlotOps::ScalarCollection { read, .. })) => {
                lens.get(owner).map(read).unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }

    pub fn push_scalar(&self, owner: &mut dyn Element, value: Scalar) -> Result<(), ScalarError> {
        match self.ops() {
            Some((lens, SlotOps::ScalarCollection { push, .. })) => match lens.get_mut(owner) {
                Some(slot) => push(slot, value),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Object handles held by an object-valued field, in write order.
    pub fn read_children(&self, owner: &dyn Element) -> Vec<ObjectId> {
        let Some((lens, ops)) = self.ops() else {
            return Vec::new();
        };
        let Some(slot) = lens.get(owner) else {
            return Vec::new();
        };
        match ops {
            SlotOps::Composite { read, .. } => read(slot).into_iter().collect(),
            SlotOps::CompositeCollection { read, .. } => read(slot),
            SlotOps::Map { values, .. } => values(slot),
            _ => Vec::new(),
        }
    }

    /// Stores `child` in a composite or collection field.
    pub fn attach_child(&self, owner: &mut dyn Element, child: ObjectId) {
        let Some((lens, ops)) = self.ops() else {
            return;
        };
        let Some(slot) = lens.get_mut(owner) else {
            return;
        };
        match ops {
            SlotOps::Composite { write, .. } => write(slot, child),
            SlotOps::CompositeCollection { push, .. } => push(slot, child),
            _ => {}
        }
    }

    /// Stores `child` under `key` in a map field.
    pub fn insert_entry(
        &self,
        owner: &mut dyn Element,
        key: Scalar,
        child: ObjectId,
    ) -> Result<(), ScalarError> {
        match self.ops() {
            Some((lens, SlotOps::Map { insert, .. })) => match lens.get_mut(owner) {
                Some(slot) => insert(slot, key, child),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("FieldDescriptor");
        debug.field("tag", &self.tag).field("kind", &self.kind);
        if let Some(scalar_type) = self.scalar_type {
            debug.field("scalar_type", &scalar_type);
        }
        if let Some(declared) = &self.declared {
            debug.field("class", declared);
        }
        if !self.whitelist.is_empty() {
            debug.field("whitelist", &self.whitelist);
        }
        if let Some(wrapped) = &self.wrapped {
            debug.field("wrapped", wrapped);
        }
        debug.finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;

    use super::{FieldDescriptor, IGNORED};
    use crate::graph::{Element, ObjectGraph, ObjectId};
    use crate::info::FieldKind;
    use crate::scalar::Scalar;

    #[derive(Default)]
    struct Shelf {
        label: String,
        books: Vec<ObjectId>,
        index: BTreeMap<String, ObjectId>,
        marks: Vec<u16>,
    }
    impl Element for Shelf {}

    #[derive(Default)]
    struct Book;
    impl Element for Book {}

    #[test]
    fn slots_are_reached_through_descriptors() {
        let mut graph = ObjectGraph::new();
        let book = graph.insert(Book);
        let mut shelf = Shelf::default();

        let label = FieldDescriptor::scalar("label", |s: &Shelf| &s.label, |s: &mut Shelf| &mut s.label);
        let books = FieldDescriptor::collection("books", "book", |s: &Shelf| &s.books, |s: &mut Shelf| {
            &mut s.books
        });
        let index = FieldDescriptor::map("index", "book", |s: &Shelf| &s.index, |s: &mut Shelf| {
            &mut s.index
        });
        let marks = FieldDescriptor::scalar_collection("mark", |s: &Shelf| &s.marks, |s: &mut Shelf| {
            &mut s.marks
        });

        label.write_scalar(&mut shelf, Scalar::from("fiction")).unwrap();
        books.attach_child(&mut shelf, book);
        index.insert_entry(&mut shelf, Scalar::from("dune"), book).unwrap();
        marks.push_scalar(&mut shelf, Scalar::UInt(3)).unwrap();

        assert_eq!(shelf.label, "fiction");
        assert_eq!(books.read_children(&shelf), vec![book]);
        assert_eq!(index.read_children(&shelf), vec![book]);
        assert_eq!(shelf.index.get("dune"), Some(&book));
        assert_eq!(marks.read_scalars(&shelf), vec![Scalar::UInt(3)]);
        assert_eq!(index.scalar_type(), Some("string"));
    }

    #[test]
    fn codecs_override_scalar_types_only() {
        let label = FieldDescriptor::scalar("label", |s: &Shelf| &s.label, |s: &mut Shelf| &mut s.label)
            .codec("genre");
        assert_eq!(label.scalar_type(), Some("genre"));
        let books = FieldDescriptor::collection("books", "book", |s: &Shelf| &s.books, |s: &mut Shelf| {
            &mut s.books
        })
        .codec("genre");
        assert_eq!(books.scalar_type(), None);
    }

    #[test]
    fn wrappers_and_placeholders() {
        let books = FieldDescriptor::collection("books", "book", |s: &Shelf| &s.books, |s: &mut Shelf| {
            &mut s.books
        })
        .element_tag("volume")
        .wrapped("library");

        assert_eq!(books.tag(), "library");
        assert_eq!(books.inner().tag(), "books");
        assert_eq!(books.inner().item_tag(), "volume");
        assert_eq!(books.inner().container_tag("book"), "volume");

        assert_eq!(IGNORED.kind(), FieldKind::Ignored);
        assert_eq!(FieldDescriptor::ignored("legacy").kind(), FieldKind::Ignored);
        assert!(IGNORED.read_scalar(&Shelf::default()).is_none());
    }
}
