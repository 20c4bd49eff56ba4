use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;
use core::marker::PhantomData;

use weft_utils::hash::HashMap;

use super::{FieldDescriptor, FieldKind, Hint};
use crate::graph::{Element, Keyed};
use crate::scalar::Scalar;

fn create<T: Element + Default>() -> Box<dyn Element> {
    Box::new(T::default())
}

fn key_of<T: Keyed>(element: &dyn Element) -> Option<Scalar> {
    element.as_any().downcast_ref::<T>().map(Keyed::key)
}

// -----------------------------------------------------------------------------
// ClassDescriptor

/// Metadata of one materializable type.
///
/// Holds the wire tag, a factory for fresh instances and the ordered field
/// table. Inherited fields are flattened into the table when the descriptor
/// is built, so lookups never walk a class hierarchy.
///
/// # Field lookup
///
/// [`field`](Self::field) finds a field by any tag its values can arrive
/// under:
///
/// - the field tag itself;
/// - the item tag of an unwrapped collection, scalar collection or map;
/// - every whitelisted class tag of an unwrapped polymorphic field.
///
/// A wrapper is found by its own tag only. When two fields claim the same
/// tag, the one declared first wins.
///
/// # Examples
///
/// ```
/// use weft_graph::graph::{Element, ObjectId};
/// use weft_graph::info::{ClassDescriptor, FieldDescriptor, FieldKind, Hint};
///
/// #[derive(Default)]
/// struct Room {
///     name: String,
///     chairs: Vec<ObjectId>,
/// }
/// impl Element for Room {}
///
/// let room = ClassDescriptor::builder::<Room>("room")
///     .field(FieldDescriptor::scalar("name", |r: &Room| &r.name, |r: &mut Room| &mut r.name))
///     .field(
///         FieldDescriptor::collection("chairs", "chair", |r: &Room| &r.chairs, |r: &mut Room| {
///             &mut r.chairs
///         })
///         .element_tag("chair"),
///     )
///     .build();
///
/// assert_eq!(room.tag(), "room");
/// assert_eq!(room.field("chair").map(|f| f.kind()), Some(FieldKind::CompositeCollection));
/// assert!(room.field("table").is_none());
/// ```
#[derive(Clone)]
pub struct ClassDescriptor {
    tag: Cow<'static, str>,
    type_id: TypeId,
    type_name: &'static str,
    factory: fn() -> Box<dyn Element>,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    text_field: Option<usize>,
    key: Option<fn(&dyn Element) -> Option<Scalar>>,
}

impl ClassDescriptor {
    /// Starts a descriptor for `T` under wire tag `tag`.
    #[inline]
    pub fn builder<T: Element + Default>(tag: impl Into<Cow<'static, str>>) -> ClassBuilder<T> {
        ClassBuilder {
            tag: tag.into(),
            fields: Vec::new(),
            key: None,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Creates a fresh default instance.
    #[inline]
    pub fn instantiate(&self) -> Box<dyn Element> {
        (self.factory)()
    }

    /// The flattened field table in declaration order.
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up the field receiving values tagged `tag`.
    #[inline]
    pub fn field(&self, tag: &str) -> Option<&FieldDescriptor> {
        self.index.get(tag).map(|&index| &self.fields[index])
    }

    /// The scalar field absorbing inline text.
    #[inline]
    pub fn text_field(&self) -> Option<&FieldDescriptor> {
        self.text_field.map(|index| &self.fields[index])
    }

    #[inline]
    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }

    /// The self-computed map key of `element`.
    ///
    /// Returns `None` if the class is not keyed or `element` is not an
    /// instance of it.
    pub fn key_of(&self, element: &dyn Element) -> Option<Scalar> {
        self.key.and_then(|key| key(element))
    }

    fn index_fields(&mut self) {
        let mut index: HashMap<String, usize> = HashMap::default();
        let mut claim = |tag: &str, position: usize| {
            index.entry(tag.into()).or_insert(position);
        };

        for (position, field) in self.fields.iter().enumerate() {
            claim(field.tag(), position);
            if field.kind() == FieldKind::Wrapper {
                continue;
            }
            if field.kind() != FieldKind::Scalar {
                claim(field.item_tag(), position);
            }
            for class_tag in field.whitelist() {
                claim(class_tag, position);
            }
        }

        self.text_field = self
            .fields
            .iter()
            .position(|f| f.kind() == FieldKind::Scalar && f.scalar_hint() == Hint::Text);
        self.index = index;
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("tag", &self.tag)
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("keyed", &self.key.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ClassBuilder

/// Builder returned by [`ClassDescriptor::builder`].
pub struct ClassBuilder<T> {
    tag: Cow<'static, str>,
    fields: Vec<FieldDescriptor>,
    key: Option<fn(&dyn Element) -> Option<Scalar>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Element + Default> ClassBuilder<T> {
    /// Appends a field to the table.
    #[inline]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Inherits every field of `parent`, reached through `up`/`up_mut`.
    ///
    /// The parent's fields are placed before the fields added so far.
    pub fn extends<P, U, V>(mut self, parent: &ClassDescriptor, up: U, up_mut: V) -> Self
    where
        P: Element,
        U: Fn(&T) -> &P + Clone + Send + Sync + 'static,
        V: Fn(&mut T) -> &mut P + Clone + Send + Sync + 'static,
    {
        debug_assert_eq!(
            parent.type_id,
            TypeId::of::<P>(),
            "`{}` is not described by `{}`",
            core::any::type_name::<P>(),
            parent.tag,
        );
        let mut fields: Vec<FieldDescriptor> = parent
            .fields
            .iter()
            .map(|field| field.rebase::<T, P, U, V>(up.clone(), up_mut.clone()))
            .collect();
        fields.append(&mut self.fields);
        self.fields = fields;
        self
    }

    /// Finishes the descriptor.
    pub fn build(self) -> ClassDescriptor {
        let mut class = ClassDescriptor {
            tag: self.tag,
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            factory: create::<T>,
            fields: self.fields,
            index: HashMap::default(),
            text_field: None,
            key: self.key,
        };
        class.index_fields();
        class
    }
}

impl<T: Keyed + Default> ClassBuilder<T> {
    /// Marks instances as self-keying map values.
    #[inline]
    pub fn keyed(mut self) -> Self {
        self.key = Some(key_of::<T>);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::ClassDescriptor;
    use crate::graph::{Element, Keyed, ObjectId};
    use crate::info::{FieldDescriptor, FieldKind, Hint};
    use crate::scalar::Scalar;

    #[derive(Default)]
    struct Shape {
        label: String,
        outline: Option<ObjectId>,
    }
    impl Element for Shape {}

    #[derive(Default)]
    struct Circle {
        shape: Shape,
        radius: f64,
        caption: Option<String>,
    }
    impl Element for Circle {}
    impl Keyed for Circle {
        fn key(&self) -> Scalar {
            Scalar::from(self.shape.label.as_str())
        }
    }

    fn shape() -> ClassDescriptor {
        ClassDescriptor::builder::<Shape>("shape")
            .field(FieldDescriptor::scalar("label", |s: &Shape| &s.label, |s: &mut Shape| &mut s.label))
            .field(
                FieldDescriptor::composite("outline", "shape", |s: &Shape| &s.outline, |s: &mut Shape| {
                    &mut s.outline
                })
                .polymorphic(&["shape", "circle"]),
            )
            .build()
    }

    fn circle(shape: &ClassDescriptor) -> ClassDescriptor {
        ClassDescriptor::builder::<Circle>("circle")
            .field(FieldDescriptor::scalar("radius", |c: &Circle| &c.radius, |c: &mut Circle| {
                &mut c.radius
            }))
            .field(
                FieldDescriptor::optional_scalar("caption", |c: &Circle| &c.caption, |c: &mut Circle| {
                    &mut c.caption
                })
                .hint(Hint::Text),
            )
            .extends(shape, |c: &Circle| &c.shape, |c: &mut Circle| &mut c.shape)
            .keyed()
            .build()
    }

    #[test]
    fn inherited_fields_come_first() {
        let circle = circle(&shape());
        let tags: Vec<_> = circle.fields().iter().map(|f| f.tag()).collect();
        assert_eq!(tags, ["label", "outline", "radius", "caption"]);
        assert_eq!(circle.text_field().map(|f| f.tag()), Some("caption"));
    }

    #[test]
    fn inherited_fields_write_through_projection() {
        let circle = circle(&shape());
        let mut value = circle.instantiate();
        circle
            .field("label")
            .unwrap()
            .write_scalar(&mut *value, Scalar::from("ring"))
            .unwrap();

        assert_eq!(circle.key_of(&*value), Some(Scalar::from("ring")));
        let concrete = (*value).as_any().downcast_ref::<Circle>().unwrap();
        assert_eq!(concrete.shape.label, "ring");
    }

    #[test]
    fn whitelisted_tags_are_indexed() {
        let shape = shape();
        assert_eq!(shape.field("circle").map(|f| f.tag()), Some("outline"));
        assert_eq!(shape.field("outline").map(|f| f.kind()), Some(FieldKind::Composite));
        assert!(!shape.is_keyed());
        assert!(shape.key_of(&Shape::default()).is_none());
    }
}
