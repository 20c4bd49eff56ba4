use alloc::boxed::Box;
use core::any::TypeId;
use core::fmt;

use slotmap::SlotMap;

use super::Element;

slotmap::new_key_type! {
    /// Handle of one element in an [`ObjectGraph`].
    pub struct ObjectId;
}

struct Node {
    value: Box<dyn Element>,
    parent: Option<ObjectId>,
}

// -----------------------------------------------------------------------------
// ObjectGraph

/// Arena owning every element of a materialized document.
///
/// Composite fields store [`ObjectId`]s, so the same element can be reached
/// along several paths (shared children) or from one of its own descendants
/// (cycles). Dropping the graph drops every element exactly once.
///
/// # Examples
///
/// ```
/// use weft_graph::graph::{Element, ObjectGraph, ObjectId};
///
/// #[derive(Default)]
/// struct Person {
///     friend: Option<ObjectId>,
/// }
/// impl Element for Person {}
///
/// let mut graph = ObjectGraph::new();
/// let me = graph.insert(Person::default());
/// graph.downcast_mut::<Person>(me).unwrap().friend = Some(me);
///
/// assert_eq!(graph.downcast::<Person>(me).unwrap().friend, Some(me));
/// assert_eq!(graph.parent(me), None);
/// ```
#[derive(Default)]
pub struct ObjectGraph {
    nodes: SlotMap<ObjectId, Node>,
}

impl ObjectGraph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `value` into the graph.
    #[inline]
    pub fn insert<T: Element>(&mut self, value: T) -> ObjectId {
        self.insert_boxed(Box::new(value))
    }

    /// Moves an already boxed element into the graph.
    #[inline]
    pub fn insert_boxed(&mut self, value: Box<dyn Element>) -> ObjectId {
        self.nodes.insert(Node {
            value,
            parent: None,
        })
    }

    /// Removes an element, returning it.
    ///
    /// Handles held by other elements are not updated.
    pub fn remove(&mut self, id: ObjectId) -> Option<Box<dyn Element>> {
        self.nodes.remove(id).map(|node| node.value)
    }

    #[inline]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, id: ObjectId) -> Option<&dyn Element> {
        self.nodes.get(id).map(|node| &*node.value)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut dyn Element> {
        match self.nodes.get_mut(id) {
            Some(node) => Some(&mut *node.value),
            None => None,
        }
    }

    /// Returns the element as `T` if it exists and has that type.
    #[inline]
    pub fn downcast<T: Element>(&self, id: ObjectId) -> Option<&T> {
        self.get(id)?.as_any().downcast_ref::<T>()
    }

    /// Returns the element as `&mut T` if it exists and has that type.
    #[inline]
    pub fn downcast_mut<T: Element>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.get_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    /// The [`TypeId`] of the concrete element behind `id`.
    #[inline]
    pub fn type_id_of(&self, id: ObjectId) -> Option<TypeId> {
        self.get(id).map(|value| value.as_any().type_id())
    }

    /// The structural parent of `id`.
    ///
    /// This is a back-reference only; the parent does not own the child.
    #[inline]
    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Records `parent` as the structural parent of `id`.
    #[inline]
    pub fn set_parent(&mut self, id: ObjectId, parent: Option<ObjectId>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
        }
    }

    /// Iterates over all elements in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &dyn Element)> {
        self.nodes.iter().map(|(id, node)| (id, &*node.value))
    }
}

impl fmt::Debug for ObjectGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.nodes.iter().map(|(id, node)| (id, (*node.value).type_name())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ObjectGraph, ObjectId};
    use crate::graph::Element;

    #[derive(Default)]
    struct Node {
        next: Option<ObjectId>,
    }

    impl Element for Node {}

    #[derive(Default)]
    struct Leaf;

    impl Element for Leaf {}

    #[test]
    fn cycles_are_plain_handles() {
        let mut graph = ObjectGraph::new();
        let a = graph.insert(Node::default());
        let b = graph.insert(Node { next: Some(a) });
        graph.downcast_mut::<Node>(a).unwrap().next = Some(b);
        graph.set_parent(b, Some(a));

        assert_eq!(graph.downcast::<Node>(b).unwrap().next, Some(a));
        assert_eq!(graph.parent(b), Some(a));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn downcast_checks_type() {
        let mut graph = ObjectGraph::new();
        let leaf = graph.insert(Leaf);
        assert!(graph.downcast::<Node>(leaf).is_none());
        assert!(graph.downcast::<Leaf>(leaf).is_some());
        assert_eq!(graph.type_id_of(leaf), Some(core::any::TypeId::of::<Leaf>()));

        assert!(graph.remove(leaf).is_some());
        assert!(!graph.contains(leaf));
        assert!(graph.get(leaf).is_none());
    }
}
