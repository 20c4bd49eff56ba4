use alloc::string::String;
use alloc::vec::Vec;

use weft_utils::hash::{HashMap, HashSet};

use super::Emitter;
use crate::error::ErrorKind;
use crate::event::{DEFAULT_MAX_DEPTH, Markers};
use crate::graph::{Element, ObjectGraph, ObjectId};
use crate::info::{ClassDescriptor, FieldDescriptor, FieldKind, Hint};
use crate::scalar::Scalar;
use crate::scope::TranslationScope;

// -----------------------------------------------------------------------------
// GraphWriter

/// Walks an object graph depth-first and feeds an [`Emitter`].
///
/// An element reachable along more than one path is expanded once, at its
/// first encounter, under a fresh identity token; every later encounter
/// writes a reference to that token instead. Unshared elements carry no
/// marker. Fields follow the class's table order.
///
/// Writing fails with [`ErrorKind::DepthLimit`] once more than `max_depth`
/// objects would be open at once.
pub struct GraphWriter<'a, E> {
    scope: &'a TranslationScope,
    graph: &'a ObjectGraph,
    emitter: E,
    shared: HashSet<ObjectId>,
    tokens: HashMap<ObjectId, String>,
    depth: usize,
    max_depth: usize,
}

impl<'a, E: Emitter> GraphWriter<'a, E> {
    pub fn new(scope: &'a TranslationScope, graph: &'a ObjectGraph, emitter: E) -> Self {
        Self {
            scope,
            graph,
            emitter,
            shared: HashSet::default(),
            tokens: HashMap::default(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[inline]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Writes the document rooted at `root` and returns the emitter.
    pub fn write(mut self, root: ObjectId) -> Result<E, ErrorKind> {
        self.find_shared(root)?;
        self.emitter.begin_document(!self.shared.is_empty())?;
        let class = self.class_of(root)?;
        self.write_object(root, None, class.tag())?;
        Ok(self.emitter)
    }

    fn element(&self, id: ObjectId) -> Result<&'a dyn Element, ErrorKind> {
        self.graph.get(id).ok_or(ErrorKind::MissingObject(id))
    }

    fn class_of(&self, id: ObjectId) -> Result<&'a ClassDescriptor, ErrorKind> {
        let element = self.element(id)?;
        self.scope
            .class_of(element)
            .ok_or_else(|| ErrorKind::UnregisteredType {
                type_name: element.type_name(),
                scope: self.scope.name().into(),
            })
    }

    /// Marks every element reached more than once.
    fn find_shared(&mut self, root: ObjectId) -> Result<(), ErrorKind> {
        let mut seen: HashSet<ObjectId> = HashSet::default();
        let mut stack: Vec<ObjectId> = alloc::vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                self.shared.insert(id);
                continue;
            }
            let element = self.element(id)?;
            let class = self.class_of(id)?;
            // Reverse so the stack pops children in table order.
            let children: Vec<ObjectId> = class
                .fields()
                .iter()
                .flat_map(|field| field.inner().read_children(element))
                .collect();
            stack.extend(children.into_iter().rev());
        }
        Ok(())
    }

    fn write_object(&mut self, id: ObjectId, key: Option<&str>, tag: &str) -> Result<(), ErrorKind> {
        if self.depth >= self.max_depth {
            return Err(ErrorKind::DepthLimit {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = self.write_body(id, key, tag);
        self.depth -= 1;
        result
    }

    fn write_body(&mut self, id: ObjectId, key: Option<&str>, tag: &str) -> Result<(), ErrorKind> {
        if let Some(token) = self.tokens.get(&id) {
            let markers = Markers {
                id: None,
                reference: Some(token.clone()),
            };
            self.emitter.start_object(key, tag, &markers)?;
            return self.emitter.end_object(tag);
        }

        let mut markers = Markers::new();
        if self.shared.contains(&id) {
            let token = alloc::format!("{}", self.tokens.len() + 1);
            self.tokens.insert(id, token.clone());
            markers.id = Some(token);
        }

        let element = self.element(id)?;
        let class = self.class_of(id)?;
        self.emitter.start_object(key, tag, &markers)?;

        if self.emitter.attributes_first() {
            let is_attribute = |field: &FieldDescriptor| {
                field.kind() == FieldKind::Scalar && field.scalar_hint() == Hint::Attribute
            };
            let is_text = |field: &FieldDescriptor| {
                field.kind() == FieldKind::Scalar && field.scalar_hint() == Hint::Text
            };
            for field in class.fields().iter().filter(|f| is_attribute(*f)) {
                self.write_field(element, field)?;
            }
            for field in class.fields().iter().filter(|f| is_text(*f)) {
                self.write_field(element, field)?;
            }
            for field in class
                .fields()
                .iter()
                .filter(|f| !is_attribute(*f) && !is_text(*f))
            {
                self.write_field(element, field)?;
            }
        } else {
            for field in class.fields() {
                self.write_field(element, field)?;
            }
        }

        self.emitter.end_object(tag)
    }

    fn write_field(&mut self, owner: &'a dyn Element, field: &FieldDescriptor) -> Result<(), ErrorKind> {
        match field.kind() {
            FieldKind::Scalar => {
                if let Some(value) = field.read_scalar(owner) {
                    let text = self.encode(field, &value)?;
                    self.emitter.scalar(field.tag(), field.scalar_hint(), &text)?;
                }
            }
            FieldKind::ScalarCollection => {
                self.emitter.start_sequence(field.tag())?;
                for value in field.read_scalars(owner) {
                    let text = self.encode(field, &value)?;
                    self.emitter.sequence_scalar(field.item_tag(), &text)?;
                }
                self.emitter.end_sequence(field.tag())?;
            }
            FieldKind::Composite => {
                if let Some(&child) = field.read_children(owner).first() {
                    let class = self.class_of(child)?;
                    self.write_object(child, Some(field.tag()), field.container_tag(class.tag()))?;
                }
            }
            FieldKind::CompositeCollection | FieldKind::CompositeMap => {
                self.emitter.start_sequence(field.tag())?;
                for child in field.read_children(owner) {
                    let class = self.class_of(child)?;
                    self.write_object(child, None, field.container_tag(class.tag()))?;
                }
                self.emitter.end_sequence(field.tag())?;
            }
            FieldKind::Wrapper => {
                let inner = field.inner();
                let empty = match inner.kind() {
                    FieldKind::Scalar => inner.read_scalar(owner).is_none(),
                    FieldKind::Composite => inner.read_children(owner).is_empty(),
                    _ => false,
                };
                if !empty {
                    self.emitter.start_wrapper(field.tag())?;
                    self.write_field(owner, inner)?;
                    self.emitter.end_wrapper(field.tag())?;
                }
            }
            FieldKind::Ignored => {}
        }
        Ok(())
    }

    fn encode(&self, field: &FieldDescriptor, value: &Scalar) -> Result<String, ErrorKind> {
        let type_name = field.scalar_type().unwrap_or("string");
        Ok(self.scope.scalars().encode(type_name, value)?)
    }
}
