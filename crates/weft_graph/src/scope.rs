//! The tag registry every parse and write resolves classes against.

use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;

use thiserror::Error;
use weft_utils::TypeIdMap;
use weft_utils::hash::HashMap;

use crate::graph::Element;
use crate::info::{ClassDescriptor, FieldDescriptor, FieldKind};
use crate::scalar::ScalarRegistry;

// -----------------------------------------------------------------------------
// Describe

/// Provides the [`ClassDescriptor`] of a type.
///
/// # Examples
///
/// ```
/// use weft_graph::graph::Element;
/// use weft_graph::info::{ClassDescriptor, FieldDescriptor};
/// use weft_graph::{Describe, TranslationScope};
///
/// #[derive(Default)]
/// struct Lamp {
///     watts: u16,
/// }
/// impl Element for Lamp {}
///
/// impl Describe for Lamp {
///     fn describe() -> ClassDescriptor {
///         ClassDescriptor::builder::<Lamp>("lamp")
///             .field(FieldDescriptor::scalar("watts", |l: &Lamp| &l.watts, |l: &mut Lamp| &mut l.watts))
///             .build()
///     }
/// }
///
/// let scope = TranslationScope::builder("home").register::<Lamp>().build().unwrap();
/// assert!(scope.get("lamp").is_some());
/// assert!(scope.get_type::<Lamp>().is_some());
/// ```
pub trait Describe: Element {
    fn describe() -> ClassDescriptor;
}

// -----------------------------------------------------------------------------
// ScopeError

/// A scope that cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ScopeError {
    #[error("scope `{scope}` registers tag `{tag}` twice")]
    DuplicateTag { scope: String, tag: String },

    #[error("scope `{scope}` registers type `{type_name}` twice")]
    DuplicateType {
        scope: String,
        type_name: &'static str,
    },

    #[error("field `{class}.{field}` refers to class `{tag}`, which scope `{scope}` lacks")]
    UnresolvedTag {
        scope: String,
        class: String,
        field: String,
        tag: String,
    },

    #[error("field `{class}.{field}` uses scalar type `{type_name}`, which has no codec")]
    UnknownScalarType {
        class: String,
        field: String,
        type_name: &'static str,
    },

    #[error("field `{class}.{field}` wraps another wrapper")]
    NestedWrapper { class: String, field: String },
}

// -----------------------------------------------------------------------------
// TranslationScope

/// An immutable mapping from wire tag to [`ClassDescriptor`].
///
/// A scope is the root-class universe of a parse and owns the
/// [`ScalarRegistry`] its fields decode with. It is built once and then
/// shared read-only, including across threads.
pub struct TranslationScope {
    name: String,
    classes: Vec<ClassDescriptor>,
    by_tag: HashMap<String, usize>,
    by_type: TypeIdMap<usize>,
    scalars: ScalarRegistry,
}

impl TranslationScope {
    /// Starts an empty scope named `name` with the built-in scalar codecs.
    #[inline]
    pub fn builder(name: impl Into<String>) -> ScopeBuilder {
        ScopeBuilder {
            name: name.into(),
            classes: Vec::new(),
            scalars: ScalarRegistry::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a class by wire tag.
    #[inline]
    pub fn get(&self, tag: &str) -> Option<&ClassDescriptor> {
        self.by_tag.get(tag).map(|&index| &self.classes[index])
    }

    /// Looks up a class by the [`TypeId`] of the type it describes.
    #[inline]
    pub fn get_by_type(&self, type_id: TypeId) -> Option<&ClassDescriptor> {
        self.by_type.get(&type_id).map(|&index| &self.classes[index])
    }

    #[inline]
    pub fn get_type<T: Element>(&self) -> Option<&ClassDescriptor> {
        self.get_by_type(TypeId::of::<T>())
    }

    /// The class of a materialized element.
    #[inline]
    pub fn class_of(&self, element: &dyn Element) -> Option<&ClassDescriptor> {
        self.get_by_type(element.as_any().type_id())
    }

    #[inline]
    pub fn scalars(&self) -> &ScalarRegistry {
        &self.scalars
    }

    /// All classes in registration order.
    #[inline]
    pub fn classes(&self) -> &[ClassDescriptor] {
        &self.classes
    }
}

impl fmt::Debug for TranslationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationScope")
            .field("name", &self.name)
            .field("classes", &self.classes.iter().map(|c| c.tag()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ScopeBuilder

/// Builder returned by [`TranslationScope::builder`].
pub struct ScopeBuilder {
    name: String,
    classes: Vec<ClassDescriptor>,
    scalars: ScalarRegistry,
}

impl ScopeBuilder {
    /// Adds a class.
    #[inline]
    pub fn class(mut self, class: ClassDescriptor) -> Self {
        self.classes.push(class);
        self
    }

    /// Adds the class described by `T`.
    #[inline]
    pub fn register<T: Describe>(self) -> Self {
        self.class(T::describe())
    }

    /// Adds every class of `other` and its codecs missing here.
    pub fn compose(mut self, other: &TranslationScope) -> Self {
        self.classes.extend(other.classes.iter().cloned());
        self.scalars.merge(&other.scalars);
        self
    }

    /// Replaces the scalar codec registry.
    #[inline]
    pub fn scalars(mut self, scalars: ScalarRegistry) -> Self {
        self.scalars = scalars;
        self
    }

    /// Validates and freezes the scope.
    ///
    /// Tags and types must be unique, every class tag a field names must be
    /// registered, and every scalar type must have a codec.
    pub fn build(self) -> Result<TranslationScope, ScopeError> {
        let mut by_tag: HashMap<String, usize> = HashMap::default();
        let mut by_type = TypeIdMap::new();

        for (index, class) in self.classes.iter().enumerate() {
            if by_tag.insert(class.tag().into(), index).is_some() {
                return Err(ScopeError::DuplicateTag {
                    scope: self.name,
                    tag: class.tag().into(),
                });
            }
            if !by_type.try_insert(class.type_id(), index) {
                return Err(ScopeError::DuplicateType {
                    scope: self.name,
                    type_name: class.type_name(),
                });
            }
        }

        for class in &self.classes {
            for field in class.fields() {
                self.check_field(&by_tag, class, field)?;
            }
        }

        log::debug!("scope `{}` built with {} classes", self.name, self.classes.len());

        Ok(TranslationScope {
            name: self.name,
            classes: self.classes,
            by_tag,
            by_type,
            scalars: self.scalars,
        })
    }

    fn check_field(
        &self,
        by_tag: &HashMap<String, usize>,
        class: &ClassDescriptor,
        field: &FieldDescriptor,
    ) -> Result<(), ScopeError> {
        if let Some(inner) = field.wrapped_field() {
            if inner.kind() == FieldKind::Wrapper {
                return Err(ScopeError::NestedWrapper {
                    class: class.tag().into(),
                    field: field.tag().into(),
                });
            }
            return self.check_field(by_tag, class, inner);
        }

        let unresolved = |tag: &str| ScopeError::UnresolvedTag {
            scope: self.name.clone(),
            class: class.tag().into(),
            field: field.tag().into(),
            tag: tag.into(),
        };

        match field.kind() {
            FieldKind::Scalar | FieldKind::ScalarCollection => {
                if let Some(type_name) = field.scalar_type()
                    && !self.scalars.contains(type_name)
                {
                    return Err(ScopeError::UnknownScalarType {
                        class: class.tag().into(),
                        field: field.tag().into(),
                        type_name,
                    });
                }
            }
            kind if kind.holds_objects() => {
                if field.is_polymorphic() {
                    if let Some(tag) = field.whitelist().find(|tag| !by_tag.contains_key(*tag)) {
                        return Err(unresolved(tag));
                    }
                } else if let Some(tag) = field.declared_class()
                    && !by_tag.contains_key(tag)
                {
                    return Err(unresolved(tag));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ScopeError, TranslationScope};
    use crate::info::{ClassDescriptor, FieldDescriptor};
    use crate::testing::{Person, zoo_scope};

    fn person(tag: &'static str) -> ClassDescriptor {
        ClassDescriptor::builder::<Person>(tag)
            .field(
                FieldDescriptor::composite("friend", "ghost", |p: &Person| &p.friend, |p: &mut Person| {
                    &mut p.friend
                }),
            )
            .build()
    }

    #[test]
    fn lookups_by_tag_and_type() {
        let scope = zoo_scope();
        assert_eq!(scope.name(), "zoo");
        assert_eq!(scope.get("cat").map(|c| c.tag()), Some("cat"));
        assert_eq!(scope.get_type::<Person>().map(|c| c.tag()), Some("person"));
        assert!(scope.get("unicorn").is_none());
        assert!(scope.scalars().contains("habitat"));
    }

    #[test]
    fn unresolved_child_tags_fail() {
        let err = TranslationScope::builder("bad").class(person("person")).build().unwrap_err();
        assert!(matches!(err, ScopeError::UnresolvedTag { ref tag, .. } if tag == "ghost"));
    }

    #[test]
    fn collisions_fail() {
        let base = zoo_scope();
        let err = TranslationScope::builder("twice")
            .compose(&base)
            .compose(&base)
            .build()
            .unwrap_err();
        assert!(matches!(err, ScopeError::DuplicateTag { .. }));

        let err = TranslationScope::builder("aliases")
            .compose(&base)
            .class(person("human"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ScopeError::DuplicateType { .. }));
    }

    #[test]
    fn composed_scopes_keep_codecs() {
        let base = zoo_scope();
        let scope = TranslationScope::builder("copy").compose(&base).build().unwrap();
        assert_eq!(scope.classes().len(), base.classes().len());
        assert!(scope.scalars().contains("habitat"));
    }
}
