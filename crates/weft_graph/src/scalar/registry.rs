use alloc::sync::Arc;

use weft_utils::hash::HashMap;

use super::{BoolCodec, DateCodec, DateTimeCodec, FromStrCodec, Scalar, ScalarCodec, ScalarError, StringCodec};

// -----------------------------------------------------------------------------
// ScalarRegistry

/// Codecs keyed by declared scalar type name.
///
/// [`ScalarRegistry::new`] installs codecs for the primitive types:
///
/// - `bool` `char` `string`
/// - `i8 - i64` `isize`
/// - `u8 - u64` `usize`
/// - `f32` `f64`
/// - `date` (`%Y-%m-%d`) `datetime` (RFC 3339)
///
/// # Examples
///
/// ```
/// use weft_graph::scalar::{Scalar, ScalarRegistry};
///
/// let registry = ScalarRegistry::new();
/// assert_eq!(registry.decode("i32", "-12"), Ok(Scalar::Int(-12)));
/// assert_eq!(registry.encode("bool", &Scalar::Bool(true)).unwrap(), "true");
/// assert!(registry.decode("uuid", "x").is_err());
/// ```
#[derive(Clone)]
pub struct ScalarRegistry {
    codecs: HashMap<&'static str, Arc<dyn ScalarCodec>>,
}

impl Default for ScalarRegistry {
    /// See [`ScalarRegistry::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarRegistry {
    /// Creates a registry without any codec.
    #[inline]
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::default(),
        }
    }

    /// Creates a registry with codecs for all primitive scalar types.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(BoolCodec);
        registry.register(StringCodec);
        registry.register(FromStrCodec::<char>::new());
        registry.register(FromStrCodec::<i8>::new());
        registry.register(FromStrCodec::<i16>::new());
        registry.register(FromStrCodec::<i32>::new());
        registry.register(FromStrCodec::<i64>::new());
        registry.register(FromStrCodec::<isize>::new());
        registry.register(FromStrCodec::<u8>::new());
        registry.register(FromStrCodec::<u16>::new());
        registry.register(FromStrCodec::<u32>::new());
        registry.register(FromStrCodec::<u64>::new());
        registry.register(FromStrCodec::<usize>::new());
        registry.register(FromStrCodec::<f32>::new());
        registry.register(FromStrCodec::<f64>::new());
        registry.register(DateCodec::new());
        registry.register(DateTimeCodec);
        registry
    }

    /// Installs `codec` under its type name, returning the codec it replaced.
    pub fn register<C: ScalarCodec>(&mut self, codec: C) -> Option<Arc<dyn ScalarCodec>> {
        self.codecs.insert(codec.type_name(), Arc::new(codec))
    }

    /// Copies every codec of `other` whose type name is not registered here.
    pub fn merge(&mut self, other: &ScalarRegistry) {
        for (&name, codec) in &other.codecs {
            self.codecs.entry(name).or_insert_with(|| codec.clone());
        }
    }

    /// Returns the codec for `type_name`.
    #[inline]
    pub fn get(&self, type_name: &str) -> Option<&dyn ScalarCodec> {
        self.codecs.get(type_name).map(|codec| &**codec)
    }

    /// Returns `true` if a codec is registered for `type_name`.
    #[inline]
    pub fn contains(&self, type_name: &str) -> bool {
        self.codecs.contains_key(type_name)
    }

    /// Decodes `text` with the codec registered for `type_name`.
    pub fn decode(&self, type_name: &str, text: &str) -> Result<Scalar, ScalarError> {
        self.get(type_name)
            .ok_or_else(|| ScalarError::UnknownType(type_name.to_owned()))?
            .decode(text)
    }

    /// Encodes `value` with the codec registered for `type_name`.
    pub fn encode(&self, type_name: &str, value: &Scalar) -> Result<String, ScalarError> {
        self.get(type_name)
            .ok_or_else(|| ScalarError::UnknownType(type_name.to_owned()))?
            .encode(value)
    }
}

impl core::fmt::Debug for ScalarRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut names: Vec<_> = self.codecs.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("ScalarRegistry").field("codecs", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ScalarRegistry;
    use crate::scalar::{DateCodec, EnumCodec, Scalar, ScalarError, StringCodec};

    #[test]
    fn primitives_are_registered() {
        let registry = ScalarRegistry::new();
        for name in ["bool", "char", "string", "i8", "i64", "u32", "usize", "f32", "f64", "date", "datetime"] {
            assert!(registry.contains(name), "missing codec `{name}`");
        }
        assert_eq!(registry.decode("u8", "255"), Ok(Scalar::UInt(255)));
        assert!(registry.decode("u8", "256").is_err());
    }

    #[test]
    fn unknown_types_are_reported() {
        let registry = ScalarRegistry::empty();
        assert_eq!(
            registry.decode("string", "x"),
            Err(ScalarError::UnknownType("string".into()))
        );
    }

    #[test]
    fn custom_codecs_replace_defaults() {
        let mut registry = ScalarRegistry::new();
        registry.register(DateCodec::with_format("%d.%m.%Y"));
        registry.register(EnumCodec::new("level").valued("low", "1").variant("high"));
        let day = registry.decode("date", "24.12.2023").unwrap();
        assert_eq!(registry.encode("date", &day).unwrap(), "24.12.2023");
        assert_eq!(registry.decode("level", "1"), Ok(Scalar::from("low")));
    }

    #[test]
    fn register_replaces() {
        let mut registry = ScalarRegistry::empty();
        assert!(registry.register(StringCodec).is_none());
        assert!(registry.register(StringCodec).is_some());
    }
}
