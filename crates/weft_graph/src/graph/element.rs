use core::any::Any;

use crate::scalar::Scalar;

// -----------------------------------------------------------------------------
// AsAny

/// Upcasting helpers, implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The Rust type name of the concrete value.
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    #[inline(always)]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline(always)]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}

// -----------------------------------------------------------------------------
// Element

/// A node of an [`ObjectGraph`](crate::graph::ObjectGraph).
///
/// Any `Send + Sync + 'static` type can be an element; the field table that
/// tells the engine how to read and write it lives in its
/// [`ClassDescriptor`](crate::info::ClassDescriptor).
///
/// # Examples
///
/// ```
/// use weft_graph::graph::Element;
///
/// #[derive(Default)]
/// struct Counter {
///     hits: u32,
///     seen: bool,
/// }
///
/// impl Element for Counter {
///     fn deserialized(&mut self) {
///         self.seen = true;
///     }
/// }
/// ```
pub trait Element: AsAny + Send + Sync + 'static {
    /// Called once after the body of a freshly materialized element was read.
    ///
    /// Elements substituted by a reference marker are not notified again.
    #[inline]
    fn deserialized(&mut self) {}
}

// -----------------------------------------------------------------------------
// Keyed

/// Self-keying capability of elements stored in map fields.
///
/// A map field inserts each element under the key it computes here rather than
/// under a separately encoded key token.
pub trait Keyed: Element {
    fn key(&self) -> Scalar;
}

#[cfg(test)]
mod tests {
    use super::{AsAny, Element};

    #[derive(Default)]
    struct Counter(u8);

    impl Element for Counter {}

    #[test]
    fn dyn_element_downcasts_to_concrete() {
        let mut boxed: Box<dyn Element> = Box::new(Counter(3));
        assert!((*boxed).as_any().is::<Counter>());
        if let Some(counter) = (*boxed).as_any_mut().downcast_mut::<Counter>() {
            counter.0 = 9;
        }
        assert_eq!((*boxed).as_any().downcast_ref::<Counter>().map(|p| p.0), Some(9));
        assert!((*boxed).type_name().ends_with("Counter"));
    }
}
