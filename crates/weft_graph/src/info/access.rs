//! Typed slot access behind type-erased field descriptors.
//!
//! A [`Lens`] projects an element onto one of its fields as `&dyn Any`; the
//! [`SlotOps`] of the field then downcast that slot to the concrete Rust type
//! the descriptor was built for.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;

use crate::graph::{Element, ObjectId};
use crate::scalar::{Scalar, ScalarError, ScalarType};

type GetFn = dyn for<'a> Fn(&'a dyn Element) -> Option<&'a dyn Any> + Send + Sync;
type GetMutFn = dyn for<'a> Fn(&'a mut dyn Element) -> Option<&'a mut dyn Any> + Send + Sync;

#[inline(always)]
fn getter<G>(get: G) -> Arc<GetFn>
where
    G: for<'a> Fn(&'a dyn Element) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    Arc::new(get)
}

#[inline(always)]
fn getter_mut<G>(get: G) -> Arc<GetMutFn>
where
    G: for<'a> Fn(&'a mut dyn Element) -> Option<&'a mut dyn Any> + Send + Sync + 'static,
{
    Arc::new(get)
}

// -----------------------------------------------------------------------------
// Lens

/// Projects an element onto one field slot.
///
/// The projection fails (returns `None`) when the element is not of the type
/// the lens was built for.
#[derive(Clone)]
pub struct Lens {
    get: Arc<GetFn>,
    get_mut: Arc<GetMutFn>,
}

impl Lens {
    /// A lens onto the field of `O` selected by `get` and `get_mut`.
    pub fn of<O, F, G, M>(get: G, get_mut: M) -> Self
    where
        O: Element,
        F: Any,
        G: Fn(&O) -> &F + Send + Sync + 'static,
        M: Fn(&mut O) -> &mut F + Send + Sync + 'static,
    {
        Self {
            get: getter(move |element| {
                let owner = element.as_any().downcast_ref::<O>()?;
                Some(get(owner) as &dyn Any)
            }),
            get_mut: getter_mut(move |element| {
                let owner = element.as_any_mut().downcast_mut::<O>()?;
                Some(get_mut(owner) as &mut dyn Any)
            }),
        }
    }

    /// Re-roots a lens over `P` so it applies to a `C` embedding a `P`.
    pub fn through<C, P, U, V>(&self, up: U, up_mut: V) -> Self
    where
        C: Element,
        P: Element,
        U: Fn(&C) -> &P + Send + Sync + 'static,
        V: Fn(&mut C) -> &mut P + Send + Sync + 'static,
    {
        let inner = self.get.clone();
        let inner_mut = self.get_mut.clone();
        Self {
            get: getter(move |element| {
                let child = element.as_any().downcast_ref::<C>()?;
                inner(up(child) as &dyn Element)
            }),
            get_mut: getter_mut(move |element| {
                let child = element.as_any_mut().downcast_mut::<C>()?;
                inner_mut(up_mut(child) as &mut dyn Element)
            }),
        }
    }

    #[inline]
    pub fn get<'a>(&self, element: &'a dyn Element) -> Option<&'a dyn Any> {
        (self.get)(element)
    }

    #[inline]
    pub fn get_mut<'a>(&self, element: &'a mut dyn Element) -> Option<&'a mut dyn Any> {
        (self.get_mut)(element)
    }
}

// -----------------------------------------------------------------------------
// SlotOps

/// Monomorphized operations on a field slot, selected by field kind.
#[derive(Clone, Copy)]
pub(crate) enum SlotOps {
    Scalar {
        read: fn(&dyn Any) -> Option<Scalar>,
        write: fn(&mut dyn Any, Scalar) -> Result<(), ScalarError>,
    },
    Composite {
        read: fn(&dyn Any) -> Option<ObjectId>,
        write: fn(&mut dyn Any, ObjectId),
    },
    CompositeCollection {
        read: fn(&dyn Any) -> Vec<ObjectId>,
        push: fn(&mut dyn Any, ObjectId),
    },
    ScalarCollection {
        read: fn(&dyn Any) -> Vec<Scalar>,
        push: fn(&mut dyn Any, Scalar) -> Result<(), ScalarError>,
    },
    Map {
        values: fn(&dyn Any) -> Vec<ObjectId>,
        insert: fn(&mut dyn Any, Scalar, ObjectId) -> Result<(), ScalarError>,
    },
}

impl SlotOps {
    pub(crate) fn scalar<T: ScalarType>() -> Self {
        SlotOps::Scalar {
            read: read_value::<T>,
            write: write_value::<T>,
        }
    }

    pub(crate) fn optional_scalar<T: ScalarType>() -> Self {
        SlotOps::Scalar {
            read: read_optional::<T>,
            write: write_optional::<T>,
        }
    }

    pub(crate) fn composite() -> Self {
        SlotOps::Composite {
            read: read_link,
            write: write_link,
        }
    }

    pub(crate) fn collection() -> Self {
        SlotOps::CompositeCollection {
            read: read_links,
            push: push_link,
        }
    }

    pub(crate) fn scalar_collection<T: ScalarType>() -> Self {
        SlotOps::ScalarCollection {
            read: read_values::<T>,
            push: push_value::<T>,
        }
    }

    pub(crate) fn map<K: ScalarType + Ord>() -> Self {
        SlotOps::Map {
            values: map_values::<K>,
            insert: map_insert::<K>,
        }
    }
}

fn read_value<T: ScalarType>(slot: &dyn Any) -> Option<Scalar> {
    slot.downcast_ref::<T>().map(T::to_scalar)
}

fn write_value<T: ScalarType>(slot: &mut dyn Any, value: Scalar) -> Result<(), ScalarError> {
    if let Some(slot) = slot.downcast_mut::<T>() {
        *slot = T::from_scalar(value)?;
    }
    Ok(())
}

fn read_optional<T: ScalarType>(slot: &dyn Any) -> Option<Scalar> {
    slot.downcast_ref::<Option<T>>()?.as_ref().map(T::to_scalar)
}

fn write_optional<T: ScalarType>(slot: &mut dyn Any, value: Scalar) -> Result<(), ScalarError> {
    if let Some(slot) = slot.downcast_mut::<Option<T>>() {
        *slot = Some(T::from_scalar(value)?);
    }
    Ok(())
}

fn read_link(slot: &dyn Any) -> Option<ObjectId> {
    slot.downcast_ref::<Option<ObjectId>>().copied().flatten()
}

fn write_link(slot: &mut dyn Any, id: ObjectId) {
    if let Some(slot) = slot.downcast_mut::<Option<ObjectId>>() {
        *slot = Some(id);
    }
}

fn read_links(slot: &dyn Any) -> Vec<ObjectId> {
    slot.downcast_ref::<Vec<ObjectId>>()
        .cloned()
        .unwrap_or_default()
}

fn push_link(slot: &mut dyn Any, id: ObjectId) {
    if let Some(slot) = slot.downcast_mut::<Vec<ObjectId>>() {
        slot.push(id);
    }
}

fn read_values<T: ScalarType>(slot: &dyn Any) -> Vec<Scalar> {
    slot.downcast_ref::<Vec<T>>()
        .map(|values| values.iter().map(T::to_scalar).collect())
        .unwrap_or_default()
}

fn push_value<T: ScalarType>(slot: &mut dyn Any, value: Scalar) -> Result<(), ScalarError> {
    if let Some(slot) = slot.downcast_mut::<Vec<T>>() {
        slot.push(T::from_scalar(value)?);
    }
    Ok(())
}

fn map_values<K: ScalarType + Ord>(slot: &dyn Any) -> Vec<ObjectId> {
    slot.downcast_ref::<BTreeMap<K, ObjectId>>()
        .map(|map| map.values().copied().collect())
        .unwrap_or_default()
}

fn map_insert<K: ScalarType + Ord>(
    slot: &mut dyn Any,
    key: Scalar,
    id: ObjectId,
) -> Result<(), ScalarError> {
    if let Some(slot) = slot.downcast_mut::<BTreeMap<K, ObjectId>>() {
        slot.insert(K::from_scalar(key)?, id);
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Accessor

/// A lens paired with the slot operations of its field kind.
#[derive(Clone)]
pub(crate) struct Accessor {
    pub lens: Lens,
    pub ops: SlotOps,
}

impl Accessor {
    /// Reapplies this accessor to a `C` that embeds the original owner `P`.
    pub(crate) fn through<C, P, U, V>(&self, up: U, up_mut: V) -> Self
    where
        C: Element,
        P: Element,
        U: Fn(&C) -> &P + Send + Sync + 'static,
        V: Fn(&mut C) -> &mut P + Send + Sync + 'static,
    {
        Self {
            lens: self.lens.through(up, up_mut),
            ops: self.ops,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Lens, SlotOps};
    use crate::graph::Element;
    use crate::scalar::Scalar;

    #[derive(Default)]
    struct Base {
        name: String,
    }
    impl Element for Base {}

    #[derive(Default)]
    struct Derived {
        base: Base,
        size: Option<u8>,
    }
    impl Element for Derived {}

    #[test]
    fn lens_projects_through_embedding() {
        let base = Lens::of(|b: &Base| &b.name, |b: &mut Base| &mut b.name);
        let lens = base.through(|d: &Derived| &d.base, |d: &mut Derived| &mut d.base);

        let mut derived = Derived::default();
        let SlotOps::Scalar { read, write } = SlotOps::scalar::<String>() else {
            unreachable!()
        };

        write(lens.get_mut(&mut derived).unwrap(), Scalar::from("rex")).unwrap();
        assert_eq!(derived.base.name, "rex");
        assert_eq!(read(lens.get(&derived).unwrap()), Some(Scalar::from("rex")));

        // The lens rejects elements of other types.
        assert!(lens.get(&Base::default()).is_none());
    }

    #[test]
    fn optional_slots_read_none() {
        let lens = Lens::of(|d: &Derived| &d.size, |d: &mut Derived| &mut d.size);
        let SlotOps::Scalar { read, write } = SlotOps::optional_scalar::<u8>() else {
            unreachable!()
        };

        let mut derived = Derived::default();
        assert_eq!(read(lens.get(&derived).unwrap()), None);
        write(lens.get_mut(&mut derived).unwrap(), Scalar::UInt(4)).unwrap();
        assert_eq!(derived.size, Some(4));
        assert!(write(lens.get_mut(&mut derived).unwrap(), Scalar::Int(-1)).is_err());
    }
}
