//! A small bounded pool of reusable scratch state.

use alloc::vec::Vec;
use core::fmt;
use core::ops::{Deref, DerefMut};

use parking_lot::{Condvar, Mutex};

// -----------------------------------------------------------------------------
// Recycle

/// State that can be reset for reuse.
pub trait Recycle: Default {
    /// Clears the state while keeping its allocations.
    fn recycle(&mut self);
}

// -----------------------------------------------------------------------------
// Pool

struct Slots<T> {
    idle: Vec<T>,
    out: usize,
}

/// Lends out at most `capacity` values at a time.
///
/// [`acquire`](Self::acquire) hands out a guard and blocks while `capacity`
/// guards are alive; [`try_acquire`](Self::try_acquire) returns `None`
/// instead. Dropping the guard recycles the value and returns it to the
/// pool, on every exit path of the borrowing scope including early returns
/// with an error and unwinding.
///
/// # Examples
///
/// ```
/// use weft_graph::pool::{Pool, Recycle};
///
/// #[derive(Default)]
/// struct Buffer(Vec<u8>);
///
/// impl Recycle for Buffer {
///     fn recycle(&mut self) {
///         self.0.clear();
///     }
/// }
///
/// let pool = Pool::<Buffer>::new(2);
/// {
///     let mut buffer = pool.acquire();
///     buffer.0.extend_from_slice(b"scratch");
/// }
/// assert_eq!(pool.idle(), 1);
/// assert!(pool.acquire().0.is_empty());
/// ```
pub struct Pool<T: Recycle> {
    slots: Mutex<Slots<T>>,
    returned: Condvar,
    capacity: usize,
}

impl<T: Recycle> Pool<T> {
    /// A capacity of zero is raised to one.
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(Slots {
                idle: Vec::new(),
                out: 0,
            }),
            returned: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Takes an idle value or creates a fresh one, waiting for a guard to be
    /// dropped when all values are lent out.
    pub fn acquire(&self) -> Pooled<'_, T> {
        let mut slots = self.slots.lock();
        while slots.out >= self.capacity {
            self.returned.wait(&mut slots);
        }
        slots.out += 1;
        let value = slots.idle.pop().unwrap_or_default();
        Pooled { pool: self, value }
    }

    /// Like [`acquire`](Self::acquire) but returns `None` when all values
    /// are lent out.
    pub fn try_acquire(&self) -> Option<Pooled<'_, T>> {
        let mut slots = self.slots.lock();
        if slots.out >= self.capacity {
            return None;
        }
        slots.out += 1;
        let value = slots.idle.pop().unwrap_or_default();
        Some(Pooled { pool: self, value })
    }

    /// Number of values waiting for reuse.
    #[inline]
    pub fn idle(&self) -> usize {
        self.slots.lock().idle.len()
    }

    /// Number of live guards.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.slots.lock().out
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn release(&self, mut value: T) {
        value.recycle();
        let mut slots = self.slots.lock();
        slots.out -= 1;
        slots.idle.push(value);
        drop(slots);
        self.returned.notify_one();
    }
}

impl<T: Recycle> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock();
        f.debug_struct("Pool")
            .field("idle", &slots.idle.len())
            .field("in_use", &slots.out)
            .field("capacity", &self.capacity)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Pooled

/// A value borrowed from a [`Pool`], returned on drop.
pub struct Pooled<'p, T: Recycle> {
    pool: &'p Pool<T>,
    value: T,
}

impl<T: Recycle> Deref for Pooled<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Recycle> DerefMut for Pooled<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Recycle> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        self.pool.release(core::mem::take(&mut self.value));
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use std::thread;

    use super::{Pool, Recycle};

    #[derive(Default)]
    struct Scratch(String);

    impl Recycle for Scratch {
        fn recycle(&mut self) {
            self.0.clear();
        }
    }

    fn fails(pool: &Pool<Scratch>) -> Result<(), &'static str> {
        let mut scratch = pool.acquire();
        scratch.0.push_str("partial");
        Err("tokenizer failed")
    }

    #[test]
    fn released_on_error_paths() {
        let pool = Pool::new(4);
        assert!(fails(&pool).is_err());
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.in_use(), 0);
        assert!(pool.acquire().0.is_empty());
    }

    #[test]
    fn capacity_bounds_lent_values() {
        let pool = Pool::<Scratch>::new(1);
        let a = pool.acquire();
        assert!(pool.try_acquire().is_none());
        assert_eq!(pool.in_use(), 1);
        drop(a);
        let b = pool.try_acquire();
        assert!(b.is_some());
        drop(b);
        assert_eq!(pool.idle(), 1);
        assert_eq!(Pool::<Scratch>::new(0).capacity(), 1);
    }

    #[test]
    fn acquire_waits_for_a_release() {
        let pool = Arc::new(Pool::<Scratch>::new(2));
        let workers: Vec<_> = (0..8)
            .map(|n| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let mut scratch = pool.acquire();
                    assert!(pool.in_use() <= 2);
                    scratch.0.push_str(&n.to_string());
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(pool.in_use(), 0);
        assert!(pool.idle() <= 2);
    }
}
