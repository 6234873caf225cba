// Copyright 2026 the saferef contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::any::Any;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::ptr::NonNull;
use std::sync::Weak as WeakArc;

use crate::safe_ref::{data_ptr, SafeRef};

/// A non-owning observer of a [`SafeRef`]'s referent, analogous to
/// [`sync::Weak`].
///
/// A `Weak` does not keep the value alive and therefore sits *outside* the
/// non-null guarantee: it is obtained from [`SafeRef::downgrade`] as an
/// explicit escape hatch, and the only way back under the guarantee is
/// [`upgrade`], which re-validates that the value still exists.
///
/// # Examples
///
/// ```rust
/// use saferef::SafeRef;
///
/// let five = SafeRef::new(5);
/// let weak_five = SafeRef::downgrade(&five);
///
/// assert_eq!(*weak_five.upgrade().unwrap(), 5);
///
/// drop(five);
/// assert!(weak_five.upgrade().is_none());
/// ```
///
/// [`SafeRef`]: ./struct.SafeRef.html
/// [`SafeRef::downgrade`]: ./struct.SafeRef.html#method.downgrade
/// [`upgrade`]: ./struct.Weak.html#method.upgrade
///
/// [`sync::Weak`]: https://doc.rust-lang.org/std/sync/struct.Weak.html
pub struct Weak<T>
where
    T: ?Sized,
{
    /// The address a successful upgrade will expose. Only dereferenced after
    /// the weak count machinery has proven the owner alive.
    pub(crate) ptr: NonNull<T>,
    pub(crate) weak: WeakArc<dyn Any + Send + Sync>,
}

// Same reasoning as for SafeRef: the owner behind the weak count is always
// `Send + Sync`, and an upgrade only ever produces a handle to a `T: Sync`.
unsafe impl<T> Send for Weak<T> where T: Sync + ?Sized {}
unsafe impl<T> Sync for Weak<T> where T: Sync + ?Sized {}

impl<T> Weak<T> {
    /// Constructs a `Weak<T>` that observes nothing; [`upgrade`] on it always
    /// returns `None`. Useful as a field initializer before a real
    /// back-reference exists.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::Weak;
    ///
    /// let empty: Weak<i32> = Weak::new();
    /// assert!(empty.upgrade().is_none());
    /// ```
    ///
    /// [`upgrade`]: ./struct.Weak.html#method.upgrade
    pub fn new() -> Weak<T> {
        let weak: WeakArc<dyn Any + Send + Sync> = WeakArc::<()>::new();
        Weak {
            // Never exposed: an upgrade of an allocation-less weak fails
            // before the pointer is looked at.
            ptr: NonNull::dangling(),
            weak,
        }
    }
}

impl<T> Weak<T>
where
    T: ?Sized,
{
    /// Attempts to promote the observer back into an owning [`SafeRef`],
    /// returning `None` if the value has already been destroyed.
    ///
    /// A successful upgrade exposes the same address the downgraded handle
    /// did, aliasing included.
    ///
    /// [`SafeRef`]: ./struct.SafeRef.html
    pub fn upgrade(&self) -> Option<SafeRef<T>> {
        let owner = self.weak.upgrade()?;
        Some(SafeRef {
            ptr: self.ptr,
            owner,
        })
    }

    /// Returns true if the observed value has been destroyed (or was never
    /// there, for [`Weak::new`]).
    ///
    /// [`Weak::new`]: ./struct.Weak.html#method.new
    pub fn expired(&self) -> bool {
        self.weak.strong_count() == 0
    }

    /// Gets the number of owning references to the observed allocation.
    pub fn strong_count(&self) -> usize {
        self.weak.strong_count()
    }

    /// Gets the number of `Weak` references to the observed allocation.
    pub fn weak_count(&self) -> usize {
        self.weak.weak_count()
    }

    /// The address an upgrade would expose. Unlike [`SafeRef::as_ptr`] this
    /// carries no validity guarantee: the value may be gone, and for
    /// [`Weak::new`] the address is dangling.
    ///
    /// [`SafeRef::as_ptr`]: ./struct.SafeRef.html#method.as_ptr
    /// [`Weak::new`]: ./struct.Weak.html#method.new
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Returns true if two observers would expose the same address on
    /// upgrade.
    pub fn ptr_eq(&self, other: &Weak<T>) -> bool {
        data_ptr(self.ptr.as_ptr()) == data_ptr(other.ptr.as_ptr())
    }
}

impl<T> Clone for Weak<T>
where
    T: ?Sized,
{
    /// Makes a clone of the observer, incrementing the shared weak count.
    fn clone(&self) -> Weak<T> {
        Weak {
            ptr: self.ptr,
            weak: WeakArc::clone(&self.weak),
        }
    }
}

impl<T> Default for Weak<T> {
    fn default() -> Weak<T> {
        Weak::new()
    }
}

impl<T> Debug for Weak<T>
where
    T: ?Sized,
{
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "(Weak)")
    }
}
