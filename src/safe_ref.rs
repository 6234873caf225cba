// Copyright 2026 the saferef contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter, Pointer, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::panic::{RefUnwindSafe, UnwindSafe};
use std::ptr::NonNull;
use std::sync::Arc;

use crate::error::{CastError, NullError};
use crate::weak::Weak;

/// Strips pointer metadata so that equality, ordering and hashing look only
/// at the address, never at vtables or slice lengths.
pub(crate) fn data_ptr<T: ?Sized>(ptr: *const T) -> *const () {
    ptr.cast()
}

/// A reference-counted ownership handle that is never null.
///
/// `SafeRef` wraps [`Arc`], the platform's shared-ownership pointer: cloning
/// a `SafeRef` increments the shared strong count, dropping one decrements
/// it, and the referent is destroyed exactly once when the last owner (handle
/// or recovered `Arc`) releases. `SafeRef` adds no counting, locking or
/// allocation of its own — its contribution is the invariant that the held
/// address is non-null for the handle's entire lifetime.
///
/// Every constructor that accepts an input which *can* be null — an absent
/// [`Arc`] or [`Box`], a raw pointer, an alias pointer — validates it before
/// taking ownership of anything and returns [`NullError`] instead of
/// constructing. Access through an existing handle therefore never fails:
/// [`get`], [`Deref`] and [`as_ptr`] are total.
///
/// The inherent methods of `SafeRef` are all associated functions, which
/// means you have to call them as e.g. [`SafeRef::get(&value)`][`get`]
/// instead of `value.get()`. This avoids conflict with methods of the inner
/// type `T`.
///
/// # Aliasing
///
/// A handle can expose an address *within* its referent while sharing the
/// original ownership, via [`map`] (safe, projection through a borrow) or
/// [`alias`] (unsafe, raw pointer). The projected handle keeps the whole
/// owner alive; [`owner_eq`] relates the two while [`ptr_eq`] distinguishes
/// them.
///
/// # Escape hatches
///
/// [`downgrade`], [`to_arc`] and [`into_owner`] convert a handle into types
/// that can be empty, reset or outlive their referent. **The non-null
/// guarantee does not follow through these conversions** — they exist for
/// interop with code that is not aware of the guarantee, and the resulting
/// values must be re-validated (e.g. by [`Weak::upgrade`] or
/// [`try_from_arc`]) to get back under it.
///
/// # Thread safety
///
/// Ownership is erased into `Arc<dyn Any + Send + Sync>`, so every
/// constructor requires `Send + Sync + 'static` of the owning value; in
/// exchange `SafeRef<T>` is `Send` and `Sync` whenever `&T` is shareable
/// (`T: Sync`), and concurrent clones and drops across threads are exactly as
/// safe as they are for [`Arc`].
///
/// # Examples
///
/// ```rust
/// use saferef::SafeRef;
///
/// let five = SafeRef::new(5);
/// let same_five = SafeRef::clone(&five);
///
/// assert_eq!(*five, 5);
/// assert!(SafeRef::ptr_eq(&five, &same_five));
/// assert_eq!(2, SafeRef::strong_count(&five));
/// ```
///
/// [`get`]: ./struct.SafeRef.html#method.get
/// [`as_ptr`]: ./struct.SafeRef.html#method.as_ptr
/// [`map`]: ./struct.SafeRef.html#method.map
/// [`alias`]: ./struct.SafeRef.html#method.alias
/// [`owner_eq`]: ./struct.SafeRef.html#method.owner_eq
/// [`ptr_eq`]: ./struct.SafeRef.html#method.ptr_eq
/// [`downgrade`]: ./struct.SafeRef.html#method.downgrade
/// [`to_arc`]: ./struct.SafeRef.html#method.to_arc
/// [`into_owner`]: ./struct.SafeRef.html#method.into_owner
/// [`try_from_arc`]: ./struct.SafeRef.html#method.try_from_arc
/// [`Weak::upgrade`]: ./struct.Weak.html#method.upgrade
/// [`NullError`]: ./struct.NullError.html
///
/// [`Arc`]: https://doc.rust-lang.org/std/sync/struct.Arc.html
/// [`Box`]: https://doc.rust-lang.org/std/boxed/struct.Box.html
/// [`Deref`]: https://doc.rust-lang.org/std/ops/trait.Deref.html
pub struct SafeRef<T>
where
    T: ?Sized,
{
    /// The exposed address. Points either at the owner's own value or, for
    /// aliased handles, at memory the owner keeps alive.
    pub(crate) ptr: NonNull<T>,
    /// The type-erased keep-alive. All reference counting happens here.
    pub(crate) owner: Arc<dyn Any + Send + Sync>,
}

// The erasure bound guarantees the owning value is `Send + Sync`, so moving
// or sharing a handle across threads is sound as soon as `&T` itself is
// shareable. The handle never hands out more than `&T`.
unsafe impl<T> Send for SafeRef<T> where T: Sync + ?Sized {}
unsafe impl<T> Sync for SafeRef<T> where T: Sync + ?Sized {}

impl<T> SafeRef<T>
where
    T: Send + Sync + 'static,
{
    /// Constructs a new `SafeRef`, placing `value` in shared storage.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::SafeRef;
    ///
    /// let five = SafeRef::new(5);
    /// assert_eq!(*five, 5);
    /// ```
    pub fn new(value: T) -> SafeRef<T> {
        SafeRef::from_arc(Arc::new(value))
    }

    /// Wraps an already-shared value. The `Arc` is statically non-null, so no
    /// runtime validation is needed on this path.
    fn from_arc(arc: Arc<T>) -> SafeRef<T> {
        // The data pointer of a live Arc is never null.
        let ptr = unsafe { NonNull::new_unchecked(Arc::as_ptr(&arc) as *mut T) };
        let owner: Arc<dyn Any + Send + Sync> = arc;
        SafeRef { ptr, owner }
    }

    /// Takes ownership of a raw pointer and wraps it in a `SafeRef`. The
    /// handle exposes `ptr` itself — the referent is not moved — and frees it
    /// as if by [`Box::from_raw`] when the last owning handle releases. A
    /// null `ptr` is rejected with [`NullError`] before ownership is taken.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must have been obtained from [`Box::into_raw`] and
    /// must not be used (or freed) by the caller afterwards.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::SafeRef;
    ///
    /// let raw = Box::into_raw(Box::new(17));
    /// let seventeen = unsafe { SafeRef::from_raw(raw) }.unwrap();
    /// assert_eq!(*seventeen, 17);
    /// assert_eq!(SafeRef::as_ptr(&seventeen), raw as *const i32);
    ///
    /// let null: *mut i32 = std::ptr::null_mut();
    /// assert!(unsafe { SafeRef::from_raw(null) }.is_err());
    /// ```
    ///
    /// [`NullError`]: ./struct.NullError.html
    ///
    /// [`Box::from_raw`]: https://doc.rust-lang.org/std/boxed/struct.Box.html#method.from_raw
    /// [`Box::into_raw`]: https://doc.rust-lang.org/std/boxed/struct.Box.html#method.into_raw
    pub unsafe fn from_raw(ptr: *mut T) -> Result<SafeRef<T>, NullError> {
        SafeRef::from_raw_with(ptr, |p: *mut T| unsafe { drop(Box::from_raw(p)) })
    }

    /// Takes ownership of a raw pointer together with a custom deleter. The
    /// deleter runs exactly once, when the last owning handle releases. A
    /// null `ptr` is rejected with [`NullError`] before ownership is taken
    /// and before the deleter is stored, so a failed construction never runs
    /// it.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must stay valid for reads until the deleter runs, and
    /// releasing the pointee through `deleter` (possibly on another thread)
    /// must be sound.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::SafeRef;
    ///
    /// let raw = Box::into_raw(Box::new(String::from("managed")));
    /// let deleter = |p: *mut String| unsafe {
    ///     drop(Box::from_raw(p));
    /// };
    /// let handle = unsafe { SafeRef::from_raw_with(raw, deleter) }.unwrap();
    /// assert_eq!(*handle, "managed");
    /// ```
    ///
    /// [`NullError`]: ./struct.NullError.html
    pub unsafe fn from_raw_with<D>(ptr: *mut T, deleter: D) -> Result<SafeRef<T>, NullError>
    where
        D: FnOnce(*mut T) + Send + Sync + 'static,
    {
        let ptr = NonNull::new(ptr).ok_or(NullError)?;
        let owner: Arc<dyn Any + Send + Sync> = Arc::new(RawGuard {
            ptr: ptr.as_ptr(),
            deleter: Some(deleter),
        });
        Ok(SafeRef { ptr, owner })
    }

    /// Wraps a nullable shared pointer, rejecting `None` with [`NullError`].
    ///
    /// This is an inherent constructor rather than a `TryFrom` impl: core's
    /// blanket `TryFrom<U> for T where U: Into<T>` already claims
    /// `SafeRef<Option<Arc<T>>>: TryFrom<Option<Arc<T>>>`, which would make
    /// every unannotated `try_from` call ambiguous.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use saferef::SafeRef;
    ///
    /// let absent: Option<Arc<i32>> = None;
    /// assert!(SafeRef::try_from_arc(absent).is_err());
    ///
    /// let five = SafeRef::try_from_arc(Some(Arc::new(5))).unwrap();
    /// assert_eq!(*five, 5);
    /// ```
    ///
    /// [`NullError`]: ./struct.NullError.html
    pub fn try_from_arc(arc: Option<Arc<T>>) -> Result<SafeRef<T>, NullError> {
        arc.map(SafeRef::from_arc).ok_or(NullError)
    }

    /// Wraps a nullable exclusive pointer, rejecting `None` with
    /// [`NullError`].
    ///
    /// [`NullError`]: ./struct.NullError.html
    pub fn try_from_box(boxed: Option<Box<T>>) -> Result<SafeRef<T>, NullError> {
        boxed.map(SafeRef::from).ok_or(NullError)
    }

    /// Recovers the underlying typed [`Arc`], if this handle directly owns a
    /// `T` allocation — that is, it was built by [`new`], the factory's
    /// default path, or wrapping an `Arc<T>`/`Box<T>`, and has not been
    /// re-pointed by [`map`] or [`alias`]. Returns `None` for aliased and
    /// deleter-backed handles.
    ///
    /// This is an escape hatch: the returned `Arc` lives its own life and the
    /// non-null guarantee does not constrain it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::SafeRef;
    ///
    /// let handle = SafeRef::new(17);
    /// let arc = SafeRef::to_arc(&handle).unwrap();
    ///
    /// // Round-tripping preserves the referent.
    /// let back = SafeRef::from(arc);
    /// assert!(SafeRef::ptr_eq(&handle, &back));
    /// ```
    ///
    /// [`new`]: ./struct.SafeRef.html#method.new
    /// [`map`]: ./struct.SafeRef.html#method.map
    /// [`alias`]: ./struct.SafeRef.html#method.alias
    ///
    /// [`Arc`]: https://doc.rust-lang.org/std/sync/struct.Arc.html
    pub fn to_arc(this: &SafeRef<T>) -> Option<Arc<T>> {
        let arc = Arc::clone(&this.owner).downcast::<T>().ok()?;
        if Arc::as_ptr(&arc) == this.ptr.as_ptr() as *const T {
            Some(arc)
        } else {
            // The owner is a T, but the handle exposes some other address
            // within it; a typed Arc would point at the wrong place.
            None
        }
    }

    /// Erases the pointee type, turning this handle into a
    /// `SafeRef<dyn Any + Send + Sync>` suitable for [`downcast`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::any::Any;
    ///
    /// use saferef::SafeRef;
    ///
    /// let any: SafeRef<dyn Any + Send + Sync> = SafeRef::into_any(SafeRef::new(17));
    /// assert!(SafeRef::is::<i32>(&any));
    /// ```
    ///
    /// [`downcast`]: ./struct.SafeRef.html#method.downcast
    pub fn into_any(this: SafeRef<T>) -> SafeRef<dyn Any + Send + Sync> {
        let ptr: NonNull<dyn Any + Send + Sync> = this.ptr;
        SafeRef {
            ptr,
            owner: this.owner,
        }
    }
}

impl<T> SafeRef<T>
where
    T: ?Sized,
{
    /// Returns a reference to the inner value. Total: the non-null invariant
    /// makes this infallible for the handle's entire lifetime.
    pub fn get(this: &SafeRef<T>) -> &T {
        // The invariant: `ptr` is non-null and kept alive by `owner`.
        unsafe { this.ptr.as_ref() }
    }

    /// Returns the exposed raw address. Never null.
    pub fn as_ptr(this: &SafeRef<T>) -> *const T {
        this.ptr.as_ptr()
    }

    /// Gets the number of owning references — `SafeRef` clones plus any
    /// [`Arc`]s recovered through [`to_arc`] — to the shared allocation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::SafeRef;
    ///
    /// let five = SafeRef::new(5);
    /// let _also_five = SafeRef::clone(&five);
    ///
    /// assert_eq!(2, SafeRef::strong_count(&five));
    /// ```
    ///
    /// [`to_arc`]: ./struct.SafeRef.html#method.to_arc
    ///
    /// [`Arc`]: https://doc.rust-lang.org/std/sync/struct.Arc.html
    pub fn strong_count(this: &SafeRef<T>) -> usize {
        Arc::strong_count(&this.owner)
    }

    /// Gets the number of [`Weak`] references to the shared allocation.
    ///
    /// [`Weak`]: ./struct.Weak.html
    pub fn weak_count(this: &SafeRef<T>) -> usize {
        Arc::weak_count(&this.owner)
    }

    /// Returns true if this handle is the only owning reference to the
    /// shared allocation.
    pub fn is_unique(this: &SafeRef<T>) -> bool {
        Arc::strong_count(&this.owner) == 1
    }

    /// Returns true if two handles expose the same address (not just values
    /// that compare as equal). This is the same relation as `==`.
    ///
    /// Contrast with [`owner_eq`], which relates handles sharing the same
    /// allocation even when aliasing has re-pointed one of them.
    ///
    /// [`owner_eq`]: ./struct.SafeRef.html#method.owner_eq
    pub fn ptr_eq(this: &SafeRef<T>, other: &SafeRef<T>) -> bool {
        data_ptr(this.ptr.as_ptr()) == data_ptr(other.ptr.as_ptr())
    }

    /// Returns true if two handles — possibly of different pointee types —
    /// share ownership of the same allocation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::SafeRef;
    ///
    /// let triple = SafeRef::new([1, 2, 3]);
    /// let second = SafeRef::map(SafeRef::clone(&triple), |t: &[i32; 3]| &t[1]);
    ///
    /// assert!(SafeRef::owner_eq(&triple, &second));
    /// assert_ne!(
    ///     SafeRef::as_ptr(&triple) as *const (),
    ///     SafeRef::as_ptr(&second) as *const (),
    /// );
    /// ```
    pub fn owner_eq<U>(this: &SafeRef<T>, other: &SafeRef<U>) -> bool
    where
        U: ?Sized,
    {
        Arc::as_ptr(&this.owner).cast::<()>() == Arc::as_ptr(&other.owner).cast::<()>()
    }

    /// Owner-based strict weak ordering, for keying ownership-identity maps.
    /// Orders by allocation, so a handle and its aliases compare equivalent.
    pub fn owner_before<U>(this: &SafeRef<T>, other: &SafeRef<U>) -> bool
    where
        U: ?Sized,
    {
        (Arc::as_ptr(&this.owner).cast::<()>() as usize)
            < (Arc::as_ptr(&other.owner).cast::<()>() as usize)
    }

    /// [`owner_eq`] against a raw shared pointer, for mixed-type code that
    /// still holds the [`Arc`] a handle was built from.
    ///
    /// [`owner_eq`]: ./struct.SafeRef.html#method.owner_eq
    ///
    /// [`Arc`]: https://doc.rust-lang.org/std/sync/struct.Arc.html
    pub fn owner_eq_arc<U>(this: &SafeRef<T>, other: &Arc<U>) -> bool
    where
        U: ?Sized,
    {
        Arc::as_ptr(&this.owner).cast::<()>() == Arc::as_ptr(other).cast::<()>()
    }

    /// [`owner_before`] against a raw shared pointer.
    ///
    /// [`owner_before`]: ./struct.SafeRef.html#method.owner_before
    pub fn owner_before_arc<U>(this: &SafeRef<T>, other: &Arc<U>) -> bool
    where
        U: ?Sized,
    {
        (Arc::as_ptr(&this.owner).cast::<()>() as usize)
            < (Arc::as_ptr(other).cast::<()>() as usize)
    }

    /// Creates a new [`Weak`] reference to this value.
    ///
    /// This is an escape hatch: a `Weak` does not own the value and can
    /// outlive it, so the non-null guarantee does not follow through. Promote
    /// it back under the guarantee with [`Weak::upgrade`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::SafeRef;
    ///
    /// let five = SafeRef::new(5);
    /// let weak_five = SafeRef::downgrade(&five);
    ///
    /// assert!(weak_five.upgrade().is_some());
    /// drop(five);
    /// assert!(weak_five.upgrade().is_none());
    /// ```
    ///
    /// [`Weak`]: ./struct.Weak.html
    /// [`Weak::upgrade`]: ./struct.Weak.html#method.upgrade
    pub fn downgrade(this: &SafeRef<T>) -> Weak<T> {
        Weak {
            ptr: this.ptr,
            weak: Arc::downgrade(&this.owner),
        }
    }

    /// Consumes the handle and returns the type-erased keep-alive itself.
    ///
    /// This is the rawest escape hatch: the returned [`Arc`] owns whatever
    /// allocation backed the handle (the value, or a deleter guard) and is
    /// not constrained by the non-null guarantee in any way.
    ///
    /// [`Arc`]: https://doc.rust-lang.org/std/sync/struct.Arc.html
    pub fn into_owner(this: SafeRef<T>) -> Arc<dyn Any + Send + Sync> {
        this.owner
    }

    /// Aliases this handle through a borrow: the returned handle shares
    /// ownership (and lifetime) with `this` but exposes the address `project`
    /// returns — a field, an element, an unsized view of the referent.
    ///
    /// The projection works through `&T`, so the exposed address is
    /// statically non-null and statically tied to memory the owner keeps
    /// alive; no runtime validation is needed. This is also how covariant
    /// conversions are spelled: `SafeRef::map(handle, |x: &Concrete| x as
    /// &dyn Trait)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::SafeRef;
    ///
    /// struct Widget {
    ///     name: String,
    /// }
    ///
    /// let widget = SafeRef::new(Widget {
    ///     name: String::from("knob"),
    /// });
    /// let name: SafeRef<String> = SafeRef::map(SafeRef::clone(&widget), |w: &Widget| &w.name);
    ///
    /// assert_eq!(*name, "knob");
    /// assert!(SafeRef::owner_eq(&widget, &name));
    ///
    /// // The projection alone keeps the whole widget alive.
    /// drop(widget);
    /// assert_eq!(*name, "knob");
    /// ```
    pub fn map<U, F>(this: SafeRef<T>, project: F) -> SafeRef<U>
    where
        U: ?Sized,
        F: FnOnce(&T) -> &U,
    {
        let ptr = NonNull::from(project(SafeRef::get(&this)));
        SafeRef {
            ptr,
            owner: this.owner,
        }
    }

    /// Aliases `owner` through a raw pointer: the returned handle shares
    /// ownership with `owner` but exposes `ptr`. A null `ptr` is rejected
    /// with [`NullError`] — the exposed pointer is validated independently of
    /// the base handle's own (always satisfied) invariant.
    ///
    /// Prefer [`map`] where the aliased address can be expressed as a borrow;
    /// this constructor exists for addresses that cannot (e.g. interop
    /// pointers into foreign memory the owner keeps alive).
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must stay valid for reads as long as `owner`'s
    /// allocation is alive.
    ///
    /// [`map`]: ./struct.SafeRef.html#method.map
    /// [`NullError`]: ./struct.NullError.html
    pub unsafe fn alias<U>(owner: &SafeRef<U>, ptr: *const T) -> Result<SafeRef<T>, NullError>
    where
        U: ?Sized,
    {
        match NonNull::new(ptr as *mut T) {
            Some(ptr) => Ok(SafeRef {
                ptr,
                owner: Arc::clone(&owner.owner),
            }),
            None => Err(NullError),
        }
    }
}

impl SafeRef<dyn Any + Send + Sync> {
    /// Returns true if the referent is of type `T`.
    pub fn is<T>(this: &SafeRef<dyn Any + Send + Sync>) -> bool
    where
        T: Any,
    {
        SafeRef::get(this).is::<T>()
    }

    /// Attempts to downcast the handle to a concrete pointee type, checking
    /// the referent's runtime type.
    ///
    /// A raw dynamic pointer cast would return null on failure; a `SafeRef`
    /// must not, so failure is signaled with [`CastError`] and no handle is
    /// produced. On success the returned handle shares ownership with the
    /// input and exposes the same address.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::SafeRef;
    ///
    /// let any = SafeRef::into_any(SafeRef::new(17i32));
    ///
    /// let int = SafeRef::downcast::<i32>(SafeRef::clone(&any)).unwrap();
    /// assert_eq!(*int, 17);
    ///
    /// assert!(SafeRef::downcast::<String>(any).is_err());
    /// ```
    ///
    /// [`CastError`]: ./struct.CastError.html
    pub fn downcast<T>(this: SafeRef<dyn Any + Send + Sync>) -> Result<SafeRef<T>, CastError>
    where
        T: Any,
    {
        if SafeRef::get(&this).is::<T>() {
            Ok(SafeRef {
                ptr: this.ptr.cast::<T>(),
                owner: this.owner,
            })
        } else {
            Err(CastError::new::<T>())
        }
    }
}

/// Owns a raw pointee on behalf of aliasing handles and releases it through
/// the caller-supplied deleter, exactly once.
struct RawGuard<T, D>
where
    D: FnOnce(*mut T),
{
    ptr: *mut T,
    deleter: Option<D>,
}

// The guard exposes nothing and only hands `ptr` to the deleter; the caller
// of `from_raw_with` vouches (via its unsafe contract) that releasing the
// pointee from any thread is sound.
unsafe impl<T, D> Send for RawGuard<T, D> where D: FnOnce(*mut T) + Send {}
unsafe impl<T, D> Sync for RawGuard<T, D> where D: FnOnce(*mut T) + Sync {}

impl<T, D> Drop for RawGuard<T, D>
where
    D: FnOnce(*mut T),
{
    fn drop(&mut self) {
        if let Some(deleter) = self.deleter.take() {
            deleter(self.ptr);
        }
    }
}

impl<T> Clone for SafeRef<T>
where
    T: ?Sized,
{
    /// Makes a clone of the handle, incrementing the shared strong count.
    fn clone(&self) -> SafeRef<T> {
        SafeRef {
            ptr: self.ptr,
            owner: Arc::clone(&self.owner),
        }
    }
}

impl<T> Deref for SafeRef<T>
where
    T: ?Sized,
{
    type Target = T;

    fn deref(&self) -> &T {
        SafeRef::get(self)
    }
}

impl<T> AsRef<T> for SafeRef<T>
where
    T: ?Sized,
{
    fn as_ref(&self) -> &T {
        SafeRef::get(self)
    }
}

impl<T> Default for SafeRef<T>
where
    T: Default + Send + Sync + 'static,
{
    /// Creates a new `SafeRef<T>` holding a value-initialized `T` in shared
    /// storage.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::SafeRef;
    ///
    /// let x: SafeRef<i32> = Default::default();
    /// assert_eq!(*x, 0);
    /// ```
    fn default() -> SafeRef<T> {
        SafeRef::new(T::default())
    }
}

impl<T> From<T> for SafeRef<T>
where
    T: Send + Sync + 'static,
{
    fn from(value: T) -> SafeRef<T> {
        SafeRef::new(value)
    }
}

impl<T> From<Arc<T>> for SafeRef<T>
where
    T: Send + Sync + 'static,
{
    /// Wraps an existing shared pointer without re-allocating; the handle
    /// shares the `Arc`'s control block.
    fn from(arc: Arc<T>) -> SafeRef<T> {
        SafeRef::from_arc(arc)
    }
}

impl<T> From<Box<T>> for SafeRef<T>
where
    T: Send + Sync + 'static,
{
    /// Transfers exclusive ownership into shared ownership.
    fn from(boxed: Box<T>) -> SafeRef<T> {
        SafeRef::from_arc(Arc::from(boxed))
    }
}

impl From<String> for SafeRef<str> {
    fn from(string: String) -> SafeRef<str> {
        SafeRef::map(SafeRef::new(string), String::as_str)
    }
}

impl<'a> From<&'a str> for SafeRef<str> {
    fn from(string: &'a str) -> SafeRef<str> {
        SafeRef::from(string.to_owned())
    }
}

impl<T> From<Vec<T>> for SafeRef<[T]>
where
    T: Send + Sync + 'static,
{
    fn from(vec: Vec<T>) -> SafeRef<[T]> {
        SafeRef::map(SafeRef::new(vec), Vec::as_slice)
    }
}

impl<T> PartialEq for SafeRef<T>
where
    T: ?Sized,
{
    /// Equality for two handles compares the exposed addresses, never the
    /// pointed-to values — two handles are equal exactly when they expose
    /// the same referent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use saferef::SafeRef;
    ///
    /// let five = SafeRef::new(5);
    ///
    /// assert_eq!(five, SafeRef::clone(&five));
    /// assert_ne!(five, SafeRef::new(5));
    /// ```
    fn eq(&self, other: &SafeRef<T>) -> bool {
        SafeRef::ptr_eq(self, other)
    }
}

impl<T> Eq for SafeRef<T> where T: ?Sized {}

impl<T> PartialEq<Arc<T>> for SafeRef<T>
where
    T: ?Sized,
{
    /// Address equality between a handle and a raw shared pointer.
    fn eq(&self, other: &Arc<T>) -> bool {
        data_ptr(self.ptr.as_ptr()) == data_ptr(Arc::as_ptr(other))
    }
}

impl<T> PartialEq<SafeRef<T>> for Arc<T>
where
    T: ?Sized,
{
    /// Address equality from the raw shared pointer's side, so `==` works in
    /// either direction.
    fn eq(&self, other: &SafeRef<T>) -> bool {
        data_ptr(Arc::as_ptr(self)) == data_ptr(other.ptr.as_ptr())
    }
}

impl<T> PartialOrd for SafeRef<T>
where
    T: ?Sized,
{
    fn partial_cmp(&self, other: &SafeRef<T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for SafeRef<T>
where
    T: ?Sized,
{
    /// Orders handles by exposed address, matching `PartialEq`. Useful for
    /// identity-keyed ordered maps; not a value ordering.
    fn cmp(&self, other: &SafeRef<T>) -> Ordering {
        (data_ptr(self.ptr.as_ptr()) as usize).cmp(&(data_ptr(other.ptr.as_ptr()) as usize))
    }
}

impl<T> PartialOrd<Arc<T>> for SafeRef<T>
where
    T: ?Sized,
{
    fn partial_cmp(&self, other: &Arc<T>) -> Option<Ordering> {
        Some((data_ptr(self.ptr.as_ptr()) as usize).cmp(&(data_ptr(Arc::as_ptr(other)) as usize)))
    }
}

impl<T> PartialOrd<SafeRef<T>> for Arc<T>
where
    T: ?Sized,
{
    fn partial_cmp(&self, other: &SafeRef<T>) -> Option<Ordering> {
        Some((data_ptr(Arc::as_ptr(self)) as usize).cmp(&(data_ptr(other.ptr.as_ptr()) as usize)))
    }
}

impl<T> Hash for SafeRef<T>
where
    T: ?Sized,
{
    /// Hashes the exposed address, consistently with `Eq`.
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        (data_ptr(self.ptr.as_ptr()) as usize).hash(state);
    }
}

impl<T> Debug for SafeRef<T>
where
    T: Debug + ?Sized,
{
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{:?}", &**self)
    }
}

impl<T> Display for SafeRef<T>
where
    T: Display + ?Sized,
{
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", &**self)
    }
}

impl<T> Pointer for SafeRef<T>
where
    T: ?Sized,
{
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{:p}", self.ptr.as_ptr())
    }
}

impl<T> UnwindSafe for SafeRef<T> where T: RefUnwindSafe + ?Sized {}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::thread;

    use super::*;

    /// Increments a shared counter when dropped, so tests can observe that
    /// destruction happens exactly once.
    struct DropProbe {
        drops: Arc<AtomicUsize>,
    }

    impl DropProbe {
        fn new(drops: &Arc<AtomicUsize>) -> DropProbe {
            DropProbe {
                drops: Arc::clone(drops),
            }
        }
    }

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.drops.fetch_add(1, AtomicOrdering::SeqCst);
        }
    }

    #[test]
    fn new_is_accessible_and_unique() {
        let handle = SafeRef::new(17usize);

        assert_eq!(*handle, 17);
        assert_eq!(*SafeRef::get(&handle), 17);
        assert!(!SafeRef::as_ptr(&handle).is_null());
        assert!(SafeRef::is_unique(&handle));
        assert_eq!(1, SafeRef::strong_count(&handle));
        assert_eq!(0, SafeRef::weak_count(&handle));
    }

    #[test]
    fn null_shared_pointer_is_rejected() {
        let absent: Option<Arc<i32>> = None;
        assert_eq!(SafeRef::try_from_arc(absent).unwrap_err(), NullError);

        let present = Some(Arc::new(5));
        assert_eq!(*SafeRef::try_from_arc(present).unwrap(), 5);
    }

    #[test]
    fn null_exclusive_pointer_is_rejected() {
        let absent: Option<Box<i32>> = None;
        assert_eq!(SafeRef::try_from_box(absent).unwrap_err(), NullError);

        let present = Some(Box::new(5));
        assert_eq!(*SafeRef::try_from_box(present).unwrap(), 5);
    }

    #[test]
    fn null_raw_pointer_is_rejected() {
        let null: *mut i32 = std::ptr::null_mut();
        assert_eq!(unsafe { SafeRef::from_raw(null) }.unwrap_err(), NullError);
    }

    #[test]
    fn null_raw_pointer_with_deleter_is_rejected_without_running_it() {
        let runs = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&runs);

        let null: *mut i32 = std::ptr::null_mut();
        let result = unsafe {
            SafeRef::from_raw_with(null, move |_| {
                observed.fetch_add(1, AtomicOrdering::SeqCst);
            })
        };

        assert_eq!(result.unwrap_err(), NullError);
        // Rejection happens before the deleter is stored anywhere.
        assert_eq!(0, runs.load(AtomicOrdering::SeqCst));
    }

    #[test]
    fn clone_and_drop_track_the_shared_count() {
        let drops = Arc::new(AtomicUsize::new(0));
        let handle = SafeRef::new(DropProbe::new(&drops));

        let clone_a = SafeRef::clone(&handle);
        let clone_b = SafeRef::clone(&handle);
        assert_eq!(3, SafeRef::strong_count(&handle));

        drop(clone_a);
        assert_eq!(2, SafeRef::strong_count(&handle));
        assert_eq!(0, drops.load(AtomicOrdering::SeqCst));

        drop(clone_b);
        drop(handle);
        assert_eq!(1, drops.load(AtomicOrdering::SeqCst));
    }

    #[test]
    fn destruction_happens_exactly_once_across_threads() {
        let drops = Arc::new(AtomicUsize::new(0));
        let handle = SafeRef::new(DropProbe::new(&drops));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let clone = SafeRef::clone(&handle);
                thread::spawn(move || {
                    assert!(!SafeRef::as_ptr(&clone).is_null());
                    drop(clone);
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(1, SafeRef::strong_count(&handle));
        assert_eq!(0, drops.load(AtomicOrdering::SeqCst));
        drop(handle);
        assert_eq!(1, drops.load(AtomicOrdering::SeqCst));
    }

    #[test]
    fn raw_round_trip_owns_and_frees() {
        let drops = Arc::new(AtomicUsize::new(0));
        let raw = Box::into_raw(Box::new(DropProbe::new(&drops)));

        let handle = unsafe { SafeRef::from_raw(raw) }.unwrap();
        // The wrapped address is the input pointer itself; the referent is
        // never moved.
        assert_eq!(SafeRef::as_ptr(&handle), raw as *const DropProbe);
        assert_eq!(0, drops.load(AtomicOrdering::SeqCst));

        let clone = SafeRef::clone(&handle);
        drop(handle);
        assert_eq!(SafeRef::as_ptr(&clone), raw as *const DropProbe);
        drop(clone);
        assert_eq!(1, drops.load(AtomicOrdering::SeqCst));
    }

    #[test]
    fn custom_deleter_runs_exactly_once_on_last_release() {
        let runs = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&runs);

        let raw = Box::into_raw(Box::new(String::from("payload")));
        let deleter = move |p: *mut String| {
            observed.fetch_add(1, AtomicOrdering::SeqCst);
            drop(unsafe { Box::from_raw(p) });
        };
        let handle = unsafe { SafeRef::from_raw_with(raw, deleter) }.unwrap();

        assert_eq!(*handle, "payload");

        let clone = SafeRef::clone(&handle);
        drop(handle);
        assert_eq!(0, runs.load(AtomicOrdering::SeqCst));
        drop(clone);
        assert_eq!(1, runs.load(AtomicOrdering::SeqCst));
    }

    #[test]
    fn arc_round_trip_preserves_the_referent() {
        let handle = SafeRef::new(17usize);

        let arc = SafeRef::to_arc(&handle).unwrap();
        assert_eq!(Arc::as_ptr(&arc), SafeRef::as_ptr(&handle));
        assert!(handle == arc);
        assert!(arc == handle);

        let back = SafeRef::from(arc);
        assert!(SafeRef::ptr_eq(&handle, &back));
        assert_eq!(2, SafeRef::strong_count(&handle));
    }

    #[test]
    fn comparisons_are_symmetric_with_the_raw_pointer() {
        let handle = SafeRef::new(5);
        let arc = SafeRef::to_arc(&handle).unwrap();
        let other = Arc::new(5);

        assert!(handle == arc && arc == handle);
        assert!(handle != other && other != handle);
        // Distinct allocations order strictly, the same way from both sides.
        assert_eq!(handle < other, !(other < handle));
        assert!(handle < other || other < handle);
    }

    #[test]
    fn owner_identity_against_a_raw_pointer() {
        let arc = Arc::new((1u8, String::from("tail")));
        let handle = SafeRef::from(Arc::clone(&arc));
        let tail = SafeRef::map(SafeRef::clone(&handle), |p: &(u8, String)| &p.1);

        // The alias shares the allocation even though its address differs.
        assert!(SafeRef::owner_eq_arc(&handle, &arc));
        assert!(SafeRef::owner_eq_arc(&tail, &arc));
        assert!(!SafeRef::owner_before_arc(&handle, &arc));

        let unrelated = Arc::new(0u64);
        assert!(!SafeRef::owner_eq_arc(&handle, &unrelated));
        // Ordering against the Arc agrees with ordering against a handle
        // wrapping that same Arc.
        let wrapped: SafeRef<u64> = SafeRef::from(Arc::clone(&unrelated));
        assert_eq!(
            SafeRef::owner_before_arc(&handle, &unrelated),
            SafeRef::owner_before(&handle, &wrapped)
        );
    }

    #[test]
    fn aliased_handles_share_ownership_but_not_address() {
        struct Widget {
            id: u32,
            name: String,
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let widget = SafeRef::new((
            Widget {
                id: 7,
                name: String::from("knob"),
            },
            DropProbe::new(&drops),
        ));

        let name = SafeRef::map(SafeRef::clone(&widget), |w: &(Widget, DropProbe)| {
            &w.0.name
        });
        let id = SafeRef::map(SafeRef::clone(&widget), |w: &(Widget, DropProbe)| &w.0.id);

        assert_eq!(*name, "knob");
        assert_eq!(*id, 7);
        assert!(SafeRef::owner_eq(&widget, &name));
        assert!(SafeRef::owner_eq(&name, &id));
        assert_eq!(3, SafeRef::strong_count(&widget));

        // A projection has left the handle; the typed Arc is unreachable
        // through it.
        assert!(SafeRef::to_arc(&SafeRef::map(
            SafeRef::clone(&widget),
            |w: &(Widget, DropProbe)| &w.0,
        ))
        .is_none());

        // Projections alone keep the owner alive.
        drop(widget);
        drop(id);
        assert_eq!(0, drops.load(AtomicOrdering::SeqCst));
        assert_eq!(*name, "knob");

        drop(name);
        assert_eq!(1, drops.load(AtomicOrdering::SeqCst));
    }

    #[test]
    fn raw_alias_validates_the_exposed_pointer() {
        let pair = SafeRef::new((1u8, String::from("tail")));

        let tail = unsafe { SafeRef::alias(&pair, &pair.1 as *const String) }.unwrap();
        assert_eq!(*tail, "tail");
        assert!(SafeRef::owner_eq(&pair, &tail));

        let null: *const String = std::ptr::null();
        assert_eq!(
            unsafe { SafeRef::alias(&pair, null) }.unwrap_err(),
            NullError
        );
    }

    #[test]
    fn unsizing_through_map() {
        use std::fmt::Display;

        let five = SafeRef::new(5i32);
        let shown: SafeRef<dyn Display> = SafeRef::map(SafeRef::clone(&five), |x: &i32| {
            x as &dyn Display
        });

        assert_eq!(shown.to_string(), "5");
        assert!(SafeRef::owner_eq(&five, &shown));
    }

    #[test]
    fn downcast_succeeds_for_the_right_type() {
        let any = SafeRef::into_any(SafeRef::new(17i32));
        let addr = SafeRef::as_ptr(&any).cast::<()>();

        assert!(SafeRef::is::<i32>(&any));
        let int = SafeRef::downcast::<i32>(any).unwrap();
        assert_eq!(*int, 17);
        assert_eq!(SafeRef::as_ptr(&int).cast::<()>(), addr);
    }

    #[test]
    fn downcast_failure_signals_instead_of_nulling() {
        let any = SafeRef::into_any(SafeRef::new(17i32));

        let error = SafeRef::downcast::<String>(any).unwrap_err();
        assert!(error.expected().contains("String"));
    }

    #[test]
    fn comparisons_use_the_address_not_the_value() {
        let a = SafeRef::new(5);
        let b = SafeRef::new(5);
        let a2 = SafeRef::clone(&a);

        assert_eq!(a, a2);
        assert_ne!(a, b);

        // A strict total order over distinct addresses.
        assert_eq!(a < b, !(b < a));
        assert!(a <= a2 && a >= a2);
    }

    #[test]
    fn hashing_follows_address_identity() {
        use std::collections::HashMap;

        let a = SafeRef::new(5);
        let b = SafeRef::new(5);

        let mut map = HashMap::new();
        map.insert(SafeRef::clone(&a), "a");
        map.insert(SafeRef::clone(&b), "b");

        assert_eq!(map.len(), 2);
        assert_eq!(map[&a], "a");
        assert_eq!(map[&b], "b");
    }

    #[test]
    fn string_and_slice_conversions() {
        let text = SafeRef::<str>::from(String::from("abc"));
        assert_eq!(&*text, "abc");

        let text = SafeRef::<str>::from("xyz");
        assert_eq!(&*text, "xyz");

        let slice = SafeRef::<[u8]>::from(vec![1u8, 2, 3]);
        assert_eq!(&*slice, &[1, 2, 3]);
    }

    #[test]
    fn formatting_forwards_to_the_value() {
        let five = SafeRef::new(5);

        assert_eq!(format!("{}", five), "5");
        assert_eq!(format!("{:?}", five), "5");
        assert_eq!(
            format!("{:p}", five),
            format!("{:p}", SafeRef::as_ptr(&five))
        );
    }

    #[test]
    fn default_value_initializes() {
        let zero: SafeRef<i32> = Default::default();
        assert_eq!(*zero, 0);
    }
}
