// Copyright 2026 the saferef contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::OnceLock;

use crate::error::NoOwnerError;
use crate::safe_ref::SafeRef;
use crate::weak::Weak;

/// The capability a type embeds to be able to hand out owning handles to
/// itself. See [`SafeFromSelf`].
///
/// A `SelfRef<T>` starts out unbound; [`SafeRef::new_bound`] and
/// [`SafeRef::bind_self`] fill it with a back-reference to the owning
/// handle's allocation. The back-reference is weak, so the capability never
/// keeps its own value alive and embedding one cannot create an ownership
/// cycle.
///
/// `Clone` yields a *fresh, unbound* capability: a copied or cloned value is
/// a different object at a different address, and inheriting the original's
/// back-reference would make [`safe_from_self`] answer with a handle to the
/// wrong object.
///
/// [`SafeFromSelf`]: ./trait.SafeFromSelf.html
/// [`SafeRef::new_bound`]: ./struct.SafeRef.html#method.new_bound
/// [`SafeRef::bind_self`]: ./struct.SafeRef.html#method.bind_self
/// [`safe_from_self`]: ./trait.SafeFromSelf.html#method.safe_from_self
pub struct SelfRef<T>
where
    T: ?Sized,
{
    weak: OnceLock<Weak<T>>,
}

impl<T> SelfRef<T>
where
    T: ?Sized,
{
    /// Creates an unbound capability.
    pub const fn new() -> SelfRef<T> {
        SelfRef {
            weak: OnceLock::new(),
        }
    }

    /// Produces an owning handle to the value this capability is embedded in,
    /// or [`NoOwnerError`] if the capability is unbound or every owning
    /// handle has been released.
    ///
    /// [`NoOwnerError`]: ./struct.NoOwnerError.html
    pub fn get(&self) -> Result<SafeRef<T>, NoOwnerError> {
        self.weak
            .get()
            .and_then(Weak::upgrade)
            .ok_or(NoOwnerError)
    }

    /// First bind wins; a rebind attempt on an already-bound capability is
    /// ignored.
    pub(crate) fn bind(&self, weak: Weak<T>) {
        let _ = self.weak.set(weak);
    }
}

impl<T> Clone for SelfRef<T>
where
    T: ?Sized,
{
    /// Clones as a fresh, unbound capability. The back-reference identifies
    /// one particular allocation and must never travel to a copy of the
    /// value.
    fn clone(&self) -> SelfRef<T> {
        SelfRef::new()
    }
}

impl<T> Default for SelfRef<T>
where
    T: ?Sized,
{
    fn default() -> SelfRef<T> {
        SelfRef::new()
    }
}

impl<T> Debug for SelfRef<T>
where
    T: ?Sized,
{
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        if self.weak.get().is_some() {
            write!(f, "SelfRef(bound)")
        } else {
            write!(f, "SelfRef(unbound)")
        }
    }
}

/// The ability to produce an owning [`SafeRef`] to `self`, for types that
/// live in shared storage.
///
/// Implementing the trait is opt-in and explicit: embed a [`SelfRef<Self>`]
/// field and point [`self_ref`] at it. Construct instances with
/// [`SafeRef::new_bound`] (or bind an existing handle with
/// [`SafeRef::bind_self`]) so the capability knows its owner; after that,
/// any `&self` method can call [`safe_from_self`] to hand out handles that
/// share ownership with every other handle to the value.
///
/// # Examples
///
/// ```rust
/// use saferef::{SafeFromSelf, SafeRef, SelfRef};
///
/// struct Session {
///     id: u64,
///     self_ref: SelfRef<Session>,
/// }
///
/// impl SafeFromSelf for Session {
///     fn self_ref(&self) -> &SelfRef<Session> {
///         &self.self_ref
///     }
/// }
///
/// let session = SafeRef::new_bound(Session {
///     id: 7,
///     self_ref: SelfRef::new(),
/// });
///
/// let another = session.safe_from_self().unwrap();
/// assert!(SafeRef::ptr_eq(&session, &another));
/// assert_eq!(2, SafeRef::strong_count(&session));
/// ```
///
/// [`SafeRef`]: ./struct.SafeRef.html
/// [`SelfRef<Self>`]: ./struct.SelfRef.html
/// [`self_ref`]: ./trait.SafeFromSelf.html#tymethod.self_ref
/// [`safe_from_self`]: ./trait.SafeFromSelf.html#method.safe_from_self
/// [`SafeRef::new_bound`]: ./struct.SafeRef.html#method.new_bound
/// [`SafeRef::bind_self`]: ./struct.SafeRef.html#method.bind_self
pub trait SafeFromSelf {
    /// The embedded capability.
    fn self_ref(&self) -> &SelfRef<Self>;

    /// Produces an owning handle to `self`, or [`NoOwnerError`] if `self`
    /// does not (or no longer does) live under an owning [`SafeRef`].
    ///
    /// [`SafeRef`]: ./struct.SafeRef.html
    /// [`NoOwnerError`]: ./struct.NoOwnerError.html
    fn safe_from_self(&self) -> Result<SafeRef<Self>, NoOwnerError> {
        self.self_ref().get()
    }
}

impl<T> SafeRef<T>
where
    T: SafeFromSelf + Send + Sync + 'static,
{
    /// Constructs a new `SafeRef` and binds the value's embedded [`SelfRef`]
    /// to it, so that [`safe_from_self`] works from the moment the handle
    /// exists.
    ///
    /// [`SelfRef`]: ./struct.SelfRef.html
    /// [`safe_from_self`]: ./trait.SafeFromSelf.html#method.safe_from_self
    pub fn new_bound(value: T) -> SafeRef<T> {
        let this = SafeRef::new(value);
        SafeRef::bind_self(&this);
        this
    }
}

impl<T> SafeRef<T>
where
    T: SafeFromSelf + ?Sized,
{
    /// Binds the referent's embedded [`SelfRef`] to this handle's
    /// allocation. A no-op if the capability is already bound.
    ///
    /// [`SelfRef`]: ./struct.SelfRef.html
    pub fn bind_self(this: &SafeRef<T>) {
        SafeRef::get(this).self_ref().bind(SafeRef::downgrade(this));
    }
}
