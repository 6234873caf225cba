// Copyright 2026 the saferef contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! This crate provides [`SafeRef`], a reference-counted ownership handle
//! with one extra invariant on top of [`Arc`]: **it is never null**. Code
//! that receives a `SafeRef<T>` can dereference it without checking, for the
//! handle's entire lifetime.
//!
//! Three pieces make that practical:
//!
//! - [`SafeRef`] itself — shared ownership delegated to [`Arc`], with every
//!   nullable input (absent pointers, raw pointers, alias pointers)
//!   validated at the construction boundary and rejected with [`NullError`].
//!   Failure paths that a raw pointer would express as null — a missed
//!   dynamic cast, say — are expressed as errors instead ([`CastError`]).
//! - [`make_safe`] and the [`MakeSafe`] trait — a construction factory that
//!   dispatches, at compile time, to a type's chosen construction entry
//!   point. A type can keep its constructors private and route everything
//!   through the factory, guaranteeing that every instance lives in shared
//!   storage.
//! - [`SafeFromSelf`] and [`SelfRef`] — an explicit, opt-in capability for a
//!   value to hand out owning handles to itself from `&self` methods, the
//!   usual companion to a factory-only type.
//!
//! # Escape hatches
//!
//! Interop with guarantee-unaware code sometimes needs a value that *can* be
//! empty. [`SafeRef::downgrade`], [`SafeRef::to_arc`] and
//! [`SafeRef::into_owner`] provide that, and they are the only ways out:
//! **the non-null guarantee does not follow through them**. Whatever comes
//! back from the outside must pass through a validating constructor (or
//! [`Weak::upgrade`]) to get back under the guarantee.
//!
//! # Examples
//!
//! ```rust
//! use saferef::{make_safe, MakeSafe, SafeRef};
//!
//! struct Channel {
//!     index: u32,
//! }
//!
//! impl MakeSafe<(u32,)> for Channel {
//!     fn make_safe((index,): (u32,)) -> SafeRef<Channel> {
//!         SafeRef::new(Channel { index })
//!     }
//! }
//!
//! let channel = make_safe::<Channel, _>((2,));
//! let same_channel = SafeRef::clone(&channel);
//!
//! // No null checks, ever.
//! assert_eq!(same_channel.index, 2);
//! assert!(SafeRef::ptr_eq(&channel, &same_channel));
//! ```
//!
//! [`SafeRef`]: ./struct.SafeRef.html
//! [`SafeRef::downgrade`]: ./struct.SafeRef.html#method.downgrade
//! [`SafeRef::to_arc`]: ./struct.SafeRef.html#method.to_arc
//! [`SafeRef::into_owner`]: ./struct.SafeRef.html#method.into_owner
//! [`Weak::upgrade`]: ./struct.Weak.html#method.upgrade
//! [`make_safe`]: ./fn.make_safe.html
//! [`MakeSafe`]: ./trait.MakeSafe.html
//! [`SafeFromSelf`]: ./trait.SafeFromSelf.html
//! [`SelfRef`]: ./struct.SelfRef.html
//! [`NullError`]: ./struct.NullError.html
//! [`CastError`]: ./struct.CastError.html
//!
//! [`Arc`]: https://doc.rust-lang.org/std/sync/struct.Arc.html

mod error;
mod make_safe;
mod safe_ref;
mod self_ref;
mod weak;

pub use crate::error::{CastError, NoOwnerError, NullError};
pub use crate::make_safe::{make_safe, MakeSafe};
pub use crate::safe_ref::SafeRef;
pub use crate::self_ref::{SafeFromSelf, SelfRef};
pub use crate::weak::Weak;
