// Copyright 2026 the saferef contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::any::type_name;
use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// The error returned by every [`SafeRef`] construction path that was handed
/// a null or absent pointer.
///
/// A [`SafeRef`] is never allowed to hold a null address, so a constructor
/// that would otherwise store one refuses to construct at all. The check runs
/// before any ownership is taken or any shared state is touched, so a failed
/// construction has no observable side effect.
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
/// ```
///
/// [`SafeRef`]: ./struct.SafeRef.html
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NullError;

impl Display for NullError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "cannot construct a SafeRef from a null pointer")
    }
}

impl Error for NullError {}

/// The error returned by [`SafeRef::downcast`] when the referent is not of
/// the requested type.
///
/// A raw dynamic pointer cast reports failure by returning null. A [`SafeRef`]
/// cannot do that, so a failed downcast is reported through this error
/// instead; no handle of any kind is produced.
///
/// [`SafeRef`]: ./struct.SafeRef.html
/// [`SafeRef::downcast`]: ./struct.SafeRef.html#method.downcast
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastError {
    expected: &'static str,
}

impl CastError {
    pub(crate) fn new<T: ?Sized>() -> CastError {
        CastError {
            expected: type_name::<T>(),
        }
    }

    /// The name of the type the failed cast requested.
    pub fn expected(&self) -> &'static str {
        self.expected
    }
}

impl Display for CastError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            "cannot downcast to `{}`: the referent is of a different type",
            self.expected
        )
    }
}

impl Error for CastError {}

/// The error returned by [`SafeFromSelf::safe_from_self`] when no owning
/// [`SafeRef`] to the value exists.
///
/// Handing out a handle to `self` requires that `self` already lives in
/// shared storage: either the back-reference was never bound (the value was
/// not constructed through [`SafeRef::new_bound`] and never passed to
/// [`SafeRef::bind_self`]), or every owning handle has been released and the
/// value is being torn down.
///
/// [`SafeRef`]: ./struct.SafeRef.html
/// [`SafeRef::new_bound`]: ./struct.SafeRef.html#method.new_bound
/// [`SafeRef::bind_self`]: ./struct.SafeRef.html#method.bind_self
/// [`SafeFromSelf::safe_from_self`]: ./trait.SafeFromSelf.html#method.safe_from_self
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoOwnerError;

impl Display for NoOwnerError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "no owning SafeRef to this value exists")
    }
}

impl Error for NoOwnerError {}
