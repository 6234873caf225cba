// Copyright 2026 the saferef contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::safe_ref::SafeRef;

/// A type's chosen construction entry point for the [`make_safe`] factory.
///
/// The factory dispatches on the implementing type: if `T` implements
/// `MakeSafe<Args>` for the given argument tuple, [`make_safe`] forwards the
/// arguments to that implementation; otherwise the blanket default strategy
/// applies, which accepts a single already-constructed `T` and moves it into
/// shared storage (equivalent to [`SafeRef::new`]).
///
/// The trait's signature is the contract: an implementation *must* come back
/// with a `SafeRef<Self>` — an owning, non-null handle to the very type being
/// constructed — and the compiler rejects anything else. This lets a type
/// funnel all construction through the factory (for instance to guarantee
/// every instance lives in shared storage, a prerequisite for
/// [`SafeFromSelf`]) by keeping its constructors private and implementing
/// `MakeSafe` inside the module.
///
/// Arities are expressed as tuples: implement `MakeSafe<()>` for a
/// zero-argument entry point, `MakeSafe<(A,)>` for one argument,
/// `MakeSafe<(A, B)>` for two, and so on.
///
/// # Examples
///
/// ```rust
/// use saferef::{make_safe, MakeSafe, SafeRef};
///
/// struct Celsius(f64);
///
/// impl MakeSafe<()> for Celsius {
///     fn make_safe(_: ()) -> SafeRef<Celsius> {
///         SafeRef::new(Celsius(0.0))
///     }
/// }
///
/// impl MakeSafe<(f64,)> for Celsius {
///     fn make_safe((degrees,): (f64,)) -> SafeRef<Celsius> {
///         SafeRef::new(Celsius(degrees))
///     }
/// }
///
/// let freezing = make_safe::<Celsius, _>(());
/// let boiling = make_safe::<Celsius, _>((100.0,));
///
/// assert_eq!(freezing.0, 0.0);
/// assert_eq!(boiling.0, 100.0);
/// ```
///
/// [`make_safe`]: ./fn.make_safe.html
/// [`SafeRef`]: ./struct.SafeRef.html
/// [`SafeRef::new`]: ./struct.SafeRef.html#method.new
/// [`SafeFromSelf`]: ./trait.SafeFromSelf.html
pub trait MakeSafe<Args = ()>: Sized {
    /// Constructs a `Self` from `args` and places it in shared storage.
    fn make_safe(args: Args) -> SafeRef<Self>;
}

/// The default construction strategy: any value whose type has not claimed a
/// construction entry point for these arguments can be moved into shared
/// storage directly.
impl<T> MakeSafe<T> for T
where
    T: Send + Sync + 'static,
{
    fn make_safe(value: T) -> SafeRef<T> {
        SafeRef::new(value)
    }
}

/// Constructs a [`SafeRef<T>`] through `T`'s chosen construction entry point.
///
/// Dispatch is by argument type, resolved at compile time: a `MakeSafe<Args>`
/// implementation on `T` claims that argument tuple, and the blanket default
/// strategy handles a plain pre-constructed value. Either way the result is
/// an owning, non-null handle.
///
/// # Examples
///
/// Default strategy — forward a finished value:
///
/// ```rust
/// use saferef::{make_safe, SafeRef};
///
/// let five: SafeRef<i32> = make_safe(5);
/// assert_eq!(*five, 5);
/// assert!(SafeRef::is_unique(&five));
/// ```
///
/// [`SafeRef<T>`]: ./struct.SafeRef.html
pub fn make_safe<T, Args>(args: Args) -> SafeRef<T>
where
    T: MakeSafe<Args>,
{
    T::make_safe(args)
}
