//! `MaybeDangling` as specified in <https://github.com/rust-lang/rfcs/pull/3336>,
//! polyfilled via `MaybeUninit`.
//!
//! The tree root is boxed, and materialized children keep raw pointers into
//! it. Wrapping the box keeps moves of the owning `SyntaxTree` from asserting
//! uniqueness over memory those pointers still refer to.

use std::mem::MaybeUninit;
use std::ops::Deref;

#[repr(transparent)]
pub(crate) struct MaybeDangling<T> {
    value: MaybeUninit<T>,
}

impl<T> MaybeDangling<T> {
    #[inline]
    pub(crate) const fn new(value: T) -> Self {
        Self { value: MaybeUninit::new(value) }
    }

    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.value.as_mut_ptr()
    }
}

impl<T> Deref for MaybeDangling<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        // SAFETY: `value` is initialized in `new` and only dropped in `drop`.
        unsafe { self.value.assume_init_ref() }
    }
}

impl<T> Drop for MaybeDangling<T> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: initialized in `new`; never read again after this.
        unsafe {
            self.value.as_mut_ptr().drop_in_place();
        }
    }
}
