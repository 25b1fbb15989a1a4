//! Change detection for store values.

use std::rc::Rc;

/// "Would a subscriber see a difference?"
///
/// Shared containers (`Rc`) compare by identity: the structural-sharing
/// discipline guarantees a new `Rc` whenever content changes and the old one
/// otherwise. Plain values compare by equality.
pub trait Same {
    fn same(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Same for Rc<T> {
    fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: Same> Same for Option<T> {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: PartialEq> Same for Vec<T> {
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

impl<A: Same, B: Same> Same for (A, B) {
    fn same(&self, other: &Self) -> bool {
        self.0.same(&other.0) && self.1.same(&other.1)
    }
}

macro_rules! same_by_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Same for $ty {
                fn same(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

same_by_eq!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    usize,
    i8,
    i16,
    i32,
    i64,
    isize,
    String,
    &'static str,
);
