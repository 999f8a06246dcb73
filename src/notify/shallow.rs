//! One-level structural equality used to decide whether a selection changed.
//!
//! `IdentityEq` is the per-element comparison: plain values compare by value,
//! shared pointers by address. `ShallowEq` compares a selected value one level
//! deep, using `IdentityEq` for its elements.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

/// Identity-style equality for a single value.
pub trait IdentityEq {
    fn identity_eq(&self, other: &Self) -> bool;
}

/// One-level structural equality.
///
/// Implement it for your own selection types with [`impl_shallow_eq!`](crate::impl_shallow_eq).
pub trait ShallowEq {
    fn shallow_eq(&self, other: &Self) -> bool;
}

macro_rules! by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IdentityEq for $ty {
                fn identity_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }

            impl ShallowEq for $ty {
                fn shallow_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

by_value!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, str,
);

impl<T: ?Sized> IdentityEq for Arc<T> {
    fn identity_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> IdentityEq for Rc<T> {
    fn identity_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: IdentityEq> IdentityEq for Option<T> {
    fn identity_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.identity_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: IdentityEq + ?Sized> IdentityEq for &T {
    fn identity_eq(&self, other: &Self) -> bool {
        (**self).identity_eq(*other)
    }
}

impl<T: ShallowEq + ?Sized> ShallowEq for Arc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other) || (**self).shallow_eq(other)
    }
}

impl<T: ShallowEq + ?Sized> ShallowEq for Rc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other) || (**self).shallow_eq(other)
    }
}

impl<T: ShallowEq> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.shallow_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: IdentityEq> ShallowEq for [T] {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.identity_eq(b))
    }
}

impl<T: IdentityEq> ShallowEq for Vec<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.as_slice().shallow_eq(other.as_slice())
    }
}

impl<K: Eq + Hash, V: IdentityEq> ShallowEq for HashMap<K, V> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, a)| other.get(key).is_some_and(|b| a.identity_eq(b)))
    }
}

impl<K: Ord, V: IdentityEq> ShallowEq for BTreeMap<K, V> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other)
                .all(|((ka, a), (kb, b))| ka == kb && a.identity_eq(b))
    }
}

impl<A: IdentityEq, B: IdentityEq> ShallowEq for (A, B) {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.0.identity_eq(&other.0) && self.1.identity_eq(&other.1)
    }
}

impl<A: IdentityEq, B: IdentityEq, C: IdentityEq> ShallowEq for (A, B, C) {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.0.identity_eq(&other.0) && self.1.identity_eq(&other.1) && self.2.identity_eq(&other.2)
    }
}

/// Implement [`ShallowEq`] for a struct by comparing the listed fields with
/// [`IdentityEq`].
///
/// # Example
///
/// ```
/// use rewind::impl_shallow_eq;
/// use rewind::notify::ShallowEq;
/// use std::sync::Arc;
///
/// struct Header {
///     title: String,
///     tags: Arc<Vec<String>>,
/// }
///
/// impl_shallow_eq!(Header { title, tags });
///
/// let tags = Arc::new(vec!["rust".to_string()]);
/// let a = Header { title: "Docs".into(), tags: Arc::clone(&tags) };
/// let b = Header { title: "Docs".into(), tags: Arc::clone(&tags) };
/// let c = Header { title: "Docs".into(), tags: Arc::new(vec!["rust".to_string()]) };
///
/// assert!(a.shallow_eq(&b));
/// assert!(!a.shallow_eq(&c)); // same contents, different allocation
/// ```
#[macro_export]
macro_rules! impl_shallow_eq {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::notify::ShallowEq for $ty {
            fn shallow_eq(&self, other: &Self) -> bool {
                true $(&& $crate::notify::IdentityEq::identity_eq(&self.$field, &other.$field))*
            }
        }
    };
}
