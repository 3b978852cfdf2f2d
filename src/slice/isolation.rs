use crate::error::{Result, StoreError};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// One named partition of application state.
///
/// A slice type picks how it is copied across the store boundary. Most
/// slices own all their data and can simply use [`Isolation::cloned`]; slices
/// holding shared handles (`Arc`, `Rc`-like types) should use
/// [`Isolation::serialized`] so every copy is reference-independent.
///
/// # Examples
///
/// ```
/// use slicestore::{impl_slice, Isolation, Slice};
///
/// #[derive(Clone, Debug, Default, PartialEq)]
/// struct Counter {
///     value: i32,
/// }
///
/// impl_slice!(Counter);
///
/// assert_eq!(Counter::kind_name(), "Counter");
/// ```
pub trait Slice: Send + Sync + 'static {
    /// Copy strategy for this kind. Resolved once when the kind is registered.
    fn isolation() -> Isolation<Self>
    where
        Self: Sized;

    /// Display name of this kind, used in errors, logs and transition events.
    fn kind_name() -> &'static str
    where
        Self: Sized,
    {
        short_type_name::<Self>()
    }
}

enum Copier<T> {
    Infallible(fn(&T) -> T),
    Fallible(fn(&T) -> serde_json::Result<T>),
}

/// Structural copy strategy for a slice kind.
pub struct Isolation<T> {
    copier: Copier<T>,
    strategy: Strategy,
}

/// Which copy strategy an [`Isolation`] uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Cloned,
    Serialized,
    Custom,
}

impl<T> Isolation<T> {
    /// Copy through the type's own `Clone`.
    pub fn cloned() -> Self
    where
        T: Clone,
    {
        Self {
            copier: Copier::Infallible(T::clone),
            strategy: Strategy::Cloned,
        }
    }

    /// Copy through a JSON round trip.
    pub fn serialized() -> Self
    where
        T: Serialize + DeserializeOwned,
    {
        Self {
            copier: Copier::Fallible(round_trip::<T>),
            strategy: Strategy::Serialized,
        }
    }

    /// Copy through a user supplied function.
    pub fn with(copy: fn(&T) -> T) -> Self {
        Self {
            copier: Copier::Infallible(copy),
            strategy: Strategy::Custom,
        }
    }

    /// Which kind of copy this strategy performs.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

impl<T: Slice> Isolation<T> {
    /// Produce a reference-independent copy of `source`.
    pub fn copy(&self, source: &T) -> Result<T> {
        match self.copier {
            Copier::Infallible(copy) => Ok(copy(source)),
            Copier::Fallible(copy) => copy(source).map_err(|source| StoreError::Isolation {
                kind: T::kind_name(),
                source,
            }),
        }
    }
}

impl<T> Clone for Isolation<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Isolation<T> {}

impl<T> Clone for Copier<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Copier<T> {}

impl<T> fmt::Debug for Isolation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Isolation")
            .field("strategy", &self.strategy)
            .finish()
    }
}

fn round_trip<T: Serialize + DeserializeOwned>(source: &T) -> serde_json::Result<T> {
    let encoded = serde_json::to_vec(source)?;
    serde_json::from_slice(&encoded)
}

/// Type name without its module path: `app::state::Counter` becomes `Counter`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let head_len = full.find('<').unwrap_or(full.len());
    match full[..head_len].rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

/// Implement [`Slice`] for a type.
///
/// `impl_slice!(Counter)` copies with `Clone`, `impl_slice!(Profile => serialized)`
/// copies with a JSON round trip.
#[macro_export]
macro_rules! impl_slice {
    ($ty:ty => cloned) => {
        impl $crate::Slice for $ty {
            fn isolation() -> $crate::Isolation<Self> {
                $crate::Isolation::cloned()
            }
        }
    };
    ($ty:ty => serialized) => {
        impl $crate::Slice for $ty {
            fn isolation() -> $crate::Isolation<Self> {
                $crate::Isolation::serialized()
            }
        }
    };
    ($ty:ty) => {
        $crate::impl_slice!($ty => cloned);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    struct Plain {
        items: Vec<String>,
    }

    crate::impl_slice!(Plain);

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Shared {
        tags: Arc<Mutex<Vec<u32>>>,
    }

    crate::impl_slice!(Shared => serialized);

    #[test]
    fn cloned_copy_is_structurally_equal() {
        let source = Plain {
            items: vec!["a".into(), "b".into()],
        };
        let copy = Plain::isolation().copy(&source).unwrap();

        assert_eq!(copy, source);
        assert_ne!(copy.items.as_ptr(), source.items.as_ptr());
    }

    #[test]
    fn serialized_copy_detaches_shared_interior() {
        let source = Shared {
            tags: Arc::new(Mutex::new(vec![1, 2])),
        };
        let copy = Shared::isolation().copy(&source).unwrap();

        copy.tags.lock().unwrap().push(3);

        assert_eq!(*source.tags.lock().unwrap(), vec![1, 2]);
        assert!(!Arc::ptr_eq(&source.tags, &copy.tags));
    }

    #[test]
    fn custom_copy_is_used() {
        let isolation = Isolation::<Plain>::with(|p| Plain {
            items: p.items.iter().rev().cloned().collect(),
        });
        let source = Plain {
            items: vec!["x".into(), "y".into()],
        };

        assert_eq!(isolation.strategy(), Strategy::Custom);
        assert_eq!(isolation.copy(&source).unwrap().items, vec!["y", "x"]);
    }

    #[test]
    fn short_names_drop_module_path() {
        assert_eq!(short_type_name::<Plain>(), "Plain");
        assert_eq!(short_type_name::<u32>(), "u32");
    }
}
