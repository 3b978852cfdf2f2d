use super::isolation::{Isolation, Slice};
use crate::error::{Result, StoreError};
use std::any::{Any, TypeId};
use std::collections::HashMap;

type AnyBox = Box<dyn Any + Send + Sync>;

struct SliceEntry {
    name: &'static str,
    value: AnyBox,
}

/// Type-indexed table of the live slices, one per kind.
///
/// Values cross the registry boundary only as isolated copies: `register` and
/// `update` store a copy of what they are given, and every read hands back a
/// fresh copy of what is stored.
#[derive(Default)]
pub struct SliceRegistry {
    slices: HashMap<TypeId, SliceEntry>,
    // Isolation<T> per kind, resolved at registration
    strategies: HashMap<TypeId, AnyBox>,
}

impl SliceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slice under its kind.
    ///
    /// Fails with [`StoreError::DuplicateSlice`] if the kind is already present.
    pub fn register<T: Slice>(&mut self, slice: T) -> Result<()> {
        let kind = TypeId::of::<T>();
        if self.slices.contains_key(&kind) {
            return Err(StoreError::DuplicateSlice {
                kind: T::kind_name(),
            });
        }

        let isolation = T::isolation();
        let stored = isolation.copy(&slice)?;

        self.strategies.insert(kind, Box::new(isolation));
        self.slices.insert(
            kind,
            SliceEntry {
                name: T::kind_name(),
                value: Box::new(stored),
            },
        );
        Ok(())
    }

    /// Isolated copy of the current slice of kind `T`, or `None` if none was registered.
    pub fn get<T: Slice>(&self) -> Result<Option<T>> {
        match self.stored::<T>() {
            Some(current) => self.isolate(current).map(Some),
            None => Ok(None),
        }
    }

    /// Replace the slice of kind `T`, returning a copy of what was stored.
    ///
    /// Not an upsert: fails with [`StoreError::UnknownSlice`] if `T` was never
    /// registered. On any error the previous value is left in place.
    pub fn update<T: Slice>(&mut self, slice: T) -> Result<T> {
        let kind = TypeId::of::<T>();
        if !self.slices.contains_key(&kind) {
            return Err(StoreError::UnknownSlice {
                kind: T::kind_name(),
            });
        }

        let stored = self.isolate(&slice)?;
        let returned = self.isolate(&stored)?;
        if let Some(entry) = self.slices.get_mut(&kind) {
            entry.value = Box::new(stored);
        }
        Ok(returned)
    }

    /// Copy `value` with the strategy cached for its kind.
    ///
    /// Kinds that were never registered fall back to their declared strategy.
    pub fn isolate<T: Slice>(&self, value: &T) -> Result<T> {
        match self
            .strategies
            .get(&TypeId::of::<T>())
            .and_then(|strategy| strategy.downcast_ref::<Isolation<T>>())
        {
            Some(isolation) => isolation.copy(value),
            None => T::isolation().copy(value),
        }
    }

    /// Borrow the stored value without copying. Crate-internal only.
    pub(crate) fn stored<T: Slice>(&self) -> Option<&T> {
        self.slices
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_ref::<T>())
    }

    /// Whether a slice of kind `T` is registered.
    pub fn contains<T: Slice>(&self) -> bool {
        self.slices.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether no kind is registered.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Names of the registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.slices.values().map(|entry| entry.name).collect();
        names.sort_unstable();
        names
    }
}
