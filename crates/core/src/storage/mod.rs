//! Storage engine abstraction.
//!
//! A storage engine owns the canonical collection of one entity kind, keyed by id. All reads
//! hand back owned copies, so callers can never mutate stored state behind the engine's back.
//! Missing ids are reported as `None`/`false`, never as errors.

pub mod in_memory;

pub use in_memory::InMemoryStorage;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// An entity that can live in a storage engine.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Partial update applied by [`StorageEngine::update`].
    type Patch;

    fn id(&self) -> &str;

    /// Shallow merge: fields present in `patch` win, everything else is retained.
    fn merge(&mut self, patch: Self::Patch);
}

/// Keyed CRUD plus predicate scans over one entity collection.
pub trait StorageEngine<T: Entity>: Send + Sync {
    /// Copies of every entity. Order is unspecified.
    fn get_all(&self) -> Vec<T>;

    fn get_by_id(&self, id: &str) -> Option<T>;

    /// Inserts `item`, replacing any entity with the same id.
    fn create(&self, item: T) -> T;

    /// Merges `patch` into the entity with `id`; `None` if no such entity exists.
    fn update(&self, id: &str, patch: T::Patch) -> Option<T>;

    /// Returns whether an entity was removed.
    fn delete(&self, id: &str) -> bool;

    fn query(&self, predicate: &dyn Fn(&T) -> bool) -> Vec<T>;

    /// Collection size when `predicate` is `None`, otherwise the number of matches.
    fn count(&self, predicate: Option<&dyn Fn(&T) -> bool>) -> usize;
}
