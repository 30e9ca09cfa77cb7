//! Resource name to store mapping

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use super::Store;
use crate::resource::Resource;

type ErasedStore = Box<dyn Any + Send + Sync>;

/// Typed stores keyed by resource name
///
/// Each entry holds an `Arc<dyn Store<R>>` for the resource registered under
/// `R::NAME`. Registering the same resource again replaces its store.
#[derive(Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<&'static str, ErasedStore>>,
}

impl StoreRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the store for a resource
    pub fn register<R: Resource>(&self, store: Arc<dyn Store<R>>) {
        tracing::debug!(resource = R::NAME, "registering store");
        self.stores.write().insert(R::NAME, Box::new(store));
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with<R: Resource>(self, store: Arc<dyn Store<R>>) -> Self {
        self.register::<R>(store);
        self
    }

    /// Store for a resource, if registered
    #[must_use]
    pub fn store<R: Resource>(&self) -> Option<Arc<dyn Store<R>>> {
        self.stores
            .read()
            .get(R::NAME)
            .and_then(|erased| erased.downcast_ref::<Arc<dyn Store<R>>>())
            .cloned()
    }

    /// Registered resource names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.stores.read().keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("resources", &self.names())
            .finish()
    }
}
