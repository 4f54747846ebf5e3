//! Root-registered named handles, looked up by descendants during build.
//!
//! Kept as an explicit value owned by the [`crate::world::World`] and
//! threaded to every model through [`crate::loader::ComponentConf`], never as
//! process-global mutable state.

use fxhash::FxHashMap;
use std::any::Any;
use std::sync::Arc;

#[derive(Default)]
pub struct Services {
    entries: FxHashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Arc<dyn Any + Send + Sync>) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.entries.get(name)
    }

    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name).and_then(|v| v.clone().downcast::<T>().ok())
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_as_downcasts() {
        let mut services = Services::new();
        services.insert("answer", Arc::new(42u32));
        assert_eq!(*services.get_as::<u32>("answer").unwrap(), 42);
        assert!(services.get_as::<String>("answer").is_none());
    }
}
