use std::collections::HashMap;
use std::sync::Arc;

use crate::QuillService;

/// Maps service names to service instances.
pub struct ServiceRegistry<R, P = ()> {
    services: HashMap<String, Arc<dyn QuillService<R, P>>>,
}

impl<R, P> ServiceRegistry<R, P> {
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Register a service, replacing any previous one with the same name.
    pub fn register<S>(&mut self, name: S, service: Arc<dyn QuillService<R, P>>)
    where
        S: Into<String>,
    {
        self.services.insert(name.into(), service);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn QuillService<R, P>>> {
        self.services.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(|k| k.as_str())
    }
}

impl<R, P> Default for ServiceRegistry<R, P> {
    fn default() -> Self {
        Self::new()
    }
}
