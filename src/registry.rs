use std::collections::HashMap;

use parking_lot::RwLock;

use super::breaker::CircuitBreaker;
use super::config::Config;

/// Breakers shared by name.
///
/// Every breaker is built from the same template configuration, with the name replaced
/// by the key it was requested under. Meant to be created once at startup and passed to
/// whatever needs breakers, rather than being global.
#[derive(Debug)]
pub struct Registry {
    template: Config,
    breakers: RwLock<HashMap<String, CircuitBreaker>>,
}

impl Registry {
    /// Creates an empty registry building breakers from `template`.
    pub fn new(template: Config) -> Self {
        Self {
            template,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the breaker registered under `name`.
    pub fn get(&self, name: &str) -> Option<CircuitBreaker> {
        self.breakers.read().get(name).cloned()
    }

    /// Returns the breaker registered under `name`, creating it on first use.
    pub fn get_or_create(&self, name: &str) -> CircuitBreaker {
        if let Some(breaker) = self.get(name) {
            return breaker;
        }

        self.breakers
            .write()
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(breaker = name, "creating circuit breaker");
                self.template.clone().name(name).build()
            })
            .clone()
    }

    /// Returns the names of all registered breakers.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.breakers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered breakers.
    pub fn len(&self) -> usize {
        self.breakers.read().len()
    }

    /// Returns `true` if no breaker was created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new(Config::default())
    }
}
