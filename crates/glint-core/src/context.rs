//! Shared suite context.
//!
//! One mutable [`Context`] is threaded by reference through a suite's
//! `before_all` -> `before_each`/test/`after_each` -> `after_all` chain.
//! Execution is sequential, so the mutex is only there to make the shared
//! handle Send across await points.

use glint_proto::Driver;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handle threaded through hooks and test bodies of one suite.
pub type SharedContext = Arc<Mutex<Context>>;

/// Mutable state shared across a suite's tests and hooks.
#[derive(Default)]
pub struct Context {
    values: Map<String, Value>,
    driver: Option<Arc<dyn Driver>>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context carrying a driver handle.
    pub fn with_driver(driver: Arc<dyn Driver>) -> Self {
        Self {
            values: Map::new(),
            driver: Some(driver),
        }
    }

    /// Stores a value under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Removes a value by key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Returns the capturable driver surface, if one was attached.
    pub fn driver(&self) -> Option<Arc<dyn Driver>> {
        self.driver.clone()
    }

    /// Attaches a driver handle.
    pub fn set_driver(&mut self, driver: Arc<dyn Driver>) {
        self.driver = Some(driver);
    }

    /// Wraps this context in the shared handle used by the runner.
    pub fn into_shared(self) -> SharedContext {
        Arc::new(Mutex::new(self))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.values)
            .field("has_driver", &self.driver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_remove() {
        let mut ctx = Context::new();
        ctx.set("token", json!("abc"));
        assert_eq!(ctx.get("token"), Some(&json!("abc")));
        assert_eq!(ctx.remove("token"), Some(json!("abc")));
        assert!(ctx.get("token").is_none());
    }

    #[test]
    fn test_empty_context_has_no_driver() {
        let ctx = Context::new();
        assert!(ctx.driver().is_none());
    }
}
