//! A cloneable, thread-safe handle to a [`Bootstrap`].
//!
//! The engine itself is single-threaded: every operation takes `&mut self`.
//! Hosts that need to reach it from several threads wrap it in a
//! [`SharedBootstrap`], which serializes access through a mutex.
//!
//! Resource initializers receive `&mut Bootstrap` directly and must not go
//! through the handle, as the lock is already held while they run.

use crate::bootstrap::{Bootstrap, RunTarget};
use crate::error::Result;
use crate::resource::ResourceValue;
use core::any::Any;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared ownership of a [`Bootstrap`].
#[derive(Debug, Clone)]
pub struct SharedBootstrap {
    inner: Arc<Mutex<Bootstrap>>,
}

impl From<Bootstrap> for SharedBootstrap {
    fn from(bootstrap: Bootstrap) -> Self {
        Self::new(bootstrap)
    }
}

impl SharedBootstrap {
    /// Wraps `bootstrap`.
    #[must_use]
    pub fn new(bootstrap: Bootstrap) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bootstrap)),
        }
    }

    /// Runs `target` while holding the lock.
    ///
    /// # Errors
    ///
    /// Same as [`Bootstrap::run`].
    pub fn run(&self, target: impl Into<RunTarget>) -> Result<()> {
        self.inner.lock().run(target)?;
        Ok(())
    }

    /// Returns true if a value is stored under `name`.
    #[must_use]
    pub fn has_resource(&self, name: &str) -> bool {
        self.inner.lock().has_resource(name)
    }

    /// Returns the value stored under `name`.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<ResourceValue> {
        self.inner.lock().resource(name)
    }

    /// Returns the value stored under `name` if it is a `T`.
    #[must_use]
    pub fn resource_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.inner.lock().resource_as::<T>(name)
    }

    /// Calls `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut Bootstrap) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::Application;
    use crate::options::OptionTree;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn concurrent_runs_execute_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let app = Application::new("testing", OptionTree::new()).unwrap();
        let bootstrap = Bootstrap::builder()
            .class_resource("db", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some(ResourceValue::new(String::from("connected"))))
            })
            .build(&app)
            .unwrap();
        let shared = SharedBootstrap::from(bootstrap);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.run("db"))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(shared.has_resource("DB"));
        assert_eq!(
            shared.resource_as::<String>("db").as_deref().map(String::as_str),
            Some("connected")
        );
        assert!(shared.with(|b| b.is_run("db")));
    }
}
