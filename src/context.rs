//! Read-once store for the server-embedded screen context.
//!
//! The server renders the context exactly once per page view; every screen
//! handler constructed during that view must observe the same snapshot. The
//! store caches the first successful read and hands out shared references
//! from then on. `reset` exists for tests and is documented as such.

use std::sync::{Arc, OnceLock, RwLock};

use serde_json::Value;

use crate::error::ContextError;
use crate::models::RawContext;

/// Source for the initial context read, the stand-in for the well-known
/// page global the server writes before any screen script runs. Embedders
/// that receive the context out-of-band can skip this and call
/// [`ContextStore::install`] directly.
pub trait ContextProvider: Send + Sync {
    fn load(&self) -> Option<Value>;
}

impl<F> ContextProvider for F
where
    F: Fn() -> Option<Value> + Send + Sync,
{
    fn load(&self) -> Option<Value> {
        self()
    }
}

/// Page-lifetime cache of the raw context.
///
/// Absence is not an error at read time; it only becomes fatal when a
/// concrete screen handler is opened against an empty store.
pub struct ContextStore {
    cached: RwLock<Option<Arc<RawContext>>>,
    provider: RwLock<Option<Box<dyn ContextProvider>>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self {
            cached: RwLock::new(None),
            provider: RwLock::new(None),
        }
    }

    /// The process-wide store. Prefer passing an explicit store where
    /// practical; this exists because most embedders have exactly one page
    /// context per process.
    pub fn global() -> &'static ContextStore {
        static GLOBAL: OnceLock<ContextStore> = OnceLock::new();
        GLOBAL.get_or_init(ContextStore::new)
    }

    /// Registers the lazy source consulted on the first `get`.
    pub fn set_provider(&self, provider: impl ContextProvider + 'static) {
        *self.provider.write().unwrap() = Some(Box::new(provider));
    }

    /// Installs a context value directly, replacing any cached one.
    pub fn install(&self, value: Value) -> Result<(), ContextError> {
        let raw: RawContext = serde_json::from_value(value)?;
        *self.cached.write().unwrap() = Some(Arc::new(raw));
        Ok(())
    }

    /// Parses and installs a JSON document.
    pub fn install_json(&self, json: &str) -> Result<(), ContextError> {
        let raw: RawContext = serde_json::from_str(json)?;
        *self.cached.write().unwrap() = Some(Arc::new(raw));
        Ok(())
    }

    /// Returns the cached context, consulting the provider on first use.
    /// Subsequent calls never re-read the provider.
    pub fn get(&self) -> Option<Arc<RawContext>> {
        if let Some(ctx) = self.cached.read().unwrap().clone() {
            return Some(ctx);
        }

        let loaded = self
            .provider
            .read()
            .unwrap()
            .as_ref()
            .and_then(|p| p.load())?;
        let raw: RawContext = match serde_json::from_value(loaded) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("discarding malformed context from provider: {err}");
                return None;
            }
        };

        let mut cached = self.cached.write().unwrap();
        // Another thread may have won the race; keep the first snapshot.
        if cached.is_none() {
            *cached = Some(Arc::new(raw));
        }
        cached.clone()
    }

    /// Returns the named top-level slice of the raw tree, or `None`.
    /// Never fails for an unknown key once a root context exists.
    pub fn get_slice(&self, key: &str) -> Option<Value> {
        self.get().and_then(|ctx| ctx.slice(key))
    }

    /// Clears the cached context and provider. Test hook; production pages
    /// never re-render a context within one lifetime.
    pub fn reset(&self) {
        *self.cached.write().unwrap() = None;
        *self.provider.write().unwrap() = None;
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn provider_is_consulted_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let store = ContextStore::new();
        store.set_provider(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Some(json!({ "screen": { "name": "login" } }))
        });

        assert!(store.get().is_some());
        assert!(store.get().is_some());
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_store_yields_none_not_error() {
        let store = ContextStore::new();
        assert!(store.get().is_none());
        assert!(store.get_slice("screen").is_none());
    }

    #[test]
    fn get_slice_missing_key_is_none() {
        let store = ContextStore::new();
        store
            .install(json!({ "screen": { "name": "login" } }))
            .unwrap();
        assert!(store.get_slice("organization").is_none());
        assert_eq!(
            store.get_slice("screen").unwrap()["name"],
            json!("login")
        );
    }

    #[test]
    fn reset_clears_cache() {
        let store = ContextStore::new();
        store
            .install(json!({ "screen": { "name": "login" } }))
            .unwrap();
        assert!(store.get().is_some());
        store.reset();
        assert!(store.get().is_none());
    }
}
