//! Process-wide store slot.
//!
//! Holds at most one [`ConfigStore`]. The first [`get_or_load`] call loads
//! it; later calls return the same instance and ignore their options until
//! [`reset`] clears the slot.
//!
//! Reads are lock-free. Two threads racing through the first load may both
//! load and the last one installed wins, so applications load once at
//! startup before spawning workers.

use super::env::EnvSnapshot;
use super::loader::LoadOptions;
use super::store::ConfigStore;
use crate::error::ConfigResult;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tracing::debug;

static STORE: ArcSwapOption<ConfigStore> = ArcSwapOption::const_empty();

/// Return the live store, loading it from the process environment if the slot is empty.
pub fn get_or_load(options: LoadOptions) -> ConfigResult<Arc<ConfigStore>> {
    if let Some(store) = current() {
        return Ok(store);
    }
    load_into_slot(options, &EnvSnapshot::capture())
}

/// Like [`get_or_load`], reading variables from `env`.
pub fn get_or_load_with_env(options: LoadOptions, env: &EnvSnapshot) -> ConfigResult<Arc<ConfigStore>> {
    if let Some(store) = current() {
        return Ok(store);
    }
    load_into_slot(options, env)
}

/// The live store, if one has been loaded.
pub fn current() -> Option<Arc<ConfigStore>> {
    STORE.load_full()
}

/// Put `store` in the slot, replacing any live one.
pub fn install(store: ConfigStore) -> Arc<ConfigStore> {
    let store = Arc::new(store);
    STORE.store(Some(Arc::clone(&store)));
    store
}

/// Clear the slot so the next [`get_or_load`] performs a fresh load.
///
/// Returns the store that was live, if any. Holders of that `Arc` keep a
/// valid, unchanged store.
pub fn reset() -> Option<Arc<ConfigStore>> {
    let previous = STORE.swap(None);
    if previous.is_some() {
        debug!("Config store reset");
    }
    previous
}

fn load_into_slot(options: LoadOptions, env: &EnvSnapshot) -> ConfigResult<Arc<ConfigStore>> {
    let store = ConfigStore::load_with_env(options, env)?;
    Ok(install(store))
}
