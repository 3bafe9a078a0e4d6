//! Tests for the process-wide store slot.
//!
//! The slot is global to the test binary, so every scenario runs inside a
//! single test function to keep them ordered.

use app_settings::config::{EnvSnapshot, LoadOptions, registry};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

#[test]
fn registry_lifecycle() {
    registry::reset();
    assert!(registry::current().is_none());

    // First call loads.
    let dev_env: EnvSnapshot = [("APP_ENV", "development")].into_iter().collect();
    let first =
        registry::get_or_load_with_env(LoadOptions::new().with_configs_path(data_dir()), &dev_env)
            .unwrap();
    assert_eq!(first.current_env(), "development");

    // Later calls return the same instance and ignore their options.
    let prod_env: EnvSnapshot = [("APP_ENV", "production")].into_iter().collect();
    let again =
        registry::get_or_load_with_env(LoadOptions::new().with_configs_path(data_dir()), &prod_env)
            .unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(again.current_env(), "development");
    assert!(Arc::ptr_eq(&first, &registry::current().unwrap()));

    // Reset clears the slot; the old handle stays usable.
    let cleared = registry::reset().unwrap();
    assert!(Arc::ptr_eq(&first, &cleared));
    assert!(registry::current().is_none());
    assert_eq!(first.get_str("redefine__val").unwrap(), Some("development.yml"));

    // A fresh load with identical inputs yields identical content.
    let reloaded =
        registry::get_or_load_with_env(LoadOptions::new().with_configs_path(data_dir()), &dev_env)
            .unwrap();
    assert!(!Arc::ptr_eq(&first, &reloaded));
    assert_eq!(first.root(), reloaded.root());

    // After another reset a different environment can be selected.
    registry::reset();
    let prod =
        registry::get_or_load_with_env(LoadOptions::new().with_configs_path(data_dir()), &prod_env)
            .unwrap();
    assert_eq!(prod.current_env(), "production");

    // A failed load leaves the slot empty.
    registry::reset();
    let missing = data_dir().join("missing");
    assert!(registry::get_or_load(LoadOptions::new().with_configs_path(missing)).is_err());
    assert!(registry::current().is_none());

    // Loading from the process environment.
    let store = registry::get_or_load(LoadOptions::new().with_configs_path(data_dir())).unwrap();
    let expected = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
    assert_eq!(store.current_env(), expected);

    // Installing replaces whatever is live.
    let installed = registry::install((*prod).clone());
    assert!(Arc::ptr_eq(&installed, &registry::current().unwrap()));
    assert_eq!(installed.current_env(), "production");

    registry::reset();
}
