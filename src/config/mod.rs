//! Layered settings.
//!
//! Merges configuration from three layers, later layers winning:
//! 1. **Base files** - `<configs_path>/*.yml`, sorted by file name
//! 2. **Environment files** - `<configs_path>/settings/<env>*.yml`, where
//!    `<env>` comes from the selector variable (`APP_ENV` by default,
//!    falling back to `development`)
//! 3. **Environment variables** - `SETTINGS__A__B=value` writes `a.b`
//!
//! ## Merge Strategy
//! - Files: top-level keys are overwritten wholesale; nested mappings from
//!   earlier files are not combined with later ones
//! - Variables: written leaf by leaf as strings, creating nested mappings
//!
//! ## Lookups
//! - `store.get("multilevel__level2__level22")` - compound key
//! - `store.section("multilevel")?.section("level2")` - nested views
//!
//! Missing keys either fail with [`LookupError::KeyNotFound`](crate::error::LookupError)
//! or yield `None`, depending on `raise_on_missing`.

mod env;
mod keypath;
mod loader;
mod merge;
pub mod registry;
mod store;

pub use env::{EnvOverride, EnvSnapshot, collect_overrides};
pub use keypath::KeyPath;
pub use loader::{
    ConfigSource, DEFAULT_CONFIG_DIR, DEFAULT_ENV_NAME, DEFAULT_ENV_VALUE, DEFAULT_PREFIX,
    DEFAULT_SPLITTER, ENV_SETTINGS_DIR, LoadOptions,
};
pub use merge::{Mapping, insert_at, merge_top_level};
pub use store::{ConfigStore, Section};
pub use serde_json::Value;
