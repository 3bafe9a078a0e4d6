//! Layered YAML application settings.
//!
//! Base files, per-environment override files and prefixed environment
//! variables merged into one read-only tree with key-path lookups.
//!
//! ```no_run
//! use app_settings::config::{LoadOptions, registry};
//!
//! let settings = registry::get_or_load(LoadOptions::default())?;
//! let port = settings.get("server__port")?;
//! println!("{} port = {:?}", settings.current_env(), port);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ConfigStore, KeyPath, LoadOptions, Section};
pub use error::{ConfigError, LookupError};
