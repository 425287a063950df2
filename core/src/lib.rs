//! Propstore - preference storage and system properties.
//!
//! This crate provides per-application key/value stores holding JSON
//! documents, a resolver for device-wide system properties, the whitelist
//! that decides which properties unprivileged callers may see, and the
//! request dispatcher that exposes all of it over a message bus.

/// JSON document validation and scalar wrapping.
pub mod codec;
/// Error taxonomy and fixed messages.
pub mod error;
/// Infrastructure components (config, telemetry, audit).
pub mod infrastructure;
/// System property resolution and enumeration.
pub mod properties;
/// Bus request dispatch.
pub mod service;
/// Per-application SQLite stores.
pub mod store;
/// Public property whitelist.
pub mod visibility;

pub use error::{ErrorKind, PrefsError, Result};
pub use properties::SystemProperties;
pub use service::PrefsService;
pub use store::{AppHandle, AppStore};
pub use visibility::Whitelist;
