//! # object-reflector
//!
//! Mirror named properties of one parent record onto any number of child
//! records.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals): the
//! authoritative value of every mirrored property is a signal, so effects and
//! deriveds can observe it no matter which record was written.
//!
//! ## Architecture
//!
//! Records are shared key/value handles whose slots hold either a plain value
//! or an accessor. A [`Reflector`] instruments the parent (and, with
//! reflect-back, each child) by installing accessors on the mirrored keys:
//!
//! ```text
//! parent.set(p, v) → shadow(p) = v → child.set(p, v) for every child
//! child.get(p)     → parent.get(p)      (reflect-back)
//! child.set(p, v)  → shadow(p) = v → plain children   (reflect-back)
//! ```
//!
//! Mirrored fields must be read and written through [`Record::get`] and
//! [`Record::set`]; that is where interception happens.
//!
//! Everything is single-threaded and synchronous. Records are `!Send`.
//!
//! ## Modules
//!
//! - [`types`] - [`Value`], the dynamically typed slot content
//! - [`record`] - [`Record`], slots, attributes and the [`Accessor`] trait
//! - [`reflector`] - [`Reflector`] and its configuration
//! - [`error`] - [`ConfigError`]

pub mod error;
pub mod record;
pub mod reflector;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{ConfigError, Result};

pub use record::{Accessor, Record, SlotFlags};

pub use reflector::{Reflector, ReflectorConfig, ReflectorId};
