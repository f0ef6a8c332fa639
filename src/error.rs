//! Configuration errors.
//!
//! Everything that can fail here is a malformed configuration. Redundant
//! operations (registering a child twice, unregistering an unknown child)
//! are tolerated and never produce an error.

use thiserror::Error;

/// Result type alias for reflector operations that can fail.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Invalid reflector configuration.
///
/// Raised before any record is instrumented, so a failed call leaves every
/// record exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("expected a parent record but got nothing")]
    MissingParent,

    #[error("invalid type for parent: expected object but got null")]
    NullParent,

    #[error("invalid type for parent: expected object but got {found}")]
    InvalidParent { found: &'static str },

    #[error("invalid type for property names: expected array but got {found}")]
    InvalidProperties { found: &'static str },

    #[error("invalid property name: expected string but got {found}")]
    InvalidPropertyName { found: &'static str },

    #[error("property `{key}` on the parent is not configurable")]
    NotConfigurable { key: String },
}
