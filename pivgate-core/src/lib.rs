//! Core data model and leaf cryptography for pivgate
//!
//! Defines the identity and credential types shared by the access-control
//! engine: access levels, agency identifiers, Ed25519 key material,
//! certificates with a canonical signing encoding, and trust anchors.

pub mod cert;
pub mod config;
pub mod error;
pub mod keys;
pub mod types;

pub use cert::*;
pub use config::*;
pub use error::*;
pub use keys::*;
pub use types::*;

/// Result type alias for pivgate core operations
pub type Result<T> = std::result::Result<T, CoreError>;
