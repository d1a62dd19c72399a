//! Access-control engine for pivgate
//!
//! Implements the decision plane over the core data model:
//! - Certificate chain validation against configured trust anchors
//! - CAC/PIV credential verification producing authenticated identities
//! - Session token issuance and validation with fixed expiry
//! - Per-agency workflow authorization with fail-closed semantics
//! - Advisory authentication risk assessment
//!
//! Every operation returns a typed outcome; a failed validation or a denial
//! is a normal result, never a panic, and internal faults are converted to
//! each component's catch-all failure at its boundary.

pub mod chain;
pub mod credential;
pub mod policy;
pub mod risk;
pub mod session;

pub use chain::*;
pub use credential::*;
pub use policy::*;
pub use risk::*;
pub use session::*;
