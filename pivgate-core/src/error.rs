//! Error types for the pivgate core data model

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid agency identifier: {0}")]
    InvalidAgencyId(String),

    #[error("Invalid organizational unit: {0}")]
    InvalidOrganizationalUnit(String),

    #[error("Unrecognized access level: {0}")]
    UnrecognizedAccessLevel(String),

    #[error("Invalid workflow category: {0}")]
    InvalidWorkflowType(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
