//! CAC/PIV credential verification
//!
//! Unlike chain validation, this layer does not short-circuit: every failing
//! check is collected so the result reports all of them. On success the
//! verifier derives the identity and delegates token issuance to the session
//! manager.

use crate::chain::{validate_chain, ChainError, Purpose};
use crate::policy::AgencyDirectory;
use crate::session::{DeviceContext, SessionToken, SessionTokenManager};
use pivgate_core::{
    AccessLevel, AgencyId, ChainConfig, Credential, Identity, TrustAnchorSet, UserId,
};
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;

/// Typed credential verification failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("organizational unit could not be parsed: {0}")]
    MalformedOrganizationalUnit(String),

    #[error("organizational unit resolves to unregistered agency '{0}'")]
    UnknownAgency(AgencyId),

    #[error("unrecognized access level '{0}'")]
    UnrecognizedAccessLevel(String),

    #[error("claimed access level {claimed} exceeds certificate ceiling {ceiling}")]
    AccessLevelExceedsCeiling {
        claimed: AccessLevel,
        ceiling: AccessLevel,
    },

    /// Catch-all for internal faults; never silently treated as success
    #[error("authentication system error: {0}")]
    System(String),
}

/// Outcome of credential verification
#[derive(Debug, Clone)]
pub enum AuthenticationResult {
    Authenticated {
        identity: Identity,
        token: SessionToken,
    },
    Failed {
        errors: Vec<CredentialError>,
    },
}

impl AuthenticationResult {
    /// Whether authentication succeeded
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthenticationResult::Authenticated { .. })
    }

    /// The collected failures, empty on success
    pub fn errors(&self) -> &[CredentialError] {
        match self {
            AuthenticationResult::Authenticated { .. } => &[],
            AuthenticationResult::Failed { errors } => errors,
        }
    }
}

/// Verifies presented credentials against trust anchors and the agency
/// directory, issuing a session token on success
#[derive(Debug)]
pub struct CredentialVerifier {
    anchors: Arc<TrustAnchorSet>,
    chain_config: ChainConfig,
    directory: Arc<AgencyDirectory>,
    sessions: Arc<SessionTokenManager>,
}

impl CredentialVerifier {
    /// Create a verifier over shared trust anchors, agency directory, and
    /// session manager
    pub fn new(
        anchors: Arc<TrustAnchorSet>,
        chain_config: ChainConfig,
        directory: Arc<AgencyDirectory>,
        sessions: Arc<SessionTokenManager>,
    ) -> Self {
        CredentialVerifier {
            anchors,
            chain_config,
            directory,
            sessions,
        }
    }

    /// Verify a credential and issue a session token on success
    ///
    /// All checks run even after one fails; `errors` reports every failure.
    pub fn verify(
        &self,
        credential: &Credential,
        device: &DeviceContext,
        now: SystemTime,
    ) -> AuthenticationResult {
        let mut errors = Vec::new();

        if let Err(e) = validate_chain(
            &credential.chain,
            Purpose::Authentication,
            &self.anchors,
            &self.chain_config,
            now,
        ) {
            errors.push(CredentialError::Chain(e));
        }

        let agency_id = match AgencyId::from_organizational_unit(&credential.organizational_unit) {
            Ok(agency_id) => {
                if self.directory.contains(&agency_id) {
                    Some(agency_id)
                } else {
                    errors.push(CredentialError::UnknownAgency(agency_id));
                    None
                }
            }
            Err(e) => {
                errors.push(CredentialError::MalformedOrganizationalUnit(e.to_string()));
                None
            }
        };

        let access_level = match AccessLevel::parse(&credential.claimed_access_level) {
            Ok(level) => {
                let ceiling = credential.chain.first().and_then(|leaf| leaf.access_ceiling);
                match ceiling {
                    Some(ceiling) if level > ceiling => {
                        errors.push(CredentialError::AccessLevelExceedsCeiling {
                            claimed: level,
                            ceiling,
                        });
                        None
                    }
                    _ => Some(level),
                }
            }
            Err(_) => {
                errors.push(CredentialError::UnrecognizedAccessLevel(
                    credential.claimed_access_level.clone(),
                ));
                None
            }
        };

        if !errors.is_empty() {
            tracing::debug!(
                card = %credential.card_serial,
                failures = errors.len(),
                "credential verification failed"
            );
            return AuthenticationResult::Failed { errors };
        }

        // Both are Some here; anything else is an internal fault, reported
        // as a typed system error rather than a panic.
        let (Some(agency_id), Some(access_level)) = (agency_id, access_level) else {
            return AuthenticationResult::Failed {
                errors: vec![CredentialError::System(
                    "verification state incomplete without recorded failure".to_string(),
                )],
            };
        };

        let user_id = match UserId::new(credential.card_serial.as_str()) {
            Ok(user_id) => user_id,
            Err(e) => {
                return AuthenticationResult::Failed {
                    errors: vec![CredentialError::System(e.to_string())],
                };
            }
        };

        let identity = Identity::new(user_id, agency_id, access_level);
        let token = self.sessions.issue(&identity, device, now);

        tracing::debug!(
            user = %identity.user_id,
            agency = %identity.agency_id,
            "credential verified"
        );
        AuthenticationResult::Authenticated { identity, token }
    }
}
