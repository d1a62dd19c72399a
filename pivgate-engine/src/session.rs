//! Session token issuance and validation
//!
//! Tokens are opaque 256-bit identifiers from the OS CSPRNG with a fixed
//! validity window. Validation is a pure read against an injected clock;
//! expired tokens are logically deleted, so an unknown identifier and an
//! expired one are indistinguishable to callers.

use pivgate_core::{AccessLevel, AgencyId, Identity, SessionConfig, UserId};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Opaque session token identifier: 32 CSPRNG bytes, hex-rendered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(String);

impl TokenId {
    /// Length of the rendered identifier in characters
    pub const LEN: usize = 64;

    /// Generate a fresh identifier from the OS random source
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        TokenId(hex::encode(bytes))
    }

    /// Constant-time equality for comparing a presented identifier against
    /// an expected one outside the store, e.g. in a host's transport layer
    pub fn ct_eq(&self, other: &TokenId) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-side context captured at authentication time
///
/// Used for the device fingerprint and anomaly comparison only, never for
/// identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceContext {
    pub user_agent: String,
    pub screen_resolution: String,
    pub timezone: String,
    pub installed_fonts: Vec<String>,
    pub origin_ip: Option<IpAddr>,
}

impl DeviceContext {
    /// One-way fingerprint over the canonical device attributes
    ///
    /// Fields are joined newline-delimited with fonts sorted, so attribute
    /// order at the caller never changes the hash.
    pub fn fingerprint(&self) -> DeviceFingerprint {
        let mut fonts = self.installed_fonts.clone();
        fonts.sort();

        let mut canonical = String::new();
        canonical.push_str(&self.user_agent);
        canonical.push('\n');
        canonical.push_str(&self.screen_resolution);
        canonical.push('\n');
        canonical.push_str(&self.timezone);
        canonical.push('\n');
        canonical.push_str(&fonts.join(","));

        DeviceFingerprint(blake3::hash(canonical.as_bytes()).into())
    }
}

/// BLAKE3 hash of the canonical device attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceFingerprint([u8; 32]);

impl DeviceFingerprint {
    /// Fingerprint bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex rendering for logs and persistence
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Metadata attached to a session at issuance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub origin_ip: Option<IpAddr>,
    pub device_fingerprint: DeviceFingerprint,
}

/// A time-bounded session bound to a user, agency, and access level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub id: TokenId,
    pub user_id: UserId,
    pub agency_id: AgencyId,
    pub access_level: AccessLevel,
    pub issued_at: SystemTime,
    pub expires_at: SystemTime,
    pub metadata: SessionMetadata,
}

impl SessionToken {
    /// Whether the token is expired at `now`
    pub fn expired_at(&self, now: SystemTime) -> bool {
        now > self.expires_at
    }
}

/// Typed token failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("session token has expired")]
    Expired,
}

/// Outcome of a token validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidation {
    Valid { remaining: Duration },
    Invalid(TokenError),
}

impl TokenValidation {
    /// Whether the token was accepted
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenValidation::Valid { .. })
    }
}

/// Issues, stores, and validates session tokens
///
/// Issuance takes a short write lock; validation takes a read lock and never
/// mutates the stored token. There is no renewal path; sessions end at
/// expiry or explicit revocation.
#[derive(Debug)]
pub struct SessionTokenManager {
    config: SessionConfig,
    store: RwLock<HashMap<TokenId, SessionToken>>,
}

impl SessionTokenManager {
    /// Create a manager with the given issuance policy
    pub fn new(config: SessionConfig) -> Self {
        SessionTokenManager {
            config,
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a token for an authenticated identity
    pub fn issue(&self, identity: &Identity, device: &DeviceContext, now: SystemTime) -> SessionToken {
        let token = SessionToken {
            id: TokenId::generate(),
            user_id: identity.user_id.clone(),
            agency_id: identity.agency_id.clone(),
            access_level: identity.access_level,
            issued_at: now,
            expires_at: now + self.config.token_ttl,
            metadata: SessionMetadata {
                origin_ip: device.origin_ip,
                device_fingerprint: device.fingerprint(),
            },
        };

        tracing::debug!(
            user = %token.user_id,
            agency = %token.agency_id,
            level = %token.access_level,
            "session token issued"
        );

        let mut store = match self.store.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        store.insert(token.id.clone(), token.clone());
        token
    }

    /// Validate a presented token identifier against the injected clock
    ///
    /// Read-only: the stored token is never mutated. A missing identifier
    /// reports `Expired` so callers cannot distinguish a purged session from
    /// one that never existed.
    pub fn validate(&self, id: &TokenId, now: SystemTime) -> TokenValidation {
        let store = match self.store.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let Some(token) = store.get(id) else {
            return TokenValidation::Invalid(TokenError::Expired);
        };
        if token.expired_at(now) {
            return TokenValidation::Invalid(TokenError::Expired);
        }

        let remaining = token
            .expires_at
            .duration_since(now)
            .unwrap_or(Duration::ZERO);
        TokenValidation::Valid { remaining }
    }

    /// Administratively remove a session; returns whether it existed
    pub fn revoke(&self, id: &TokenId) -> bool {
        let mut store = match self.store.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let removed = store.remove(id).is_some();
        if removed {
            tracing::debug!(token = %id, "session revoked");
        }
        removed
    }

    /// Drop every token expired at `now`; returns the number removed
    pub fn purge_expired(&self, now: SystemTime) -> usize {
        let mut store = match self.store.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = store.len();
        store.retain(|_, token| !token.expired_at(now));
        before - store.len()
    }

    /// Number of stored sessions, including not-yet-purged expired ones
    pub fn active_sessions(&self) -> usize {
        match self.store.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

mod hex {
    use std::fmt::Write;

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().fold(String::new(), |mut output, b| {
            let _ = write!(output, "{:02x}", b);
            output
        })
    }
}
