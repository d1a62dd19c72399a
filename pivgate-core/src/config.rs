//! Configuration for chain validation and session lifetimes
//!
//! Plain structs with defaults; hosts construct these at startup and pass
//! them into the engine. Nothing here is read from the environment.

use crate::SignatureAlgorithm;
use std::collections::BTreeSet;
use std::time::Duration;

/// Default maximum certificate chain depth
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 5;

/// Default session token lifetime
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Chain validation policy
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Maximum permitted chain length, leaf through root
    pub max_depth: usize,

    /// Signature algorithm labels accepted on any chain element
    pub allowed_algorithms: BTreeSet<SignatureAlgorithm>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            max_depth: DEFAULT_MAX_CHAIN_DEPTH,
            allowed_algorithms: BTreeSet::from([
                SignatureAlgorithm::Ed25519,
                SignatureAlgorithm::EcdsaSha256,
                SignatureAlgorithm::EcdsaSha384,
                SignatureAlgorithm::RsaSha256,
                SignatureAlgorithm::RsaSha384,
                SignatureAlgorithm::RsaSha512,
            ]),
        }
    }
}

impl ChainConfig {
    /// Restrict the allow-list to a specific set of algorithms
    pub fn with_algorithms(mut self, algorithms: impl IntoIterator<Item = SignatureAlgorithm>) -> Self {
        self.allowed_algorithms = algorithms.into_iter().collect();
        self
    }

    /// Set the maximum chain depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Session token issuance policy
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed validity window applied at issuance
    pub token_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

impl SessionConfig {
    /// Set the token lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}
