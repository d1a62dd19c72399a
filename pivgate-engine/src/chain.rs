//! Certificate chain validation
//!
//! A pure function of (chain, purpose, trust anchors, config, now). Checks
//! run in a fixed order and short-circuit on the first failure; `now` is
//! injected so identical inputs always produce identical results.

use pivgate_core::{Certificate, ChainConfig, KeyUsage, SignatureAlgorithm, TrustAnchorSet};
use std::time::SystemTime;
use thiserror::Error;

/// Purpose a chain is being validated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Authentication,
    DigitalSignature,
    Encryption,
}

impl Purpose {
    /// Key usage flags every chain element must carry for this purpose
    pub fn required_usage(&self) -> KeyUsage {
        match self {
            Purpose::Authentication => KeyUsage {
                digital_signature: true,
                key_encipherment: true,
                key_cert_sign: false,
                crl_sign: false,
            },
            Purpose::DigitalSignature => KeyUsage {
                digital_signature: true,
                key_encipherment: false,
                key_cert_sign: false,
                crl_sign: false,
            },
            Purpose::Encryption => KeyUsage {
                digital_signature: false,
                key_encipherment: true,
                key_cert_sign: false,
                crl_sign: false,
            },
        }
    }
}

/// Typed chain validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain depth {depth} exceeds configured maximum {max}")]
    ChainTooDeep { depth: usize, max: usize },

    #[error("certificate '{subject}' is outside its validity window")]
    CertificateExpired { subject: String },

    #[error("signature algorithm {algorithm} on '{subject}' is not permitted")]
    UnsupportedAlgorithm {
        subject: String,
        algorithm: SignatureAlgorithm,
    },

    #[error("certificate '{subject}' lacks key usage required for {purpose:?}")]
    InvalidKeyUsage { subject: String, purpose: Purpose },

    #[error("signature on certificate '{subject}' did not verify")]
    InvalidSignature { subject: String },

    #[error("root certificate '{subject}' is not a configured trust anchor")]
    UntrustedRoot { subject: String },

    /// Catch-all for malformed input; never a raw internal fault
    #[error("chain validation error: {0}")]
    Validation(String),
}

/// Successful validation outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSummary {
    pub chain_length: usize,
    pub validated_at: SystemTime,
}

/// Validate an ordered certificate chain, leaf first, root last
///
/// Check order, first failure wins: depth, validity windows, algorithm
/// allow-list, key usage for `purpose`, pairwise signatures upward toward the
/// root (the root must be self-signed), trust anchor membership of the root.
pub fn validate_chain(
    chain: &[Certificate],
    purpose: Purpose,
    anchors: &TrustAnchorSet,
    config: &ChainConfig,
    now: SystemTime,
) -> Result<ChainSummary, ChainError> {
    if chain.is_empty() {
        return Err(ChainError::Validation("empty certificate chain".to_string()));
    }
    if config.max_depth == 0 {
        return Err(ChainError::Validation(
            "configured maximum depth is zero".to_string(),
        ));
    }
    if chain.len() > config.max_depth {
        return Err(ChainError::ChainTooDeep {
            depth: chain.len(),
            max: config.max_depth,
        });
    }

    for cert in chain {
        if !cert.valid_at(now) {
            tracing::debug!(subject = %cert.subject, "certificate outside validity window");
            return Err(ChainError::CertificateExpired {
                subject: cert.subject.clone(),
            });
        }
    }

    for cert in chain {
        if !config.allowed_algorithms.contains(&cert.algorithm) {
            return Err(ChainError::UnsupportedAlgorithm {
                subject: cert.subject.clone(),
                algorithm: cert.algorithm,
            });
        }
    }

    let required = purpose.required_usage();
    for cert in chain {
        if !cert.key_usage.contains(&required) {
            return Err(ChainError::InvalidKeyUsage {
                subject: cert.subject.clone(),
                purpose,
            });
        }
    }

    // Each certificate's signature verifies under its issuer's key; the
    // chain signs upward toward the root.
    for i in 1..chain.len() {
        if !chain[i - 1].verify_signed_by(&chain[i].public_key) {
            return Err(ChainError::InvalidSignature {
                subject: chain[i - 1].subject.clone(),
            });
        }
    }

    let root = &chain[chain.len() - 1];
    if !root.verify_signed_by(&root.public_key) {
        return Err(ChainError::InvalidSignature {
            subject: root.subject.clone(),
        });
    }

    if !anchors.contains(root) {
        tracing::warn!(subject = %root.subject, "chain terminates at untrusted root");
        return Err(ChainError::UntrustedRoot {
            subject: root.subject.clone(),
        });
    }

    Ok(ChainSummary {
        chain_length: chain.len(),
        validated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Signature;
    use pivgate_core::{CertificateParams, KeyPair, KeyUsage};
    use std::time::Duration;

    struct Fixture {
        chain: Vec<Certificate>,
        anchors: TrustAnchorSet,
        now: SystemTime,
    }

    /// Build a leaf -> intermediate -> root chain with a correct signature
    /// pattern and the root registered as a trust anchor.
    fn three_cert_chain() -> Fixture {
        let now = SystemTime::now();
        let nb = now - Duration::from_secs(60);
        let na = now + Duration::from_secs(3600);

        let root_key = KeyPair::generate();
        let inter_key = KeyPair::generate();
        let leaf_key = KeyPair::generate();

        let root = Certificate::self_signed(
            CertificateParams::new("CN=root-ca", "CN=root-ca", nb, na, root_key.public_key())
                .with_usage(KeyUsage::authority()),
            &root_key,
        );
        let intermediate = Certificate::issue(
            CertificateParams::new("CN=issuing-ca", "CN=root-ca", nb, na, inter_key.public_key())
                .with_usage(KeyUsage::authority()),
            &root_key,
        );
        let leaf = Certificate::issue(
            CertificateParams::new("CN=card-holder", "CN=issuing-ca", nb, na, leaf_key.public_key()),
            &inter_key,
        );

        let anchors = TrustAnchorSet::from_roots([&root]);
        Fixture {
            chain: vec![leaf, intermediate, root],
            anchors,
            now,
        }
    }

    #[test]
    fn chain_of_three_validates_with_length_three() {
        let f = three_cert_chain();
        let summary = validate_chain(
            &f.chain,
            Purpose::Authentication,
            &f.anchors,
            &ChainConfig::default(),
            f.now,
        )
        .unwrap();

        assert_eq!(summary.chain_length, 3);
        assert_eq!(summary.validated_at, f.now);
    }

    #[test]
    fn chain_deeper_than_max_is_rejected_before_other_checks() {
        let f = three_cert_chain();
        let config = ChainConfig::default().with_max_depth(2);

        // Even with an expired leaf the depth check fires first
        let mut chain = f.chain.clone();
        chain[0].not_after = f.now - Duration::from_secs(1);

        let err = validate_chain(&chain, Purpose::Authentication, &f.anchors, &config, f.now)
            .unwrap_err();
        assert_eq!(err, ChainError::ChainTooDeep { depth: 3, max: 2 });
    }

    #[test]
    fn expired_certificate_is_rejected() {
        let f = three_cert_chain();
        let late = f.chain[0].not_after + Duration::from_secs(1);

        let err = validate_chain(
            &f.chain,
            Purpose::Authentication,
            &f.anchors,
            &ChainConfig::default(),
            late,
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::CertificateExpired { .. }));
    }

    #[test]
    fn disallowed_algorithm_is_rejected() {
        let f = three_cert_chain();
        let config = ChainConfig::default().with_algorithms([SignatureAlgorithm::RsaSha256]);

        let err = validate_chain(&f.chain, Purpose::Authentication, &f.anchors, &config, f.now)
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::UnsupportedAlgorithm {
                algorithm: SignatureAlgorithm::Ed25519,
                ..
            }
        ));
    }

    #[test]
    fn missing_key_usage_is_rejected() {
        let f = three_cert_chain();

        // Authentication requires key_encipherment on every element; the
        // leaf in this fixture carries entity usage which lacks cert signing,
        // so DigitalSignature still passes but a leaf without encipherment
        // fails Authentication.
        let mut chain = f.chain.clone();
        chain[0].key_usage.key_encipherment = false;
        // Re-sign is deliberately skipped: usage is checked before signatures.

        let err = validate_chain(
            &chain,
            Purpose::Authentication,
            &f.anchors,
            &ChainConfig::default(),
            f.now,
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::InvalidKeyUsage { .. }));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let f = three_cert_chain();

        let mut chain = f.chain.clone();
        let mut bytes = chain[1].signature.to_bytes();
        bytes[7] ^= 0x01;
        chain[1].signature = Signature::from_bytes(&bytes);

        let err = validate_chain(
            &chain,
            Purpose::Authentication,
            &f.anchors,
            &ChainConfig::default(),
            f.now,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ChainError::InvalidSignature {
                subject: "CN=issuing-ca".to_string()
            }
        );
    }

    #[test]
    fn tampered_certificate_content_is_rejected() {
        let f = three_cert_chain();

        // Altering signed content invalidates the issuer signature
        let mut chain = f.chain.clone();
        chain[0].subject = "CN=someone-else".to_string();

        let err = validate_chain(
            &chain,
            Purpose::Authentication,
            &f.anchors,
            &ChainConfig::default(),
            f.now,
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::InvalidSignature { .. }));
    }

    #[test]
    fn unknown_root_is_rejected() {
        let f = three_cert_chain();

        let err = validate_chain(
            &f.chain,
            Purpose::Authentication,
            &TrustAnchorSet::new(),
            &ChainConfig::default(),
            f.now,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ChainError::UntrustedRoot {
                subject: "CN=root-ca".to_string()
            }
        );
    }

    #[test]
    fn empty_chain_is_a_validation_error() {
        let err = validate_chain(
            &[],
            Purpose::Authentication,
            &TrustAnchorSet::new(),
            &ChainConfig::default(),
            SystemTime::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::Validation(_)));
    }

    #[test]
    fn validation_is_deterministic_for_fixed_now() {
        let f = three_cert_chain();
        let config = ChainConfig::default();

        let a = validate_chain(&f.chain, Purpose::Authentication, &f.anchors, &config, f.now);
        let b = validate_chain(&f.chain, Purpose::Authentication, &f.anchors, &config, f.now);
        assert_eq!(a, b);
    }
}
