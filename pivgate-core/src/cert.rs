//! Certificates, trust anchors, and presented credentials
//!
//! Certificates here are the abstract chain elements carried by a CAC/PIV
//! credential, not full X.509: identity attributes, a validity window, a
//! declared signature algorithm, key usage flags, Ed25519 key material, and
//! an issuer signature over a canonical byte encoding.

use crate::{AccessLevel, CardSerial, KeyPair, PublicKey};
use ed25519_dalek::Signature;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

/// Key usage flags declared on a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyUsage {
    pub digital_signature: bool,
    pub key_encipherment: bool,
    pub key_cert_sign: bool,
    pub crl_sign: bool,
}

impl KeyUsage {
    /// Usage carried by end-entity authentication certificates
    pub fn entity() -> Self {
        KeyUsage {
            digital_signature: true,
            key_encipherment: true,
            key_cert_sign: false,
            crl_sign: false,
        }
    }

    /// Usage carried by certificate authorities
    pub fn authority() -> Self {
        KeyUsage {
            digital_signature: true,
            key_encipherment: true,
            key_cert_sign: true,
            crl_sign: true,
        }
    }

    /// No flags set
    pub fn none() -> Self {
        KeyUsage {
            digital_signature: false,
            key_encipherment: false,
            key_cert_sign: false,
            crl_sign: false,
        }
    }

    /// Check that every flag set in `required` is also set here
    pub fn contains(&self, required: &KeyUsage) -> bool {
        (!required.digital_signature || self.digital_signature)
            && (!required.key_encipherment || self.key_encipherment)
            && (!required.key_cert_sign || self.key_cert_sign)
            && (!required.crl_sign || self.crl_sign)
    }

    /// Flag bits as a stable string, used in the canonical encoding
    pub fn to_bits(&self) -> String {
        format!(
            "{}{}{}{}",
            self.digital_signature as u8,
            self.key_encipherment as u8,
            self.key_cert_sign as u8,
            self.crl_sign as u8
        )
    }
}

/// Declared signature algorithm of a certificate
///
/// The allow-list check in chain validation is over these labels. Signature
/// verification itself is Ed25519 over the canonical encoding; the RSA and
/// ECDSA labels exist so agency policy can be expressed against chains that
/// declare them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignatureAlgorithm {
    Ed25519,
    EcdsaSha256,
    EcdsaSha384,
    RsaSha256,
    RsaSha384,
    RsaSha512,
}

impl SignatureAlgorithm {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Ed25519 => "ED25519",
            SignatureAlgorithm::EcdsaSha256 => "ECDSA_SHA256",
            SignatureAlgorithm::EcdsaSha384 => "ECDSA_SHA384",
            SignatureAlgorithm::RsaSha256 => "RSA_SHA256",
            SignatureAlgorithm::RsaSha384 => "RSA_SHA384",
            SignatureAlgorithm::RsaSha512 => "RSA_SHA512",
        }
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unsigned certificate content, signed by an issuer to produce a [`Certificate`]
#[derive(Debug, Clone)]
pub struct CertificateParams {
    pub subject: String,
    pub issuer: String,
    pub not_before: SystemTime,
    pub not_after: SystemTime,
    pub algorithm: SignatureAlgorithm,
    pub key_usage: KeyUsage,
    pub public_key: PublicKey,
    /// Highest access level the issuer asserts for the holder (leaf only)
    pub access_ceiling: Option<AccessLevel>,
}

impl CertificateParams {
    /// Create params with entity usage and the Ed25519 algorithm label
    pub fn new(
        subject: &str,
        issuer: &str,
        not_before: SystemTime,
        not_after: SystemTime,
        public_key: PublicKey,
    ) -> Self {
        CertificateParams {
            subject: subject.to_string(),
            issuer: issuer.to_string(),
            not_before,
            not_after,
            algorithm: SignatureAlgorithm::Ed25519,
            key_usage: KeyUsage::entity(),
            public_key,
            access_ceiling: None,
        }
    }

    /// Set the key usage flags
    pub fn with_usage(mut self, usage: KeyUsage) -> Self {
        self.key_usage = usage;
        self
    }

    /// Set the declared signature algorithm
    pub fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the asserted access-level ceiling
    pub fn with_ceiling(mut self, ceiling: AccessLevel) -> Self {
        self.access_ceiling = Some(ceiling);
        self
    }
}

/// A chain element: certificate content plus the issuer's signature
#[derive(Debug, Clone)]
pub struct Certificate {
    pub subject: String,
    pub issuer: String,
    pub not_before: SystemTime,
    pub not_after: SystemTime,
    pub algorithm: SignatureAlgorithm,
    pub key_usage: KeyUsage,
    pub public_key: PublicKey,
    pub access_ceiling: Option<AccessLevel>,
    pub signature: Signature,
}

impl Certificate {
    /// Sign certificate params with an issuer key
    pub fn issue(params: CertificateParams, issuer_key: &KeyPair) -> Self {
        let mut cert = Certificate {
            subject: params.subject,
            issuer: params.issuer,
            not_before: params.not_before,
            not_after: params.not_after,
            algorithm: params.algorithm,
            key_usage: params.key_usage,
            public_key: params.public_key,
            access_ceiling: params.access_ceiling,
            // Placeholder until the canonical content exists to sign
            signature: Signature::from_bytes(&[0u8; 64]),
        };
        cert.signature = issuer_key.sign(cert.to_canonical_string().as_bytes());
        cert
    }

    /// Sign params with the holder's own key (roots)
    pub fn self_signed(params: CertificateParams, key: &KeyPair) -> Self {
        Certificate::issue(params, key)
    }

    /// Canonical newline-delimited encoding of the signed content
    ///
    /// The signature is excluded; both signing and verification operate on
    /// exactly these bytes.
    pub fn to_canonical_string(&self) -> String {
        let mut canonical = String::new();

        canonical.push_str(&self.subject);
        canonical.push('\n');
        canonical.push_str(&self.issuer);
        canonical.push('\n');
        canonical.push_str(&unix_secs(self.not_before).to_string());
        canonical.push('\n');
        canonical.push_str(&unix_secs(self.not_after).to_string());
        canonical.push('\n');
        canonical.push_str(self.algorithm.as_str());
        canonical.push('\n');
        canonical.push_str(&self.key_usage.to_bits());
        canonical.push('\n');
        canonical.push_str(&self.public_key.to_hex());
        canonical.push('\n');
        match self.access_ceiling {
            Some(level) => canonical.push_str(level.as_str()),
            None => canonical.push('-'),
        }

        canonical
    }

    /// Check whether `now` lies within the validity window
    pub fn valid_at(&self, now: SystemTime) -> bool {
        now >= self.not_before && now <= self.not_after
    }

    /// Verify this certificate's signature under an issuer public key
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> bool {
        issuer_key
            .verify(self.to_canonical_string().as_bytes(), &self.signature)
            .is_ok()
    }

    /// BLAKE3 fingerprint over the canonical content
    pub fn fingerprint(&self) -> Fingerprint {
        let hash = blake3::hash(self.to_canonical_string().as_bytes());
        Fingerprint(hash.into())
    }
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Certificate fingerprint used for trust anchor membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Constant-time equality check
    pub fn ct_eq(&self, other: &Fingerprint) -> bool {
        self.0.ct_eq(&other.0).into()
    }

    /// Fingerprint bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Configured set of implicitly trusted root certificates
///
/// Built once at startup from administrative configuration and shared
/// read-only during request handling. Membership is by fingerprint keyed on
/// the anchor's subject name.
#[derive(Debug, Clone, Default)]
pub struct TrustAnchorSet {
    anchors: HashMap<String, Fingerprint>,
}

impl TrustAnchorSet {
    /// Create an empty anchor set
    pub fn new() -> Self {
        TrustAnchorSet {
            anchors: HashMap::new(),
        }
    }

    /// Build from trusted root certificates
    pub fn from_roots<'a>(roots: impl IntoIterator<Item = &'a Certificate>) -> Self {
        let mut set = TrustAnchorSet::new();
        for root in roots {
            set.add_root(root);
        }
        set
    }

    /// Add a trusted root
    pub fn add_root(&mut self, root: &Certificate) {
        self.anchors
            .insert(root.subject.clone(), root.fingerprint());
    }

    /// Check whether a certificate is one of the configured anchors
    pub fn contains(&self, cert: &Certificate) -> bool {
        match self.anchors.get(&cert.subject) {
            Some(anchor) => anchor.ct_eq(&cert.fingerprint()),
            None => false,
        }
    }

    /// Number of configured anchors
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether no anchors are configured
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// CAC/PIV credential material presented at authentication time
///
/// Immutable once presented; never persisted beyond the attempt. The claimed
/// access level stays a raw string here so unrecognized values surface as a
/// typed verification failure rather than a parse panic upstream.
#[derive(Debug, Clone)]
pub struct Credential {
    pub card_serial: CardSerial,
    pub organizational_unit: String,
    pub subject_dn: String,
    pub claimed_access_level: String,
    /// Ordered leaf first, root last
    pub chain: Vec<Certificate>,
}
