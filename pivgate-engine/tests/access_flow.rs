//! End-to-end access-control flow
//!
//! Exercises the full path: build a certificate chain, verify a credential,
//! receive a session token, and authorize workflow actions against a
//! registered agency profile.

use pivgate_core::*;
use pivgate_engine::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

struct Deployment {
    verifier: CredentialVerifier,
    engine: PolicyEngine,
    sessions: Arc<SessionTokenManager>,
    credential: Credential,
    now: SystemTime,
}

fn deployment() -> Deployment {
    let now = SystemTime::now();
    let nb = now - Duration::from_secs(60);
    let na = now + Duration::from_secs(86_400);

    let root_key = KeyPair::generate();
    let inter_key = KeyPair::generate();
    let leaf_key = KeyPair::generate();

    let root = Certificate::self_signed(
        CertificateParams::new("CN=federal-root", "CN=federal-root", nb, na, root_key.public_key())
            .with_usage(KeyUsage::authority()),
        &root_key,
    );
    let intermediate = Certificate::issue(
        CertificateParams::new("CN=gsa-issuing", "CN=federal-root", nb, na, inter_key.public_key())
            .with_usage(KeyUsage::authority()),
        &root_key,
    );
    let leaf = Certificate::issue(
        CertificateParams::new("CN=jordan-reyes", "CN=gsa-issuing", nb, na, leaf_key.public_key())
            .with_ceiling(AccessLevel::Executive),
        &inter_key,
    );

    let anchors = Arc::new(TrustAnchorSet::from_roots([&root]));
    let directory = Arc::new(AgencyDirectory::new());
    directory.register(
        AgencyAuthenticationProfile::new(AgencyId::new("GSA").unwrap(), AccessLevel::Standard)
            .with_workflow(
                WorkflowType::new("BID_SUBMISSION").unwrap(),
                [AccessLevel::Standard, AccessLevel::Privileged],
            )
            .with_workflow(
                WorkflowType::new("CONTRACT_AWARD").unwrap(),
                [AccessLevel::Executive],
            ),
    );

    let sessions = Arc::new(SessionTokenManager::new(SessionConfig::default()));
    let verifier = CredentialVerifier::new(
        anchors,
        ChainConfig::default(),
        Arc::clone(&directory),
        Arc::clone(&sessions),
    );
    let engine = PolicyEngine::new(directory);

    let credential = Credential {
        card_serial: CardSerial::new("PIV-2204-8817").unwrap(),
        organizational_unit: "GSA, Procurement Division, Region 4".to_string(),
        subject_dn: "CN=jordan-reyes".to_string(),
        claimed_access_level: "PRIVILEGED".to_string(),
        chain: vec![leaf, intermediate, root],
    };

    Deployment {
        verifier,
        engine,
        sessions,
        credential,
        now,
    }
}

fn device() -> DeviceContext {
    DeviceContext {
        user_agent: "Mozilla/5.0 (Windows NT 10.0)".to_string(),
        screen_resolution: "2560x1440".to_string(),
        timezone: "America/Chicago".to_string(),
        installed_fonts: vec!["Calibri".to_string(), "Consolas".to_string()],
        origin_ip: Some("10.40.2.17".parse().unwrap()),
    }
}

#[test]
fn verify_issue_validate_authorize_round() {
    let d = deployment();

    let (identity, token) = match d.verifier.verify(&d.credential, &device(), d.now) {
        AuthenticationResult::Authenticated { identity, token } => (identity, token),
        AuthenticationResult::Failed { errors } => {
            panic!("expected authentication, got {:?}", errors)
        }
    };

    // Token is live for the configured window
    match d.sessions.validate(&token.id, d.now) {
        TokenValidation::Valid { remaining } => assert_eq!(remaining, DEFAULT_TOKEN_TTL),
        other => panic!("expected valid token, got {:?}", other),
    }

    // Privileged is in the BID_SUBMISSION set but not CONTRACT_AWARD's
    let bid = WorkflowType::new("BID_SUBMISSION").unwrap();
    let award = WorkflowType::new("CONTRACT_AWARD").unwrap();
    assert!(d
        .engine
        .authorize(&identity, &bid, &SecondaryEvidence::none())
        .is_authorized());
    assert!(!d
        .engine
        .authorize(&identity, &award, &SecondaryEvidence::none())
        .is_authorized());
}

#[test]
fn expired_session_denies_validation_but_identity_still_authorizes() {
    let d = deployment();
    let result = d.verifier.verify(&d.credential, &device(), d.now);
    let AuthenticationResult::Authenticated { identity, token } = result else {
        panic!("expected authentication");
    };

    let after_expiry = token.expires_at + Duration::from_millis(1);
    assert!(!d.sessions.validate(&token.id, after_expiry).is_valid());

    // Authorization is a pure policy decision over the identity; session
    // lifetime is enforced by whoever validates the token first.
    let bid = WorkflowType::new("BID_SUBMISSION").unwrap();
    assert!(d
        .engine
        .authorize(&identity, &bid, &SecondaryEvidence::none())
        .is_authorized());
}

#[test]
fn tampered_chain_blocks_the_whole_flow() {
    let d = deployment();

    let mut credential = d.credential.clone();
    let mut bytes = credential.chain[1].signature.to_bytes();
    bytes[0] ^= 0xff;
    credential.chain[1].signature = ed25519_dalek::Signature::from_bytes(&bytes);

    let result = d.verifier.verify(&credential, &device(), d.now);
    assert!(!result.is_authenticated());
    assert!(result
        .errors()
        .iter()
        .any(|e| matches!(e, CredentialError::Chain(ChainError::InvalidSignature { .. }))));
}

#[test]
fn token_identifiers_do_not_collide_across_ten_thousand_issuances() {
    let d = deployment();
    let identity = Identity::new(
        UserId::new("PIV-2204-8817").unwrap(),
        AgencyId::new("GSA").unwrap(),
        AccessLevel::Standard,
    );

    let mut seen = HashSet::with_capacity(10_000);
    for _ in 0..10_000 {
        let token = d.sessions.issue(&identity, &device(), d.now);
        assert!(seen.insert(token.id), "duplicate token identifier");
    }
}

#[test]
fn advisory_risk_never_blocks_authorization() {
    let d = deployment();
    let result = d.verifier.verify(&d.credential, &DeviceContext::default(), d.now);
    let AuthenticationResult::Authenticated { identity, .. } = result else {
        panic!("expected authentication");
    };

    // A maximally suspicious context still authorizes; the score is advisory
    let assessment = assess(&DeviceContext::default(), &[]);
    assert!(assessment.is_elevated());

    let bid = WorkflowType::new("BID_SUBMISSION").unwrap();
    assert!(d
        .engine
        .authorize(&identity, &bid, &SecondaryEvidence::none())
        .is_authorized());
}
