//! Per-agency authorization policy
//!
//! Each agency registers a profile mapping workflow categories to the set of
//! access levels permitted to perform them. Lookups run against an immutable
//! snapshot swapped atomically on registration, so readers never observe a
//! partially-updated profile. Everything here fails closed: missing agency,
//! missing workflow entry, and missing secondary evidence all deny.

use pivgate_core::{AccessLevel, AgencyId, Identity, WorkflowType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Additional verification step kinds an agency may require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationKind {
    Biometric,
    SecondaryCredential,
    LocationVerification,
}

/// One step in an agency's additional verification sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationStep {
    pub kind: VerificationKind,
    pub mandatory: bool,
}

impl VerificationStep {
    /// A mandatory step
    pub fn required(kind: VerificationKind) -> Self {
        VerificationStep {
            kind,
            mandatory: true,
        }
    }

    /// An optional step
    pub fn optional(kind: VerificationKind) -> Self {
        VerificationStep {
            kind,
            mandatory: false,
        }
    }
}

/// Authentication and authorization policy for one agency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgencyAuthenticationProfile {
    pub agency_id: AgencyId,

    /// Baseline level required for any access under this agency
    pub required_access_level: AccessLevel,

    /// When set, every declared verification step must be evidenced
    pub mandatory_role_verification: bool,

    /// Ordered additional verification steps
    pub additional_verification_steps: Vec<VerificationStep>,

    /// Workflow category -> access levels permitted to perform it.
    /// An absent or empty entry permits no one.
    pub workflow_access: HashMap<WorkflowType, BTreeSet<AccessLevel>>,
}

impl AgencyAuthenticationProfile {
    /// Create a profile with no verification steps and no workflow grants
    pub fn new(agency_id: AgencyId, required_access_level: AccessLevel) -> Self {
        AgencyAuthenticationProfile {
            agency_id,
            required_access_level,
            mandatory_role_verification: false,
            additional_verification_steps: Vec::new(),
            workflow_access: HashMap::new(),
        }
    }

    /// Grant a workflow category to a set of access levels
    pub fn with_workflow(
        mut self,
        workflow: WorkflowType,
        levels: impl IntoIterator<Item = AccessLevel>,
    ) -> Self {
        self.workflow_access
            .insert(workflow, levels.into_iter().collect());
        self
    }

    /// Append a verification step
    pub fn with_step(mut self, step: VerificationStep) -> Self {
        self.additional_verification_steps.push(step);
        self
    }

    /// Require evidence for every declared step
    pub fn with_mandatory_role_verification(mut self) -> Self {
        self.mandatory_role_verification = true;
        self
    }

    /// Step kinds that must be evidenced before authorization
    ///
    /// Mandatory steps always count; with `mandatory_role_verification` every
    /// declared step counts, and an agency that sets the flag without
    /// declaring steps requires a secondary credential check.
    pub fn required_verification(&self) -> HashSet<VerificationKind> {
        let mut required: HashSet<VerificationKind> = self
            .additional_verification_steps
            .iter()
            .filter(|step| step.mandatory || self.mandatory_role_verification)
            .map(|step| step.kind)
            .collect();

        if self.mandatory_role_verification && self.additional_verification_steps.is_empty() {
            required.insert(VerificationKind::SecondaryCredential);
        }
        required
    }
}

/// Evidence that secondary verification steps were completed and recorded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecondaryEvidence {
    completed: HashSet<VerificationKind>,
}

impl SecondaryEvidence {
    /// No steps completed
    pub fn none() -> Self {
        SecondaryEvidence::default()
    }

    /// Evidence for the given completed steps
    pub fn completed(kinds: impl IntoIterator<Item = VerificationKind>) -> Self {
        SecondaryEvidence {
            completed: kinds.into_iter().collect(),
        }
    }

    /// Record one more completed step
    pub fn record(&mut self, kind: VerificationKind) {
        self.completed.insert(kind);
    }

    /// Whether every required kind is covered
    pub fn satisfies(&self, required: &HashSet<VerificationKind>) -> bool {
        required.is_subset(&self.completed)
    }
}

/// Typed denial reasons
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    #[error("agency '{0}' has no registered profile")]
    UnknownAgency(AgencyId),

    #[error("access level {held} does not permit workflow '{workflow}'")]
    InsufficientPrivileges {
        held: AccessLevel,
        workflow: WorkflowType,
    },

    #[error("required secondary verification steps are not evidenced")]
    SecondaryVerificationRequired,
}

/// Outcome of an authorization check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationDecision {
    Authorized,
    Denied(DenialReason),
}

impl AuthorizationDecision {
    /// Whether access was granted
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthorizationDecision::Authorized)
    }
}

type ProfileSnapshot = HashMap<AgencyId, Arc<AgencyAuthenticationProfile>>;

/// Registry of agency profiles with snapshot-swap semantics
///
/// `register` clones the current map, applies the upsert, and swaps the
/// `Arc`; `lookup` clones the current `Arc` and reads it without holding the
/// lock, so in-flight reads keep a complete snapshot.
#[derive(Debug, Default)]
pub struct AgencyDirectory {
    snapshot: RwLock<Arc<ProfileSnapshot>>,
}

impl AgencyDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        AgencyDirectory::default()
    }

    /// Idempotent upsert keyed by agency id; replaces any prior profile
    pub fn register(&self, profile: AgencyAuthenticationProfile) {
        let agency = profile.agency_id.clone();
        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut next: ProfileSnapshot = (**guard).clone();
        next.insert(agency.clone(), Arc::new(profile));
        *guard = Arc::new(next);

        tracing::info!(agency = %agency, "agency profile registered");
    }

    /// Current snapshot of all profiles
    pub fn snapshot(&self) -> Arc<ProfileSnapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Look up the profile for an agency
    pub fn lookup(&self, agency_id: &AgencyId) -> Option<Arc<AgencyAuthenticationProfile>> {
        self.snapshot().get(agency_id).cloned()
    }

    /// Whether a profile exists for the agency
    pub fn contains(&self, agency_id: &AgencyId) -> bool {
        self.snapshot().contains_key(agency_id)
    }
}

/// Evaluates workflow authorization against registered agency profiles
#[derive(Debug)]
pub struct PolicyEngine {
    directory: Arc<AgencyDirectory>,
}

impl PolicyEngine {
    /// Create an engine over a shared agency directory
    pub fn new(directory: Arc<AgencyDirectory>) -> Self {
        PolicyEngine { directory }
    }

    /// The directory this engine reads from
    pub fn directory(&self) -> &Arc<AgencyDirectory> {
        &self.directory
    }

    /// Authorize an identity for a workflow category
    ///
    /// Decision is by set membership in the profile's workflow entry, after
    /// the baseline level gate and the secondary-verification gate. Missing
    /// configuration at any point denies.
    pub fn authorize(
        &self,
        identity: &Identity,
        workflow: &WorkflowType,
        evidence: &SecondaryEvidence,
    ) -> AuthorizationDecision {
        let Some(profile) = self.directory.lookup(&identity.agency_id) else {
            tracing::warn!(agency = %identity.agency_id, "authorization denied: unknown agency");
            return AuthorizationDecision::Denied(DenialReason::UnknownAgency(
                identity.agency_id.clone(),
            ));
        };

        if identity.access_level < profile.required_access_level {
            tracing::debug!(
                user = %identity.user_id,
                held = %identity.access_level,
                baseline = %profile.required_access_level,
                "authorization denied: below agency baseline"
            );
            return AuthorizationDecision::Denied(DenialReason::InsufficientPrivileges {
                held: identity.access_level,
                workflow: workflow.clone(),
            });
        }

        let required = profile.required_verification();
        if !evidence.satisfies(&required) {
            tracing::debug!(
                user = %identity.user_id,
                agency = %identity.agency_id,
                "authorization denied: secondary verification not evidenced"
            );
            return AuthorizationDecision::Denied(DenialReason::SecondaryVerificationRequired);
        }

        let permitted = profile
            .workflow_access
            .get(workflow)
            .map(|levels| levels.contains(&identity.access_level))
            .unwrap_or(false);

        if permitted {
            AuthorizationDecision::Authorized
        } else {
            tracing::debug!(
                user = %identity.user_id,
                workflow = %workflow,
                held = %identity.access_level,
                "authorization denied: level not in workflow set"
            );
            AuthorizationDecision::Denied(DenialReason::InsufficientPrivileges {
                held: identity.access_level,
                workflow: workflow.clone(),
            })
        }
    }
}
