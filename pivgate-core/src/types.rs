//! Identity and access-level types for pivgate

use serde::{Deserialize, Serialize};

/// Ordered access levels attached to identities and authorization rules
///
/// Backed by an integer rank so both threshold comparisons and
/// set membership are well-defined. The wire names are the
/// SCREAMING_SNAKE_CASE forms carried on credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    Restricted,
    Standard,
    Privileged,
    Executive,
    SystemAdmin,
}

impl AccessLevel {
    /// All levels in ascending order of privilege
    pub const ALL: [AccessLevel; 5] = [
        AccessLevel::Restricted,
        AccessLevel::Standard,
        AccessLevel::Privileged,
        AccessLevel::Executive,
        AccessLevel::SystemAdmin,
    ];

    /// Parse the wire name of an access level
    ///
    /// Unknown names are an error; callers must treat them as a denial,
    /// never as a default level.
    pub fn parse(name: &str) -> crate::Result<Self> {
        match name.trim() {
            "RESTRICTED" => Ok(AccessLevel::Restricted),
            "STANDARD" => Ok(AccessLevel::Standard),
            "PRIVILEGED" => Ok(AccessLevel::Privileged),
            "EXECUTIVE" => Ok(AccessLevel::Executive),
            "SYSTEM_ADMIN" => Ok(AccessLevel::SystemAdmin),
            other => Err(crate::CoreError::UnrecognizedAccessLevel(other.to_string())),
        }
    }

    /// Wire name of this level
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Restricted => "RESTRICTED",
            AccessLevel::Standard => "STANDARD",
            AccessLevel::Privileged => "PRIVILEGED",
            AccessLevel::Executive => "EXECUTIVE",
            AccessLevel::SystemAdmin => "SYSTEM_ADMIN",
        }
    }

    /// Integer rank used for ordering comparisons
    pub fn rank(&self) -> u8 {
        match self {
            AccessLevel::Restricted => 0,
            AccessLevel::Standard => 1,
            AccessLevel::Privileged => 2,
            AccessLevel::Executive => 3,
            AccessLevel::SystemAdmin => 4,
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Agency identifier derived from a credential's organizational unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgencyId(String);

impl AgencyId {
    /// Create an agency id with validation
    pub fn new(id: &str) -> crate::Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(crate::CoreError::InvalidAgencyId("empty id".to_string()));
        }
        if !id.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            return Err(crate::CoreError::InvalidAgencyId(format!(
                "invalid characters in '{}'",
                id
            )));
        }
        Ok(AgencyId(id.to_string()))
    }

    /// Derive the agency id from an organizational-unit string
    ///
    /// The agency identifier is the first comma-delimited segment of the
    /// organizational unit, with surrounding whitespace trimmed. This is the
    /// single place the parsing rule lives; an empty unit or empty first
    /// segment is an error, not a default.
    pub fn from_organizational_unit(unit: &str) -> crate::Result<Self> {
        let first = unit
            .split(',')
            .next()
            .unwrap_or("")
            .trim();
        if first.is_empty() {
            return Err(crate::CoreError::InvalidOrganizationalUnit(format!(
                "no agency segment in '{}'",
                unit
            )));
        }
        AgencyId::new(first)
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgencyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identifier bound to a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a user id with validation
    pub fn new(id: &str) -> crate::Result<Self> {
        if id.trim().is_empty() {
            return Err(crate::CoreError::Internal("empty user id".to_string()));
        }
        Ok(UserId(id.trim().to_string()))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Smart-card serial identifier presented at authentication time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardSerial(String);

impl CardSerial {
    /// Create a card serial with validation
    pub fn new(serial: &str) -> crate::Result<Self> {
        let serial = serial.trim();
        if serial.is_empty() {
            return Err(crate::CoreError::Internal("empty card serial".to_string()));
        }
        Ok(CardSerial(serial.to_string()))
    }

    /// Get the serial as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CardSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named workflow category against which access rules are defined
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkflowType(String);

impl WorkflowType {
    /// Create a workflow category name with validation
    pub fn new(name: &str) -> crate::Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(crate::CoreError::InvalidWorkflowType("empty name".to_string()));
        }
        Ok(WorkflowType(name.to_string()))
    }

    /// Get the category name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated identity produced by credential verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub agency_id: AgencyId,
    pub access_level: AccessLevel,
}

impl Identity {
    /// Create a new identity
    pub fn new(user_id: UserId, agency_id: AgencyId, access_level: AccessLevel) -> Self {
        Identity {
            user_id,
            agency_id,
            access_level,
        }
    }
}
