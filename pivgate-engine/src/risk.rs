//! Advisory authentication risk assessment
//!
//! Produces a score and the signals behind it for audit and step-up
//! decisions made by the host. Nothing here gates authorization; the policy
//! engine never consults the score.

use crate::session::{DeviceContext, DeviceFingerprint};
use serde::{Deserialize, Serialize};

/// Individual signals contributing to a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskSignal {
    /// Device fingerprint not among the user's known devices
    UnfamiliarDevice,
    /// No origin IP captured for the attempt
    MissingOriginIp,
    /// Device context is effectively empty (no attributes to fingerprint)
    BareDeviceContext,
}

impl RiskSignal {
    fn weight(&self) -> u8 {
        match self {
            RiskSignal::UnfamiliarDevice => 40,
            RiskSignal::MissingOriginIp => 20,
            RiskSignal::BareDeviceContext => 25,
        }
    }
}

/// Advisory assessment of an authentication attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0 (no signals) to 100
    pub score: u8,
    pub signals: Vec<RiskSignal>,
}

impl RiskAssessment {
    /// Whether the host should consider step-up verification
    pub fn is_elevated(&self) -> bool {
        self.score >= 50
    }
}

/// Assess an authentication attempt against the user's known devices
pub fn assess(device: &DeviceContext, known_devices: &[DeviceFingerprint]) -> RiskAssessment {
    let mut signals = Vec::new();

    let bare = device.user_agent.is_empty()
        && device.screen_resolution.is_empty()
        && device.timezone.is_empty()
        && device.installed_fonts.is_empty();
    if bare {
        signals.push(RiskSignal::BareDeviceContext);
    }

    let fingerprint = device.fingerprint();
    if !bare && !known_devices.contains(&fingerprint) {
        signals.push(RiskSignal::UnfamiliarDevice);
    }

    if device.origin_ip.is_none() {
        signals.push(RiskSignal::MissingOriginIp);
    }

    let score = signals
        .iter()
        .map(|s| u32::from(s.weight()))
        .sum::<u32>()
        .min(100) as u8;

    let assessment = RiskAssessment { score, signals };
    if assessment.is_elevated() {
        tracing::warn!(score = assessment.score, "elevated authentication risk");
    }
    assessment
}
