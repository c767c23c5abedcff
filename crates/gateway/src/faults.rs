//! Fault-injection toggles exposed by the gateway.
//!
//! The toggles make the payment agency or the shipping carrier reject
//! requests, which drives Saga compensations and 2PC aborts on demand.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Downstream service a toggle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultCategory {
    /// The financial agency behind the payment service.
    Fina,
    /// The shipping carrier behind the shipping service.
    Carrier,
}

impl FaultCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultCategory::Fina => "fina",
            FaultCategory::Carrier => "carrier",
        }
    }
}

impl std::fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FaultCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fina" => Ok(FaultCategory::Fina),
            "carrier" => Ok(FaultCategory::Carrier),
            other => Err(format!("unknown fault category '{other}'")),
        }
    }
}

/// Individual validation a toggle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultSetting {
    Availability,
    PreAuthorization,
    Capacity,
}

impl FaultSetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultSetting::Availability => "availability",
            FaultSetting::PreAuthorization => "pre-authorization",
            FaultSetting::Capacity => "capacity",
        }
    }
}

impl std::fmt::Display for FaultSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FaultSetting {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "availability" => Ok(FaultSetting::Availability),
            "pre-authorization" | "preauthorization" => Ok(FaultSetting::PreAuthorization),
            "capacity" => Ok(FaultSetting::Capacity),
            other => Err(format!("unknown fault setting '{other}'")),
        }
    }
}

/// A category/setting pair the gateway actually exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaultToggle {
    category: FaultCategory,
    setting: FaultSetting,
}

impl FaultToggle {
    /// Validates the pair.
    ///
    /// FINA offers availability and pre-authorization, the carrier offers
    /// availability and capacity.
    pub fn new(category: FaultCategory, setting: FaultSetting) -> Result<Self> {
        let valid = matches!(
            (category, setting),
            (FaultCategory::Fina, FaultSetting::Availability)
                | (FaultCategory::Fina, FaultSetting::PreAuthorization)
                | (FaultCategory::Carrier, FaultSetting::Availability)
                | (FaultCategory::Carrier, FaultSetting::Capacity)
        );
        if !valid {
            return Err(GatewayError::InvalidToggle { category, setting });
        }
        Ok(Self { category, setting })
    }

    pub fn category(&self) -> FaultCategory {
        self.category
    }

    pub fn setting(&self) -> FaultSetting {
        self.setting
    }

    /// Returns the gateway path that sets this toggle.
    pub fn path(&self, enabled: bool) -> String {
        format!(
            "/api/gateway/config/{}/{}/{}",
            self.category, self.setting, enabled
        )
    }

    /// Returns the key under which the service reports this toggle.
    pub fn status_key(&self) -> &'static str {
        match (self.category, self.setting) {
            (FaultCategory::Fina, FaultSetting::PreAuthorization) => "preAuthorizationEnabled",
            (FaultCategory::Fina, _) => "finaAvailabilityEnabled",
            (FaultCategory::Carrier, FaultSetting::Capacity) => "carrierCapacityEnabled",
            (FaultCategory::Carrier, _) => "carrierAvailabilityEnabled",
        }
    }
}

impl std::fmt::Display for FaultToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.setting)
    }
}

/// Status of one category as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryStatus {
    /// The gateway could not fetch the service's toggles.
    Unavailable { error: String },
    /// Toggle name to enabled flag.
    Toggles(BTreeMap<String, bool>),
}

impl CategoryStatus {
    /// Returns the flag for a toggle, if it was reported.
    pub fn get(&self, key: &str) -> Option<bool> {
        match self {
            CategoryStatus::Toggles(toggles) => toggles.get(key).copied(),
            CategoryStatus::Unavailable { .. } => None,
        }
    }
}

/// Body of `GET /api/gateway/config/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigStatus {
    pub fina: CategoryStatus,
    pub carrier: CategoryStatus,
}

impl ConfigStatus {
    /// Returns the flag for a toggle, if its service reported it.
    pub fn is_enabled(&self, toggle: FaultToggle) -> Option<bool> {
        let status = match toggle.category() {
            FaultCategory::Fina => &self.fina,
            FaultCategory::Carrier => &self.carrier,
        };
        status.get(toggle.status_key())
    }
}

/// Acknowledgement returned after setting a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleAck {
    pub setting: String,
    pub enabled: bool,
    #[serde(default)]
    pub message: Option<String>,
}
