//! Domain model for a parking attendant (jukir).
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendantStatus {
    Pending,
    Active,
    Inactive,
}

impl AttendantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendantStatus::Pending => "pending",
            AttendantStatus::Active => "active",
            AttendantStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for AttendantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendantStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AttendantStatus::Pending),
            "active" => Ok(AttendantStatus::Active),
            "inactive" => Ok(AttendantStatus::Inactive),
            other => Err(anyhow::anyhow!("unknown attendant status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendant {
    pub id: String,
    /// Unique human-facing code printed on the attendant's badge
    pub code: String,
    pub name: String,
    pub area_id: String,
    /// Long-lived credential embedded in the attendant's QR code
    pub token: String,
    pub status: AttendantStatus,
}

impl Attendant {
    pub fn is_active(&self) -> bool {
        self.status == AttendantStatus::Active
    }
}
