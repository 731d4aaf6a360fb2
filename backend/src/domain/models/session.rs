//! Domain model for a parking session.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::VehicleType;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::payment::PaymentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    PendingPayment,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::PendingPayment => "pending_payment",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "pending_payment" => Ok(SessionStatus::PendingPayment),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            other => Err(anyhow::anyhow!("unknown session status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub area_id: String,
    pub attendant_id: Option<String>,
    /// Token presented at check-in, used for token-scoped check-out lookups
    pub token: Option<String>,
    pub vehicle_type: VehicleType,
    pub plate_number: Option<String>,
    pub is_manual: bool,
    pub checkin_time: DateTime<Utc>,
    pub checkout_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub total_cost: Option<f64>,
    pub payment_status: PaymentStatus,
    pub status: SessionStatus,
}

impl Session {
    pub fn generate_id() -> String {
        format!("session::{}", Uuid::new_v4())
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active && self.checkout_time.is_none()
    }

    /// Whole minutes between check-in and `until`, clamped at zero
    pub fn elapsed_minutes(&self, until: DateTime<Utc>) -> i64 {
        (until - self.checkin_time).num_minutes().max(0)
    }

    /// Sets every terminal field at once
    pub fn complete(&mut self, checkout_time: DateTime<Utc>, total_cost: f64) {
        self.duration_minutes = Some(self.elapsed_minutes(checkout_time));
        self.checkout_time = Some(checkout_time);
        self.total_cost = Some(total_cost);
        self.payment_status = PaymentStatus::Paid;
        self.status = SessionStatus::Completed;
    }

    /// When the session's money is considered settled for reporting
    pub fn settlement_time(&self) -> DateTime<Utc> {
        self.checkout_time.unwrap_or(self.checkin_time)
    }
}
