//! Domain model for the payment attached to a session.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(anyhow::anyhow!("unknown payment status '{}'", other)),
        }
    }
}

/// Payment row, one per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub session_id: String,
    pub amount: f64,
    pub method: String,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub status: PaymentStatus,
}

impl Payment {
    pub const CASH: &'static str = "cash";

    pub fn generate_id() -> String {
        format!("payment::{}", Uuid::new_v4())
    }

    /// A cash payment collected by `attendant_id` at `at`
    pub fn collected(session_id: &str, amount: f64, attendant_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: Self::generate_id(),
            session_id: session_id.to_string(),
            amount,
            method: Self::CASH.to_string(),
            confirmed_by: Some(attendant_id.to_string()),
            confirmed_at: Some(at),
            status: PaymentStatus::Paid,
        }
    }
}
