//! Production records: a chef's claim on a raw-material lot, resolved by
//! approval or cancellation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A production record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Production {
    pub id: Uuid,
    pub bahan_baku_id: Uuid,
    pub chef_id: Uuid,
    pub jumlah_diproses: i32,
    pub status: ProductionStatus,
    pub waktu_mulai: Option<DateTime<Utc>>,
    pub waktu_selesai: Option<DateTime<Utc>>,
    pub catatan: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Production status. `Approved` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    Pending,
    Approved,
    Cancelled,
}

impl ProductionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionStatus::Pending => "pending",
            ProductionStatus::Approved => "approved",
            ProductionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProductionStatus::Pending)
    }

    pub fn can_transition_to(&self, next: ProductionStatus) -> bool {
        matches!(
            (self, next),
            (ProductionStatus::Pending, ProductionStatus::Approved)
                | (ProductionStatus::Pending, ProductionStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for ProductionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProductionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProductionStatus::Pending),
            "approved" => Ok(ProductionStatus::Approved),
            "cancelled" => Ok(ProductionStatus::Cancelled),
            other => Err(format!("Unknown production status: {}", other)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("production cannot move from {from} to {to}")]
pub struct ProductionTransitionError {
    pub from: ProductionStatus,
    pub to: ProductionStatus,
}

/// Validate a status change
pub fn transition(
    from: ProductionStatus,
    to: ProductionStatus,
) -> Result<ProductionStatus, ProductionTransitionError> {
    if from.can_transition_to(to) {
        Ok(to)
    } else {
        Err(ProductionTransitionError { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_resolves_once() {
        assert_eq!(
            transition(ProductionStatus::Pending, ProductionStatus::Approved),
            Ok(ProductionStatus::Approved)
        );
        assert_eq!(
            transition(ProductionStatus::Pending, ProductionStatus::Cancelled),
            Ok(ProductionStatus::Cancelled)
        );
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [ProductionStatus::Approved, ProductionStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in [
                ProductionStatus::Pending,
                ProductionStatus::Approved,
                ProductionStatus::Cancelled,
            ] {
                assert!(transition(from, to).is_err());
            }
        }
    }

    #[test]
    fn test_pending_to_pending_rejected() {
        assert!(transition(ProductionStatus::Pending, ProductionStatus::Pending).is_err());
    }
}
