//! Stock counter arithmetic shared by the fast-path and primary store paths

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A change to a catalog stock counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "jumlah", rename_all = "snake_case")]
pub enum StockChange {
    /// Conditional decrement, aborts when stock is insufficient
    Decrement(i32),
    Increment(i32),
}

impl StockChange {
    pub fn quantity(&self) -> i32 {
        match self {
            StockChange::Decrement(q) | StockChange::Increment(q) => *q,
        }
    }

    /// Signed delta applied to the counter
    pub fn delta(&self) -> i64 {
        match self {
            StockChange::Decrement(q) => -(*q as i64),
            StockChange::Increment(q) => *q as i64,
        }
    }

    /// The change that undoes this one
    pub fn inverse(&self) -> Self {
        match self {
            StockChange::Decrement(q) => StockChange::Increment(*q),
            StockChange::Increment(q) => StockChange::Decrement(*q),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StockError {
    #[error("insufficient stock: available {available}, requested {requested}")]
    Insufficient { available: i64, requested: i32 },

    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i32),
}

/// One compare-and-swap step: compute the new counter value from the current
/// one, or abort. Never produces a negative value.
pub fn apply_change(current: i64, change: StockChange) -> Result<i64, StockError> {
    let quantity = change.quantity();
    if quantity <= 0 {
        return Err(StockError::InvalidQuantity(quantity));
    }
    match change {
        StockChange::Decrement(q) => {
            if current < q as i64 {
                Err(StockError::Insufficient {
                    available: current,
                    requested: q,
                })
            } else {
                Ok(current - q as i64)
            }
        }
        StockChange::Increment(q) => Ok(current.max(0) + q as i64),
    }
}

/// Whether a stock level is at or under its reorder threshold
pub fn is_low_stock(stok: i32, stok_minimal: i32) -> bool {
    stok <= stok_minimal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrement_with_sufficient_stock() {
        assert_eq!(apply_change(10, StockChange::Decrement(2)), Ok(8));
        assert_eq!(apply_change(2, StockChange::Decrement(2)), Ok(0));
    }

    #[test]
    fn test_decrement_aborts_when_insufficient() {
        assert_eq!(
            apply_change(1, StockChange::Decrement(2)),
            Err(StockError::Insufficient {
                available: 1,
                requested: 2
            })
        );
    }

    #[test]
    fn test_increment() {
        assert_eq!(apply_change(8, StockChange::Increment(2)), Ok(10));
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        assert_eq!(
            apply_change(10, StockChange::Decrement(0)),
            Err(StockError::InvalidQuantity(0))
        );
        assert!(apply_change(10, StockChange::Increment(-3)).is_err());
    }

    #[test]
    fn test_inverse_and_delta() {
        let change = StockChange::Decrement(3);
        assert_eq!(change.delta(), -3);
        assert_eq!(change.inverse(), StockChange::Increment(3));
        assert_eq!(change.inverse().delta(), 3);
    }

    #[test]
    fn test_low_stock() {
        assert!(is_low_stock(5, 5));
        assert!(!is_low_stock(6, 5));
    }
}
