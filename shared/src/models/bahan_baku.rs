//! Raw material lots

use chrono::{DateTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stock::StockError;

/// One ingredient line: name, unit cost, quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BahanItem {
    pub nama: String,
    pub harga: Decimal,
    pub jumlah: Decimal,
}

impl BahanItem {
    pub fn subtotal(&self) -> Decimal {
        self.harga * self.jumlah
    }
}

/// A raw-material lot prepared for production
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BahanBaku {
    pub id: Uuid,
    pub nama: String,
    pub bahan: Vec<BahanItem>,
    pub total_stok: Decimal,
    pub total_harga: Decimal,
    pub modal_per_porsi: Decimal,
    /// Set once a production from this lot has been approved
    #[serde(rename = "is_bahan_siapp")]
    pub is_bahan_siap: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values derived from a lot's ingredient lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BahanTotals {
    pub total_stok: Decimal,
    pub total_harga: Decimal,
    pub modal_per_porsi: Decimal,
}

/// `total_stok = Σ jumlah`, `total_harga = Σ harga × jumlah`,
/// `modal_per_porsi = total_harga / total_stok` (zero when there is no stock)
pub fn compute_totals(bahan: &[BahanItem]) -> BahanTotals {
    let total_stok: Decimal = bahan.iter().map(|b| b.jumlah).sum();
    let total_harga: Decimal = bahan.iter().map(BahanItem::subtotal).sum();
    let modal_per_porsi = if total_stok.is_zero() {
        Decimal::ZERO
    } else {
        (total_harga / total_stok).round_dp(2)
    };
    BahanTotals {
        total_stok,
        total_harga,
        modal_per_porsi,
    }
}

/// Remaining stock after a chef claims `jumlah` units. Never below zero.
pub fn claim_quantity(total_stok: Decimal, jumlah: i32) -> Result<Decimal, StockError> {
    if jumlah <= 0 {
        return Err(StockError::InvalidQuantity(jumlah));
    }
    let requested = Decimal::from(jumlah);
    if requested > total_stok {
        return Err(StockError::Insufficient {
            available: total_stok.trunc().to_i64().unwrap_or(0),
            requested: jumlah,
        });
    }
    Ok(total_stok - requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(nama: &str, harga: &str, jumlah: &str) -> BahanItem {
        BahanItem {
            nama: nama.to_string(),
            harga: dec(harga),
            jumlah: dec(jumlah),
        }
    }

    #[test]
    fn test_compute_totals() {
        let totals = compute_totals(&[item("Udang", "3000", "10"), item("Tepung", "500", "10")]);
        assert_eq!(totals.total_stok, dec("20"));
        assert_eq!(totals.total_harga, dec("35000"));
        assert_eq!(totals.modal_per_porsi, dec("1750"));
    }

    #[test]
    fn test_compute_totals_empty() {
        let totals = compute_totals(&[]);
        assert_eq!(totals.total_stok, Decimal::ZERO);
        assert_eq!(totals.modal_per_porsi, Decimal::ZERO);
    }

    #[test]
    fn test_claim_reduces_by_exact_quantity() {
        assert_eq!(claim_quantity(dec("20"), 5).unwrap(), dec("15"));
        assert_eq!(claim_quantity(dec("5"), 5).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_claim_rejects_over_request() {
        assert_eq!(
            claim_quantity(dec("4"), 5),
            Err(StockError::Insufficient {
                available: 4,
                requested: 5
            })
        );
        assert_eq!(claim_quantity(dec("4"), 0), Err(StockError::InvalidQuantity(0)));
    }
}
