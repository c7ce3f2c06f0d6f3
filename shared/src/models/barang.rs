//! Catalog goods

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BahanItem;
use crate::pricing::{effective_unit_price, harga_final, harga_jual_from_margin, PriceAdjustments, PricingError};

/// A sellable finished good
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barang {
    pub id: Uuid,
    pub kode_barang: String,
    pub nama_barang: String,
    pub kategori: Option<String>,
    pub harga_beli: Decimal,
    pub harga_jual: Decimal,
    #[serde(rename = "hargaFinal")]
    pub harga_final: Decimal,
    pub stok: i32,
    pub stok_minimal: i32,
    /// Margin on price, in percent
    pub margin: Decimal,
    pub bahan_baku: Vec<BahanItem>,
    pub status: BarangStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Barang {
    /// Price charged per unit at the till
    pub fn unit_price(&self) -> Decimal {
        effective_unit_price(self.harga_jual, self.harga_final)
    }

    pub fn is_low_stock(&self) -> bool {
        crate::stock::is_low_stock(self.stok, self.stok_minimal)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BarangStatus {
    #[default]
    Aktif,
    Nonaktif,
}

impl BarangStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarangStatus::Aktif => "aktif",
            BarangStatus::Nonaktif => "nonaktif",
        }
    }
}

impl std::str::FromStr for BarangStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aktif" => Ok(BarangStatus::Aktif),
            "nonaktif" => Ok(BarangStatus::Nonaktif),
            other => Err(format!("Unknown barang status: {}", other)),
        }
    }
}

/// Prices for a good derived from its cost per portion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedPrices {
    pub harga_beli: Decimal,
    pub harga_jual: Decimal,
    pub harga_final: Decimal,
}

/// Price a new good from its cost, margin, and the shop's adjustments
pub fn derive_prices(
    modal_per_porsi: Decimal,
    margin_persen: Decimal,
    adjustments: &PriceAdjustments,
) -> Result<DerivedPrices, PricingError> {
    let harga_jual = harga_jual_from_margin(modal_per_porsi, margin_persen)?;
    Ok(DerivedPrices {
        harga_beli: crate::pricing::round_rupiah(modal_per_porsi),
        harga_jual,
        harga_final: harga_final(harga_jual, adjustments),
    })
}

/// Catalog code for a good created by production approval
pub fn generate_kode_barang(sequence: i64) -> String {
    format!("BRG{:03}", sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_generate_kode_barang() {
        assert_eq!(generate_kode_barang(1), "BRG001");
        assert_eq!(generate_kode_barang(1234), "BRG1234");
    }

    #[test]
    fn test_derive_prices() {
        let adj = PriceAdjustments {
            pajak_persen: dec("10"),
            ..Default::default()
        };
        let prices = derive_prices(dec("9000"), dec("40"), &adj).unwrap();
        assert_eq!(prices.harga_beli, dec("9000"));
        assert_eq!(prices.harga_jual, dec("15000"));
        assert_eq!(prices.harga_final, dec("16500"));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("aktif".parse::<BarangStatus>().unwrap(), BarangStatus::Aktif);
        assert!("habis".parse::<BarangStatus>().is_err());
    }
}
