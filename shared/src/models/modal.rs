//! Capital ledger: master recipes, operational expenses, and the capital
//! in/out history with its running balance.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::BahanItem;
use crate::types::same_name;

/// Master recipe: product name and the ingredients of one batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResepProduk {
    pub nama_produk: String,
    /// Portions one batch yields
    pub jumlah_porsi: i32,
    pub bahan: Vec<BahanItem>,
}

impl ResepProduk {
    /// Cost of one batch
    pub fn total_biaya(&self) -> Decimal {
        self.bahan.iter().map(BahanItem::subtotal).sum()
    }

    /// Cost of one portion. A recipe without a portion count is one portion.
    pub fn modal_per_porsi(&self) -> Decimal {
        let porsi = self.jumlah_porsi.max(1);
        (self.total_biaya() / Decimal::from(porsi)).round_dp(2)
    }

    /// Portions yielded by `batches` batches
    pub fn yield_for(&self, batches: i32) -> i32 {
        self.jumlah_porsi.max(1).saturating_mul(batches.max(0))
    }
}

/// An operational expense
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BiayaOperasional {
    pub id: Uuid,
    pub tanggal: NaiveDate,
    pub keterangan: String,
    pub jumlah: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TipeRiwayat {
    Masuk,
    Keluar,
}

/// One capital movement. Entries are appended and never changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiwayatModal {
    pub tanggal: DateTime<Utc>,
    pub keterangan: String,
    pub tipe: TipeRiwayat,
    pub jumlah: Decimal,
    pub saldo_setelah: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("insufficient capital: remaining {remaining}, requested {requested}")]
    InsufficientCapital { remaining: Decimal, requested: Decimal },

    #[error("recipe name is required")]
    EmptyRecipeName,

    #[error("recipe portions must be positive")]
    InvalidPortions,
}

/// The capital ledger document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModalUtama {
    pub total_modal: Decimal,
    pub bahan_baku: Vec<ResepProduk>,
    pub biaya_operasional: Vec<BiayaOperasional>,
    pub sisa_modal: Decimal,
    pub riwayat: Vec<RiwayatModal>,
}

impl ModalUtama {
    pub fn total_biaya_bahan(&self) -> Decimal {
        self.bahan_baku.iter().map(ResepProduk::total_biaya).sum()
    }

    pub fn total_biaya_operasional(&self) -> Decimal {
        self.biaya_operasional.iter().map(|b| b.jumlah).sum()
    }

    /// `sisa_modal = total_modal - Σ recipe cost - Σ operational cost`
    pub fn recompute_sisa(&mut self) {
        self.sisa_modal = self.total_modal - self.total_biaya_bahan() - self.total_biaya_operasional();
    }

    pub fn find_recipe(&self, nama_produk: &str) -> Option<&ResepProduk> {
        self.bahan_baku
            .iter()
            .find(|r| same_name(&r.nama_produk, nama_produk))
    }

    /// Sum of operational expenses dated `date`
    pub fn operational_expenses_on(&self, date: NaiveDate) -> Decimal {
        self.biaya_operasional
            .iter()
            .filter(|b| b.tanggal == date)
            .map(|b| b.jumlah)
            .sum()
    }

    pub fn add_capital(
        &mut self,
        jumlah: Decimal,
        keterangan: &str,
        now: DateTime<Utc>,
    ) -> Result<&RiwayatModal, LedgerError> {
        if jumlah <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount);
        }
        self.total_modal += jumlah;
        self.recompute_sisa();
        Ok(self.append_history(now, keterangan, TipeRiwayat::Masuk, jumlah))
    }

    pub fn withdraw_capital(
        &mut self,
        jumlah: Decimal,
        keterangan: &str,
        now: DateTime<Utc>,
    ) -> Result<&RiwayatModal, LedgerError> {
        if jumlah <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount);
        }
        self.recompute_sisa();
        if jumlah > self.sisa_modal {
            return Err(LedgerError::InsufficientCapital {
                remaining: self.sisa_modal,
                requested: jumlah,
            });
        }
        self.total_modal -= jumlah;
        self.recompute_sisa();
        Ok(self.append_history(now, keterangan, TipeRiwayat::Keluar, jumlah))
    }

    /// Record an operational expense and its capital outflow
    pub fn record_expense(
        &mut self,
        expense: BiayaOperasional,
        now: DateTime<Utc>,
    ) -> Result<&RiwayatModal, LedgerError> {
        if expense.jumlah <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount);
        }
        let jumlah = expense.jumlah;
        let keterangan = format!("Biaya operasional: {}", expense.keterangan);
        self.biaya_operasional.push(expense);
        self.recompute_sisa();
        Ok(self.append_history(now, &keterangan, TipeRiwayat::Keluar, jumlah))
    }

    /// Insert a recipe or replace the one with the same product name
    pub fn upsert_recipe(&mut self, resep: ResepProduk) -> Result<(), LedgerError> {
        if resep.nama_produk.trim().is_empty() {
            return Err(LedgerError::EmptyRecipeName);
        }
        if resep.jumlah_porsi <= 0 {
            return Err(LedgerError::InvalidPortions);
        }
        match self
            .bahan_baku
            .iter_mut()
            .find(|r| same_name(&r.nama_produk, &resep.nama_produk))
        {
            Some(existing) => *existing = resep,
            None => self.bahan_baku.push(resep),
        }
        self.recompute_sisa();
        Ok(())
    }

    pub fn remove_recipe(&mut self, nama_produk: &str) -> bool {
        let before = self.bahan_baku.len();
        self.bahan_baku.retain(|r| !same_name(&r.nama_produk, nama_produk));
        let removed = self.bahan_baku.len() != before;
        if removed {
            self.recompute_sisa();
        }
        removed
    }

    fn append_history(
        &mut self,
        tanggal: DateTime<Utc>,
        keterangan: &str,
        tipe: TipeRiwayat,
        jumlah: Decimal,
    ) -> &RiwayatModal {
        self.riwayat.push(RiwayatModal {
            tanggal,
            keterangan: keterangan.to_string(),
            tipe,
            jumlah,
            saldo_setelah: self.sisa_modal,
        });
        // just pushed
        &self.riwayat[self.riwayat.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn resep(nama: &str, porsi: i32) -> ResepProduk {
        ResepProduk {
            nama_produk: nama.to_string(),
            jumlah_porsi: porsi,
            bahan: vec![
                BahanItem {
                    nama: "Udang".to_string(),
                    harga: dec("40000"),
                    jumlah: dec("2"),
                },
                BahanItem {
                    nama: "Tepung".to_string(),
                    harga: dec("10000"),
                    jumlah: dec("1"),
                },
            ],
        }
    }

    #[test]
    fn test_recipe_costs() {
        let r = resep("Udang Crispy", 10);
        assert_eq!(r.total_biaya(), dec("90000"));
        assert_eq!(r.modal_per_porsi(), dec("9000"));
        assert_eq!(r.yield_for(3), 30);
        assert_eq!(resep("X", 0).modal_per_porsi(), dec("90000"));
    }

    #[test]
    fn test_sisa_modal_recomputed() {
        let mut ledger = ModalUtama::default();
        let now = Utc::now();
        ledger.add_capital(dec("1000000"), "Modal awal", now).unwrap();
        ledger.upsert_recipe(resep("Udang Crispy", 10)).unwrap();
        ledger
            .record_expense(
                BiayaOperasional {
                    id: Uuid::new_v4(),
                    tanggal: now.date_naive(),
                    keterangan: "Gas".to_string(),
                    jumlah: dec("25000"),
                },
                now,
            )
            .unwrap();

        assert_eq!(ledger.sisa_modal, dec("885000"));
        assert_eq!(ledger.riwayat.len(), 2);
        assert_eq!(ledger.riwayat[0].saldo_setelah, dec("1000000"));
        assert_eq!(ledger.riwayat[1].tipe, TipeRiwayat::Keluar);
        assert_eq!(ledger.riwayat[1].saldo_setelah, dec("885000"));
        assert_eq!(ledger.operational_expenses_on(now.date_naive()), dec("25000"));
    }

    #[test]
    fn test_upsert_recipe_replaces_by_name() {
        let mut ledger = ModalUtama::default();
        ledger.upsert_recipe(resep("Udang Crispy", 10)).unwrap();
        ledger.upsert_recipe(resep("  udang crispy ", 5)).unwrap();
        assert_eq!(ledger.bahan_baku.len(), 1);
        assert_eq!(ledger.find_recipe("UDANG CRISPY").unwrap().jumlah_porsi, 5);
        assert!(ledger.remove_recipe("Udang Crispy"));
        assert!(!ledger.remove_recipe("Udang Crispy"));
    }

    #[test]
    fn test_withdraw_rejects_more_than_remaining() {
        let mut ledger = ModalUtama::default();
        let now = Utc::now();
        ledger.add_capital(dec("100000"), "Modal awal", now).unwrap();
        assert!(matches!(
            ledger.withdraw_capital(dec("200000"), "Tarik", now),
            Err(LedgerError::InsufficientCapital { .. })
        ));
        ledger.withdraw_capital(dec("40000"), "Tarik", now).unwrap();
        assert_eq!(ledger.sisa_modal, dec("60000"));
        assert_eq!(ledger.riwayat.len(), 2);
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        let mut ledger = ModalUtama::default();
        assert_eq!(
            ledger.add_capital(Decimal::ZERO, "x", Utc::now()).unwrap_err(),
            LedgerError::NonPositiveAmount
        );
        assert!(ledger.riwayat.is_empty());
    }
}
