//! Daily cost-of-goods-sold rollup
//!
//! One document per calendar day. Every completed sale upserts its lines into
//! the day's product array and the day totals are re-summed, so the document
//! is always a live running total.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::same_name;

/// Per-product line of a day's rollup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HppProduk {
    pub nama_produk: String,
    pub jumlah_terjual: i64,
    pub hpp_per_porsi: Decimal,
    pub hpp_total: Decimal,
    pub pendapatan: Decimal,
    pub laba_kotor: Decimal,
}

/// The daily rollup document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HppHarian {
    pub tanggal: NaiveDate,
    pub produk: Vec<HppProduk>,
    pub total_hpp: Decimal,
    pub total_pendapatan: Decimal,
    pub total_laba_kotor: Decimal,
    pub total_beban: Decimal,
    pub laba_bersih: Decimal,
}

/// A sold line fed into the rollup, with its recipe cost resolved
#[derive(Debug, Clone, PartialEq)]
pub struct HppEntry {
    pub nama_produk: String,
    pub jumlah: i32,
    pub harga_satuan: Decimal,
    pub hpp_per_porsi: Decimal,
}

impl HppEntry {
    pub fn hpp_total(&self) -> Decimal {
        self.hpp_per_porsi * Decimal::from(self.jumlah)
    }

    pub fn pendapatan(&self) -> Decimal {
        self.harga_satuan * Decimal::from(self.jumlah)
    }
}

impl HppHarian {
    pub fn new(tanggal: NaiveDate) -> Self {
        Self {
            tanggal,
            produk: Vec::new(),
            total_hpp: Decimal::ZERO,
            total_pendapatan: Decimal::ZERO,
            total_laba_kotor: Decimal::ZERO,
            total_beban: Decimal::ZERO,
            laba_bersih: Decimal::ZERO,
        }
    }

    /// Add a sold line: increment the matching product line (name match is
    /// case and whitespace insensitive) or append a new one.
    pub fn record(&mut self, entry: &HppEntry) {
        let hpp_total = entry.hpp_total();
        let pendapatan = entry.pendapatan();

        match self
            .produk
            .iter_mut()
            .find(|p| same_name(&p.nama_produk, &entry.nama_produk))
        {
            Some(line) => {
                line.jumlah_terjual += entry.jumlah as i64;
                line.hpp_per_porsi = entry.hpp_per_porsi;
                line.hpp_total += hpp_total;
                line.pendapatan += pendapatan;
                line.laba_kotor = line.pendapatan - line.hpp_total;
            }
            None => self.produk.push(HppProduk {
                nama_produk: entry.nama_produk.trim().to_string(),
                jumlah_terjual: entry.jumlah as i64,
                hpp_per_porsi: entry.hpp_per_porsi,
                hpp_total,
                pendapatan,
                laba_kotor: pendapatan - hpp_total,
            }),
        }
    }

    /// Re-sum the day totals from the product lines.
    ///
    /// `total_beban = service_fee_persen / 100 × total_pendapatan + beban_operasional`
    pub fn recompute_totals(&mut self, service_fee_persen: Decimal, beban_operasional: Decimal) {
        self.total_hpp = self.produk.iter().map(|p| p.hpp_total).sum();
        self.total_pendapatan = self.produk.iter().map(|p| p.pendapatan).sum();
        self.total_laba_kotor = self.produk.iter().map(|p| p.laba_kotor).sum();
        self.total_beban =
            (service_fee_persen / Decimal::ONE_HUNDRED * self.total_pendapatan).round_dp(2) + beban_operasional;
        self.laba_bersih = self.total_laba_kotor - self.total_beban;
    }

    /// Record a batch of lines and re-sum
    pub fn apply_sale(
        &mut self,
        entries: &[HppEntry],
        service_fee_persen: Decimal,
        beban_operasional: Decimal,
    ) {
        for entry in entries {
            self.record(entry);
        }
        self.recompute_totals(service_fee_persen, beban_operasional);
    }

    /// Whether the totals equal the sums of the product lines
    pub fn totals_consistent(&self) -> bool {
        self.total_hpp == self.produk.iter().map(|p| p.hpp_total).sum::<Decimal>()
            && self.total_pendapatan == self.produk.iter().map(|p| p.pendapatan).sum::<Decimal>()
            && self.total_laba_kotor == self.produk.iter().map(|p| p.laba_kotor).sum::<Decimal>()
    }
}

/// Sum several days into one summary
pub fn sum_days(days: &[HppHarian]) -> HppSummary {
    HppSummary {
        hari: days.len(),
        total_hpp: days.iter().map(|d| d.total_hpp).sum(),
        total_pendapatan: days.iter().map(|d| d.total_pendapatan).sum(),
        total_laba_kotor: days.iter().map(|d| d.total_laba_kotor).sum(),
        total_beban: days.iter().map(|d| d.total_beban).sum(),
        laba_bersih: days.iter().map(|d| d.laba_bersih).sum(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HppSummary {
    pub hari: usize,
    pub total_hpp: Decimal,
    pub total_pendapatan: Decimal,
    pub total_laba_kotor: Decimal,
    pub total_beban: Decimal,
    pub laba_bersih: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn entry(nama: &str, jumlah: i32, harga: &str, hpp: &str) -> HppEntry {
        HppEntry {
            nama_produk: nama.to_string(),
            jumlah,
            harga_satuan: dec(harga),
            hpp_per_porsi: dec(hpp),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_new_line_appended() {
        let mut day = HppHarian::new(today());
        day.apply_sale(&[entry("Udang Crispy", 2, "15000", "9000")], Decimal::ZERO, Decimal::ZERO);

        assert_eq!(day.produk.len(), 1);
        let line = &day.produk[0];
        assert_eq!(line.nama_produk, "Udang Crispy");
        assert_eq!(line.jumlah_terjual, 2);
        assert_eq!(line.hpp_total, dec("18000"));
        assert_eq!(line.pendapatan, dec("30000"));
        assert_eq!(line.laba_kotor, dec("12000"));
        assert_eq!(day.laba_bersih, dec("12000"));
    }

    #[test]
    fn test_existing_line_incremented_by_normalized_name() {
        let mut day = HppHarian::new(today());
        day.apply_sale(&[entry("Udang Crispy", 2, "15000", "9000")], Decimal::ZERO, Decimal::ZERO);
        day.apply_sale(&[entry(" udang  CRISPY", 3, "15000", "9000")], Decimal::ZERO, Decimal::ZERO);

        assert_eq!(day.produk.len(), 1);
        assert_eq!(day.produk[0].jumlah_terjual, 5);
        assert_eq!(day.total_pendapatan, dec("75000"));
        assert_eq!(day.total_hpp, dec("45000"));
        assert!(day.totals_consistent());
    }

    #[test]
    fn test_beban_and_laba_bersih() {
        let mut day = HppHarian::new(today());
        day.apply_sale(
            &[
                entry("Udang Crispy", 2, "15000", "9000"),
                entry("Es Teh", 4, "5000", "1000"),
            ],
            dec("2"),
            dec("10000"),
        );
        // pendapatan 50000, hpp 22000, laba kotor 28000
        // beban = 2% * 50000 + 10000 = 11000
        assert_eq!(day.total_pendapatan, dec("50000"));
        assert_eq!(day.total_laba_kotor, dec("28000"));
        assert_eq!(day.total_beban, dec("11000"));
        assert_eq!(day.laba_bersih, dec("17000"));
    }

    #[test]
    fn test_sum_days() {
        let mut a = HppHarian::new(today());
        a.apply_sale(&[entry("A", 1, "10000", "4000")], Decimal::ZERO, Decimal::ZERO);
        let mut b = HppHarian::new(today().succ_opt().unwrap());
        b.apply_sale(&[entry("B", 2, "10000", "4000")], Decimal::ZERO, Decimal::ZERO);

        let summary = sum_days(&[a, b]);
        assert_eq!(summary.hari, 2);
        assert_eq!(summary.total_pendapatan, dec("30000"));
        assert_eq!(summary.laba_bersih, dec("18000"));
    }
}
