//! Capital ledger tests
//!
//! - sisa_modal follows total_modal minus recipe and operating costs
//! - Withdrawals cannot exceed the remaining capital
//! - History is append-only with the balance after each movement

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{BahanItem, BiayaOperasional, LedgerError, ModalUtama, ResepProduk, TipeRiwayat};
use std::str::FromStr;
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn expense(tanggal: NaiveDate, jumlah: &str) -> BiayaOperasional {
    BiayaOperasional {
        id: Uuid::new_v4(),
        tanggal,
        keterangan: "Gas LPG".to_string(),
        jumlah: dec(jumlah),
    }
}

fn recipe(nama: &str, harga: &str) -> ResepProduk {
    ResepProduk {
        nama_produk: nama.to_string(),
        jumlah_porsi: 10,
        bahan: vec![BahanItem {
            nama: "Udang".to_string(),
            harga: dec(harga),
            jumlah: dec("1"),
        }],
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_add_capital() {
        let mut ledger = ModalUtama::default();
        let entry = ledger.add_capital(dec("1000000"), "Setoran awal", Utc::now()).unwrap();

        assert_eq!(entry.tipe, TipeRiwayat::Masuk);
        assert_eq!(entry.saldo_setelah, dec("1000000"));
        assert_eq!(ledger.sisa_modal, dec("1000000"));
    }

    #[test]
    fn test_expense_reduces_remaining() {
        let mut ledger = ModalUtama::default();
        ledger.add_capital(dec("500000"), "Setoran", Utc::now()).unwrap();
        let tanggal = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        ledger.record_expense(expense(tanggal, "75000"), Utc::now()).unwrap();

        assert_eq!(ledger.total_modal, dec("500000"));
        assert_eq!(ledger.sisa_modal, dec("425000"));
        assert_eq!(ledger.operational_expenses_on(tanggal), dec("75000"));
        assert_eq!(ledger.riwayat.len(), 2);
        assert_eq!(ledger.riwayat[1].tipe, TipeRiwayat::Keluar);
    }

    #[test]
    fn test_withdraw_more_than_remaining() {
        let mut ledger = ModalUtama::default();
        ledger.add_capital(dec("100000"), "Setoran", Utc::now()).unwrap();

        let err = ledger.withdraw_capital(dec("150000"), "Tarik", Utc::now()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientCapital {
                remaining: dec("100000"),
                requested: dec("150000"),
            }
        );
        assert_eq!(ledger.riwayat.len(), 1);
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let mut ledger = ModalUtama::default();
        assert_eq!(
            ledger.add_capital(Decimal::ZERO, "Nol", Utc::now()).unwrap_err(),
            LedgerError::NonPositiveAmount
        );
        assert_eq!(
            ledger.withdraw_capital(dec("-5"), "Minus", Utc::now()).unwrap_err(),
            LedgerError::NonPositiveAmount
        );
    }

    #[test]
    fn test_recipe_upsert_replaces_by_name() {
        let mut ledger = ModalUtama::default();
        ledger.add_capital(dec("100000"), "Setoran", Utc::now()).unwrap();
        ledger.upsert_recipe(recipe("Udang Crispy", "20000")).unwrap();
        ledger.upsert_recipe(recipe("udang  crispy", "30000")).unwrap();

        assert_eq!(ledger.bahan_baku.len(), 1);
        assert_eq!(ledger.sisa_modal, dec("70000"));
        assert_eq!(
            ledger.find_recipe("UDANG CRISPY").map(|r| r.modal_per_porsi()),
            Some(dec("3000"))
        );
    }

    #[test]
    fn test_remove_recipe_restores_remaining() {
        let mut ledger = ModalUtama::default();
        ledger.add_capital(dec("100000"), "Setoran", Utc::now()).unwrap();
        ledger.upsert_recipe(recipe("Es Teh", "10000")).unwrap();

        assert!(ledger.remove_recipe("es teh"));
        assert!(!ledger.remove_recipe("es teh"));
        assert_eq!(ledger.sisa_modal, dec("100000"));
    }

    #[test]
    fn test_recipe_requires_name_and_portions() {
        let mut ledger = ModalUtama::default();
        assert_eq!(
            ledger.upsert_recipe(recipe("  ", "1000")),
            Err(LedgerError::EmptyRecipeName)
        );
        let mut zero = recipe("Es Teh", "1000");
        zero.jumlah_porsi = 0;
        assert_eq!(ledger.upsert_recipe(zero), Err(LedgerError::InvalidPortions));
    }
}

proptest! {
    /// After any mix of movements the balance identity holds and every
    /// history entry records the balance at that point
    #[test]
    fn prop_balance_identity(
        moves in prop::collection::vec((any::<bool>(), 1i64..500_000), 1..30),
        expenses in prop::collection::vec(1i64..50_000, 0..5),
    ) {
        let mut ledger = ModalUtama::default();
        let tanggal = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        for (masuk, jumlah) in moves {
            let jumlah = Decimal::from(jumlah);
            let _ = if masuk {
                ledger.add_capital(jumlah, "Setoran", Utc::now()).map(|_| ())
            } else {
                ledger.withdraw_capital(jumlah, "Tarik", Utc::now()).map(|_| ())
            };
        }
        for jumlah in expenses {
            let _ = ledger.record_expense(expense(tanggal, &jumlah.to_string()), Utc::now());
        }

        prop_assert_eq!(
            ledger.sisa_modal,
            ledger.total_modal - ledger.total_biaya_bahan() - ledger.total_biaya_operasional()
        );
        prop_assert!(ledger.total_modal >= Decimal::ZERO);
        if let Some(last) = ledger.riwayat.last() {
            prop_assert_eq!(last.saldo_setelah, ledger.sisa_modal);
        }
    }
}
