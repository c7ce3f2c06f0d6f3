//! Capital ledger service
//!
//! The ledger is a single row. Every mutation locks it, applies the change
//! through [`ModalUtama`] and writes the whole document back, so `sisa_modal`
//! is recomputed on every save and history entries are only ever appended.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{types::Json, FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{
    validate_recipe, BiayaOperasional, ModalUtama, ResepProduk, RiwayatModal,
};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ModalService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ModalRow {
    total_modal: Decimal,
    bahan_baku: Json<Vec<ResepProduk>>,
    biaya_operasional: Json<Vec<BiayaOperasional>>,
    sisa_modal: Decimal,
    riwayat: Json<Vec<RiwayatModal>>,
}

impl From<ModalRow> for ModalUtama {
    fn from(row: ModalRow) -> Self {
        ModalUtama {
            total_modal: row.total_modal,
            bahan_baku: row.bahan_baku.0,
            biaya_operasional: row.biaya_operasional.0,
            sisa_modal: row.sisa_modal,
            riwayat: row.riwayat.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CapitalInput {
    pub jumlah: Decimal,
    pub keterangan: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseInput {
    pub tanggal: Option<NaiveDate>,
    pub keterangan: String,
    pub jumlah: Decimal,
}

const MODAL_COLUMNS: &str = "total_modal, bahan_baku, biaya_operasional, sisa_modal, riwayat";

impl ModalService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find(&self) -> AppResult<Option<ModalUtama>> {
        let row = sqlx::query_as::<_, ModalRow>(&format!(
            "SELECT {MODAL_COLUMNS} FROM modal_utama WHERE id = TRUE"
        ))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(ModalUtama::from))
    }

    /// The ledger, or an empty one before the first mutation
    pub async fn get(&self) -> AppResult<ModalUtama> {
        Ok(self.find().await?.unwrap_or_default())
    }

    pub async fn add_capital(&self, input: CapitalInput) -> AppResult<ModalUtama> {
        let keterangan = input.keterangan.unwrap_or_else(|| "Tambah modal".to_string());
        self.mutate(|ledger| {
            ledger.add_capital(input.jumlah, &keterangan, Utc::now())?;
            Ok(())
        })
        .await
    }

    pub async fn withdraw_capital(&self, input: CapitalInput) -> AppResult<ModalUtama> {
        let keterangan = input.keterangan.unwrap_or_else(|| "Tarik modal".to_string());
        self.mutate(|ledger| {
            ledger.withdraw_capital(input.jumlah, &keterangan, Utc::now())?;
            Ok(())
        })
        .await
    }

    pub async fn record_expense(&self, input: ExpenseInput) -> AppResult<ModalUtama> {
        if input.keterangan.trim().is_empty() {
            return Err(AppError::validation("keterangan", "Description is required"));
        }
        let expense = BiayaOperasional {
            id: Uuid::new_v4(),
            tanggal: input.tanggal.unwrap_or_else(|| chrono::Local::now().date_naive()),
            keterangan: input.keterangan.trim().to_string(),
            jumlah: input.jumlah,
        };
        self.mutate(|ledger| {
            ledger.record_expense(expense, Utc::now())?;
            Ok(())
        })
        .await
    }

    pub async fn upsert_recipe(&self, resep: ResepProduk) -> AppResult<ModalUtama> {
        validate_recipe(&resep).map_err(|e| AppError::validation("bahan", e))?;
        self.mutate(|ledger| Ok(ledger.upsert_recipe(resep)?)).await
    }

    pub async fn delete_recipe(&self, nama_produk: &str) -> AppResult<ModalUtama> {
        self.mutate(|ledger| {
            if ledger.remove_recipe(nama_produk) {
                Ok(())
            } else {
                Err(AppError::NotFound("Resep".to_string()))
            }
        })
        .await
    }

    /// Lock the ledger (creating it empty if absent), apply `f`, save
    async fn mutate<F>(&self, f: F) -> AppResult<ModalUtama>
    where
        F: FnOnce(&mut ModalUtama) -> AppResult<()>,
    {
        let mut tx = self.db.begin().await?;

        sqlx::query("INSERT INTO modal_utama (id) VALUES (TRUE) ON CONFLICT (id) DO NOTHING")
            .execute(&mut *tx)
            .await?;
        let mut ledger = lock_ledger(&mut tx).await?.ok_or(AppError::LedgerMissing)?;

        f(&mut ledger)?;
        ledger.recompute_sisa();

        let row = sqlx::query_as::<_, ModalRow>(&format!(
            r#"
            UPDATE modal_utama SET
                total_modal = $1, bahan_baku = $2, biaya_operasional = $3,
                sisa_modal = $4, riwayat = $5, updated_at = NOW()
            WHERE id = TRUE
            RETURNING {MODAL_COLUMNS}
            "#
        ))
        .bind(ledger.total_modal)
        .bind(Json(&ledger.bahan_baku))
        .bind(Json(&ledger.biaya_operasional))
        .bind(ledger.sisa_modal)
        .bind(Json(&ledger.riwayat))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let ledger = ModalUtama::from(row);
        tracing::debug!(sisa_modal = %ledger.sisa_modal, "Capital ledger saved");
        Ok(ledger)
    }
}

/// Read the ledger under a row lock held until the transaction ends
pub(crate) async fn lock_ledger(
    tx: &mut Transaction<'_, Postgres>,
) -> AppResult<Option<ModalUtama>> {
    let row = sqlx::query_as::<_, ModalRow>(&format!(
        "SELECT {MODAL_COLUMNS} FROM modal_utama WHERE id = TRUE FOR UPDATE"
    ))
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(ModalUtama::from))
}
