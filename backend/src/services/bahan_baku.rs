//! Raw-material lots and the chef's claim

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{claim_quantity, compute_totals, validate_bahan_items, BahanBaku, BahanItem, Production};

use crate::error::{AppError, AppResult};
use crate::services::production::{ProductionRow, PRODUCTION_COLUMNS};

const BAHAN_COLUMNS: &str =
    "id, nama, bahan, total_stok, total_harga, modal_per_porsi, is_bahan_siap, created_at, updated_at";

#[derive(Clone)]
pub struct BahanBakuService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
pub(crate) struct BahanBakuRow {
    id: Uuid,
    nama: String,
    bahan: Json<Vec<BahanItem>>,
    total_stok: Decimal,
    total_harga: Decimal,
    modal_per_porsi: Decimal,
    is_bahan_siap: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BahanBakuRow> for BahanBaku {
    fn from(row: BahanBakuRow) -> Self {
        BahanBaku {
            id: row.id,
            nama: row.nama,
            bahan: row.bahan.0,
            total_stok: row.total_stok,
            total_harga: row.total_harga,
            modal_per_porsi: row.modal_per_porsi,
            is_bahan_siap: row.is_bahan_siap,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BahanBakuInput {
    pub nama: String,
    pub bahan: Vec<BahanItem>,
}

/// Claim request from a chef
#[derive(Debug, Deserialize)]
pub struct ClaimInput {
    pub bahan_baku_id: Uuid,
    pub jumlah: i32,
    pub catatan: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClaimResult {
    pub bahan_baku: BahanBaku,
    pub production: Production,
}

impl BahanBakuService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<BahanBaku>> {
        let rows = sqlx::query_as::<_, BahanBakuRow>(&format!(
            "SELECT {BAHAN_COLUMNS} FROM bahan_baku ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(BahanBaku::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BahanBaku> {
        let row = sqlx::query_as::<_, BahanBakuRow>(&format!(
            "SELECT {BAHAN_COLUMNS} FROM bahan_baku WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bahan baku".to_string()))?;

        Ok(row.into())
    }

    pub async fn create(&self, input: BahanBakuInput) -> AppResult<BahanBaku> {
        validate_input(&input)?;
        let totals = compute_totals(&input.bahan);

        let row = sqlx::query_as::<_, BahanBakuRow>(&format!(
            r#"
            INSERT INTO bahan_baku (nama, bahan, total_stok, total_harga, modal_per_porsi)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BAHAN_COLUMNS}
            "#
        ))
        .bind(input.nama.trim())
        .bind(Json(&input.bahan))
        .bind(totals.total_stok)
        .bind(totals.total_harga)
        .bind(totals.modal_per_porsi)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(nama = %row.nama, total_stok = %row.total_stok, "Bahan baku created");
        Ok(row.into())
    }

    /// Replace the ingredient list; derived totals are recomputed
    pub async fn update(&self, id: Uuid, input: BahanBakuInput) -> AppResult<BahanBaku> {
        validate_input(&input)?;
        let totals = compute_totals(&input.bahan);

        let row = sqlx::query_as::<_, BahanBakuRow>(&format!(
            r#"
            UPDATE bahan_baku SET
                nama = $2, bahan = $3, total_stok = $4, total_harga = $5,
                modal_per_porsi = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {BAHAN_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.nama.trim())
        .bind(Json(&input.bahan))
        .bind(totals.total_stok)
        .bind(totals.total_harga)
        .bind(totals.modal_per_porsi)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bahan baku".to_string()))?;

        Ok(row.into())
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM productions WHERE bahan_baku_id = $1 AND status = 'pending')",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        if in_use {
            return Err(AppError::InvalidStateTransition(
                "raw material has a pending production".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM bahan_baku WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Bahan baku".to_string()));
        }
        Ok(())
    }

    /// Take `jumlah` units out of a lot and open a pending production for the
    /// chef. Both writes commit together.
    pub async fn claim(&self, chef_id: Uuid, input: ClaimInput) -> AppResult<ClaimResult> {
        let mut tx = self.db.begin().await?;

        let current = lock_lot(&mut tx, input.bahan_baku_id).await?;
        let remaining = claim_quantity(current.total_stok, input.jumlah)?;

        let row = sqlx::query_as::<_, BahanBakuRow>(&format!(
            r#"
            UPDATE bahan_baku SET total_stok = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {BAHAN_COLUMNS}
            "#
        ))
        .bind(input.bahan_baku_id)
        .bind(remaining)
        .fetch_one(&mut *tx)
        .await?;

        let production = sqlx::query_as::<_, ProductionRow>(&format!(
            r#"
            INSERT INTO productions (bahan_baku_id, chef_id, jumlah_diproses, status, catatan)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING {PRODUCTION_COLUMNS}
            "#
        ))
        .bind(input.bahan_baku_id)
        .bind(chef_id)
        .bind(input.jumlah)
        .bind(&input.catatan)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let production = Production::try_from(production)?;
        tracing::info!(
            bahan_baku_id = %input.bahan_baku_id,
            production_id = %production.id,
            jumlah = input.jumlah,
            "Raw material claimed"
        );

        Ok(ClaimResult {
            bahan_baku: row.into(),
            production,
        })
    }
}

/// Read a lot and hold its row lock for the rest of the transaction
pub(crate) async fn lock_lot(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> AppResult<BahanBaku> {
    let row = sqlx::query_as::<_, BahanBakuRow>(&format!(
        "SELECT {BAHAN_COLUMNS} FROM bahan_baku WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Bahan baku".to_string()))?;

    Ok(row.into())
}

pub(crate) async fn mark_prepared(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE bahan_baku SET is_bahan_siap = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn validate_input(input: &BahanBakuInput) -> AppResult<()> {
    if input.nama.trim().is_empty() {
        return Err(AppError::validation("nama", "Name is required"));
    }
    validate_bahan_items(&input.bahan).map_err(|e| AppError::validation("bahan", e))?;
    Ok(())
}
