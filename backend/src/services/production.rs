//! Production workflow: pending claims resolved by approval or cancellation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{transition, Barang, Production, ProductionStatus};

use crate::error::{AppError, AppResult};
use crate::realtime::RealtimeHub;
use crate::services::bahan_baku::{lock_lot, mark_prepared};
use crate::services::barang::{BarangService, ProductionOutput};
use crate::services::modal::ModalService;
use crate::AppState;

/// Margin applied to goods first created by a production approval
pub const DEFAULT_MARGIN_PERSEN: i64 = 30;

pub(crate) const PRODUCTION_COLUMNS: &str = "id, bahan_baku_id, chef_id, jumlah_diproses, status, \
     waktu_mulai, waktu_selesai, catatan, created_at, updated_at";

#[derive(Clone)]
pub struct ProductionService {
    db: PgPool,
    barang: BarangService,
    hub: RealtimeHub,
}

#[derive(Debug, FromRow)]
pub(crate) struct ProductionRow {
    id: Uuid,
    bahan_baku_id: Uuid,
    chef_id: Uuid,
    jumlah_diproses: i32,
    status: String,
    waktu_mulai: Option<DateTime<Utc>>,
    waktu_selesai: Option<DateTime<Utc>>,
    catatan: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductionRow> for Production {
    type Error = AppError;

    fn try_from(row: ProductionRow) -> Result<Self, Self::Error> {
        Ok(Production {
            id: row.id,
            bahan_baku_id: row.bahan_baku_id,
            chef_id: row.chef_id,
            jumlah_diproses: row.jumlah_diproses,
            status: row.status.parse().map_err(AppError::Internal)?,
            waktu_mulai: row.waktu_mulai,
            waktu_selesai: row.waktu_selesai,
            catatan: row.catatan,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductionFilter {
    pub status: Option<ProductionStatus>,
    pub chef_id: Option<Uuid>,
}

/// Resolve a pending production
#[derive(Debug, Deserialize)]
pub struct ResolveInput {
    pub status: ProductionStatus,
    /// Margin for a newly created catalog good, in percent
    pub margin: Option<Decimal>,
    pub catatan: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResult {
    pub production: Production,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barang: Option<Barang>,
    /// Whether approval created a new catalog good
    pub barang_baru: bool,
    /// Quantity added to the catalog
    pub jumlah_produksi: i32,
    /// Portions the master recipe says this claim yields; informational
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_resep: Option<i32>,
}

impl ProductionService {
    pub fn new(db: PgPool, barang: BarangService, hub: RealtimeHub) -> Self {
        Self { db, barang, hub }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.db.clone(),
            BarangService::from_state(state),
            state.hub.clone(),
        )
    }

    pub async fn list(&self, filter: &ProductionFilter) -> AppResult<Vec<Production>> {
        let rows = sqlx::query_as::<_, ProductionRow>(&format!(
            r#"
            SELECT {PRODUCTION_COLUMNS} FROM productions
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::UUID IS NULL OR chef_id = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.chef_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Production::try_from).collect()
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Production> {
        sqlx::query_as::<_, ProductionRow>(&format!(
            "SELECT {PRODUCTION_COLUMNS} FROM productions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Production".to_string()))?
        .try_into()
    }

    pub async fn resolve(&self, id: Uuid, input: ResolveInput) -> AppResult<ResolveResult> {
        match input.status {
            ProductionStatus::Approved => self.approve(id, input).await,
            ProductionStatus::Cancelled => self.cancel(id, input.catatan).await,
            ProductionStatus::Pending => Err(AppError::validation(
                "status",
                "status must be approved or cancelled",
            )),
        }
    }

    /// Approve a pending production and put its output into the catalog.
    ///
    /// The produced quantity is the claimed `jumlah_diproses`. The recipe
    /// yield is looked up and returned alongside, but does not change stock.
    /// Status, lot flag and catalog change commit together; counters and
    /// realtime events are published only after commit.
    pub async fn approve(&self, id: Uuid, input: ResolveInput) -> AppResult<ResolveResult> {
        let ledger = ModalService::new(self.db.clone()).find().await?;
        let adjustments = self.barang.price_adjustments().await?;

        let mut tx = self.db.begin().await?;

        let current = lock_production(&mut tx, id).await?;
        transition(current.status, ProductionStatus::Approved)?;
        let lot = lock_lot(&mut tx, current.bahan_baku_id).await?;

        let row = sqlx::query_as::<_, ProductionRow>(&format!(
            r#"
            UPDATE productions SET
                status = 'approved', waktu_mulai = NOW(),
                catatan = COALESCE($2, catatan), updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.catatan)
        .fetch_one(&mut *tx)
        .await?;
        mark_prepared(&mut tx, lot.id).await?;

        let recipe = ledger.as_ref().and_then(|l| l.find_recipe(&lot.nama));
        let yield_resep = recipe.map(|r| r.yield_for(current.jumlah_diproses));
        let modal_per_porsi = recipe
            .map(|r| r.modal_per_porsi())
            .unwrap_or(lot.modal_per_porsi);
        let margin = input
            .margin
            .unwrap_or_else(|| Decimal::from(DEFAULT_MARGIN_PERSEN));

        let output = self
            .barang
            .receive_production(
                &mut tx,
                &lot.nama,
                current.jumlah_diproses,
                modal_per_porsi,
                margin,
                &lot.bahan,
                &adjustments,
            )
            .await?;

        tx.commit().await?;

        let output = self.barang.publish_production(output).await;
        let production = Production::try_from(row)?;
        tracing::info!(
            production_id = %production.id,
            nama = %lot.nama,
            jumlah = production.jumlah_diproses,
            ?yield_resep,
            "Production approved"
        );
        self.hub.production_updated(&production);

        let barang_baru = matches!(output, ProductionOutput::Created(_));
        Ok(ResolveResult {
            jumlah_produksi: production.jumlah_diproses,
            production,
            barang: Some(output.barang().clone()),
            barang_baru,
            yield_resep,
        })
    }

    /// Cancel a pending production. Claimed raw material is not returned.
    pub async fn cancel(&self, id: Uuid, catatan: Option<String>) -> AppResult<ResolveResult> {
        let mut tx = self.db.begin().await?;

        let current = lock_production(&mut tx, id).await?;
        transition(current.status, ProductionStatus::Cancelled)?;

        let row = sqlx::query_as::<_, ProductionRow>(&format!(
            r#"
            UPDATE productions SET
                status = 'cancelled', waktu_selesai = NOW(),
                catatan = COALESCE($2, catatan), updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&catatan)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let production = Production::try_from(row)?;
        tracing::info!(production_id = %production.id, "Production cancelled");
        self.hub.production_updated(&production);

        Ok(ResolveResult {
            production,
            barang: None,
            barang_baru: false,
            jumlah_produksi: 0,
            yield_resep: None,
        })
    }
}

async fn lock_production(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<Production> {
    sqlx::query_as::<_, ProductionRow>(&format!(
        "SELECT {PRODUCTION_COLUMNS} FROM productions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Production".to_string()))?
    .try_into()
}
