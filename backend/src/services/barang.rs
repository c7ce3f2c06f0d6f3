//! Catalog of sellable goods

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{types::Json, FromRow, PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{
    derive_prices, generate_kode_barang, harga_final, harga_jual_from_margin, margin_from_prices,
    normalize_name, validate_bahan_items, validate_kode_barang, BahanItem, Barang, BarangStatus,
    PriceAdjustments, StockChange,
};

use crate::error::{map_unique_violation, AppError, AppResult};
use crate::realtime::RealtimeHub;
use crate::services::settings::SettingsService;
use crate::services::stock::StockEngine;
use crate::AppState;

pub(crate) const BARANG_COLUMNS: &str = "id, kode_barang, nama_barang, kategori, harga_beli, harga_jual, \
     harga_final, stok, stok_minimal, margin, bahan_baku, status, created_at, updated_at";

#[derive(Clone)]
pub struct BarangService {
    db: PgPool,
    stock: StockEngine,
    hub: RealtimeHub,
}

#[derive(Debug, FromRow)]
pub(crate) struct BarangRow {
    id: Uuid,
    kode_barang: String,
    nama_barang: String,
    kategori: Option<String>,
    harga_beli: Decimal,
    harga_jual: Decimal,
    harga_final: Decimal,
    stok: i32,
    stok_minimal: i32,
    margin: Decimal,
    bahan_baku: Json<Vec<BahanItem>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BarangRow> for Barang {
    type Error = AppError;

    fn try_from(row: BarangRow) -> Result<Self, Self::Error> {
        Ok(Barang {
            id: row.id,
            kode_barang: row.kode_barang,
            nama_barang: row.nama_barang,
            kategori: row.kategori,
            harga_beli: row.harga_beli,
            harga_jual: row.harga_jual,
            harga_final: row.harga_final,
            stok: row.stok,
            stok_minimal: row.stok_minimal,
            margin: row.margin,
            bahan_baku: row.bahan_baku.0,
            status: row.status.parse::<BarangStatus>().map_err(AppError::Internal)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// List filter
#[derive(Debug, Default, Deserialize)]
pub struct BarangFilter {
    /// Only goods at or under their reorder threshold
    #[serde(default)]
    pub low_stock: bool,
    pub kategori: Option<String>,
    pub search: Option<String>,
}

/// Input for creating a good. `harga_jual` is derived from `harga_beli` and
/// `margin` when omitted.
#[derive(Debug, Deserialize)]
pub struct CreateBarangInput {
    pub kode_barang: Option<String>,
    pub nama_barang: String,
    pub kategori: Option<String>,
    pub harga_beli: Decimal,
    pub harga_jual: Option<Decimal>,
    pub margin: Option<Decimal>,
    #[serde(default)]
    pub stok: i32,
    #[serde(default)]
    pub stok_minimal: i32,
    #[serde(default)]
    pub bahan_baku: Vec<BahanItem>,
    pub status: Option<BarangStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBarangInput {
    pub nama_barang: Option<String>,
    pub kategori: Option<String>,
    pub harga_beli: Option<Decimal>,
    pub harga_jual: Option<Decimal>,
    pub margin: Option<Decimal>,
    pub stok: Option<i32>,
    pub stok_minimal: Option<i32>,
    pub bahan_baku: Option<Vec<BahanItem>>,
    pub status: Option<BarangStatus>,
}

/// What production approval did to the catalog
#[derive(Debug, Clone)]
pub enum ProductionOutput {
    Incremented(Barang),
    Created(Barang),
    /// Existing good whose increment goes through the fast-path counter
    /// after commit
    Deferred { barang: Barang, jumlah: i32 },
}

impl ProductionOutput {
    pub fn barang(&self) -> &Barang {
        match self {
            ProductionOutput::Incremented(b)
            | ProductionOutput::Created(b)
            | ProductionOutput::Deferred { barang: b, .. } => b,
        }
    }
}

impl BarangService {
    pub fn new(db: PgPool, stock: StockEngine, hub: RealtimeHub) -> Self {
        Self { db, stock, hub }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.db.clone(), StockEngine::from_state(state), state.hub.clone())
    }

    pub async fn list(&self, filter: &BarangFilter) -> AppResult<Vec<Barang>> {
        let search = filter
            .search
            .as_deref()
            .map(|s| format!("%{}%", s.trim().to_lowercase()));

        let rows = sqlx::query_as::<_, BarangRow>(&format!(
            r#"
            SELECT {BARANG_COLUMNS}
            FROM barang
            WHERE ($1 = FALSE OR stok <= stok_minimal)
              AND ($2::TEXT IS NULL OR kategori = $2)
              AND ($3::TEXT IS NULL OR LOWER(nama_barang) LIKE $3 OR LOWER(kode_barang) LIKE $3)
            ORDER BY kode_barang ASC
            "#
        ))
        .bind(filter.low_stock)
        .bind(&filter.kategori)
        .bind(&search)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Barang::try_from).collect()
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Barang> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Barang".to_string()))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Barang>> {
        let row = sqlx::query_as::<_, BarangRow>(&format!(
            "SELECT {BARANG_COLUMNS} FROM barang WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Barang::try_from).transpose()
    }

    /// Resolve a good by catalog code, falling back to its name (case and
    /// whitespace insensitive)
    pub async fn find_by_code_or_name(
        &self,
        kode_barang: Option<&str>,
        nama_barang: Option<&str>,
    ) -> AppResult<Option<Barang>> {
        if let Some(kode) = kode_barang.map(str::trim).filter(|k| !k.is_empty()) {
            let row = sqlx::query_as::<_, BarangRow>(&format!(
                "SELECT {BARANG_COLUMNS} FROM barang WHERE kode_barang = $1"
            ))
            .bind(kode)
            .fetch_optional(&self.db)
            .await?;

            if let Some(row) = row {
                return Ok(Some(row.try_into()?));
            }
        }

        match nama_barang.filter(|n| !n.trim().is_empty()) {
            Some(nama) => find_by_name(&self.db, nama).await,
            None => Ok(None),
        }
    }

    pub async fn create(&self, input: CreateBarangInput) -> AppResult<Barang> {
        if input.nama_barang.trim().is_empty() {
            return Err(AppError::validation("nama_barang", "Name is required"));
        }
        if input.stok < 0 || input.stok_minimal < 0 {
            return Err(AppError::validation("stok", "Stock cannot be negative"));
        }
        validate_bahan_items(&input.bahan_baku).map_err(|e| AppError::validation("bahan_baku", e))?;

        let adjustments = self.price_adjustments().await?;
        let (harga_jual, margin) = match (input.harga_jual, input.margin) {
            (Some(harga_jual), margin) => (
                harga_jual,
                margin.unwrap_or_else(|| margin_from_prices(input.harga_beli, harga_jual)),
            ),
            (None, Some(margin)) => (harga_jual_from_margin(input.harga_beli, margin)?, margin),
            (None, None) => {
                return Err(AppError::validation(
                    "harga_jual",
                    "Either harga_jual or margin is required",
                ))
            }
        };

        let kode = match input.kode_barang {
            Some(kode) => {
                let kode = kode.trim().to_uppercase();
                validate_kode_barang(&kode).map_err(|e| AppError::validation("kode_barang", e))?;
                kode
            }
            None => {
                let mut conn = self.db.acquire().await?;
                next_kode_barang(&mut conn).await?
            }
        };

        let row = sqlx::query_as::<_, BarangRow>(&format!(
            r#"
            INSERT INTO barang (kode_barang, nama_barang, kategori, harga_beli, harga_jual,
                                harga_final, stok, stok_minimal, margin, bahan_baku, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {BARANG_COLUMNS}
            "#
        ))
        .bind(&kode)
        .bind(input.nama_barang.trim())
        .bind(&input.kategori)
        .bind(input.harga_beli)
        .bind(harga_jual)
        .bind(harga_final(harga_jual, &adjustments))
        .bind(input.stok)
        .bind(input.stok_minimal)
        .bind(margin)
        .bind(Json(&input.bahan_baku))
        .bind(input.status.unwrap_or_default().as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "kode_barang"))?;

        let barang = Barang::try_from(row)?;
        tracing::info!(kode_barang = %barang.kode_barang, "Barang created");

        self.stock.publish_counter(barang.id, barang.stok as i64).await;
        self.hub.barang_created(&barang);
        Ok(barang)
    }

    pub async fn update(&self, id: Uuid, input: UpdateBarangInput) -> AppResult<Barang> {
        let mut barang = self.get(id).await?;
        let stock_changed = input.stok.is_some_and(|s| s != barang.stok);

        if let Some(nama) = input.nama_barang {
            if nama.trim().is_empty() {
                return Err(AppError::validation("nama_barang", "Name is required"));
            }
            barang.nama_barang = nama.trim().to_string();
        }
        if let Some(kategori) = input.kategori {
            barang.kategori = Some(kategori);
        }
        if let Some(stok) = input.stok {
            if stok < 0 {
                return Err(AppError::validation("stok", "Stock cannot be negative"));
            }
            barang.stok = stok;
        }
        if let Some(stok_minimal) = input.stok_minimal {
            barang.stok_minimal = stok_minimal.max(0);
        }
        if let Some(bahan) = input.bahan_baku {
            validate_bahan_items(&bahan).map_err(|e| AppError::validation("bahan_baku", e))?;
            barang.bahan_baku = bahan;
        }
        if let Some(status) = input.status {
            barang.status = status;
        }

        let reprice = input.harga_beli.is_some() || input.harga_jual.is_some() || input.margin.is_some();
        if let Some(harga_beli) = input.harga_beli {
            barang.harga_beli = harga_beli;
        }
        match (input.harga_jual, input.margin) {
            (Some(harga_jual), _) => {
                barang.harga_jual = harga_jual;
                barang.margin = margin_from_prices(barang.harga_beli, harga_jual);
            }
            (None, Some(margin)) => {
                barang.harga_jual = harga_jual_from_margin(barang.harga_beli, margin)?;
                barang.margin = margin;
            }
            (None, None) => {}
        }
        if reprice {
            let adjustments = self.price_adjustments().await?;
            barang.harga_final = harga_final(barang.harga_jual, &adjustments);
        }

        let row = sqlx::query_as::<_, BarangRow>(&format!(
            r#"
            UPDATE barang SET
                nama_barang = $2, kategori = $3, harga_beli = $4, harga_jual = $5,
                harga_final = $6, stok = $7, stok_minimal = $8, margin = $9,
                bahan_baku = $10, status = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING {BARANG_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&barang.nama_barang)
        .bind(&barang.kategori)
        .bind(barang.harga_beli)
        .bind(barang.harga_jual)
        .bind(barang.harga_final)
        .bind(barang.stok)
        .bind(barang.stok_minimal)
        .bind(barang.margin)
        .bind(Json(&barang.bahan_baku))
        .bind(barang.status.as_str())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Barang".to_string()))?;

        let barang = Barang::try_from(row)?;
        if stock_changed {
            self.stock.publish_counter(barang.id, barang.stok as i64).await;
        }
        self.hub.barang_updated(&barang);
        Ok(barang)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM barang WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Barang".to_string()));
        }
        tracing::info!(barang_id = %id, "Barang deleted");
        Ok(())
    }

    /// Put produced goods into the catalog inside the approval transaction:
    /// increment the good with the same name, or create it priced from the
    /// lot's cost per portion. Nothing is published until
    /// [`publish_production`](Self::publish_production) runs after commit.
    pub async fn receive_production(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        nama_produk: &str,
        jumlah: i32,
        modal_per_porsi: Decimal,
        margin: Decimal,
        bahan: &[BahanItem],
        adjustments: &PriceAdjustments,
    ) -> AppResult<ProductionOutput> {
        let existing = find_by_name(&mut **tx, nama_produk).await?;
        match (receive_route(existing.is_some(), self.stock.fast_path_configured()), existing) {
            (ReceiveRoute::ThroughCounter, Some(barang)) => Ok(ProductionOutput::Deferred { barang, jumlah }),
            (ReceiveRoute::InTransaction, Some(existing)) => {
                let row = sqlx::query_as::<_, BarangRow>(&format!(
                    r#"
                    UPDATE barang SET stok = stok + $2, updated_at = NOW()
                    WHERE id = $1
                    RETURNING {BARANG_COLUMNS}
                    "#
                ))
                .bind(existing.id)
                .bind(jumlah)
                .fetch_one(&mut **tx)
                .await?;
                Ok(ProductionOutput::Incremented(row.try_into()?))
            }
            _ => {
                let prices = derive_prices(modal_per_porsi, margin, adjustments)?;
                let kode = next_kode_barang(&mut **tx).await?;

                let row = sqlx::query_as::<_, BarangRow>(&format!(
                    r#"
                    INSERT INTO barang (kode_barang, nama_barang, kategori, harga_beli, harga_jual,
                                        harga_final, stok, stok_minimal, margin, bahan_baku, status)
                    VALUES ($1, $2, NULL, $3, $4, $5, $6, 0, $7, $8, 'aktif')
                    RETURNING {BARANG_COLUMNS}
                    "#
                ))
                .bind(&kode)
                .bind(nama_produk.trim())
                .bind(prices.harga_beli)
                .bind(prices.harga_jual)
                .bind(prices.harga_final)
                .bind(jumlah)
                .bind(margin)
                .bind(Json(bahan))
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| map_unique_violation(e, "kode_barang"))?;
                Ok(ProductionOutput::Created(row.try_into()?))
            }
        }
    }

    /// Publish committed production output. A deferred increment is applied
    /// here through the stock engine so the fast-path counter stays
    /// authoritative.
    pub async fn publish_production(&self, output: ProductionOutput) -> ProductionOutput {
        match output {
            ProductionOutput::Deferred { mut barang, jumlah } => {
                match self
                    .stock
                    .apply(barang.id, barang.stok, StockChange::Increment(jumlah))
                    .await
                {
                    Ok(outcome) => barang.stok = outcome.stok as i32,
                    Err(e) => tracing::error!(
                        kode_barang = %barang.kode_barang,
                        jumlah,
                        "Production output not added to stock, fix by hand: {}",
                        e
                    ),
                }
                self.hub.barang_updated(&barang);
                ProductionOutput::Incremented(barang)
            }
            ProductionOutput::Incremented(barang) => {
                self.stock.publish_counter(barang.id, barang.stok as i64).await;
                self.hub.barang_updated(&barang);
                ProductionOutput::Incremented(barang)
            }
            ProductionOutput::Created(barang) => {
                self.stock.publish_counter(barang.id, barang.stok as i64).await;
                self.hub.barang_created(&barang);
                ProductionOutput::Created(barang)
            }
        }
    }

    pub async fn price_adjustments(&self) -> AppResult<PriceAdjustments> {
        Ok(SettingsService::new(self.db.clone())
            .find()
            .await?
            .unwrap_or_default()
            .price_adjustments())
    }
}

async fn find_by_name<'e, E>(executor: E, nama: &str) -> AppResult<Option<Barang>>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_as::<_, BarangRow>(&format!(
        r#"
        SELECT {BARANG_COLUMNS} FROM barang
        WHERE LOWER(REGEXP_REPLACE(BTRIM(nama_barang), '\s+', ' ', 'g')) = $1
        ORDER BY created_at ASC
        LIMIT 1
        "#
    ))
    .bind(normalize_name(nama))
    .fetch_optional(executor)
    .await?;

    row.map(Barang::try_from).transpose()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiveRoute {
    /// `stok = stok + n` on the approval transaction
    InTransaction,
    /// Increment on the fast-path counter once the approval committed
    ThroughCounter,
    Create,
}

/// Where a production's output lands. With a fast-path counter, existing
/// goods are never incremented on the primary store directly.
fn receive_route(exists: bool, fast_path: bool) -> ReceiveRoute {
    match (exists, fast_path) {
        (false, _) => ReceiveRoute::Create,
        (true, true) => ReceiveRoute::ThroughCounter,
        (true, false) => ReceiveRoute::InTransaction,
    }
}

/// Next free `BRGnnn` code
async fn next_kode_barang(conn: &mut PgConnection) -> AppResult<String> {
    loop {
        let seq = sqlx::query_scalar::<_, i64>("SELECT nextval('barang_kode_seq')")
            .fetch_one(&mut *conn)
            .await?;
        let kode = generate_kode_barang(seq);
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM barang WHERE kode_barang = $1)",
        )
        .bind(&kode)
        .fetch_one(&mut *conn)
        .await?;
        if !taken {
            return Ok(kode);
        }
    }
}
