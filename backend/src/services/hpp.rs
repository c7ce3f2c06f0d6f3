//! Daily cost-of-goods-sold rollup

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{types::Json, FromRow, PgPool};

use shared::{sum_days, DateRange, HppEntry, HppHarian, HppProduk, HppSummary, SaleLine};

use crate::error::{AppError, AppResult};
use crate::services::modal::lock_ledger;

#[derive(Clone)]
pub struct HppService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct HppRow {
    tanggal: NaiveDate,
    produk: Json<Vec<HppProduk>>,
    total_hpp: Decimal,
    total_pendapatan: Decimal,
    total_laba_kotor: Decimal,
    total_beban: Decimal,
    laba_bersih: Decimal,
}

impl From<HppRow> for HppHarian {
    fn from(row: HppRow) -> Self {
        HppHarian {
            tanggal: row.tanggal,
            produk: row.produk.0,
            total_hpp: row.total_hpp,
            total_pendapatan: row.total_pendapatan,
            total_laba_kotor: row.total_laba_kotor,
            total_beban: row.total_beban,
            laba_bersih: row.laba_bersih,
        }
    }
}

/// Range totals plus the day documents they were summed from
#[derive(Debug, Serialize)]
pub struct HppRangeTotal {
    pub range: DateRange,
    pub summary: HppSummary,
    pub hari: Vec<HppHarian>,
}

const HPP_COLUMNS: &str =
    "tanggal, produk, total_hpp, total_pendapatan, total_laba_kotor, total_beban, laba_bersih";

impl HppService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fold a sale's lines into the rollup for `tanggal`.
    ///
    /// Cost per portion comes from the matching master recipe; a product with
    /// no recipe is costed at its catalog purchase price. Fails with
    /// `LedgerMissing` when the capital ledger or the settings row is absent.
    pub async fn record_sale(&self, tanggal: NaiveDate, lines: &[SaleLine]) -> AppResult<HppHarian> {
        let mut tx = self.db.begin().await?;

        let ledger = lock_ledger(&mut tx).await?.ok_or(AppError::LedgerMissing)?;
        let service_fee = sqlx::query_scalar::<_, Decimal>(
            "SELECT biaya_layanan_persen FROM settings WHERE id = TRUE",
        )
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::LedgerMissing)?;

        sqlx::query("INSERT INTO hpp_harian (tanggal) VALUES ($1) ON CONFLICT (tanggal) DO NOTHING")
            .bind(tanggal)
            .execute(&mut *tx)
            .await?;
        let mut day: HppHarian = sqlx::query_as::<_, HppRow>(&format!(
            "SELECT {HPP_COLUMNS} FROM hpp_harian WHERE tanggal = $1 FOR UPDATE"
        ))
        .bind(tanggal)
        .fetch_one(&mut *tx)
        .await?
        .into();

        let entries: Vec<HppEntry> = lines
            .iter()
            .map(|line| HppEntry {
                nama_produk: line.nama_barang.clone(),
                jumlah: line.jumlah,
                harga_satuan: line.harga_satuan,
                hpp_per_porsi: ledger
                    .find_recipe(&line.nama_barang)
                    .map(|r| r.modal_per_porsi())
                    .unwrap_or(line.harga_beli),
            })
            .collect();

        day.apply_sale(&entries, service_fee, ledger.operational_expenses_on(tanggal));

        let row = sqlx::query_as::<_, HppRow>(&format!(
            r#"
            UPDATE hpp_harian SET
                produk = $2, total_hpp = $3, total_pendapatan = $4, total_laba_kotor = $5,
                total_beban = $6, laba_bersih = $7, updated_at = NOW()
            WHERE tanggal = $1
            RETURNING {HPP_COLUMNS}
            "#
        ))
        .bind(tanggal)
        .bind(Json(&day.produk))
        .bind(day.total_hpp)
        .bind(day.total_pendapatan)
        .bind(day.total_laba_kotor)
        .bind(day.total_beban)
        .bind(day.laba_bersih)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    pub async fn get_day(&self, tanggal: NaiveDate) -> AppResult<HppHarian> {
        let row = sqlx::query_as::<_, HppRow>(&format!(
            "SELECT {HPP_COLUMNS} FROM hpp_harian WHERE tanggal = $1"
        ))
        .bind(tanggal)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(HppHarian::from).unwrap_or_else(|| HppHarian::new(tanggal)))
    }

    pub async fn range_total(&self, range: DateRange) -> AppResult<HppRangeTotal> {
        let rows = sqlx::query_as::<_, HppRow>(&format!(
            r#"
            SELECT {HPP_COLUMNS} FROM hpp_harian
            WHERE tanggal BETWEEN $1 AND $2
            ORDER BY tanggal ASC
            "#
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        let hari: Vec<HppHarian> = rows.into_iter().map(HppHarian::from).collect();
        Ok(HppRangeTotal {
            range,
            summary: sum_days(&hari),
            hari,
        })
    }
}
