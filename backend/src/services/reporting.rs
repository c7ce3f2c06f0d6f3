//! Reporting service for sales analytics and data export
//! Reads the sales ledger and the daily HPP rollup; owns no invariants

use chrono::{Duration, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};

use shared::{DateRange, Period, Transaksi};

use crate::error::{AppError, AppResult};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Sales totals for one period bucket
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OmzetPoint {
    pub periode: NaiveDate,
    pub jumlah_transaksi: i64,
    pub omzet: Decimal,
    pub total_hpp: Decimal,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub nama_barang: String,
    pub jumlah_terjual: i64,
    pub pendapatan: Decimal,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PaymentBreakdown {
    pub metode_pembayaran: String,
    pub jumlah_transaksi: i64,
    pub total: Decimal,
}

/// One day of the profit breakdown
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProfitRow {
    pub tanggal: NaiveDate,
    pub pendapatan: Decimal,
    pub hpp: Decimal,
    pub laba_kotor: Decimal,
    pub beban: Decimal,
    pub laba_bersih: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ProfitBreakdown {
    pub range: DateRange,
    pub pendapatan: Decimal,
    pub hpp: Decimal,
    pub laba_kotor: Decimal,
    pub beban: Decimal,
    pub laba_bersih: Decimal,
    pub harian: Vec<ProfitRow>,
}

/// Report filter parameters
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportFilter {
    /// Requested range; defaults to the last 30 days ending today
    pub fn range(&self, today: NaiveDate) -> AppResult<DateRange> {
        let end = self.end_date.unwrap_or(today);
        let start = self.start_date.unwrap_or(end - Duration::days(29));
        if start > end {
            return Err(AppError::validation(
                "start_date",
                "start_date must not be after end_date",
            ));
        }
        Ok(DateRange { start, end })
    }
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Add a completed sale to the sales ledger. Recording the same order
    /// twice is a no-op.
    pub async fn record_completed_sale(&self, sale: &Transaksi) -> AppResult<()> {
        let total_hpp: Decimal = sale
            .barang_dibeli
            .iter()
            .map(|l| l.harga_beli * Decimal::from(l.jumlah))
            .sum();
        let tanggal = sale.created_at.with_timezone(&Local).date_naive();

        let result = sqlx::query(
            r#"
            INSERT INTO laporan_penjualan
                (order_id, tanggal, total, total_hpp, metode_pembayaran, kasir_id, items)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (order_id) DO NOTHING
            "#,
        )
        .bind(&sale.order_id)
        .bind(tanggal)
        .bind(sale.total_harga)
        .bind(total_hpp)
        .bind(&sale.metode_pembayaran)
        .bind(sale.kasir_id)
        .bind(Json(&sale.barang_dibeli))
        .execute(&self.db)
        .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(order_id = %sale.order_id, "Sale added to sales ledger");
        }
        Ok(())
    }

    /// Sales totals bucketed by day, week or month
    pub async fn omzet(&self, period: Period, range: &DateRange) -> AppResult<Vec<OmzetPoint>> {
        let points = sqlx::query_as::<_, OmzetPoint>(&format!(
            r#"
            SELECT
                date_trunc('{field}', tanggal)::date AS periode,
                COUNT(*) AS jumlah_transaksi,
                COALESCE(SUM(total), 0) AS omzet,
                COALESCE(SUM(total_hpp), 0) AS total_hpp
            FROM laporan_penjualan
            WHERE tanggal BETWEEN $1 AND $2
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
            field = period.trunc_field()
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(points)
    }

    pub async fn top_products(&self, range: &DateRange, limit: i64) -> AppResult<Vec<TopProduct>> {
        let products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                item->>'nama_barang' AS nama_barang,
                SUM((item->>'jumlah')::BIGINT)::BIGINT AS jumlah_terjual,
                COALESCE(SUM((item->>'subtotal')::NUMERIC), 0) AS pendapatan
            FROM laporan_penjualan, jsonb_array_elements(items) AS item
            WHERE tanggal BETWEEN $1 AND $2
            GROUP BY 1
            ORDER BY jumlah_terjual DESC, nama_barang ASC
            LIMIT $3
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    pub async fn payment_breakdown(&self, range: &DateRange) -> AppResult<Vec<PaymentBreakdown>> {
        let rows = sqlx::query_as::<_, PaymentBreakdown>(
            r#"
            SELECT
                metode_pembayaran,
                COUNT(*) AS jumlah_transaksi,
                COALESCE(SUM(total), 0) AS total
            FROM laporan_penjualan
            WHERE tanggal BETWEEN $1 AND $2
            GROUP BY metode_pembayaran
            ORDER BY total DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Revenue, cost, expenses and net profit from the daily rollup
    pub async fn profit(&self, range: DateRange) -> AppResult<ProfitBreakdown> {
        let harian = sqlx::query_as::<_, ProfitRow>(
            r#"
            SELECT
                tanggal,
                total_pendapatan AS pendapatan,
                total_hpp AS hpp,
                total_laba_kotor AS laba_kotor,
                total_beban AS beban,
                laba_bersih
            FROM hpp_harian
            WHERE tanggal BETWEEN $1 AND $2
            ORDER BY tanggal ASC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(ProfitBreakdown {
            range,
            pendapatan: harian.iter().map(|d| d.pendapatan).sum(),
            hpp: harian.iter().map(|d| d.hpp).sum(),
            laba_kotor: harian.iter().map(|d| d.laba_kotor).sum(),
            beban: harian.iter().map(|d| d.beban).sum(),
            laba_bersih: harian.iter().map(|d| d.laba_bersih).sum(),
            harian,
        })
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
