//! Transaction engine
//!
//! Creating a sale resolves the cashier and the payment route before touching
//! any stock, then takes each cart line out of the catalog in order. A line
//! that fails leaves the lines before it decremented; there is no
//! compensation. A request that loses an idempotency-key race hands its
//! stock back and returns the sale that won.

use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use shared::{
    build_sale_line, ensure_transition, generate_order_id, restock_changes, sale_total,
    validate_cart, BarangStatus, CartLine, PaginatedResponse, Pagination, PaginationMeta,
    PaymentReference, PaymentSelection, SaleLine, SalePlan, SaleStateError, SaleStatus, Transaksi,
};

use crate::error::{is_unique_violation, map_unique_violation, AppError, AppResult};
use crate::external::midtrans::{ChargeRequest, MidtransClient};
use crate::realtime::RealtimeHub;
use crate::services::barang::BarangService;
use crate::services::cashier::CashierSelector;
use crate::services::hpp::HppService;
use crate::services::payment::NotificationAction;
use crate::services::reporting::ReportingService;
use crate::services::settings::SettingsService;
use crate::services::stock::StockEngine;
use crate::AppState;

const IDEMPOTENCY_CONSTRAINT: &str = "transaksi_idempotency_key_key";

const TRANSAKSI_COLUMNS: &str = "id, order_id, nomor_transaksi, barang_dibeli, total_harga, \
     total_klien, metode_pembayaran, status, kasir_id, no_va, payment_reference, \
     stok_dikembalikan, idempotency_key, created_at, updated_at";

#[derive(Clone)]
pub struct TransaksiService {
    db: PgPool,
    stock: StockEngine,
    barang: BarangService,
    cashier: CashierSelector,
    gateway: Option<MidtransClient>,
    hub: RealtimeHub,
}

#[derive(Debug, FromRow)]
struct TransaksiRow {
    id: Uuid,
    order_id: String,
    nomor_transaksi: String,
    barang_dibeli: Json<Vec<SaleLine>>,
    total_harga: Decimal,
    total_klien: Option<Decimal>,
    metode_pembayaran: String,
    status: String,
    kasir_id: Uuid,
    no_va: Option<String>,
    payment_reference: Option<Json<PaymentReference>>,
    stok_dikembalikan: bool,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransaksiRow> for Transaksi {
    type Error = AppError;

    fn try_from(row: TransaksiRow) -> Result<Self, Self::Error> {
        Ok(Transaksi {
            id: row.id,
            order_id: row.order_id,
            nomor_transaksi: row.nomor_transaksi,
            barang_dibeli: row.barang_dibeli.0,
            total_harga: row.total_harga,
            total_klien: row.total_klien,
            metode_pembayaran: row.metode_pembayaran,
            status: row.status.parse().map_err(AppError::Internal)?,
            kasir_id: row.kasir_id,
            no_va: row.no_va,
            payment_reference: row.payment_reference.map(|j| j.0),
            stok_dikembalikan: row.stok_dikembalikan,
            idempotency_key: row.idempotency_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Sale request from the cashier UI
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub barang_dibeli: Vec<CartLine>,
    pub metode_pembayaran: String,
    /// Total the client computed; stored for audit, never charged
    pub total_harga: Option<Decimal>,
    pub kasir_username: Option<String>,
    pub idempotency_key: Option<String>,
}

/// A sale plus whether any stock change bypassed the fast-path store
#[derive(Debug, Serialize)]
pub struct SaleOutcome {
    #[serde(flatten)]
    pub transaksi: Transaksi,
    pub degraded: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransaksiFilter {
    pub status: Option<SaleStatus>,
    pub kasir_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl TransaksiFilter {
    fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page),
            per_page: self.per_page.unwrap_or(default.per_page),
        }
    }
}

impl TransaksiService {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            stock: StockEngine::from_state(state),
            barang: BarangService::from_state(state),
            cashier: CashierSelector::new(state.db.clone(), state.kasir_cursor.clone()),
            gateway: state.gateway.clone(),
            hub: state.hub.clone(),
        }
    }

    pub async fn create(&self, input: CreateSaleInput) -> AppResult<SaleOutcome> {
        validate_cart(&input.barang_dibeli).map_err(|e| AppError::validation("barang_dibeli", e))?;

        let idempotency_key = input
            .idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        if let Some(key) = idempotency_key {
            if let Some(existing) = self.find_by_idempotency_key(key).await? {
                tracing::debug!(order_id = %existing.order_id, "Repeated sale request, returning existing sale");
                return Ok(SaleOutcome {
                    transaksi: existing,
                    degraded: false,
                });
            }
        }

        let settings = SettingsService::new(self.db.clone())
            .find()
            .await?
            .unwrap_or_default();
        let selection =
            PaymentSelection::parse(&input.metode_pembayaran)?.validate_against(&settings.payment_methods)?;

        let kasir = self.cashier.resolve(input.kasir_username.as_deref()).await?;
        let plan = SalePlan::new(
            &input.barang_dibeli,
            &kasir,
            selection.is_cash(),
            self.gateway.is_some(),
        )?;

        let mut lines = Vec::with_capacity(input.barang_dibeli.len());
        let mut degraded = false;
        for (cart_line, change) in input.barang_dibeli.iter().zip(&plan.stock_changes) {
            let barang = self
                .barang
                .find_by_code_or_name(cart_line.kode_barang.as_deref(), cart_line.nama_barang.as_deref())
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "Barang {}",
                        cart_line
                            .kode_barang
                            .as_deref()
                            .or(cart_line.nama_barang.as_deref())
                            .unwrap_or_default()
                    ))
                })?;
            if barang.status == BarangStatus::Nonaktif {
                return Err(AppError::validation(
                    "barang_dibeli",
                    format!("{} is not for sale", barang.nama_barang),
                ));
            }

            let outcome = self.stock.apply(barang.id, barang.stok, *change).await?;
            degraded |= outcome.degraded;
            lines.push(build_sale_line(&barang, cart_line.jumlah));
        }

        let order_id = generate_order_id();
        let total_harga = sale_total(&lines);

        let inserted = sqlx::query_as::<_, TransaksiRow>(&format!(
            r#"
            INSERT INTO transaksi (order_id, nomor_transaksi, barang_dibeli, total_harga, total_klien,
                                   metode_pembayaran, status, kasir_id, idempotency_key)
            VALUES ($1, $1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TRANSAKSI_COLUMNS}
            "#
        ))
        .bind(&order_id)
        .bind(Json(&lines))
        .bind(total_harga)
        .bind(input.total_harga)
        .bind(selection.to_string())
        .bind(plan.status.as_str())
        .bind(plan.kasir_id)
        .bind(idempotency_key)
        .fetch_one(&self.db)
        .await;

        let row = match (inserted, idempotency_key) {
            (Ok(row), _) => row,
            (Err(e), Some(key)) if is_unique_violation(&e, Some(IDEMPOTENCY_CONSTRAINT)) => {
                return self.settle_duplicate(key, &lines, degraded).await;
            }
            (Err(e), _) => return Err(map_unique_violation(e, "idempotency_key")),
        };
        let mut transaksi = Transaksi::try_from(row)?;

        tracing::info!(
            order_id = %transaksi.order_id,
            kasir = %kasir.username,
            total = %transaksi.total_harga,
            status = %transaksi.status,
            degraded,
            "Sale created"
        );

        if let Err(e) = HppService::new(self.db.clone())
            .record_sale(business_date(), &transaksi.barang_dibeli)
            .await
        {
            tracing::error!(order_id = %transaksi.order_id, "HPP rollup failed: {}", e);
        }

        if transaksi.status == SaleStatus::Selesai {
            self.feed_reporting(&transaksi).await;
        }

        if let (false, Some(gateway)) = (selection.is_cash(), self.gateway.as_ref()) {
            let reference = gateway
                .charge(ChargeRequest {
                    order_id: &transaksi.order_id,
                    gross_amount: transaksi.total_harga,
                    selection: &selection,
                    items: &transaksi.barang_dibeli,
                })
                .await?;
            transaksi = self.attach_payment_reference(transaksi.id, &reference).await?;
        }

        Ok(SaleOutcome { transaksi, degraded })
    }

    /// Another request stored a sale under the same key first: hand back the
    /// stock this request took and answer with that sale.
    async fn settle_duplicate(&self, key: &str, lines: &[SaleLine], degraded: bool) -> AppResult<SaleOutcome> {
        let degraded = self.restock("duplicate", key, lines).await || degraded;
        let transaksi = self
            .find_by_idempotency_key(key)
            .await?
            .ok_or_else(|| AppError::DuplicateEntry("idempotency_key".to_string()))?;

        tracing::info!(order_id = %transaksi.order_id, "Concurrent repeat of a sale, stock handed back");
        Ok(SaleOutcome { transaksi, degraded })
    }

    /// Increment every line back into the catalog. A line that cannot be
    /// returned is logged and skipped. Returns whether any change was degraded.
    async fn restock(&self, reason: &str, order_ref: &str, lines: &[SaleLine]) -> bool {
        let mut degraded = false;
        for (line, (barang_id, change)) in lines.iter().zip(restock_changes(lines)) {
            let current = match self.barang.find_by_id(barang_id).await {
                Ok(Some(barang)) => barang.stok,
                Ok(None) => {
                    tracing::warn!(
                        order = %order_ref,
                        kode_barang = %line.kode_barang,
                        "Cannot return stock for a deleted good"
                    );
                    continue;
                }
                Err(e) => {
                    tracing::error!(
                        order = %order_ref,
                        reason,
                        kode_barang = %line.kode_barang,
                        jumlah = line.jumlah,
                        "Stock not returned, fix by hand: {}",
                        e
                    );
                    continue;
                }
            };
            match self.stock.apply(barang_id, current, change).await {
                Ok(outcome) => degraded |= outcome.degraded,
                Err(e) => tracing::error!(
                    order = %order_ref,
                    reason,
                    kode_barang = %line.kode_barang,
                    jumlah = line.jumlah,
                    "Stock not returned, fix by hand: {}",
                    e
                ),
            }
        }
        degraded
    }

    async fn attach_payment_reference(&self, id: Uuid, reference: &PaymentReference) -> AppResult<Transaksi> {
        sqlx::query_as::<_, TransaksiRow>(&format!(
            r#"
            UPDATE transaksi SET no_va = $2, payment_reference = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {TRANSAKSI_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&reference.va_number)
        .bind(Json(reference))
        .fetch_one(&self.db)
        .await?
        .try_into()
    }

    pub async fn list(&self, filter: &TransaksiFilter) -> AppResult<PaginatedResponse<Transaksi>> {
        let pagination = filter.pagination();
        let status = filter.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM transaksi
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::UUID IS NULL OR kasir_id = $2)
              AND ($3::DATE IS NULL OR created_at::date >= $3)
              AND ($4::DATE IS NULL OR created_at::date <= $4)
            "#,
        )
        .bind(status)
        .bind(filter.kasir_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, TransaksiRow>(&format!(
            r#"
            SELECT {TRANSAKSI_COLUMNS} FROM transaksi
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::UUID IS NULL OR kasir_id = $2)
              AND ($3::DATE IS NULL OR created_at::date >= $3)
              AND ($4::DATE IS NULL OR created_at::date <= $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(status)
        .bind(filter.kasir_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let data = rows
            .into_iter()
            .map(Transaksi::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(&pagination, total.max(0) as u64),
        })
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Transaksi> {
        sqlx::query_as::<_, TransaksiRow>(&format!(
            "SELECT {TRANSAKSI_COLUMNS} FROM transaksi WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaksi".to_string()))?
        .try_into()
    }

    pub async fn find_by_order_id(&self, order_id: &str) -> AppResult<Option<Transaksi>> {
        let row = sqlx::query_as::<_, TransaksiRow>(&format!(
            "SELECT {TRANSAKSI_COLUMNS} FROM transaksi WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Transaksi::try_from).transpose()
    }

    async fn find_by_idempotency_key(&self, key: &str) -> AppResult<Option<Transaksi>> {
        let row = sqlx::query_as::<_, TransaksiRow>(&format!(
            "SELECT {TRANSAKSI_COLUMNS} FROM transaksi WHERE idempotency_key = $1"
        ))
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        row.map(Transaksi::try_from).transpose()
    }

    /// Move a pending sale to another status. Statuses that hand stock back
    /// go through the same guarded return as cancellation.
    pub async fn update_status(&self, id: Uuid, status: SaleStatus) -> AppResult<SaleOutcome> {
        let current = self.get(id).await?;
        ensure_transition(current.status, status)?;

        if status.returns_stock() {
            return self.return_stock(current, status).await;
        }

        let row = sqlx::query_as::<_, TransaksiRow>(&format!(
            r#"
            UPDATE transaksi SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {TRANSAKSI_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.db)
        .await?
        .ok_or(SaleStateError::InvalidTransition {
            from: current.status,
            to: status,
        })?;
        let transaksi = Transaksi::try_from(row)?;

        tracing::info!(order_id = %transaksi.order_id, status = %transaksi.status, "Sale status updated");
        if transaksi.status == SaleStatus::Selesai {
            self.feed_reporting(&transaksi).await;
        }
        self.hub.status_updated(&transaksi);

        Ok(SaleOutcome {
            transaksi,
            degraded: false,
        })
    }

    /// Cancel a sale and return its stock exactly once
    pub async fn cancel(&self, id: Uuid) -> AppResult<SaleOutcome> {
        let current = self.get(id).await?;
        self.return_stock(current, SaleStatus::Dibatalkan).await
    }

    async fn return_stock(&self, current: Transaksi, status: SaleStatus) -> AppResult<SaleOutcome> {
        let mut claimed = current.clone();
        claimed.claim_stock_return(status)?;

        // Only one caller can flip the flag; everyone else gets a conflict.
        let row = sqlx::query_as::<_, TransaksiRow>(&format!(
            r#"
            UPDATE transaksi SET status = $2, stok_dikembalikan = TRUE, updated_at = NOW()
            WHERE id = $1 AND stok_dikembalikan = FALSE AND status <> 'selesai'
            RETURNING {TRANSAKSI_COLUMNS}
            "#
        ))
        .bind(current.id)
        .bind(claimed.status.as_str())
        .fetch_optional(&self.db)
        .await?
        .ok_or(SaleStateError::StockAlreadyReturned)?;
        let transaksi = Transaksi::try_from(row)?;

        let degraded = self
            .restock(claimed.status.as_str(), &transaksi.order_id, &transaksi.barang_dibeli)
            .await;

        tracing::info!(order_id = %transaksi.order_id, status = %transaksi.status, "Sale stock returned");
        self.hub.status_updated(&transaksi);

        Ok(SaleOutcome { transaksi, degraded })
    }

    /// Delete a finished sale. Pending sales must be resolved first.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM transaksi WHERE id = $1 AND status <> 'pending'")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            let current = self.get(id).await?;
            return Err(AppError::InvalidStateTransition(format!(
                "a {} sale cannot be deleted",
                current.status
            )));
        }
        tracing::info!(transaksi_id = %id, "Sale deleted");
        Ok(())
    }

    /// Apply a gateway notification. Unknown orders and sales that already
    /// left `pending` are acknowledged without change.
    pub async fn reconcile(&self, order_id: &str, action: NotificationAction) -> AppResult<Option<Transaksi>> {
        let NotificationAction::Transition(status) = action else {
            return Ok(None);
        };

        let Some(current) = self.find_by_order_id(order_id).await? else {
            tracing::warn!(order_id = %order_id, "Payment notification for unknown order");
            return Ok(None);
        };
        if current.status != SaleStatus::Pending {
            tracing::debug!(order_id = %order_id, status = %current.status, "Sale already resolved");
            return Ok(None);
        }

        let outcome = self.update_status(current.id, status).await?;
        Ok(Some(outcome.transaksi))
    }

    async fn feed_reporting(&self, transaksi: &Transaksi) {
        if let Err(e) = ReportingService::new(self.db.clone())
            .record_completed_sale(transaksi)
            .await
        {
            tracing::error!(order_id = %transaksi.order_id, "Failed to record sale in sales ledger: {}", e);
        }
    }
}

/// Calendar day sales are booked to
pub fn business_date() -> NaiveDate {
    Local::now().date_naive()
}
