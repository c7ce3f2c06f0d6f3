//! Sales

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{Barang, User, UserRole};
use crate::stock::StockChange;
use crate::validation::validate_cart;

/// A completed or pending sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaksi {
    pub id: Uuid,
    pub order_id: String,
    pub nomor_transaksi: String,
    pub barang_dibeli: Vec<SaleLine>,
    pub total_harga: Decimal,
    /// Total quoted by the client, kept for audit only
    pub total_klien: Option<Decimal>,
    pub metode_pembayaran: String,
    pub status: SaleStatus,
    pub kasir_id: Uuid,
    pub no_va: Option<String>,
    pub payment_reference: Option<PaymentReference>,
    pub stok_dikembalikan: bool,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A finalized sale line, priced from the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleLine {
    pub barang_id: Uuid,
    pub kode_barang: String,
    pub nama_barang: String,
    pub jumlah: i32,
    pub harga_satuan: Decimal,
    pub harga_beli: Decimal,
    pub subtotal: Decimal,
}

/// A cart line as sent by the cashier UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub kode_barang: Option<String>,
    pub nama_barang: Option<String>,
    pub jumlah: i32,
    /// Client-side price; ignored in favour of the catalog price
    #[serde(default)]
    pub harga_satuan: Option<Decimal>,
}

/// Reference returned by the payment gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentReference {
    pub payment_type: String,
    pub va_number: Option<String>,
    pub qr_string: Option<String>,
    pub token: Option<String>,
    pub redirect_url: Option<String>,
    pub expiry_time: Option<String>,
}

/// Sale status. Everything except `Pending` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Selesai,
    Dibatalkan,
    Expire,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Selesai => "selesai",
            SaleStatus::Dibatalkan => "dibatalkan",
            SaleStatus::Expire => "expire",
        }
    }

    /// Status a new sale starts in
    pub fn initial(is_cash: bool) -> Self {
        if is_cash {
            SaleStatus::Selesai
        } else {
            SaleStatus::Pending
        }
    }

    /// Whether reaching this status hands stock back to the catalog
    pub fn returns_stock(&self) -> bool {
        matches!(self, SaleStatus::Dibatalkan | SaleStatus::Expire)
    }

    pub fn can_transition_to(&self, next: SaleStatus) -> bool {
        matches!(self, SaleStatus::Pending) && next != SaleStatus::Pending
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SaleStatus::Pending),
            "selesai" => Ok(SaleStatus::Selesai),
            "dibatalkan" => Ok(SaleStatus::Dibatalkan),
            "expire" => Ok(SaleStatus::Expire),
            other => Err(format!("Unknown sale status: {}", other)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SaleStateError {
    #[error("sale is already finished")]
    AlreadyFinished,

    #[error("stock for this sale has already been returned")]
    StockAlreadyReturned,

    #[error("sale cannot move from {from} to {to}")]
    InvalidTransition { from: SaleStatus, to: SaleStatus },
}

/// Check that a sale may be cancelled and its stock returned
pub fn ensure_cancellable(status: SaleStatus, stok_dikembalikan: bool) -> Result<(), SaleStateError> {
    if status == SaleStatus::Selesai {
        return Err(SaleStateError::AlreadyFinished);
    }
    if stok_dikembalikan {
        return Err(SaleStateError::StockAlreadyReturned);
    }
    Ok(())
}

/// Validate a generic status change
pub fn ensure_transition(from: SaleStatus, to: SaleStatus) -> Result<(), SaleStateError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(SaleStateError::InvalidTransition { from, to })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SalePlanError {
    #[error("{0}")]
    InvalidCart(&'static str),

    #[error("user {0} is not an active cashier")]
    NotACashier(String),

    #[error("payment gateway is not configured")]
    GatewayUnavailable,
}

/// A sale that passed every check which does not depend on stock. Stock
/// changes for a sale only come from here, so they cannot be issued before
/// the cashier is settled.
#[derive(Debug, Clone, PartialEq)]
pub struct SalePlan {
    pub kasir_id: Uuid,
    pub status: SaleStatus,
    /// One decrement per cart line, in cart order
    pub stock_changes: Vec<StockChange>,
}

impl SalePlan {
    pub fn new(
        cart: &[CartLine],
        kasir: &User,
        is_cash: bool,
        gateway_configured: bool,
    ) -> Result<Self, SalePlanError> {
        validate_cart(cart).map_err(SalePlanError::InvalidCart)?;
        if kasir.role != UserRole::Kasir || !kasir.is_active {
            return Err(SalePlanError::NotACashier(kasir.username.clone()));
        }
        if !is_cash && !gateway_configured {
            return Err(SalePlanError::GatewayUnavailable);
        }

        Ok(Self {
            kasir_id: kasir.id,
            status: SaleStatus::initial(is_cash),
            stock_changes: cart.iter().map(|l| StockChange::Decrement(l.jumlah)).collect(),
        })
    }
}

/// Increments that hand a sale's lines back to the catalog
pub fn restock_changes(lines: &[SaleLine]) -> Vec<(Uuid, StockChange)> {
    lines
        .iter()
        .map(|l| (l.barang_id, StockChange::Increment(l.jumlah)))
        .collect()
}

impl Transaksi {
    /// Claim the one-time stock return and move to `status`. A second claim
    /// fails, so the returned increments are issued at most once.
    pub fn claim_stock_return(&mut self, status: SaleStatus) -> Result<Vec<(Uuid, StockChange)>, SaleStateError> {
        ensure_cancellable(self.status, self.stok_dikembalikan)?;
        if !status.returns_stock() {
            return Err(SaleStateError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.stok_dikembalikan = true;
        Ok(restock_changes(&self.barang_dibeli))
    }
}

/// Build a sale line from the catalog record, ignoring any client price
pub fn build_sale_line(barang: &Barang, jumlah: i32) -> SaleLine {
    let harga_satuan = barang.unit_price();
    SaleLine {
        barang_id: barang.id,
        kode_barang: barang.kode_barang.clone(),
        nama_barang: barang.nama_barang.clone(),
        jumlah,
        harga_satuan,
        harga_beli: barang.harga_beli,
        subtotal: harga_satuan * Decimal::from(jumlah),
    }
}

pub fn sale_total(lines: &[SaleLine]) -> Decimal {
    lines.iter().map(|l| l.subtotal).sum()
}

/// Fresh identifier used as both `order_id` and `nomor_transaksi`
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BarangStatus;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn udang_crispy() -> Barang {
        Barang {
            id: Uuid::new_v4(),
            kode_barang: "BRG001".to_string(),
            nama_barang: "Udang Crispy".to_string(),
            kategori: Some("Makanan".to_string()),
            harga_beli: dec("9000"),
            harga_jual: dec("15000"),
            harga_final: Decimal::ZERO,
            stok: 10,
            stok_minimal: 2,
            margin: dec("40"),
            bahan_baku: vec![],
            status: BarangStatus::Aktif,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_sale_line_uses_catalog_price() {
        let line = build_sale_line(&udang_crispy(), 2);
        assert_eq!(line.harga_satuan, dec("15000"));
        assert_eq!(line.subtotal, dec("30000"));
        assert_eq!(line.harga_beli, dec("9000"));
        assert_eq!(sale_total(&[line]), dec("30000"));
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(SaleStatus::initial(true), SaleStatus::Selesai);
        assert_eq!(SaleStatus::initial(false), SaleStatus::Pending);
    }

    #[test]
    fn test_cancellable() {
        assert!(ensure_cancellable(SaleStatus::Pending, false).is_ok());
        assert_eq!(
            ensure_cancellable(SaleStatus::Selesai, false),
            Err(SaleStateError::AlreadyFinished)
        );
        assert_eq!(
            ensure_cancellable(SaleStatus::Dibatalkan, true),
            Err(SaleStateError::StockAlreadyReturned)
        );
    }

    #[test]
    fn test_transitions_only_leave_pending() {
        assert!(ensure_transition(SaleStatus::Pending, SaleStatus::Selesai).is_ok());
        assert!(ensure_transition(SaleStatus::Pending, SaleStatus::Expire).is_ok());
        assert!(ensure_transition(SaleStatus::Pending, SaleStatus::Pending).is_err());
        assert!(ensure_transition(SaleStatus::Selesai, SaleStatus::Dibatalkan).is_err());
        assert!(ensure_transition(SaleStatus::Expire, SaleStatus::Selesai).is_err());
    }

    fn kasir(role: UserRole, is_active: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: "kasir1".to_string(),
            nama: "Kasir Satu".to_string(),
            role,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cart() -> Vec<CartLine> {
        vec![
            CartLine {
                kode_barang: Some("BRG001".to_string()),
                nama_barang: None,
                jumlah: 2,
                harga_satuan: None,
            },
            CartLine {
                kode_barang: None,
                nama_barang: Some("Es Teh".to_string()),
                jumlah: 1,
                harga_satuan: None,
            },
        ]
    }

    #[test]
    fn test_sale_plan_decrements_in_cart_order() {
        let kasir = kasir(UserRole::Kasir, true);
        let plan = SalePlan::new(&cart(), &kasir, true, false).unwrap();
        assert_eq!(plan.kasir_id, kasir.id);
        assert_eq!(plan.status, SaleStatus::Selesai);
        assert_eq!(
            plan.stock_changes,
            vec![StockChange::Decrement(2), StockChange::Decrement(1)]
        );
    }

    #[test]
    fn test_sale_plan_rejects_invalid_cashier() {
        assert_eq!(
            SalePlan::new(&cart(), &kasir(UserRole::Chef, true), true, true),
            Err(SalePlanError::NotACashier("kasir1".to_string()))
        );
        assert_eq!(
            SalePlan::new(&cart(), &kasir(UserRole::Kasir, false), true, true),
            Err(SalePlanError::NotACashier("kasir1".to_string()))
        );
    }

    #[test]
    fn test_sale_plan_requires_gateway_for_non_cash() {
        let kasir = kasir(UserRole::Kasir, true);
        assert_eq!(
            SalePlan::new(&cart(), &kasir, false, false),
            Err(SalePlanError::GatewayUnavailable)
        );
        let plan = SalePlan::new(&cart(), &kasir, false, true).unwrap();
        assert_eq!(plan.status, SaleStatus::Pending);
    }

    #[test]
    fn test_sale_plan_rejects_empty_cart() {
        assert_eq!(
            SalePlan::new(&[], &kasir(UserRole::Kasir, true), true, true),
            Err(SalePlanError::InvalidCart("Cart is empty"))
        );
    }

    #[test]
    fn test_generate_order_id_is_uuid() {
        let id = generate_order_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, generate_order_id());
    }
}
