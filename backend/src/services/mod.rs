//! Business logic services for the Kedai POS platform

pub mod auth;
pub mod bahan_baku;
pub mod barang;
pub mod cashier;
pub mod hpp;
pub mod modal;
pub mod payment;
pub mod production;
pub mod reporting;
pub mod settings;
pub mod stock;
pub mod transaksi;

pub use auth::AuthService;
pub use bahan_baku::BahanBakuService;
pub use barang::BarangService;
pub use cashier::CashierSelector;
pub use hpp::HppService;
pub use modal::ModalService;
pub use production::ProductionService;
pub use reporting::ReportingService;
pub use settings::SettingsService;
pub use stock::StockEngine;
pub use transaksi::TransaksiService;
