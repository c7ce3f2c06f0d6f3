//! HTTP handlers for the Kedai POS API

mod auth;
mod bahan_baku;
mod barang;
mod health;
mod hpp;
mod modal;
mod payment;
mod production;
mod reporting;
mod settings;
mod transaksi;

pub use auth::*;
pub use bahan_baku::*;
pub use barang::*;
pub use health::*;
pub use hpp::*;
pub use modal::*;
pub use payment::*;
pub use production::*;
pub use reporting::*;
pub use settings::*;
pub use transaksi::*;
