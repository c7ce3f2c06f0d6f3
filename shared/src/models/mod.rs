//! Domain models for the Kedai POS platform

mod bahan_baku;
mod barang;
mod hpp;
mod modal;
mod production;
mod settings;
mod transaksi;
mod user;

pub use bahan_baku::*;
pub use barang::*;
pub use hpp::*;
pub use modal::*;
pub use production::*;
pub use settings::*;
pub use transaksi::*;
pub use user::*;
