//! External API integrations

pub mod firebase;
pub mod midtrans;

pub use firebase::{FastPathError, FirebaseCounterStore};
pub use midtrans::MidtransClient;
