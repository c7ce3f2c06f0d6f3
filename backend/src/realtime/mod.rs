//! Realtime fan-out of stock, sale, and production changes
//!
//! ```text
//! services ──publish──▶ RealtimeHub (broadcast) ──▶ GET /ws sessions
//! ```
//!
//! Publish-only. Events sent with no subscribers are dropped.

mod ws;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use shared::{Barang, Production, Transaksi};

pub use ws::ws_handler;

const BROADCAST_CAPACITY: usize = 256;

/// An event pushed to connected clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum RealtimeEvent {
    #[serde(rename = "stockUpdated")]
    StockUpdated { id: Uuid, stok: i64 },

    #[serde(rename = "statusUpdated")]
    StatusUpdated(Box<Transaksi>),

    #[serde(rename = "barang:created")]
    BarangCreated(Box<Barang>),

    #[serde(rename = "barang:updated")]
    BarangUpdated(Box<Barang>),

    #[serde(rename = "production:updated")]
    ProductionUpdated(Box<Production>),
}

impl RealtimeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::StockUpdated { .. } => "stockUpdated",
            RealtimeEvent::StatusUpdated(_) => "statusUpdated",
            RealtimeEvent::BarangCreated(_) => "barang:created",
            RealtimeEvent::BarangUpdated(_) => "barang:updated",
            RealtimeEvent::ProductionUpdated(_) => "production:updated",
        }
    }

    /// JSON frame `{event, data}`
    pub fn to_frame(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<RealtimeEvent>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: RealtimeEvent) {
        tracing::trace!(event = event.name(), "publish");
        // No subscribers is not an error
        let _ = self.tx.send(event);
    }

    pub fn stock_updated(&self, id: Uuid, stok: i64) {
        self.publish(RealtimeEvent::StockUpdated { id, stok });
    }

    pub fn status_updated(&self, sale: &Transaksi) {
        self.publish(RealtimeEvent::StatusUpdated(Box::new(sale.clone())));
    }

    pub fn barang_created(&self, barang: &Barang) {
        self.publish(RealtimeEvent::BarangCreated(Box::new(barang.clone())));
    }

    pub fn barang_updated(&self, barang: &Barang) {
        self.publish(RealtimeEvent::BarangUpdated(Box::new(barang.clone())));
    }

    pub fn production_updated(&self, production: &Production) {
        self.publish(RealtimeEvent::ProductionUpdated(Box::new(production.clone())));
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
