//! Stock counter engine
//!
//! Every catalog stock change goes through here. The fast-path store is tried
//! first; its compare-and-swap is safe under concurrent sales of one good.
//! When it is not configured or cannot be reached, the change falls back to a
//! conditional update on the primary store and the outcome is flagged
//! `degraded`.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::{StockChange, StockError};

use crate::error::{AppError, AppResult};
use crate::external::{FastPathError, FirebaseCounterStore};
use crate::realtime::RealtimeHub;
use crate::AppState;

/// Result of a committed stock change
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StockOutcome {
    pub barang_id: Uuid,
    pub stok: i64,
    /// The change was made without the fast-path store
    pub degraded: bool,
}

#[derive(Clone)]
pub struct StockEngine {
    db: PgPool,
    fast_path: Option<FirebaseCounterStore>,
    hub: RealtimeHub,
}

impl StockEngine {
    pub fn new(db: PgPool, fast_path: Option<FirebaseCounterStore>, hub: RealtimeHub) -> Self {
        Self { db, fast_path, hub }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.db.clone(), state.fast_path.clone(), state.hub.clone())
    }

    /// Apply a change to one good's stock. `current_stok` seeds the fast-path
    /// counter if it has never been written.
    pub async fn apply(
        &self,
        barang_id: Uuid,
        current_stok: i32,
        change: StockChange,
    ) -> AppResult<StockOutcome> {
        if change.quantity() <= 0 {
            return Err(StockError::InvalidQuantity(change.quantity()).into());
        }

        if let Some(fast_path) = &self.fast_path {
            match fast_path.apply(barang_id, change, current_stok as i64).await {
                Ok(stok) => {
                    self.mirror_to_primary(barang_id, stok).await;
                    self.hub.stock_updated(barang_id, stok);
                    return Ok(StockOutcome {
                        barang_id,
                        stok,
                        degraded: false,
                    });
                }
                Err(FastPathError::Rejected(e)) => return Err(e.into()),
                Err(FastPathError::Unavailable(reason)) => {
                    tracing::warn!(
                        barang_id = %barang_id,
                        "Fast-path stock store unavailable, using primary store: {}",
                        reason
                    );
                }
            }
        }

        let stok = self.apply_primary(barang_id, change).await?;
        self.mirror_to_fast_path(barang_id, stok).await;
        self.hub.stock_updated(barang_id, stok);

        Ok(StockOutcome {
            barang_id,
            stok,
            degraded: true,
        })
    }

    /// Conditional update on the primary store. A decrement only matches rows
    /// that still hold enough stock.
    async fn apply_primary(&self, barang_id: Uuid, change: StockChange) -> AppResult<i64> {
        let updated = match change {
            StockChange::Decrement(n) => {
                sqlx::query_scalar::<_, i32>(
                    r#"
                    UPDATE barang SET stok = stok - $2, updated_at = NOW()
                    WHERE id = $1 AND stok >= $2
                    RETURNING stok
                    "#,
                )
                .bind(barang_id)
                .bind(n)
                .fetch_optional(&self.db)
                .await?
            }
            StockChange::Increment(n) => {
                sqlx::query_scalar::<_, i32>(
                    r#"
                    UPDATE barang SET stok = stok + $2, updated_at = NOW()
                    WHERE id = $1
                    RETURNING stok
                    "#,
                )
                .bind(barang_id)
                .bind(n)
                .fetch_optional(&self.db)
                .await?
            }
        };

        if let Some(stok) = updated {
            return Ok(stok as i64);
        }

        let available = sqlx::query_scalar::<_, i32>("SELECT stok FROM barang WHERE id = $1")
            .bind(barang_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Barang".to_string()))?;

        Err(StockError::Insufficient {
            available: available as i64,
            requested: change.quantity(),
        }
        .into())
    }

    /// Publish a stock value written directly to the primary store (catalog
    /// edits, production output)
    pub async fn publish_counter(&self, barang_id: Uuid, stok: i64) {
        self.mirror_to_fast_path(barang_id, stok).await;
        self.hub.stock_updated(barang_id, stok);
    }

    async fn mirror_to_primary(&self, barang_id: Uuid, stok: i64) {
        let result = sqlx::query("UPDATE barang SET stok = $2, updated_at = NOW() WHERE id = $1")
            .bind(barang_id)
            .bind(stok as i32)
            .execute(&self.db)
            .await;

        if let Err(e) = result {
            tracing::error!(barang_id = %barang_id, stok, "Failed to mirror stock into primary store: {}", e);
        }
    }

    async fn mirror_to_fast_path(&self, barang_id: Uuid, stok: i64) {
        if let Some(fast_path) = &self.fast_path {
            if let Err(e) = fast_path.set(barang_id, stok).await {
                tracing::warn!(barang_id = %barang_id, stok, "Failed to mirror stock into fast-path store: {}", e);
            }
        }
    }

    /// Whether the fast-path counter is the authority for stock values
    pub fn fast_path_configured(&self) -> bool {
        self.fast_path.is_some()
    }
}
