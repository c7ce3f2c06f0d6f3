//! Cashier attribution for new sales

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sqlx::PgPool;

use shared::{User, UserRole};

use crate::error::{AppError, AppResult};
use crate::services::auth::UserRow;

#[derive(Clone)]
pub struct CashierSelector {
    db: PgPool,
    cursor: Arc<AtomicUsize>,
}

impl CashierSelector {
    pub fn new(db: PgPool, cursor: Arc<AtomicUsize>) -> Self {
        Self { db, cursor }
    }

    /// Resolve the cashier a sale is booked to. An explicit username must be
    /// an active kasir; otherwise active cashiers are taken in turn.
    pub async fn resolve(&self, kasir_username: Option<&str>) -> AppResult<User> {
        match kasir_username.map(str::trim).filter(|u| !u.is_empty()) {
            Some(username) => self.by_username(username).await,
            None => self.next_in_rotation().await,
        }
    }

    async fn by_username(&self, username: &str) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, nama, password_hash, role, is_active, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username.to_lowercase())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Kasir".to_string()))?;

        let user = User::try_from(row)?;
        if user.role != UserRole::Kasir || !user.is_active {
            return Err(AppError::validation(
                "kasir_username",
                "User is not an active cashier",
            ));
        }
        Ok(user)
    }

    async fn next_in_rotation(&self) -> AppResult<User> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, nama, password_hash, role, is_active, created_at, updated_at
            FROM users
            WHERE role = 'kasir' AND is_active = TRUE
            ORDER BY username ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let index = pick(&self.cursor, rows.len())
            .ok_or_else(|| AppError::NotFound("Active kasir".to_string()))?;
        let row = rows
            .into_iter()
            .nth(index)
            .ok_or_else(|| AppError::NotFound("Active kasir".to_string()))?;

        row.try_into()
    }
}

/// Advance the rotation and return the index to use among `len` cashiers
fn pick(cursor: &AtomicUsize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(cursor.fetch_add(1, Ordering::Relaxed) % len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_cycles() {
        let cursor = AtomicUsize::new(0);
        let picks: Vec<_> = (0..5).filter_map(|_| pick(&cursor, 3)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_no_cashiers() {
        let cursor = AtomicUsize::new(7);
        assert_eq!(pick(&cursor, 0), None);
        assert_eq!(cursor.load(Ordering::Relaxed), 7);
    }
}
