//! Firebase Realtime Database client for catalog stock counters
//!
//! Counters live at `<root>/barang/<id>/stok`. A conditional update is a GET
//! with `X-Firebase-ETag: true` followed by a PUT carrying `if-match`; a 412
//! means another writer got there first and the step is retried.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use shared::{apply_change, StockChange, StockError};

use crate::config::FirebaseConfig;

const MAX_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum FastPathError {
    /// The precondition failed; the counter was not written
    #[error(transparent)]
    Rejected(#[from] StockError),

    /// The store could not be reached or kept conflicting
    #[error("fast-path store unavailable: {0}")]
    Unavailable(String),
}

/// Stock counters in Firebase RTDB
#[derive(Clone)]
pub struct FirebaseCounterStore {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    root: String,
}

impl FirebaseCounterStore {
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.database_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            root: config.root.trim_matches('/').to_string(),
        }
    }

    fn counter_url(&self, id: Uuid) -> String {
        let mut url = format!("{}/{}.json", self.base_url, counter_path(&self.root, id));
        if let Some(token) = &self.auth_token {
            url.push_str("?auth=");
            url.push_str(token);
        }
        url
    }

    /// Apply a stock change with compare-and-swap semantics. `seed` is used
    /// when the counter does not exist yet. Returns the committed value.
    pub async fn apply(
        &self,
        id: Uuid,
        change: StockChange,
        seed: i64,
    ) -> Result<i64, FastPathError> {
        let url = self.counter_url(id);

        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .client
                .get(&url)
                .header("X-Firebase-ETag", "true")
                .send()
                .await
                .map_err(|e| FastPathError::Unavailable(format!("read failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(FastPathError::Unavailable(format!(
                    "read returned {}",
                    response.status()
                )));
            }

            let etag = response
                .headers()
                .get("etag")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| FastPathError::Unavailable("missing ETag".to_string()))?;

            let body: Value = response
                .json()
                .await
                .map_err(|e| FastPathError::Unavailable(format!("bad counter body: {}", e)))?;

            let current = parse_counter(&body).unwrap_or(seed);
            let next = apply_change(current, change)?;

            let write = self
                .client
                .put(&url)
                .header("if-match", etag)
                .json(&next)
                .send()
                .await
                .map_err(|e| FastPathError::Unavailable(format!("write failed: {}", e)))?;

            match write.status() {
                s if s.is_success() => return Ok(next),
                StatusCode::PRECONDITION_FAILED => {
                    tracing::debug!(barang_id = %id, attempt, "Counter write conflicted, retrying");
                }
                s => {
                    return Err(FastPathError::Unavailable(format!("write returned {}", s)));
                }
            }
        }

        Err(FastPathError::Unavailable(format!(
            "gave up after {} conflicting writes",
            MAX_ATTEMPTS
        )))
    }

    /// Overwrite a counter unconditionally
    pub async fn set(&self, id: Uuid, value: i64) -> Result<(), FastPathError> {
        let response = self
            .client
            .put(self.counter_url(id))
            .json(&value)
            .send()
            .await
            .map_err(|e| FastPathError::Unavailable(format!("write failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FastPathError::Unavailable(format!(
                "write returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Whether the database answers at all
    pub async fn ping(&self) -> bool {
        let mut url = format!("{}/.json?shallow=true", self.base_url);
        if let Some(token) = &self.auth_token {
            url.push_str("&auth=");
            url.push_str(token);
        }
        matches!(self.client.get(url).send().await, Ok(r) if r.status().is_success())
    }
}

fn counter_path(root: &str, id: Uuid) -> String {
    if root.is_empty() {
        format!("barang/{}/stok", id)
    } else {
        format!("{}/barang/{}/stok", root, id)
    }
}

/// Read a counter value. Firebase returns `null` for missing paths and may
/// store numbers as floats or strings when written by other clients.
fn parse_counter(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counter_path() {
        let id = Uuid::nil();
        assert_eq!(
            counter_path("", id),
            "barang/00000000-0000-0000-0000-000000000000/stok"
        );
        assert_eq!(
            counter_path("kedai", id),
            "kedai/barang/00000000-0000-0000-0000-000000000000/stok"
        );
    }

    #[test]
    fn test_counter_url_with_auth() {
        let store = FirebaseCounterStore::new(&FirebaseConfig {
            database_url: "https://kedai.firebaseio.com/".to_string(),
            auth_token: Some("tok".to_string()),
            root: "/pos/".to_string(),
        });
        let url = store.counter_url(Uuid::nil());
        assert!(url.starts_with("https://kedai.firebaseio.com/pos/barang/"));
        assert!(url.ends_with("/stok.json?auth=tok"));
    }

    #[test]
    fn test_parse_counter() {
        assert_eq!(parse_counter(&json!(10)), Some(10));
        assert_eq!(parse_counter(&json!(7.0)), Some(7));
        assert_eq!(parse_counter(&json!("12")), Some(12));
        assert_eq!(parse_counter(&Value::Null), None);
        assert_eq!(parse_counter(&json!({"stok": 1})), None);
    }
}
