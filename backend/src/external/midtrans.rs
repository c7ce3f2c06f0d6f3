//! Midtrans payment gateway client
//!
//! Virtual accounts and QRIS go through the Core API charge endpoint; every
//! other non-cash method gets a Snap hosted-page token.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha512};

use shared::{PaymentKind, PaymentReference, PaymentSelection, SaleLine};

use crate::config::MidtransConfig;
use crate::error::{AppError, AppResult};

const SANDBOX_API: &str = "https://api.sandbox.midtrans.com";
const PRODUCTION_API: &str = "https://api.midtrans.com";
const SANDBOX_SNAP: &str = "https://app.sandbox.midtrans.com";
const PRODUCTION_SNAP: &str = "https://app.midtrans.com";

/// Midtrans API client
#[derive(Clone)]
pub struct MidtransClient {
    client: Client,
    server_key: String,
    api_base: String,
    snap_base: String,
}

/// What to charge
pub struct ChargeRequest<'a> {
    pub order_id: &'a str,
    pub gross_amount: Decimal,
    pub selection: &'a PaymentSelection,
    pub items: &'a [SaleLine],
}

#[derive(Debug, Deserialize)]
struct ChargeResponse {
    status_code: Option<String>,
    status_message: Option<String>,
    payment_type: Option<String>,
    #[serde(default)]
    va_numbers: Vec<VaNumber>,
    permata_va_number: Option<String>,
    bill_key: Option<String>,
    biller_code: Option<String>,
    qr_string: Option<String>,
    expiry_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VaNumber {
    va_number: String,
}

#[derive(Debug, Deserialize)]
struct SnapResponse {
    token: Option<String>,
    redirect_url: Option<String>,
    #[serde(default)]
    error_messages: Vec<String>,
}

impl MidtransClient {
    pub fn new(config: &MidtransConfig) -> Self {
        let (api_base, snap_base) = if config.is_production {
            (PRODUCTION_API, PRODUCTION_SNAP)
        } else {
            (SANDBOX_API, SANDBOX_SNAP)
        };
        Self {
            client: Client::new(),
            server_key: config.server_key.clone(),
            api_base: api_base.to_string(),
            snap_base: snap_base.to_string(),
        }
    }

    pub fn server_key(&self) -> &str {
        &self.server_key
    }

    fn authorization(&self) -> String {
        format!("Basic {}", BASE64.encode(format!("{}:", self.server_key)))
    }

    /// Request a payment reference for a non-cash sale
    pub async fn charge(&self, request: ChargeRequest<'_>) -> AppResult<PaymentReference> {
        match request.selection.kind {
            PaymentKind::VirtualAccount | PaymentKind::Qris => self.core_charge(&request).await,
            _ => self.snap_transaction(&request).await,
        }
    }

    async fn core_charge(&self, request: &ChargeRequest<'_>) -> AppResult<PaymentReference> {
        let body = core_charge_body(request);
        let url = format!("{}/v2/charge", self.api_base);

        let value = self.post_json(&url, &body).await?;
        let response: ChargeResponse = serde_json::from_value(value)
            .map_err(|e| AppError::PaymentGateway(format!("Unexpected charge response: {}", e)))?;

        reference_from_charge(response)
    }

    async fn snap_transaction(&self, request: &ChargeRequest<'_>) -> AppResult<PaymentReference> {
        let body = json!({
            "transaction_details": {
                "order_id": request.order_id,
                "gross_amount": whole_rupiah(request.gross_amount),
            },
            "item_details": item_details(request.items),
        });
        let url = format!("{}/snap/v1/transactions", self.snap_base);

        let value = self.post_json(&url, &body).await?;
        let response: SnapResponse = serde_json::from_value(value)
            .map_err(|e| AppError::PaymentGateway(format!("Unexpected Snap response: {}", e)))?;

        match response.token {
            Some(token) => Ok(PaymentReference {
                payment_type: "snap".to_string(),
                va_number: None,
                qr_string: None,
                token: Some(token),
                redirect_url: response.redirect_url,
                expiry_time: None,
            }),
            None => Err(AppError::PaymentGateway(if response.error_messages.is_empty() {
                "Snap returned no token".to_string()
            } else {
                response.error_messages.join("; ")
            })),
        }
    }

    async fn post_json(&self, url: &str, body: &Value) -> AppResult<Value> {
        let response = self
            .client
            .post(url)
            .header("Authorization", self.authorization())
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("Midtrans request failed: {}", e)))?;

        let status = response.status();
        let value: Value = response
            .json()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("Failed to parse Midtrans response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::PaymentGateway(format!("Midtrans error: {} - {}", status, value)));
        }
        Ok(value)
    }
}

fn whole_rupiah(amount: Decimal) -> i64 {
    amount.round().to_i64().unwrap_or(0)
}

fn item_details(items: &[SaleLine]) -> Vec<Value> {
    items
        .iter()
        .map(|line| {
            json!({
                "id": line.kode_barang,
                "name": line.nama_barang,
                "price": whole_rupiah(line.harga_satuan),
                "quantity": line.jumlah,
            })
        })
        .collect()
}

fn core_charge_body(request: &ChargeRequest<'_>) -> Value {
    let transaction_details = json!({
        "order_id": request.order_id,
        "gross_amount": whole_rupiah(request.gross_amount),
    });
    let items = item_details(request.items);

    match request.selection.kind {
        PaymentKind::Qris => json!({
            "payment_type": "qris",
            "transaction_details": transaction_details,
            "item_details": items,
        }),
        _ => {
            let bank = request
                .selection
                .channel
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_lowercase();
            if bank == "mandiri" {
                json!({
                    "payment_type": "echannel",
                    "transaction_details": transaction_details,
                    "item_details": items,
                    "echannel": {
                        "bill_info1": "Pembayaran",
                        "bill_info2": request.order_id,
                    },
                })
            } else {
                json!({
                    "payment_type": "bank_transfer",
                    "transaction_details": transaction_details,
                    "item_details": items,
                    "bank_transfer": { "bank": bank },
                })
            }
        }
    }
}

fn reference_from_charge(response: ChargeResponse) -> AppResult<PaymentReference> {
    let ok = response
        .status_code
        .as_deref()
        .map(|c| c.starts_with('2'))
        .unwrap_or(false);
    if !ok {
        return Err(AppError::PaymentGateway(
            response
                .status_message
                .unwrap_or_else(|| "Charge was not accepted".to_string()),
        ));
    }

    let va_number = response
        .va_numbers
        .into_iter()
        .next()
        .map(|v| v.va_number)
        .or(response.permata_va_number)
        .or_else(|| match (response.biller_code, response.bill_key) {
            (Some(biller), Some(key)) => Some(format!("{}-{}", biller, key)),
            (None, Some(key)) => Some(key),
            _ => None,
        });

    Ok(PaymentReference {
        payment_type: response.payment_type.unwrap_or_default(),
        va_number,
        qr_string: response.qr_string,
        token: None,
        redirect_url: None,
        expiry_time: response.expiry_time,
    })
}

/// `sha512(order_id + status_code + gross_amount + server_key)`, hex encoded
pub fn notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
    signature_key: &str,
) -> bool {
    notification_signature(order_id, status_code, gross_amount, server_key)
        .eq_ignore_ascii_case(signature_key.trim())
}
