//! WebAssembly module for the Kedai POS cashier and kitchen UIs
//!
//! Provides client-side computation for:
//! - Price previews (margin, tax, discount, service charge)
//! - Payment method parsing
//! - Cart totals from catalog prices
//! - Role permission lookups for menu rendering
//!
//! Amounts cross the boundary as decimal strings so rupiah values keep
//! their exact precision.

use std::str::FromStr;

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use shared::{
    apply_change, claim_quantity, effective_unit_price, harga_final, harga_jual_from_margin,
    PaymentSelection, PriceAdjustments, StockChange, UserRole,
};

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("kedai-pos wasm ready"));
}

fn parse_amount(field: &str, value: &str) -> Result<Decimal, JsValue> {
    Decimal::from_str(value.trim())
        .map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", field, e)))
}

/// Selling price for a cost and a margin on price
#[wasm_bindgen]
pub fn preview_harga_jual(modal: &str, margin_persen: &str) -> Result<String, JsValue> {
    let modal = parse_amount("modal", modal)?;
    let margin = parse_amount("margin", margin_persen)?;
    harga_jual_from_margin(modal, margin)
        .map(|harga| harga.to_string())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Shelf price after discount, tax and service charge
#[wasm_bindgen]
pub fn preview_harga_final(
    harga_jual: &str,
    pajak_persen: &str,
    diskon_persen: &str,
    service_charge_persen: &str,
) -> Result<String, JsValue> {
    let adjustments = PriceAdjustments {
        pajak_persen: parse_amount("pajak_persen", pajak_persen)?,
        diskon_persen: parse_amount("diskon_persen", diskon_persen)?,
        service_charge_persen: parse_amount("service_charge_persen", service_charge_persen)?,
    };
    adjustments
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let harga_jual = parse_amount("harga_jual", harga_jual)?;
    Ok(harga_final(harga_jual, &adjustments).to_string())
}

/// Parse a combined payment string such as `"Virtual Account (BCA)"`.
/// Returns the selection as JSON: `{kind, method, channel}`.
#[wasm_bindgen]
pub fn parse_payment_method(raw: &str) -> Result<String, JsValue> {
    let selection =
        PaymentSelection::parse(raw).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&selection).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Whether a payment string settles at the counter
#[wasm_bindgen]
pub fn is_cash_payment(raw: &str) -> bool {
    PaymentSelection::parse(raw)
        .map(|s| s.is_cash())
        .unwrap_or(false)
}

#[derive(serde::Deserialize)]
struct PreviewLine {
    harga_jual: Decimal,
    #[serde(default)]
    harga_final: Decimal,
    jumlah: i32,
}

/// Cart total as the server will charge it. Takes a JSON array of
/// `{harga_jual, harga_final, jumlah}` copied from the catalog.
#[wasm_bindgen]
pub fn cart_total(lines_json: &str) -> Result<String, JsValue> {
    let lines: Vec<PreviewLine> = serde_json::from_str(lines_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid cart JSON: {}", e)))?;

    let mut total = Decimal::ZERO;
    for line in &lines {
        if line.jumlah <= 0 {
            return Err(JsValue::from_str("Quantity must be positive"));
        }
        total += effective_unit_price(line.harga_jual, line.harga_final) * Decimal::from(line.jumlah);
    }
    Ok(total.to_string())
}

/// Stock left after selling `jumlah`, or an error when the shelf is short
#[wasm_bindgen]
pub fn stock_after_sale(stok: i32, jumlah: i32) -> Result<i32, JsValue> {
    apply_change(i64::from(stok), StockChange::Decrement(jumlah))
        .map(|sisa| sisa as i32)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Raw-material stock left after a chef claim
#[wasm_bindgen]
pub fn stock_after_claim(total_stok: &str, jumlah: i32) -> Result<String, JsValue> {
    let total_stok = parse_amount("total_stok", total_stok)?;
    claim_quantity(total_stok, jumlah)
        .map(|sisa| sisa.to_string())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// `resource:action` strings granted to a role, for hiding menu entries
#[wasm_bindgen]
pub fn permissions_for_role(role: &str) -> Result<js_sys::Array, JsValue> {
    let role = UserRole::from_str(role).map_err(|e| JsValue::from_str(&e))?;
    Ok(role
        .permission_strings()
        .into_iter()
        .map(JsValue::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_harga_jual() {
        assert_eq!(preview_harga_jual("7000", "30").unwrap(), "10000");
    }

    #[test]
    fn test_preview_harga_final() {
        assert_eq!(preview_harga_final("10000", "10", "0", "0").unwrap(), "11000");
        assert_eq!(preview_harga_final("10000", "0", "10", "0").unwrap(), "9000");
    }

    #[test]
    fn test_parse_payment_method() {
        let json = parse_payment_method("Virtual Account (BCA)").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "virtual_account");
        assert_eq!(value["channel"], "BCA");
    }

    #[test]
    fn test_is_cash_payment() {
        assert!(is_cash_payment("Tunai"));
        assert!(!is_cash_payment("QRIS"));
        assert!(!is_cash_payment(""));
    }

    #[test]
    fn test_cart_total() {
        let total = cart_total(
            r#"[{"harga_jual": "15000", "jumlah": 2},
                {"harga_jual": "5000", "harga_final": "5500", "jumlah": 1}]"#,
        )
        .unwrap();
        assert_eq!(total, "35500");
    }

    #[test]
    fn test_stock_after_sale() {
        assert_eq!(stock_after_sale(10, 2).unwrap(), 8);
    }

    #[test]
    fn test_stock_after_claim() {
        assert_eq!(stock_after_claim("20", 5).unwrap(), "15");
    }
}
