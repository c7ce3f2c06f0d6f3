//! Validation utilities for the Kedai POS platform

use rust_decimal::Decimal;

use crate::models::{BahanItem, CartLine, PaymentMethodConfig, ResepProduk};

// ============================================================================
// Catalog & Inventory Validations
// ============================================================================

/// Validate catalog code format (2-20 uppercase alphanumeric, dash allowed)
pub fn validate_kode_barang(kode: &str) -> Result<(), &'static str> {
    if kode.len() < 2 {
        return Err("Kode barang must be at least 2 characters");
    }
    if kode.len() > 20 {
        return Err("Kode barang must be at most 20 characters");
    }
    if !kode
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Kode barang must be uppercase alphanumeric");
    }
    Ok(())
}

/// Validate a stock or sale quantity
pub fn validate_quantity(jumlah: i32) -> Result<(), &'static str> {
    if jumlah <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Largest rupiah amount a money column holds (`NUMERIC(15, 2)`)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_7FFF, 0x0003_8D7E, 0, false, 2);

/// Largest raw-material quantity a lot holds (`NUMERIC(15, 3)`)
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(0xA4C6_7FFF, 0x0003_8D7E, 0, false, 3);

/// Validate ingredient lines: named, non-negative price and quantity, and
/// small enough that the lot totals fit a money column
pub fn validate_bahan_items(items: &[BahanItem]) -> Result<(), &'static str> {
    let mut total_stok = Decimal::ZERO;
    let mut total_harga = Decimal::ZERO;
    for item in items {
        if item.nama.trim().is_empty() {
            return Err("Ingredient name is required");
        }
        if item.harga < Decimal::ZERO {
            return Err("Ingredient price cannot be negative");
        }
        if item.jumlah < Decimal::ZERO {
            return Err("Ingredient quantity cannot be negative");
        }
        if item.harga > MAX_AMOUNT || item.jumlah > MAX_QUANTITY {
            return Err("Ingredient price or quantity is too large");
        }
        total_stok = total_stok
            .checked_add(item.jumlah)
            .filter(|t| *t <= MAX_QUANTITY)
            .ok_or("Total ingredient quantity is too large")?;
        total_harga = item
            .harga
            .checked_mul(item.jumlah)
            .and_then(|subtotal| total_harga.checked_add(subtotal))
            .filter(|t| *t <= MAX_AMOUNT)
            .ok_or("Total ingredient cost is too large")?;
    }
    Ok(())
}

/// Validate a master recipe
pub fn validate_recipe(resep: &ResepProduk) -> Result<(), &'static str> {
    if resep.nama_produk.trim().is_empty() {
        return Err("Recipe product name is required");
    }
    if resep.jumlah_porsi <= 0 {
        return Err("Recipe portions must be positive");
    }
    if resep.bahan.is_empty() {
        return Err("Recipe must list at least one ingredient");
    }
    validate_bahan_items(&resep.bahan)
}

// ============================================================================
// Sale Validations
// ============================================================================

/// Validate a cart before any lookup: non-empty, every line identifies a good
/// and has a positive quantity
pub fn validate_cart(cart: &[CartLine]) -> Result<(), &'static str> {
    if cart.is_empty() {
        return Err("Cart is empty");
    }
    for line in cart {
        let has_code = line.kode_barang.as_deref().is_some_and(|k| !k.trim().is_empty());
        let has_name = line.nama_barang.as_deref().is_some_and(|n| !n.trim().is_empty());
        if !has_code && !has_name {
            return Err("Each cart line needs kode_barang or nama_barang");
        }
        validate_quantity(line.jumlah)?;
    }
    Ok(())
}

/// Validate configured payment methods: unique names, at least one active
pub fn validate_payment_methods(methods: &[PaymentMethodConfig]) -> Result<(), &'static str> {
    if !methods.iter().any(|m| m.aktif) {
        return Err("At least one payment method must be active");
    }
    let mut seen = std::collections::HashSet::new();
    for method in methods {
        if method.nama.trim().is_empty() {
            return Err("Payment method name is required");
        }
        if !seen.insert(crate::types::normalize_name(&method.nama)) {
            return Err("Payment method names must be unique");
        }
        if method.channels.iter().any(|c| c.nama.trim().is_empty()) {
            return Err("Payment channel name is required");
        }
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate username format (3-32 lowercase alphanumeric, underscore or dot)
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters");
    }
    if username.len() > 32 {
        return Err("Username must be at most 32 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
    {
        return Err("Username must be lowercase alphanumeric");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentChannelConfig;

    // ========================================================================
    // Catalog Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_kode_barang() {
        assert!(validate_kode_barang("BRG001").is_ok());
        assert!(validate_kode_barang("MKN-01").is_ok());
        assert!(validate_kode_barang("b").is_err());
        assert!(validate_kode_barang("brg001").is_err());
        assert!(validate_kode_barang("BRG 001").is_err());
    }

    #[test]
    fn test_validate_bahan_items() {
        let ok = BahanItem {
            nama: "Udang".to_string(),
            harga: Decimal::from(3000),
            jumlah: Decimal::from(10),
        };
        assert!(validate_bahan_items(&[ok.clone()]).is_ok());

        let unnamed = BahanItem {
            nama: " ".to_string(),
            ..ok.clone()
        };
        assert!(validate_bahan_items(&[unnamed]).is_err());

        let negative = BahanItem {
            jumlah: Decimal::from(-1),
            ..ok.clone()
        };
        assert!(validate_bahan_items(&[negative]).is_err());
    }

    #[test]
    fn test_max_amount_matches_money_column() {
        assert_eq!(MAX_AMOUNT.to_string(), "9999999999999.99");
        assert_eq!(MAX_QUANTITY.to_string(), "999999999999.999");
    }

    #[test]
    fn test_oversized_bahan_items_rejected() {
        let huge = BahanItem {
            nama: "Udang".to_string(),
            harga: Decimal::MAX,
            jumlah: Decimal::from(2),
        };
        assert!(validate_bahan_items(&[huge]).is_err());

        // each value fits, the product does not
        let costly = BahanItem {
            nama: "Saffron".to_string(),
            harga: Decimal::from(10_000_000_000i64),
            jumlah: Decimal::from(10_000),
        };
        assert_eq!(
            validate_bahan_items(&[costly]),
            Err("Total ingredient cost is too large")
        );

        let at_limit = BahanItem {
            nama: "Udang".to_string(),
            harga: MAX_AMOUNT,
            jumlah: Decimal::ONE,
        };
        assert!(validate_bahan_items(&[at_limit.clone()]).is_ok());
        assert!(validate_bahan_items(&[at_limit.clone(), at_limit]).is_err());
    }

    // ========================================================================
    // Sale Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_cart() {
        let line = CartLine {
            kode_barang: Some("BRG001".to_string()),
            nama_barang: Some("Udang Crispy".to_string()),
            jumlah: 2,
            harga_satuan: None,
        };
        assert!(validate_cart(&[line.clone()]).is_ok());
        assert_eq!(validate_cart(&[]), Err("Cart is empty"));

        let by_name_only = CartLine {
            kode_barang: None,
            ..line.clone()
        };
        assert!(validate_cart(&[by_name_only]).is_ok());

        let anonymous = CartLine {
            kode_barang: None,
            nama_barang: Some("".to_string()),
            ..line.clone()
        };
        assert!(validate_cart(&[anonymous]).is_err());

        let zero = CartLine { jumlah: 0, ..line };
        assert_eq!(validate_cart(&[zero]), Err("Quantity must be positive"));
    }

    #[test]
    fn test_validate_payment_methods() {
        let tunai = PaymentMethodConfig {
            nama: "Tunai".to_string(),
            aktif: true,
            logo: None,
            channels: vec![],
        };
        assert!(validate_payment_methods(&[tunai.clone()]).is_ok());
        assert!(validate_payment_methods(&[tunai.clone(), tunai.clone()]).is_err());

        let inactive = PaymentMethodConfig {
            aktif: false,
            ..tunai.clone()
        };
        assert!(validate_payment_methods(&[inactive]).is_err());

        let blank_channel = PaymentMethodConfig {
            nama: "Virtual Account".to_string(),
            channels: vec![PaymentChannelConfig {
                nama: "".to_string(),
                aktif: true,
                logo: None,
            }],
            ..tunai
        };
        assert!(validate_payment_methods(&[blank_channel]).is_err());
    }

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_username() {
        assert!(validate_username("kasir_01").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("Kasir").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("rahasia123").is_ok());
        assert!(validate_password("short").is_err());
    }
}
