//! Shop settings

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::PriceAdjustments;

/// A payment channel under a method, e.g. a bank for virtual accounts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentChannelConfig {
    pub nama: String,
    pub aktif: bool,
    #[serde(default)]
    pub logo: Option<String>,
}

/// A payment method offered at the till
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentMethodConfig {
    pub nama: String,
    pub aktif: bool,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub channels: Vec<PaymentChannelConfig>,
}

/// Receipt texts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReceiptText {
    pub header: Option<String>,
    pub footer: Option<String>,
}

/// The settings document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub payment_methods: Vec<PaymentMethodConfig>,
    pub pajak_persen: Decimal,
    pub diskon_persen: Decimal,
    pub service_charge_persen: Decimal,
    /// Fee charged on revenue, booked as an expense in the daily rollup
    pub biaya_layanan_persen: Decimal,
    pub struk: ReceiptText,
}

impl Settings {
    pub fn price_adjustments(&self) -> PriceAdjustments {
        PriceAdjustments {
            pajak_persen: self.pajak_persen,
            diskon_persen: self.diskon_persen,
            service_charge_persen: self.service_charge_persen,
        }
    }

    pub fn active_methods(&self) -> impl Iterator<Item = &PaymentMethodConfig> {
        self.payment_methods.iter().filter(|m| m.aktif)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            payment_methods: vec![PaymentMethodConfig {
                nama: "Tunai".to_string(),
                aktif: true,
                logo: None,
                channels: Vec::new(),
            }],
            pajak_persen: Decimal::ZERO,
            diskon_persen: Decimal::ZERO,
            service_charge_persen: Decimal::ZERO,
            biaya_layanan_persen: Decimal::ZERO,
            struk: ReceiptText::default(),
        }
    }
}
