//! Payment method selection
//!
//! Cashier UIs send a combined string such as `"Virtual Account (BCA)"`.
//! It is parsed once at the API boundary into a [`PaymentSelection`] and
//! checked against the active methods in settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PaymentMethodConfig;
use crate::types::same_name;

/// Kind of payment, deciding how the gateway is called
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Cash at the counter, settled immediately
    Tunai,
    /// Bank virtual account; channel is the bank code
    VirtualAccount,
    Qris,
    EWallet,
    /// Any other configured method, paid through the hosted payment page
    Lainnya,
}

impl PaymentKind {
    pub fn from_method_name(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "tunai" | "cash" | "kas" => PaymentKind::Tunai,
            "virtualaccount" | "va" | "banktransfer" | "transferbank" => {
                PaymentKind::VirtualAccount
            }
            "qris" => PaymentKind::Qris,
            "ewallet" | "dompetdigital" => PaymentKind::EWallet,
            _ => PaymentKind::Lainnya,
        }
    }

    pub fn is_cash(&self) -> bool {
        matches!(self, PaymentKind::Tunai)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("payment method is empty")]
    Empty,

    #[error("malformed payment method: {0}")]
    Malformed(String),

    #[error("payment method '{0}' is not active")]
    MethodNotActive(String),

    #[error("channel '{channel}' is not available for {method}")]
    ChannelNotAvailable { method: String, channel: String },

    #[error("{0} requires a channel")]
    ChannelRequired(String),
}

/// A parsed payment method with its optional channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSelection {
    pub kind: PaymentKind,
    pub method: String,
    pub channel: Option<String>,
}

impl PaymentSelection {
    /// Parse `"Method"` or `"Method (Channel)"`
    pub fn parse(raw: &str) -> Result<Self, PaymentError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PaymentError::Empty);
        }

        let (method, channel) = match raw.find('(') {
            Some(open) => {
                let rest = &raw[open + 1..];
                let close = rest
                    .rfind(')')
                    .ok_or_else(|| PaymentError::Malformed(raw.to_string()))?;
                if !rest[close + 1..].trim().is_empty() {
                    return Err(PaymentError::Malformed(raw.to_string()));
                }
                let channel = rest[..close].trim();
                let channel = (!channel.is_empty()).then(|| channel.to_string());
                (raw[..open].trim(), channel)
            }
            None => (raw, None),
        };

        if method.is_empty() {
            return Err(PaymentError::Malformed(raw.to_string()));
        }

        Ok(Self {
            kind: PaymentKind::from_method_name(method),
            method: method.to_string(),
            channel,
        })
    }

    /// Check the selection against the configured payment methods. Returns
    /// the canonical configured names.
    pub fn validate_against(&self, methods: &[PaymentMethodConfig]) -> Result<Self, PaymentError> {
        let config = methods
            .iter()
            .find(|m| m.aktif && same_name(&m.nama, &self.method))
            .ok_or_else(|| PaymentError::MethodNotActive(self.method.clone()))?;

        let channel = match &self.channel {
            Some(channel) => {
                let found = config
                    .channels
                    .iter()
                    .find(|c| c.aktif && same_name(&c.nama, channel))
                    .ok_or_else(|| PaymentError::ChannelNotAvailable {
                        method: config.nama.clone(),
                        channel: channel.clone(),
                    })?;
                Some(found.nama.clone())
            }
            None if self.kind == PaymentKind::VirtualAccount => {
                return Err(PaymentError::ChannelRequired(config.nama.clone()));
            }
            None => None,
        };

        Ok(Self {
            kind: self.kind,
            method: config.nama.clone(),
            channel,
        })
    }

    pub fn is_cash(&self) -> bool {
        self.kind.is_cash()
    }
}

impl std::fmt::Display for PaymentSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.channel {
            Some(channel) => write!(f, "{} ({})", self.method, channel),
            None => write!(f, "{}", self.method),
        }
    }
}

impl std::str::FromStr for PaymentSelection {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentChannelConfig;

    fn methods() -> Vec<PaymentMethodConfig> {
        vec![
            PaymentMethodConfig {
                nama: "Tunai".to_string(),
                aktif: true,
                logo: None,
                channels: vec![],
            },
            PaymentMethodConfig {
                nama: "Virtual Account".to_string(),
                aktif: true,
                logo: None,
                channels: vec![
                    PaymentChannelConfig {
                        nama: "BCA".to_string(),
                        aktif: true,
                        logo: None,
                    },
                    PaymentChannelConfig {
                        nama: "BNI".to_string(),
                        aktif: false,
                        logo: None,
                    },
                ],
            },
            PaymentMethodConfig {
                nama: "QRIS".to_string(),
                aktif: false,
                logo: None,
                channels: vec![],
            },
        ]
    }

    #[test]
    fn test_parse_plain_method() {
        let sel = PaymentSelection::parse("Tunai").unwrap();
        assert_eq!(sel.kind, PaymentKind::Tunai);
        assert_eq!(sel.method, "Tunai");
        assert_eq!(sel.channel, None);
    }

    #[test]
    fn test_parse_method_with_channel() {
        let sel = PaymentSelection::parse(" Virtual Account ( BCA ) ").unwrap();
        assert_eq!(sel.kind, PaymentKind::VirtualAccount);
        assert_eq!(sel.method, "Virtual Account");
        assert_eq!(sel.channel.as_deref(), Some("BCA"));
        assert_eq!(sel.to_string(), "Virtual Account (BCA)");
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(PaymentSelection::parse("  "), Err(PaymentError::Empty));
        assert!(matches!(
            PaymentSelection::parse("Virtual Account (BCA"),
            Err(PaymentError::Malformed(_))
        ));
        assert!(matches!(
            PaymentSelection::parse("(BCA)"),
            Err(PaymentError::Malformed(_))
        ));
        assert!(matches!(
            PaymentSelection::parse("VA (BCA) extra"),
            Err(PaymentError::Malformed(_))
        ));
    }

    #[test]
    fn test_validate_active_method_and_channel() {
        let sel = PaymentSelection::parse("virtual account (bca)").unwrap();
        let validated = sel.validate_against(&methods()).unwrap();
        assert_eq!(validated.method, "Virtual Account");
        assert_eq!(validated.channel.as_deref(), Some("BCA"));
    }

    #[test]
    fn test_validate_rejects_inactive_method() {
        let sel = PaymentSelection::parse("QRIS").unwrap();
        assert_eq!(
            sel.validate_against(&methods()),
            Err(PaymentError::MethodNotActive("QRIS".to_string()))
        );
        let sel = PaymentSelection::parse("Kartu Kredit").unwrap();
        assert!(sel.validate_against(&methods()).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_or_inactive_channel() {
        for raw in ["Virtual Account (BNI)", "Virtual Account (Mandiri)"] {
            let sel = PaymentSelection::parse(raw).unwrap();
            assert!(matches!(
                sel.validate_against(&methods()),
                Err(PaymentError::ChannelNotAvailable { .. })
            ));
        }
    }

    #[test]
    fn test_virtual_account_requires_channel() {
        let sel = PaymentSelection::parse("Virtual Account").unwrap();
        assert_eq!(
            sel.validate_against(&methods()),
            Err(PaymentError::ChannelRequired("Virtual Account".to_string()))
        );
    }

    #[test]
    fn test_kind_from_method_name() {
        assert_eq!(PaymentKind::from_method_name("Cash"), PaymentKind::Tunai);
        assert_eq!(PaymentKind::from_method_name("Bank Transfer"), PaymentKind::VirtualAccount);
        assert_eq!(PaymentKind::from_method_name("E-Wallet"), PaymentKind::EWallet);
        assert_eq!(PaymentKind::from_method_name("Debit"), PaymentKind::Lainnya);
    }
}
