//! Payment gateway notifications

use serde::Deserialize;

use shared::SaleStatus;

/// Notification body posted by Midtrans
#[derive(Debug, Clone, Deserialize)]
pub struct MidtransNotification {
    pub order_id: String,
    pub transaction_status: String,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub gross_amount: String,
    pub signature_key: Option<String>,
    pub fraud_status: Option<String>,
    pub payment_type: Option<String>,
}

/// What a notification means for the sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// Move the sale to this status
    Transition(SaleStatus),
    /// Nothing to do
    Ignore,
}

impl MidtransNotification {
    pub fn action(&self) -> NotificationAction {
        notification_action(&self.transaction_status, self.fraud_status.as_deref())
    }
}

/// Map a gateway transaction status to a sale transition. A card capture
/// flagged for fraud review is left pending.
pub fn notification_action(transaction_status: &str, fraud_status: Option<&str>) -> NotificationAction {
    match transaction_status.trim().to_lowercase().as_str() {
        "settlement" => NotificationAction::Transition(SaleStatus::Selesai),
        "capture" => match fraud_status.map(str::to_lowercase).as_deref() {
            Some("challenge") => NotificationAction::Ignore,
            Some("deny") => NotificationAction::Transition(SaleStatus::Dibatalkan),
            _ => NotificationAction::Transition(SaleStatus::Selesai),
        },
        "expire" => NotificationAction::Transition(SaleStatus::Expire),
        "cancel" | "deny" => NotificationAction::Transition(SaleStatus::Dibatalkan),
        _ => NotificationAction::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_completes_sale() {
        assert_eq!(
            notification_action("settlement", None),
            NotificationAction::Transition(SaleStatus::Selesai)
        );
        assert_eq!(
            notification_action("capture", Some("accept")),
            NotificationAction::Transition(SaleStatus::Selesai)
        );
    }

    #[test]
    fn test_expire_and_cancel_return_stock() {
        for (status, expected) in [
            ("expire", SaleStatus::Expire),
            ("cancel", SaleStatus::Dibatalkan),
            ("deny", SaleStatus::Dibatalkan),
        ] {
            match notification_action(status, None) {
                NotificationAction::Transition(s) => {
                    assert_eq!(s, expected);
                    assert!(s.returns_stock());
                }
                NotificationAction::Ignore => panic!("{} should transition", status),
            }
        }
    }

    #[test]
    fn test_pending_and_challenge_ignored() {
        assert_eq!(notification_action("pending", None), NotificationAction::Ignore);
        assert_eq!(
            notification_action("capture", Some("challenge")),
            NotificationAction::Ignore
        );
        assert_eq!(notification_action("refund", None), NotificationAction::Ignore);
    }

    #[test]
    fn test_parse_notification_body() {
        let n: MidtransNotification = serde_json::from_str(
            r#"{"order_id":"o-1","transaction_status":"settlement","status_code":"200","gross_amount":"30000.00","signature_key":"abc"}"#,
        )
        .unwrap();
        assert_eq!(n.action(), NotificationAction::Transition(SaleStatus::Selesai));
        assert_eq!(n.gross_amount, "30000.00");
    }
}
