//! Shop settings: payment methods and price adjustments

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{types::Json, FromRow, PgPool};

use shared::{validate_payment_methods, validate_percent, PaymentMethodConfig, ReceiptText, Settings};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct SettingsService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct SettingsRow {
    payment_methods: Json<Vec<PaymentMethodConfig>>,
    pajak_persen: Decimal,
    diskon_persen: Decimal,
    service_charge_persen: Decimal,
    biaya_layanan_persen: Decimal,
    struk: Json<ReceiptText>,
}

impl From<SettingsRow> for Settings {
    fn from(row: SettingsRow) -> Self {
        Settings {
            payment_methods: row.payment_methods.0,
            pajak_persen: row.pajak_persen,
            diskon_persen: row.diskon_persen,
            service_charge_persen: row.service_charge_persen,
            biaya_layanan_persen: row.biaya_layanan_persen,
            struk: row.struk.0,
        }
    }
}

/// Partial update; omitted fields keep their value
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsInput {
    pub payment_methods: Option<Vec<PaymentMethodConfig>>,
    pub pajak_persen: Option<Decimal>,
    pub diskon_persen: Option<Decimal>,
    pub service_charge_persen: Option<Decimal>,
    pub biaya_layanan_persen: Option<Decimal>,
    pub struk: Option<ReceiptText>,
}

impl SettingsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// The settings row, if it has been created
    pub async fn find(&self) -> AppResult<Option<Settings>> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT payment_methods, pajak_persen, diskon_persen, service_charge_persen,
                   biaya_layanan_persen, struk
            FROM settings
            WHERE id = TRUE
            "#,
        )
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Settings::from))
    }

    pub async fn get(&self) -> AppResult<Settings> {
        self.find()
            .await?
            .ok_or_else(|| AppError::NotFound("Settings".to_string()))
    }

    pub async fn update(&self, input: UpdateSettingsInput) -> AppResult<Settings> {
        let mut settings = self.find().await?.unwrap_or_default();

        if let Some(methods) = input.payment_methods {
            validate_payment_methods(&methods)
                .map_err(|e| AppError::validation("payment_methods", e))?;
            settings.payment_methods = methods;
        }
        if let Some(v) = input.pajak_persen {
            settings.pajak_persen = v;
        }
        if let Some(v) = input.diskon_persen {
            settings.diskon_persen = v;
        }
        if let Some(v) = input.service_charge_persen {
            settings.service_charge_persen = v;
        }
        if let Some(v) = input.biaya_layanan_persen {
            settings.biaya_layanan_persen = v;
        }
        if let Some(struk) = input.struk {
            settings.struk = struk;
        }

        settings.price_adjustments().validate()?;
        validate_percent("biaya_layanan_persen", settings.biaya_layanan_persen)?;

        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            INSERT INTO settings (id, payment_methods, pajak_persen, diskon_persen,
                                  service_charge_persen, biaya_layanan_persen, struk)
            VALUES (TRUE, $1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                payment_methods = EXCLUDED.payment_methods,
                pajak_persen = EXCLUDED.pajak_persen,
                diskon_persen = EXCLUDED.diskon_persen,
                service_charge_persen = EXCLUDED.service_charge_persen,
                biaya_layanan_persen = EXCLUDED.biaya_layanan_persen,
                struk = EXCLUDED.struk,
                updated_at = NOW()
            RETURNING payment_methods, pajak_persen, diskon_persen, service_charge_persen,
                      biaya_layanan_persen, struk
            "#,
        )
        .bind(Json(&settings.payment_methods))
        .bind(settings.pajak_persen)
        .bind(settings.diskon_persen)
        .bind(settings.service_charge_persen)
        .bind(settings.biaya_layanan_persen)
        .bind(Json(&settings.struk))
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Settings updated");
        Ok(row.into())
    }
}
