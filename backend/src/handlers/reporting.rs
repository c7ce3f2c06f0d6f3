//! Reporting handlers for sales analytics and data export

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shared::{Action, Period, Resource};

use crate::error::AppResult;
use crate::middleware::{check_permission, AuthUser, CurrentUser};
use crate::services::reporting::{ReportFilter, ReportingService};
use crate::services::transaksi::business_date;
use crate::AppState;

#[derive(Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub period: Option<Period>,
    pub limit: Option<i64>,
    pub format: Option<String>, // "json" or "csv"
}

impl ReportQuery {
    fn filter(&self) -> ReportFilter {
        ReportFilter {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    fn wants_csv(&self) -> bool {
        self.format.as_deref() == Some("csv")
    }
}

fn respond<T: Serialize>(
    user: &AuthUser,
    data: Vec<T>,
    as_csv: bool,
    filename: &str,
) -> AppResult<Response> {
    if as_csv {
        check_permission(user, Resource::Laporan, Action::Export)?;
        let csv = ReportingService::export_to_csv(&data)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.csv\"", filename),
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(data).into_response())
    }
}

/// Sales totals by day, week or month
pub async fn get_omzet(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    check_permission(&current_user.0, Resource::Laporan, Action::View)?;
    let range = query.filter().range(business_date())?;
    let period = query.period.unwrap_or_default();

    let data = ReportingService::new(state.db).omzet(period, &range).await?;
    respond(&current_user.0, data, query.wants_csv(), &format!("omzet_{}", period.as_str()))
}

pub async fn get_top_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    check_permission(&current_user.0, Resource::Laporan, Action::View)?;
    let range = query.filter().range(business_date())?;

    let data = ReportingService::new(state.db)
        .top_products(&range, query.limit.unwrap_or(10))
        .await?;
    respond(&current_user.0, data, query.wants_csv(), "produk_terlaris")
}

pub async fn get_payment_breakdown(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    check_permission(&current_user.0, Resource::Laporan, Action::View)?;
    let range = query.filter().range(business_date())?;

    let data = ReportingService::new(state.db).payment_breakdown(&range).await?;
    respond(&current_user.0, data, query.wants_csv(), "metode_pembayaran")
}

/// Profit breakdown; the CSV form carries the per-day rows
pub async fn get_profit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    check_permission(&current_user.0, Resource::Laporan, Action::View)?;
    let range = query.filter().range(business_date())?;

    let breakdown = ReportingService::new(state.db).profit(range).await?;
    if query.wants_csv() {
        respond(&current_user.0, breakdown.harian, true, "laba_rugi")
    } else {
        Ok(Json(breakdown).into_response())
    }
}
