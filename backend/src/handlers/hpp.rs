//! Daily HPP rollup handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;

use shared::{Action, HppHarian, Resource};

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::hpp::HppRangeTotal;
use crate::services::reporting::ReportFilter;
use crate::services::transaksi::business_date;
use crate::services::HppService;
use crate::AppState;

/// Totals over a date range plus the day documents
pub async fn get_hpp_total(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<HppRangeTotal>> {
    check_permission(&current_user.0, Resource::Laporan, Action::View)?;
    let range = filter.range(business_date())?;
    let total = HppService::new(state.db).range_total(range).await?;
    Ok(Json(total))
}

pub async fn get_hpp_day(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(tanggal): Path<NaiveDate>,
) -> AppResult<Json<HppHarian>> {
    check_permission(&current_user.0, Resource::Laporan, Action::View)?;
    let day = HppService::new(state.db).get_day(tanggal).await?;
    Ok(Json(day))
}
