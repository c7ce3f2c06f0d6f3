//! Route definitions for the Kedai POS API

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes, mounted under `/api`
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .route("/auth/login", post(handlers::login))
        // Protected routes
        .merge(protected_routes(state))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(handlers::me))
        .nest("/users", user_routes())
        .nest("/barang", barang_routes())
        .nest("/bahan-baku", bahan_baku_routes())
        .nest("/chef", chef_routes())
        .nest("/transaksi", transaksi_routes())
        .nest("/modal", modal_routes())
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .nest("/admin", admin_routes())
        .nest("/laporan", reporting_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Staff account routes
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route("/kasir", get(handlers::list_kasir))
        .route("/:id/active", put(handlers::set_user_active))
}

/// Catalog routes
fn barang_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_barang).post(handlers::create_barang))
        .route(
            "/:id",
            get(handlers::get_barang)
                .put(handlers::update_barang)
                .delete(handlers::delete_barang),
        )
}

/// Raw-material routes
fn bahan_baku_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_bahan_baku).post(handlers::create_bahan_baku),
        )
        .route(
            "/:id",
            get(handlers::get_bahan_baku)
                .put(handlers::update_bahan_baku)
                .delete(handlers::delete_bahan_baku),
        )
}

/// Chef workflow routes
fn chef_routes() -> Router<AppState> {
    Router::new()
        .route("/bahan-baku", get(handlers::list_bahan_baku))
        .route("/bahan-baku/ambil", post(handlers::claim_bahan_baku))
        .route("/productions", get(handlers::list_productions))
        .route("/productions/:id", get(handlers::get_production))
        .route(
            "/productions/:id/status",
            put(handlers::update_production_status),
        )
}

/// Sales routes
fn transaksi_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transaksi).post(handlers::create_transaksi),
        )
        .route(
            "/:id",
            get(handlers::get_transaksi)
                .put(handlers::update_transaksi_status)
                .patch(handlers::update_transaksi_status)
                .delete(handlers::delete_transaksi),
        )
        .route("/:id/cancel", post(handlers::cancel_transaksi))
}

/// Capital ledger routes
fn modal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_modal))
        .route("/tambah", post(handlers::add_capital))
        .route("/tarik", post(handlers::withdraw_capital))
        .route("/biaya-operasional", post(handlers::record_expense))
        .route("/resep", put(handlers::upsert_recipe))
        .route("/resep/:nama_produk", axum::routing::delete(handlers::delete_recipe))
}

/// Admin cost rollup routes
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/hpp-total", get(handlers::get_hpp_total))
        .route("/hpp/:tanggal", get(handlers::get_hpp_day))
}

/// Reporting routes
fn reporting_routes() -> Router<AppState> {
    Router::new()
        .route("/omzet", get(handlers::get_omzet))
        .route("/produk-terlaris", get(handlers::get_top_products))
        .route("/metode-pembayaran", get(handlers::get_payment_breakdown))
        .route("/laba-rugi", get(handlers::get_profit))
}
