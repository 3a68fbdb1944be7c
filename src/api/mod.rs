pub mod auth;
pub mod handlers;

use crate::config::AuthConfig;
use crate::service::ReportService;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use std::sync::Arc;

pub const API_PREFIX: &str = "/api/cobranca";

/// Shared state: the report service and the accepted credential.
#[derive(Clone)]
pub struct AppState {
    pub reports: Arc<ReportService>,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(reports: ReportService, auth: AuthConfig) -> Self {
        Self {
            reports: Arc::new(reports),
            auth: Arc::new(auth),
        }
    }
}

/// All routes; everything under `API_PREFIX` requires Basic auth.
pub fn router(state: AppState) -> Router {
    let reports = Router::new()
        .route("/consulta", get(handlers::consulta))
        .route("/consulta_xlsx", get(handlers::consulta_xlsx))
        .route("/consulta_csv", get(handlers::consulta_csv))
        .route("/renegociacao", get(handlers::renegociacao))
        .route("/renegociacao_xlsx", get(handlers::renegociacao_xlsx))
        .layer(from_fn_with_state(state.clone(), auth::basic_auth))
        .with_state(state);

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest(API_PREFIX, reports)
}
