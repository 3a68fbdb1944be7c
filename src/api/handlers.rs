use crate::api::AppState;
use crate::error::{ContextError, ReportError};
use crate::models::{ListingQuery, PageRequest, ReceivableFilters, RenegotiationFilters, RenegotiationQuery};
use crate::service::{ExportFile, Listing};
use crate::service::format::JsonRecord;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

const LISTING_ERROR: &str = "Erro ao executar consulta";
const RENEGOTIATION_ERROR: &str = "Erro ao executar consulta de renegociação";
const XLSX_ERROR: &str = "Erro ao exportar XLSX";
const CSV_ERROR: &str = "Erro ao exportar CSV";

/// Listing envelope
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub status: &'static str,
    pub pagina: u32,
    pub limite: u32,
    pub total_registros: i64,
    pub dados: Vec<JsonRecord>,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            status: "ok",
            pagina: listing.page.page,
            limite: listing.page.size,
            total_registros: listing.total,
            dados: listing.records,
        }
    }
}

impl IntoResponse for ExportFile {
    fn into_response(self) -> Response {
        let disposition = self.content_disposition();
        (
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.body,
        )
            .into_response()
    }
}

/// Unparseable query strings are reported like any other invalid parameter.
fn query_params<T>(
    query: Result<Query<T>, QueryRejection>,
    context: &'static str,
) -> Result<T, ContextError> {
    query.map(|Query(params)| params).map_err(|rejection| {
        ReportError::InvalidParameter {
            param: "query".into(),
            reason: rejection.body_text(),
        }
        .in_context(context)
    })
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /consulta
pub async fn consulta(
    State(state): State<AppState>,
    query: Result<Query<ListingQuery>, QueryRejection>,
) -> Result<Json<ListingResponse>, ContextError> {
    let params = query_params(query, LISTING_ERROR)?;
    let page = PageRequest::from_params(params.pagina.as_deref(), params.limite.as_deref())
        .map_err(|e| e.in_context(LISTING_ERROR))?;

    let listing = state
        .reports
        .list_receivables(&params.filters, page)
        .await
        .map_err(|e| e.in_context(LISTING_ERROR))?;
    Ok(Json(listing.into()))
}

/// GET /consulta_xlsx
pub async fn consulta_xlsx(
    State(state): State<AppState>,
    query: Result<Query<ReceivableFilters>, QueryRejection>,
) -> Result<ExportFile, ContextError> {
    let filters = query_params(query, XLSX_ERROR)?;
    state
        .reports
        .export_receivables_xlsx(&filters)
        .await
        .map_err(|e| e.in_context(XLSX_ERROR))
}

/// GET /consulta_csv
pub async fn consulta_csv(
    State(state): State<AppState>,
    query: Result<Query<ReceivableFilters>, QueryRejection>,
) -> Result<ExportFile, ContextError> {
    let filters = query_params(query, CSV_ERROR)?;
    state
        .reports
        .export_receivables_csv(&filters)
        .await
        .map_err(|e| e.in_context(CSV_ERROR))
}

/// GET /renegociacao
pub async fn renegociacao(
    State(state): State<AppState>,
    query: Result<Query<RenegotiationQuery>, QueryRejection>,
) -> Result<Json<ListingResponse>, ContextError> {
    let params = query_params(query, RENEGOTIATION_ERROR)?;
    let page = PageRequest::from_params(params.pagina.as_deref(), params.limite.as_deref())
        .map_err(|e| e.in_context(RENEGOTIATION_ERROR))?;

    let listing = state
        .reports
        .list_renegotiation(&params.filters, page)
        .await
        .map_err(|e| e.in_context(RENEGOTIATION_ERROR))?;
    Ok(Json(listing.into()))
}

/// GET /renegociacao_xlsx
pub async fn renegociacao_xlsx(
    State(state): State<AppState>,
    query: Result<Query<RenegotiationFilters>, QueryRejection>,
) -> Result<ExportFile, ContextError> {
    let filters = query_params(query, XLSX_ERROR)?;
    state
        .reports
        .export_renegotiation_xlsx(&filters)
        .await
        .map_err(|e| e.in_context(XLSX_ERROR))
}
