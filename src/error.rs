use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Parâmetro de data inválido: {param} deve ser DD/MM/AAAA")]
    InvalidDate { param: String },

    #[error("Parâmetro inválido: {param} {reason}")]
    InvalidParameter { param: String, reason: String },

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("{0}")]
    Csv(String),
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Csv(err.to_string())
    }
}

impl<W> From<csv::IntoInnerError<W>> for ReportError {
    fn from(err: csv::IntoInnerError<W>) -> Self {
        ReportError::Csv(err.error().to_string())
    }
}

impl ReportError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReportError::InvalidDate { .. } | ReportError::InvalidParameter { .. }
        )
    }

    /// Attach the endpoint context that prefixes failure messages.
    pub fn in_context(self, context: &'static str) -> ContextError {
        ContextError {
            context,
            source: self,
        }
    }
}

/// JSON error envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub mensagem: String,
}

impl ErrorBody {
    pub fn new(mensagem: impl Into<String>) -> Self {
        Self {
            status: "erro",
            mensagem: mensagem.into(),
        }
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// A failure tagged with the operation that produced it.
#[derive(Debug, Error)]
#[error("{context}: {source}")]
pub struct ContextError {
    pub context: &'static str,
    #[source]
    pub source: ReportError,
}

impl IntoResponse for ContextError {
    fn into_response(self) -> Response {
        if self.source.is_client_error() {
            return self.source.into_response();
        }
        tracing::error!("{}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new(self.to_string())),
        )
            .into_response()
    }
}
