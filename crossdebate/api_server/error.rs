use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crossdebate_data_store::TableError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP clients as `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client input was rejected.
    #[error("{0}")]
    BadRequest(String),
    /// The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),
    /// A required request part is missing or has the wrong shape.
    #[error("{0}")]
    Unprocessable(String),
    /// An extractor rejected the request with its own status.
    #[error("{detail}")]
    Rejected {
        /// Status chosen by the extractor.
        status: StatusCode,
        /// Rejection text.
        detail: String,
    },
    /// Unexpected failure; `cause` is logged and never sent to the client.
    #[error("{detail}")]
    Internal {
        /// Generic client-facing message.
        detail: String,
        /// Server-side cause.
        cause: String,
    },
}

impl ApiError {
    /// Builds an internal error from a client message and a loggable cause.
    pub fn internal(detail: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Internal {
            detail: detail.into(),
            cause: cause.to_string(),
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Rejected { status, .. } => *status,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal { detail, cause } => {
                tracing::error!(%cause, "{detail}");
            }
            other => tracing::debug!(status = status.as_u16(), detail = %other, "request rejected"),
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<TableError> for ApiError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::NoColumns => {
                Self::BadRequest("Arquivo CSV não contém colunas válidas.".into())
            }
            TableError::Empty => Self::BadRequest("Arquivo CSV está vazio.".into()),
            other => Self::BadRequest(format!("Erro ao parsear CSV: {other}")),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Rejected {
            status: err.status(),
            detail: err.body_text(),
        }
    }
}
