//! Mapping of gateway errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use zeke_core::GatewayError;

use crate::models::ErrorResponse;

/// A gateway error on its way out of an axum handler.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ProxyError(#[from] pub GatewayError);

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::from(&self.0))).into_response()
    }
}
