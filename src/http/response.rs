//! Outcome to HTTP response mapping.
//!
//! | Outcome                          | Status | Body            |
//! |----------------------------------|--------|-----------------|
//! | Success                          | 200    | `{"bid": "..."}`|
//! | UpstreamTimeout / StorageTimeout | 408    | empty           |
//! | InternalError                    | 500    | empty           |
//! | ClientCancelled                  | 499    | empty           |
//!
//! A cancelled request normally has no peer left to read anything; 499 only
//! exists so the handler has something to return.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::quoting::{Outcome, QuotationResponse};

/// Non-standard "client closed request" status.
pub fn client_closed_request() -> StatusCode {
    StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT)
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Success { bid, .. } => {
                (StatusCode::OK, Json(QuotationResponse { bid })).into_response()
            }
            Outcome::UpstreamTimeout | Outcome::StorageTimeout => {
                StatusCode::REQUEST_TIMEOUT.into_response()
            }
            Outcome::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            Outcome::ClientCancelled => client_closed_request().into_response(),
        }
    }
}
