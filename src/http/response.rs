//! Response handling.
//!
//! # Responsibilities
//! - JSON bodies for claim results and failures
//! - Map claim errors to HTTP status codes
//!
//! # Design Decisions
//! - Every response body is `{"msg": ...}`, success or failure
//! - Remote error text is passed through for operators; it never contains key material

use alloy::primitives::TxHash;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::dispatch::Dispatch;
use crate::error::{whole_secs, ClaimError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
}

impl ClaimResponse {
    pub fn message(msg: impl Into<String>) -> Self {
        Self { msg: msg.into(), tx_hash: None }
    }

    pub fn from_dispatch(recipient: &str, dispatch: Dispatch) -> Self {
        match dispatch {
            Dispatch::Funded(tx_hash) => Self { msg: format!("Txhash: {tx_hash}"), tx_hash: Some(tx_hash) },
            Dispatch::Queued { position } => {
                Self::message(format!("Added {recipient} to the queue (position {position})"))
            }
        }
    }
}

impl IntoResponse for ClaimError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(ClaimResponse::message(self.to_string()))).into_response();

        if let ClaimError::RateLimited { remaining } = &self {
            if let Ok(value) = HeaderValue::from_str(&whole_secs(remaining).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Error body for requests rejected before reaching the faucet.
pub fn bad_request(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ClaimResponse::message(msg))).into_response()
}
