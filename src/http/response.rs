//! Response mapping.
//!
//! # Responsibilities
//! - Turn action replies into HTTP responses
//! - Map dispatch and runner failures to status codes
//!
//! # Design Decisions
//! - Reply code 0 means "unspecified" and becomes 200
//! - Unresolved dispatch is a 404, never a guess at some action
//! - Runner errors are 400 with the error text

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::action::{ActionError, ActionReply};

impl IntoResponse for ActionReply {
    fn into_response(self) -> Response {
        let status = match self.code {
            0 => StatusCode::OK,
            code => StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        };
        match self.data {
            Some(data) => (status, Json(data)).into_response(),
            None => status.into_response(),
        }
    }
}

pub fn bad_request(reason: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, reason.into()).into_response()
}

pub fn unresolved() -> Response {
    (StatusCode::NOT_FOUND, "No action resolved for request").into_response()
}

pub fn action_failed(error: &ActionError) -> Response {
    bad_request(error.to_string())
}
