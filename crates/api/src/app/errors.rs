use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use cellcentre_auth::AuthError;

use crate::gateway::GatewayError;

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::Misconfigured(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, err.code(), err.to_string())
        }
        _ => json_error(StatusCode::UNAUTHORIZED, err.code(), err.to_string()),
    }
}

/// Store failures surface as bad requests, like invalid input.
pub fn gateway_error_to_response(err: GatewayError) -> axum::response::Response {
    match err {
        GatewayError::Auth(e) => auth_error_to_response(e),
        GatewayError::InvalidParameters(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_parameters", msg)
        }
        GatewayError::InvalidEntityData(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_employee_data", msg)
        }
        GatewayError::InvalidEntityRoles(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_employee_roles", msg)
        }
        GatewayError::Persistence(e) => {
            json_error(StatusCode::BAD_REQUEST, "persistence_failure", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
