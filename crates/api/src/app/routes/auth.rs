use std::sync::Arc;

use axum::{Extension, Json, extract::rejection::JsonRejection, response::IntoResponse};

use cellcentre_auth::AuthError;

use crate::app::dto::{AuthenticateRequest, TokenResponse};
use crate::app::errors::auth_error_to_response;
use crate::app::services::AppServices;

pub async fn authenticate(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> axum::response::Response {
    let Ok(Json(body)) = body else {
        return auth_error_to_response(AuthError::InvalidParameters);
    };
    match services
        .auth
        .authenticate(&body.entity, &body.login, &body.password)
        .await
    {
        Ok(token) => Json(TokenResponse { token }).into_response(),
        Err(e) => auth_error_to_response(e),
    }
}
