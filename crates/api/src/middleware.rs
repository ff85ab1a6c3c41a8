use axum::{extract::State, middleware::Next, response::Response};

use cellcentre_auth::AuthorizationGate;

use crate::app::errors::auth_error_to_response;
use crate::context::request_context;

#[derive(Clone)]
pub struct AuthState {
    pub gate: AuthorizationGate,
}

/// Default interceptor: every protected route needs a valid token. The
/// verified [`cellcentre_auth::RequestContext`] is stored in the request
/// extensions for handlers.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let mut ctx = request_context(req.headers());
    state
        .gate
        .authenticate(&mut ctx)
        .map_err(auth_error_to_response)?;

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
