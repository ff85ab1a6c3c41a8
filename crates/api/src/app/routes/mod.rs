use axum::{Router, routing::post};

pub mod auth;
pub mod employees;
pub mod system;

/// Public routes: no token required.
pub fn public_router() -> Router {
    Router::new().route("/auth/authenticate", post(auth::authenticate))
}

/// Routes behind the default token interceptor.
pub fn protected_router() -> Router {
    Router::new().nest("/employees", employees::router())
}
