use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{
        Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

use cellcentre_auth::RequestContext;
use cellcentre_core::EmployeeId;
use cellcentre_employees::NewEmployeeRequest;

use crate::app::dto::{EmployeeQuery, UpdateEmployeeBody};
use crate::app::errors::{gateway_error_to_response, json_error};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_employee).post(new_employee).delete(delete_employee))
        .route("/:id", put(update_employee))
}

fn invalid_body(e: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_parameters", e.body_text())
}

fn invalid_query(e: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_parameters", e.body_text())
}

pub async fn get_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(mut ctx): Extension<RequestContext>,
    query: Result<Query<EmployeeQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(e) => return invalid_query(e),
    };
    match services.gateway.get_employee(&mut ctx, &query.into()).await {
        Ok(employee) => Json(employee).into_response(),
        Err(e) => gateway_error_to_response(e),
    }
}

pub async fn new_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(mut ctx): Extension<RequestContext>,
    body: Result<Json<NewEmployeeRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return invalid_body(e),
    };
    match services.gateway.new_employee(&mut ctx, body).await {
        Ok(employee) => (StatusCode::CREATED, Json(employee)).into_response(),
        Err(e) => gateway_error_to_response(e),
    }
}

pub async fn update_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(mut ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateEmployeeBody>, JsonRejection>,
) -> axum::response::Response {
    let Ok(id) = id.parse::<EmployeeId>() else {
        return json_error(StatusCode::BAD_REQUEST, "invalid_parameters", "invalid employee id");
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return invalid_body(e),
    };
    match services
        .gateway
        .update_employee(&mut ctx, body.into_request(id))
        .await
    {
        Ok(employee) => Json(employee).into_response(),
        Err(e) => gateway_error_to_response(e),
    }
}

pub async fn delete_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(mut ctx): Extension<RequestContext>,
    query: Result<Query<EmployeeQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(e) => return invalid_query(e),
    };
    match services.gateway.delete_employee(&mut ctx, query.into()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => gateway_error_to_response(e),
    }
}
