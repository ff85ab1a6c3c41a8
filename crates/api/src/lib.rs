//! HTTP API: authentication, the employee mutation gateway, and the axum
//! surface in front of them.

pub mod app;
pub mod auth_service;
pub mod config;
pub mod context;
pub mod gateway;
pub mod middleware;

pub use auth_service::AuthService;
pub use config::Config;
pub use gateway::{EmployeeGateway, GatewayError};
