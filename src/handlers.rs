// src/handlers.rs

use axum::http::StatusCode;

use crate::common::{error::AppError, response::ApiResponse};

pub mod audit;
pub mod auth;
pub mod menu;
pub mod security_group;
pub mod security_rule;
pub mod task;
pub mod user;

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Servidor no ar"))
)]
pub async fn health() -> ApiResponse<()> {
    ApiResponse::message(StatusCode::OK, "OK")
}

// Rota inexistente também responde no envelope padrão
pub async fn not_found() -> AppError {
    AppError::NotFound("Recurso")
}
