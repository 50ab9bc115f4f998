// src/handlers/menu.rs

use axum::extract::{Path, State};

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::menu::Menu,
};

#[utoipa::path(
    get,
    path = "/menu",
    tag = "Menus",
    responses((status = 200, description = "Todos os menus cadastrados", body = Vec<Menu>)),
    security(("api_jwt" = []))
)]
pub async fn list_menus(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<ApiResponse<Vec<Menu>>, AppError> {
    let menus = app_state.permission_service.list_menus().await?;
    Ok(ApiResponse::ok("Menus listados com sucesso.", menus))
}

#[utoipa::path(
    get,
    path = "/menu/{id}",
    tag = "Menus",
    params(("id" = i32, Path, description = "ID do menu")),
    responses(
        (status = 200, description = "Menu encontrado", body = Menu),
        (status = 404, description = "Menu não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_menu(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<ApiResponse<Menu>, AppError> {
    let menu = app_state.permission_service.find_menu(id).await?;
    Ok(ApiResponse::ok("Menu encontrado.", menu))
}
