// src/handlers/user.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        extract::ValidatedJson,
        pagination::{Page, PageRequest},
        response::ApiResponse,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireCapability, UserCreate, UserDelete, UserUpdate, UserView},
    },
    models::user::{User, UserDetail, UserPayload},
};

#[utoipa::path(
    get,
    path = "/user",
    tag = "Users",
    responses((status = 200, description = "Usuários da empresa", body = Vec<User>)),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<UserView>,
) -> Result<ApiResponse<Vec<User>>, AppError> {
    let users = app_state.user_service.list(&user).await?;
    Ok(ApiResponse::ok("Usuários listados com sucesso.", users))
}

#[utoipa::path(
    post,
    path = "/user/pagination",
    tag = "Users",
    request_body = PageRequest,
    responses((status = 200, description = "Página de usuários", body = Page<User>)),
    security(("api_jwt" = []))
)]
pub async fn paginate_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<UserView>,
    ValidatedJson(request): ValidatedJson<PageRequest>,
) -> Result<ApiResponse<Page<User>>, AppError> {
    let page = app_state.user_service.paginate(&user, request).await?;
    Ok(ApiResponse::ok("Usuários listados com sucesso.", page))
}

#[utoipa::path(
    get,
    path = "/user/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário com seus grupos", body = UserDetail),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<UserView>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<UserDetail>, AppError> {
    let found = app_state.user_service.fetch(&user, id).await?;
    Ok(ApiResponse::ok("Usuário encontrado.", found))
}

#[utoipa::path(
    post,
    path = "/user",
    tag = "Users",
    request_body = UserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = UserDetail),
        (status = 400, description = "Payload inválido"),
        (status = 409, description = "Nome de usuário já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<UserCreate>,
    ValidatedJson(payload): ValidatedJson<UserPayload>,
) -> Result<ApiResponse<UserDetail>, AppError> {
    let created = app_state.user_service.create(&user, payload).await?;
    Ok(ApiResponse::created("Usuário criado com sucesso.", created))
}

#[utoipa::path(
    put,
    path = "/user/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = UserPayload,
    responses(
        (status = 200, description = "Usuário atualizado", body = UserDetail),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<UserUpdate>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UserPayload>,
) -> Result<ApiResponse<UserDetail>, AppError> {
    let updated = app_state.user_service.update(&user, id, payload).await?;
    Ok(ApiResponse::ok("Usuário atualizado com sucesso.", updated))
}

#[utoipa::path(
    delete,
    path = "/user/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário removido"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<UserDelete>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    app_state.user_service.delete(&user, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Usuário removido com sucesso."))
}
