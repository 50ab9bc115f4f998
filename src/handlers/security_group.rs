// src/handlers/security_group.rs

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
        rbac::{GroupCreate, GroupDelete, GroupUpdate, GroupView, RequireCapability},
    },
    models::security::{SecurityGroup, SecurityGroupDetail, SecurityGroupPayload},
};

#[utoipa::path(
    get,
    path = "/security-group",
    tag = "Security Groups",
    responses((status = 200, description = "Grupos da empresa", body = Vec<SecurityGroup>)),
    security(("api_jwt" = []))
)]
pub async fn list_groups(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<GroupView>,
) -> Result<ApiResponse<Vec<SecurityGroup>>, AppError> {
    let groups = app_state.security_service.list_groups(&user).await?;
    Ok(ApiResponse::ok("Grupos listados com sucesso.", groups))
}

#[utoipa::path(
    post,
    path = "/security-group/pagination",
    tag = "Security Groups",
    request_body = PageRequest,
    responses((status = 200, description = "Página de grupos", body = Page<SecurityGroup>)),
    security(("api_jwt" = []))
)]
pub async fn paginate_groups(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<GroupView>,
    ValidatedJson(request): ValidatedJson<PageRequest>,
) -> Result<ApiResponse<Page<SecurityGroup>>, AppError> {
    let page = app_state.security_service.paginate_groups(&user, request).await?;
    Ok(ApiResponse::ok("Grupos listados com sucesso.", page))
}

#[utoipa::path(
    get,
    path = "/security-group/{id}",
    tag = "Security Groups",
    params(("id" = Uuid, Path, description = "ID do grupo")),
    responses(
        (status = 200, description = "Grupo com suas regras", body = SecurityGroupDetail),
        (status = 404, description = "Grupo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_group(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<GroupView>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<SecurityGroupDetail>, AppError> {
    let group = app_state.security_service.fetch_group(&user, id).await?;
    Ok(ApiResponse::ok("Grupo encontrado.", group))
}

#[utoipa::path(
    post,
    path = "/security-group",
    tag = "Security Groups",
    request_body = SecurityGroupPayload,
    responses(
        (status = 201, description = "Grupo criado", body = SecurityGroupDetail),
        (status = 400, description = "Payload inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_group(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<GroupCreate>,
    ValidatedJson(payload): ValidatedJson<SecurityGroupPayload>,
) -> Result<ApiResponse<SecurityGroupDetail>, AppError> {
    let group = app_state.security_service.create_group(&user, payload).await?;
    Ok(ApiResponse::created("Grupo criado com sucesso.", group))
}

#[utoipa::path(
    put,
    path = "/security-group/{id}",
    tag = "Security Groups",
    params(("id" = Uuid, Path, description = "ID do grupo")),
    request_body = SecurityGroupPayload,
    responses(
        (status = 200, description = "Grupo atualizado", body = SecurityGroupDetail),
        (status = 404, description = "Grupo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_group(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<GroupUpdate>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SecurityGroupPayload>,
) -> Result<ApiResponse<SecurityGroupDetail>, AppError> {
    let group = app_state.security_service.update_group(&user, id, payload).await?;
    Ok(ApiResponse::ok("Grupo atualizado com sucesso.", group))
}

#[utoipa::path(
    delete,
    path = "/security-group/{id}",
    tag = "Security Groups",
    params(("id" = Uuid, Path, description = "ID do grupo")),
    responses(
        (status = 200, description = "Grupo removido"),
        (status = 404, description = "Grupo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_group(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<GroupDelete>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    app_state.security_service.delete_group(&user, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Grupo removido com sucesso."))
}
