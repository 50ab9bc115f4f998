// src/handlers/security_rule.rs

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
        rbac::{RequireCapability, RuleCreate, RuleDelete, RuleUpdate, RuleView},
    },
    models::security::{SecurityRule, SecurityRuleDetail, SecurityRulePayload},
};

#[utoipa::path(
    get,
    path = "/security-rule",
    tag = "Security Rules",
    responses(
        (status = 200, description = "Regras da empresa", body = Vec<SecurityRule>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_rules(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<RuleView>,
) -> Result<ApiResponse<Vec<SecurityRule>>, AppError> {
    let rules = app_state.security_service.list_rules(&user).await?;
    Ok(ApiResponse::ok("Regras listadas com sucesso.", rules))
}

#[utoipa::path(
    post,
    path = "/security-rule/pagination",
    tag = "Security Rules",
    request_body = PageRequest,
    responses(
        (status = 200, description = "Página de regras", body = Page<SecurityRule>)
    ),
    security(("api_jwt" = []))
)]
pub async fn paginate_rules(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<RuleView>,
    ValidatedJson(request): ValidatedJson<PageRequest>,
) -> Result<ApiResponse<Page<SecurityRule>>, AppError> {
    let page = app_state.security_service.paginate_rules(&user, request).await?;
    Ok(ApiResponse::ok("Regras listadas com sucesso.", page))
}

#[utoipa::path(
    get,
    path = "/security-rule/{id}",
    tag = "Security Rules",
    params(("id" = Uuid, Path, description = "ID da regra")),
    responses(
        (status = 200, description = "Regra com suas permissões de menu", body = SecurityRuleDetail),
        (status = 404, description = "Regra não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_rule(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<RuleView>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<SecurityRuleDetail>, AppError> {
    let rule = app_state.security_service.fetch_rule(&user, id).await?;
    Ok(ApiResponse::ok("Regra encontrada.", rule))
}

#[utoipa::path(
    post,
    path = "/security-rule",
    tag = "Security Rules",
    request_body = SecurityRulePayload,
    responses(
        (status = 201, description = "Regra criada", body = SecurityRuleDetail),
        (status = 400, description = "Payload inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_rule(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<RuleCreate>,
    ValidatedJson(payload): ValidatedJson<SecurityRulePayload>,
) -> Result<ApiResponse<SecurityRuleDetail>, AppError> {
    let rule = app_state.security_service.create_rule(&user, payload).await?;
    Ok(ApiResponse::created("Regra criada com sucesso.", rule))
}

#[utoipa::path(
    put,
    path = "/security-rule/{id}",
    tag = "Security Rules",
    params(("id" = Uuid, Path, description = "ID da regra")),
    request_body = SecurityRulePayload,
    responses(
        (status = 200, description = "Regra atualizada", body = SecurityRuleDetail),
        (status = 404, description = "Regra não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_rule(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<RuleUpdate>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SecurityRulePayload>,
) -> Result<ApiResponse<SecurityRuleDetail>, AppError> {
    let rule = app_state.security_service.update_rule(&user, id, payload).await?;
    Ok(ApiResponse::ok("Regra atualizada com sucesso.", rule))
}

#[utoipa::path(
    delete,
    path = "/security-rule/{id}",
    tag = "Security Rules",
    params(("id" = Uuid, Path, description = "ID da regra")),
    responses(
        (status = 200, description = "Regra removida"),
        (status = 404, description = "Regra não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_rule(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<RuleDelete>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    app_state.security_service.delete_rule(&user, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Regra removida com sucesso."))
}
