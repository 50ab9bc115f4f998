// src/handlers/audit.rs

use axum::extract::{rejection::QueryRejection, Query, State};
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::Page, response::ApiResponse},
    config::AppState,
    middleware::{
        rbac::{AuditView, RequireCapability},
        tenancy::TenantContext,
    },
    models::audit::{AuditLogQuery, ChangeRecord},
};

#[utoipa::path(
    get,
    path = "/audit-log",
    tag = "Audit",
    params(AuditLogQuery),
    responses(
        (status = 200, description = "Registros de alteração da empresa, mais recentes primeiro", body = Page<ChangeRecord>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_audit_log(
    State(app_state): State<AppState>,
    TenantContext(company_id): TenantContext,
    _guard: RequireCapability<AuditView>,
    query: Result<Query<AuditLogQuery>, QueryRejection>,
) -> Result<ApiResponse<Page<ChangeRecord>>, AppError> {
    let Query(filter) = query.map_err(|rejection| AppError::MalformedPayload(rejection.body_text()))?;
    let page = filter.page_request();
    page.validate()?;

    let records = app_state.audit_repo.list(company_id, &filter, page).await?;
    Ok(ApiResponse::ok("Registros de auditoria listados com sucesso.", records))
}
