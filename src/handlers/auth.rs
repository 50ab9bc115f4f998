// src/handlers/auth.rs

use axum::extract::State;

use crate::{
    common::{error::AppError, extract::ValidatedJson, response::ApiResponse},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{LoginPayload, LoginResponse, SessionResponse},
};

// Handler de login
#[utoipa::path(
    post,
    path = "/auth/verifyLogin",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token emitido junto com os menus do usuário", body = LoginResponse),
        (status = 401, description = "Usuário ou senha inválidos")
    )
)]
pub async fn verify_login(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> Result<ApiResponse<LoginResponse>, AppError> {
    let response = app_state.auth_service.login(payload).await?;
    Ok(ApiResponse::ok("Login realizado com sucesso.", response))
}

// Handler da rota protegida: devolve o dono do token e seus menus
#[utoipa::path(
    get,
    path = "/auth/verifyToken",
    tag = "Auth",
    responses(
        (status = 200, description = "Token válido", body = SessionResponse),
        (status = 401, description = "Token ausente, inválido ou expirado")
    ),
    security(("api_jwt" = []))
)]
pub async fn verify_token(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<ApiResponse<SessionResponse>, AppError> {
    let session = app_state.auth_service.session(user).await?;
    Ok(ApiResponse::ok("Token válido.", session))
}
