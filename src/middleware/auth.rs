// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use regex::Regex;

use crate::{common::error::AppError, config::AppState, models::auth::Principal};

/// Caminhos que dispensam o token: prefixos por segmento e expressões regulares.
#[derive(Debug, Clone)]
pub struct PublicPaths {
    prefixes: Vec<String>,
    patterns: Vec<Regex>,
}

impl PublicPaths {
    pub fn new(prefixes: &[String], patterns: &[String]) -> Result<Self, regex::Error> {
        let prefixes = prefixes
            .iter()
            .map(|prefix| prefix.trim().trim_end_matches('/').to_string())
            .filter(|prefix| !prefix.is_empty())
            .collect();
        let patterns = patterns
            .iter()
            .map(|pattern| Regex::new(pattern.trim()))
            .collect::<Result<_, _>>()?;

        Ok(Self { prefixes, patterns })
    }

    // "/auth/verifyLogin" libera "/auth/verifyLogin/..." mas não "/auth/verifyLoginX"
    pub fn is_public(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        }) || self.patterns.iter().any(|pattern| pattern.is_match(path))
    }
}

// O middleware em si
pub async fn auth_gate(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if app_state.public_paths.is_public(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let bearer = request
        .headers()
        .typed_try_get::<Authorization<Bearer>>()
        .map_err(|_| AppError::Unauthenticated)?
        .ok_or(AppError::Unauthenticated)?;

    let principal = app_state.auth_service.tokens().verify(bearer.token())?;

    // Insere o usuário nos "extensions" da requisição
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub Principal);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::Unauthenticated)
    }
}
