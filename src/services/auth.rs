// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    config::BootstrapAdmin,
    db::UserRepository,
    models::auth::{Claims, LoginPayload, LoginResponse, Principal, SessionResponse},
    services::permission_service::PermissionService,
};

/// Emite e valida os tokens HS256.
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self { secret: secret.into(), ttl }
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims::new(principal, now, now + self.ttl);
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Principal, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims.into_principal())
        .map_err(|error| match error.kind() {
            ErrorKind::ExpiredSignature => AppError::InvalidCredential("Token expirado"),
            _ => AppError::InvalidCredential("Token inválido"),
        })
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    permissions: PermissionService,
    tokens: TokenCodec,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        permissions: PermissionService,
        tokens: TokenCodec,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, permissions, tokens, pool }
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<LoginResponse, AppError> {
        let user = self
            .user_repo
            .find_by_username(&payload.username)
            .await?
            .ok_or(AppError::InvalidLogin)?;

        if !user.is_active {
            tracing::warn!(username = %user.username, "Tentativa de login de usuário inativo");
            return Err(AppError::InvalidLogin);
        }

        let password = payload.password;
        let password_hash = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidLogin);
        }

        let principal = Principal::from(&user);
        let token = self.tokens.issue(&principal)?;
        let menus = self.permissions.resolve(&principal).await?;

        tracing::info!(user_id = %principal.id, "🔑 Login realizado");
        Ok(LoginResponse { user: principal, token, menus })
    }

    pub async fn session(&self, principal: Principal) -> Result<SessionResponse, AppError> {
        let menus = self.permissions.resolve(&principal).await?;
        Ok(SessionResponse { user: principal, menus })
    }

    /// Cria empresa e administrador na primeira subida, se o usuário ainda não existir.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<(), AppError> {
        if self.user_repo.find_by_username(&admin.username).await?.is_some() {
            return Ok(());
        }

        let password = admin.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let mut tx = self.pool.begin().await?;
        let company_id = self.user_repo.create_company(&mut *tx, &admin.company_name).await?;
        self.user_repo
            .create_admin(&mut *tx, company_id, &admin.username, &password_hash)
            .await?;
        tx.commit().await?;

        tracing::info!(username = %admin.username, "👤 Administrador inicial criado");
        Ok(())
    }
}
