// src/config.rs

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{AuditRepository, PermissionRepository, PgStorage, UserRepository},
    middleware::auth::PublicPaths,
    services::{
        audit::AuditLogger,
        auth::{AuthService, TokenCodec},
        permission_service::PermissionService,
        pipeline::MutationPipeline,
        security_service::SecurityService,
        task_service::TaskService,
        user_service::UserService,
    },
};

const DEFAULT_PUBLIC_PATHS: &str = "/auth/verifyLogin,/api/health,/swagger-ui,/api-docs";

/// Administrador criado na primeira subida, quando as variáveis estão presentes.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub company_name: String,
}

/// Configuração lida do ambiente (.env incluído).
#[derive(Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub server_addr: String,
    pub public_paths: Vec<String>,
    pub public_path_patterns: Vec<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{key} deve ser definida"))
        };

        let jwt_ttl_hours = parse_or(&lookup, "JWT_TTL_HOURS", 24)?;
        if jwt_ttl_hours <= 0 {
            anyhow::bail!("JWT_TTL_HOURS deve ser maior que zero");
        }

        let bootstrap_admin = match (lookup("BOOTSTRAP_ADMIN_USERNAME"), lookup("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                username,
                password,
                company_name: lookup("BOOTSTRAP_COMPANY_NAME").unwrap_or_else(|| "Empresa".to_string()),
            }),
            (None, None) => None,
            _ => anyhow::bail!(
                "BOOTSTRAP_ADMIN_USERNAME e BOOTSTRAP_ADMIN_PASSWORD devem ser definidas juntas"
            ),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_ttl_hours,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout: Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:4000".to_string()),
            public_paths: split_list(&lookup("PUBLIC_PATHS").unwrap_or_else(|| DEFAULT_PUBLIC_PATHS.to_string())),
            public_path_patterns: split_list(&lookup("PUBLIC_PATH_PATTERNS").unwrap_or_default()),
            bootstrap_admin,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} inválida: '{raw}'")),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub public_paths: Arc<PublicPaths>,
    pub auth_service: AuthService,
    pub permission_service: PermissionService,
    pub security_service: SecurityService,
    pub user_service: UserService,
    pub task_service: TaskService,
    pub audit_repo: AuditRepository,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(settings.db_acquire_timeout)
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(db_pool, settings)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, settings: Settings) -> anyhow::Result<Self> {
        let public_paths = PublicPaths::new(&settings.public_paths, &settings.public_path_patterns)
            .context("PUBLIC_PATH_PATTERNS contém uma expressão inválida")?;

        let user_repo = UserRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());
        let permission_service = PermissionService::new(PermissionRepository::new(db_pool.clone()));

        let tokens = TokenCodec::new(
            settings.jwt_secret.clone(),
            chrono::Duration::hours(settings.jwt_ttl_hours),
        );
        let auth_service = AuthService::new(user_repo, permission_service.clone(), tokens, db_pool.clone());

        let pipeline = MutationPipeline::new(
            PgStorage::new(db_pool.clone()),
            AuditLogger::new(Arc::new(audit_repo.clone())),
        );

        Ok(Self {
            security_service: SecurityService::new(pipeline.clone()),
            user_service: UserService::new(pipeline.clone(), bcrypt::DEFAULT_COST),
            task_service: TaskService::new(pipeline),
            db_pool,
            public_paths: Arc::new(public_paths),
            auth_service,
            permission_service,
            audit_repo,
        })
    }
}
