// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::response::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Corpo da requisição inválido: {0}")]
    MalformedPayload(String),

    // Cabeçalho Authorization ausente ou fora do formato "Bearer <token>"
    #[error("Cabeçalho de autorização ausente ou inválido")]
    Unauthenticated,

    // Assinatura inválida ou token expirado
    #[error("{0}")]
    InvalidCredential(&'static str),

    #[error("Usuário ou senha inválidos")]
    InvalidLogin,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    #[error("Registro duplicado ({0})")]
    Conflict(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated | AppError::InvalidCredential(_) | AppError::InvalidLogin => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte erros do banco, tratando violação de unicidade como conflito.
    pub fn from_db(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return AppError::Conflict(constraint);
            }
        }
        AppError::DatabaseError(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, details): (String, Option<Value>) = match &self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                (
                    "Um ou mais campos são inválidos.".to_string(),
                    Some(Value::Object(details)),
                )
            }
            AppError::Conflict(constraint) if constraint == "users_username_key" => {
                ("Este nome de usuário já está em uso.".to_string(), None)
            }
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                // Detalhes ficam no log, o cliente recebe só a mensagem genérica
                tracing::error!(error = ?e, "Erro Interno do Servidor: {}", e);
                ("Ocorreu um erro inesperado.".to_string(), None)
            }
            e => (e.to_string(), None),
        };

        ApiResponse::new(status, message, details).into_response()
    }
}
