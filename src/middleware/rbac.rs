// src/middleware/rbac.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{auth::Principal, menu::Capability},
};

/// 1. O Trait que define uma exigência: menu + bit de permissão
pub trait CapabilityDef: Send + Sync + 'static {
    fn menu_url() -> &'static str;
    fn capability() -> Capability;
}

/// 2. O Extractor (Guardião)
pub struct RequireCapability<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireCapability<T>
where
    T: CapabilityDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai Usuário
        let principal = parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AppError::Unauthenticated)?;

        // B. Administrador não passa pelo banco
        if principal.is_admin {
            return Ok(RequireCapability(PhantomData));
        }

        // C. Verifica as permissões efetivas
        let app_state = AppState::from_ref(state);
        let allowed = app_state
            .permission_service
            .allows(&principal, T::menu_url(), T::capability())
            .await?;

        if !allowed {
            return Err(denied::<T>());
        }

        Ok(RequireCapability(PhantomData))
    }
}

fn denied<T: CapabilityDef>() -> AppError {
    AppError::Forbidden(format!(
        "Você precisa da permissão '{}' em '{}' para realizar esta ação.",
        T::capability().as_str(),
        T::menu_url()
    ))
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! capabilities {
    ($($name:ident => ($url:literal, $capability:ident)),* $(,)?) => {
        $(
            pub struct $name;
            impl CapabilityDef for $name {
                fn menu_url() -> &'static str { $url }
                fn capability() -> Capability { Capability::$capability }
            }
        )*
    };
}

capabilities! {
    RuleView => ("/security-rule", View),
    RuleCreate => ("/security-rule", Create),
    RuleUpdate => ("/security-rule", Update),
    RuleDelete => ("/security-rule", Delete),

    GroupView => ("/security-group", View),
    GroupCreate => ("/security-group", Create),
    GroupUpdate => ("/security-group", Update),
    GroupDelete => ("/security-group", Delete),

    UserView => ("/user", View),
    UserCreate => ("/user", Create),
    UserUpdate => ("/user", Update),
    UserDelete => ("/user", Delete),

    BoardView => ("/task-management/board", View),
    BoardCreate => ("/task-management/board", Create),
    BoardUpdate => ("/task-management/board", Update),
    BoardDelete => ("/task-management/board", Delete),

    TaskView => ("/task-management/task", View),
    TaskCreate => ("/task-management/task", Create),
    TaskUpdate => ("/task-management/task", Update),
    TaskDelete => ("/task-management/task", Delete),

    AuditView => ("/audit-log", View),
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn denial_is_403_naming_menu_and_capability() {
        let error = denied::<UserDelete>();

        assert_eq!(error.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            error.to_string(),
            "Você precisa da permissão 'excluir' em '/user' para realizar esta ação."
        );
    }

    #[test]
    fn markers_point_at_the_seeded_menu_urls() {
        assert_eq!(BoardView::menu_url(), "/task-management/board");
        assert_eq!(TaskCreate::capability(), Capability::Create);
        assert_eq!(AuditView::menu_url(), "/audit-log");
    }
}
