// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,

        // --- Auth ---
        handlers::auth::verify_login,
        handlers::auth::verify_token,

        // --- Menus ---
        handlers::menu::list_menus,
        handlers::menu::get_menu,

        // --- Security Rules ---
        handlers::security_rule::list_rules,
        handlers::security_rule::paginate_rules,
        handlers::security_rule::get_rule,
        handlers::security_rule::create_rule,
        handlers::security_rule::update_rule,
        handlers::security_rule::delete_rule,

        // --- Security Groups ---
        handlers::security_group::list_groups,
        handlers::security_group::paginate_groups,
        handlers::security_group::get_group,
        handlers::security_group::create_group,
        handlers::security_group::update_group,
        handlers::security_group::delete_group,

        // --- Users ---
        handlers::user::list_users,
        handlers::user::paginate_users,
        handlers::user::get_user,
        handlers::user::create_user,
        handlers::user::update_user,
        handlers::user::delete_user,

        // --- Task Management ---
        handlers::task::list_boards,
        handlers::task::paginate_boards,
        handlers::task::get_board,
        handlers::task::list_board_tasks,
        handlers::task::create_board,
        handlers::task::update_board,
        handlers::task::delete_board,
        handlers::task::list_tasks,
        handlers::task::get_task,
        handlers::task::create_task,
        handlers::task::update_task,
        handlers::task::delete_task,

        // --- Audit ---
        handlers::audit::list_audit_log,
    ),
    components(
        schemas(
            common::pagination::PageRequest,

            // --- Auth ---
            models::auth::Principal,
            models::auth::LoginPayload,
            models::auth::LoginResponse,
            models::auth::SessionResponse,

            // --- Menus ---
            models::menu::Menu,
            models::menu::Capabilities,
            models::menu::MenuGrant,

            // --- Security ---
            models::security::SecurityRule,
            models::security::RuleMenuPermission,
            models::security::SecurityRulePayload,
            models::security::RuleMenuPermissionItem,
            models::security::SecurityRuleDetail,
            models::security::SecurityGroup,
            models::security::SecurityGroupRule,
            models::security::SecurityGroupPayload,
            models::security::GroupRuleItem,
            models::security::SecurityGroupDetail,

            // --- Users ---
            models::user::User,
            models::user::UserGroup,
            models::user::UserPayload,
            models::user::UserGroupItem,
            models::user::UserDetail,

            // --- Task Management ---
            models::task::TaskBoard,
            models::task::TaskBoardColumn,
            models::task::TaskBoardPayload,
            models::task::TaskBoardColumnItem,
            models::task::TaskBoardDetail,
            models::task::Task,
            models::task::TaskUser,
            models::task::TaskPayload,
            models::task::TaskUserItem,
            models::task::TaskDetail,

            // --- Audit ---
            models::audit::AuditAction,
            models::audit::ChangeRecord,
        )
    ),
    tags(
        (name = "Health", description = "Verificação de disponibilidade"),
        (name = "Auth", description = "Login e validação de token"),
        (name = "Menus", description = "Menus da aplicação"),
        (name = "Security Rules", description = "Regras de segurança e permissões por menu"),
        (name = "Security Groups", description = "Grupos de segurança e suas regras"),
        (name = "Users", description = "Usuários da empresa e seus grupos"),
        (name = "Task Management", description = "Quadros, colunas e tarefas"),
        (name = "Audit", description = "Registros de alteração")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
