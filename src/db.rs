pub mod audit_repo;
pub mod permission_repo;
pub mod record;
pub mod statement;
pub mod store;
pub mod user_repo;

#[cfg(test)]
pub mod memory;

pub use audit_repo::AuditRepository;
pub use permission_repo::PermissionRepository;
pub use store::PgStorage;
pub use user_repo::UserRepository;
