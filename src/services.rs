pub mod audit;
pub mod auth;
pub mod permission_service;
pub mod pipeline;
pub mod reconcile;
pub mod security_service;
pub mod task_service;
pub mod user_service;
