pub mod audit;
pub mod auth;
pub mod menu;
pub mod security;
pub mod task;
pub mod user;
