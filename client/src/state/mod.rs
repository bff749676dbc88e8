pub mod attendance;
pub mod auth;
pub mod cache;
pub mod theme;
