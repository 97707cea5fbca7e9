pub mod config;
pub mod credentials;
pub mod database;
pub mod logging;
pub mod security;
