pub mod api;
pub mod assets;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod queries;
pub mod server;
pub mod tasks;
pub mod viz;
