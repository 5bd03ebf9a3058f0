pub mod cli;
pub mod config;
pub mod database;
pub mod ddl;
pub mod error;
pub mod handlers;
pub mod json_path;
pub mod middleware;
pub mod pipeline;
pub mod schema;
pub mod services;
pub mod types;
pub mod validation;
