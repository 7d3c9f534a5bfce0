pub mod admin;
pub mod auth;
pub mod bloom;
pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod guidance;
pub mod llm_client;
pub mod models;
pub mod rag;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod students;
pub mod teachers;
pub mod uploads;
