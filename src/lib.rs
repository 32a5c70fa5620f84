pub mod academic;
pub mod auth;
pub mod categories;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod resolver;
pub mod routes;
pub mod schema;
pub mod state;
pub mod storage;
pub mod tracker;
