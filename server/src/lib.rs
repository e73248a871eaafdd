pub mod cleanup;
pub mod config;
pub mod host;
pub mod routes;
