pub mod admin;
pub mod auth;
pub mod devices;
pub mod ingest;
pub mod profile;
pub mod routes;
pub mod utils;
