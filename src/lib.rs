//! Backend for a personal photo gallery: a thin axum HTTP layer over
//! S3-compatible object storage. Display order lives in a single ledger
//! document in the bucket, a shared admin password guards the mutating
//! routes, and public clients read the merged catalog.

pub mod auth;
pub mod aws_clients;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod startup;
pub mod storage;
pub mod test_support;

use catalog::Catalog;
use config::Config;

/// Shared resources for the web server.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub config: Config,
}
