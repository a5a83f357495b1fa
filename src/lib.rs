//! HTTP backend for Love Unfolds: create, list, search, paginate and delete
//! short text/image "moments".
//!
//! The API layer only talks to a [`domain::MomentRepository`] handle that is
//! connected once at startup and injected through [`AppState`]. Two stores
//! exist: DynamoDB for deployments and an in-memory map for development.

pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod startup;

use std::sync::Arc;

use domain::MomentRepository;

/// AppState holds shared resources for the web server.
pub struct AppState {
    pub moment_repo: Arc<dyn MomentRepository>,
}

impl AppState {
    pub fn new(moment_repo: Arc<dyn MomentRepository>) -> Arc<Self> {
        Arc::new(Self { moment_repo })
    }
}
