// Site Migrator - content tooling for the marketing site

pub mod assets;
pub mod cli;
pub mod config;
pub mod content;
pub mod convert;
pub mod leads;     // Lead capture: validation, rate limiting, webhook forwarding
pub mod middleware;
pub mod models;
pub mod pipeline;  // migrate-images and scrape runs
pub mod routes;
pub mod scrape;    // Legacy page extraction
pub mod storage;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use types::{ContentCategory, MigrateError};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
