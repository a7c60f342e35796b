//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::{AdminService, BlogService, Repositories};
use blog_infra::InMemoryBlogStore;

#[cfg(feature = "postgres")]
use blog_infra::DatabaseConnections;

use crate::config::AppConfig;
use crate::render::PageRenderer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub admin: AdminService,
    pub renderer: Arc<PageRenderer>,
}

impl AppState {
    /// Build the application state, falling back to the in-memory store when
    /// no database is reachable.
    pub async fn new(config: &AppConfig) -> Result<Self, tera::Error> {
        #[cfg(feature = "postgres")]
        let repos = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => connections.repositories(),
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    in_memory()
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                in_memory()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            tracing::info!("Running without postgres feature - using in-memory store");
            in_memory()
        };

        let state = Self::with_repositories(repos, config)?;
        tracing::info!("Application state initialized");
        Ok(state)
    }

    /// State over the given repositories.
    pub fn with_repositories(repos: Repositories, config: &AppConfig) -> Result<Self, tera::Error> {
        Ok(Self {
            blog: BlogService::new(repos.clone(), config.feed.clone()),
            admin: AdminService::new(repos, config.admin_per_page),
            renderer: Arc::new(PageRenderer::new()?),
        })
    }
}

fn in_memory() -> Repositories {
    Arc::new(InMemoryBlogStore::new()).repositories()
}
