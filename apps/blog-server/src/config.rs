//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use blog_core::FeedSettings;
use blog_infra::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub feed: FeedSettings,
    pub admin_per_page: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Unparseable numbers fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, default: u64| parsed(&lookup, key).unwrap_or(default);

        let database = lookup("DATABASE_URL").map(|url| {
            let defaults = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS")
                    .unwrap_or(defaults.max_connections),
                min_connections: parsed(&lookup, "DB_MIN_CONNECTIONS")
                    .unwrap_or(defaults.min_connections),
                ..defaults
            }
        });

        let defaults = FeedSettings::default();
        let feed = FeedSettings {
            popular_limit: number("FEED_POPULAR_LIMIT", defaults.popular_limit),
            recent_limit: number("FEED_RECENT_LIMIT", defaults.recent_limit),
            similar_limit: number("FEED_SIMILAR_LIMIT", defaults.similar_limit),
            tag_posts_limit: number("FEED_TAG_POSTS_LIMIT", defaults.tag_posts_limit),
            media_url: lookup("MEDIA_URL").unwrap_or(defaults.media_url),
            ..defaults
        };

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&lookup, "PORT").unwrap_or(8080),
            database,
            feed,
            admin_per_page: number("ADMIN_PER_PAGE", 50),
        }
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
