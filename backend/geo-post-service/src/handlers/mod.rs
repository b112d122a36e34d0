/// HTTP handlers for the geo post endpoints
///
/// - Posts: ingest a location-tagged post and index it
/// - Search: geo-radius lookup of indexed posts
/// - Health: liveness check
pub mod health;
pub mod posts;
pub mod search;

use std::sync::Arc;

use crate::config::Config;
use crate::elasticsearch::PostIndex;

pub use health::health;
pub use posts::create_post;
pub use search::search_posts;

/// Shared handler state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<dyn PostIndex>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(index: Arc<dyn PostIndex>, config: Config) -> Self {
        Self {
            index,
            config: Arc::new(config),
        }
    }
}
