pub mod config;
pub mod elasticsearch;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;

pub use config::Config;
pub use elasticsearch::{ElasticsearchClient, PostIndex};
pub use handlers::AppState;
