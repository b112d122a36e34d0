use actix_web::web;

use crate::handlers;

/// Register the service routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/post", web::post().to(handlers::create_post))
        .route("/search", web::get().to(handlers::search_posts));
}
