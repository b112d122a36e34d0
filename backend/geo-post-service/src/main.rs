use actix_web::{web, App, HttpServer};
use anyhow::Context;
use geo_post_service::{routes, AppState, Config, ElasticsearchClient};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting geo-post-service");

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!(
        url = %config.elasticsearch.url,
        index = %config.elasticsearch.post_index,
        default_radius_km = config.search.default_radius_km,
        "Connecting to Elasticsearch"
    );
    let client = ElasticsearchClient::connect(&config.elasticsearch)
        .await
        .context("Failed to initialize Elasticsearch client")?;

    let bind_addr = (config.app.host.clone(), config.app.port);
    let state = AppState::new(Arc::new(client), config);

    tracing::info!("geo-post-service HTTP listening on {}:{}", bind_addr.0, bind_addr.1);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(TracingLogger::default())
            .configure(routes::configure)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
