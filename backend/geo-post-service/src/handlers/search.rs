/// Geo-radius search handler
use actix_web::{web, HttpRequest, HttpResponse};

use super::AppState;
use crate::elasticsearch::{Distance, GeoDistanceQuery, LOCATION_FIELD};
use crate::error::{AppError, Result};
use crate::models::{decode_hits, SearchParams};

/// Search posts within a radius of `lat`/`lon`.
///
/// Coordinates that are missing or fail to parse fall back to `0.0`. The
/// query string is read leniently, so no input shape is rejected here.
pub async fn search_posts(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    tracing::info!("Received a search request");

    let params = SearchParams::from_query(req.query_string());
    let lat = parse_coordinate("lat", params.lat.as_deref());
    let lon = parse_coordinate("lon", params.lon.as_deref());
    let radius_km = resolve_radius_km(
        params.range.as_deref(),
        state.config.search.default_radius_km,
    );
    tracing::debug!(lat, lon, radius_km, "Resolved search range");

    let query = GeoDistanceQuery::new(LOCATION_FIELD)
        .distance(Distance::km(radius_km))
        .lat(lat)
        .lon(lon);

    let index = &state.config.elasticsearch.post_index;
    let hits = state.index.search(index, &query).await.map_err(|e| {
        tracing::error!(error = %e, index = %index, "Failed to read post from Elasticsearch");
        AppError::SearchBackend
    })?;

    let decoded = decode_hits(hits);
    if decoded.dropped > 0 {
        tracing::warn!(
            dropped = decoded.dropped,
            kept = decoded.posts.len(),
            "Dropped search hits that are not posts"
        );
    }

    let body = serde_json::to_vec(&decoded.posts).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse post into JSON format");
        AppError::Serialization
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

fn parse_coordinate(name: &str, raw: Option<&str>) -> f64 {
    let raw = raw.unwrap_or_default();
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            tracing::debug!(coordinate = name, raw, "Unparseable coordinate, using 0.0");
            0.0
        }
    }
}

fn resolve_radius_km(range: Option<&str>, default_km: f64) -> f64 {
    let raw = match range.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return default_km,
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => {
            tracing::warn!(range = raw, default_km, "Invalid range, using default radius");
            default_km
        }
    }
}
