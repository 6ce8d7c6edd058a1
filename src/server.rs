use crate::config::AppConfig;
use crate::fetch::{self, RegionFailure};
use crate::processing;
use crate::render;
use crate::types::Marker;
use anyhow::Result;
use axum::{
    extract::State,
    response::{Html, Json},
    routing::get,
    Router,
};
use reqwest::Client;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

pub struct AppState {
    pub client: Client,
    pub config: AppConfig,
}

/// The marker list as a standalone data endpoint, for clients that want
/// the JSON payload without the page around it.
#[derive(Serialize)]
pub struct MarkersResponse {
    pub markers: Vec<Marker>,
    pub failed_regions: Vec<RegionFailure>,
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let client = fetch::build_client(&config.api)?;
    let static_dir = config.server.static_dir.clone();
    let port = config.server.port;

    let state = Arc::new(AppState { client, config });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let app = Router::new()
        .route("/", get(page_handler))
        .route("/api/markers", get(markers_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Runs the whole pipeline per request: the marker list has no lifecycle
/// beyond a single page render, so there is nothing to cache or refresh.
async fn page_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let report = fetch::fetch_all(&state.client, &state.config.api).await;
    let markers = processing::build_markers(&state.config.processing, &report.regions);
    let filters = processing::filter_substrings(&state.config.processing);

    match render::render_page(&markers, &filters, &report.failures) {
        Ok(page) => Html(page),
        Err(e) => {
            error!(error = %e, "page rendering failed");
            Html("<!DOCTYPE html><html><body>Bank ATMs Map is unavailable.</body></html>".to_string())
        }
    }
}

async fn markers_handler(State(state): State<Arc<AppState>>) -> Json<MarkersResponse> {
    let report = fetch::fetch_all(&state.client, &state.config.api).await;
    let markers = processing::build_markers(&state.config.processing, &report.regions);

    Json(MarkersResponse {
        markers,
        failed_regions: report.failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_response_serializes_with_stable_keys() {
        let response = MarkersResponse {
            markers: vec![Marker {
                lat: 53.9,
                lng: 27.5,
                popup: "<b>Отделение</b>".to_string(),
            }],
            failed_regions: vec![RegionFailure {
                region: "Минская область".to_string(),
                error: "request failed".to_string(),
            }],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["markers"][0]["lat"], 53.9);
        assert_eq!(json["markers"][0]["lng"], 27.5);
        assert_eq!(json["failed_regions"][0]["region"], "Минская область");
    }
}
