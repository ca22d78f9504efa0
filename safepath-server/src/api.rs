use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use geojson::Feature;
use safepath_core::{
    Error, SafetyConfig, compute_route,
    loading::FeatureSummary,
    model::LatLng,
    prelude::{RouteSummary, ScoringReport},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{AppState, ServerConfig};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RouteRequest {
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_lat: f64,
    pub end_lng: f64,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub success: bool,
    pub coordinates: Vec<LatLng>,
    pub geojson: Feature,
    pub path_info: RouteSummary,
    /// Seconds spent on the request
    pub processing_time: f64,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub scoring: ScoringReport,
    pub features: FeatureSummary,
    pub safety: SafetyConfig,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub kind: &'static str,
    /// Always empty; no coordinates are produced for a failed request
    pub coordinates: Vec<LatLng>,
    pub geojson: Option<Feature>,
}

/// Routing error rendered as a JSON payload with a matching status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    kind: &'static str,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            kind: "internal",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = match &error {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NodeResolution { .. } | Error::NoPathFound { .. } => StatusCode::NOT_FOUND,
            Error::SearchLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
            kind: error.kind(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidInput(rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(kind = self.kind, "{}", self.message);
        }
        let body = ErrorResponse {
            success: false,
            error: self.message,
            kind: self.kind,
            coordinates: Vec::new(),
            geojson: None,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Builds the application router with tracing, CORS, timeout and
/// concurrency limits applied.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/route", post(route_handler))
        .route("/api/reload", post(reload_handler))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        // the route map front-end is served from another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "safepath",
    }))
}

async fn route_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<RouteResponse>, ApiError> {
    let started = Instant::now();
    let Json(request) = payload?;
    let context = state.snapshot();

    let start = LatLng {
        lat: request.start_lat,
        lng: request.start_lng,
    };
    let end = LatLng {
        lat: request.end_lat,
        lng: request.end_lng,
    };

    // A* is CPU bound; keep it off the async workers
    let path = tokio::task::spawn_blocking(move || compute_route(&context, start, end))
        .await
        .map_err(|e| ApiError::internal(format!("route task failed: {e}")))??;

    let geojson = path.to_geojson()?;
    let processing_time = started.elapsed().as_secs_f64();
    info!(
        nodes = path.node_count(),
        iterations = path.iterations(),
        processing_time,
        "route computed"
    );

    Ok(Json(RouteResponse {
        success: true,
        coordinates: path.lat_lng(),
        geojson,
        path_info: path.summary(),
        processing_time,
    }))
}

async fn reload_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let context = tokio::task::spawn_blocking(move || state.reload())
        .await
        .map_err(|e| ApiError::internal(format!("reload task failed: {e}")))??;

    Ok(Json(ReloadResponse {
        success: true,
        scoring: *context.graph().report(),
        features: *context.feature_summary(),
        safety: *context.graph().safety_config(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use safepath_core::{
        FeatureSet, RoutingContext, RoutingModelConfig, SafetyConfig, SearchConfig,
        WeightedGraph, loading::GraphData,
    };
    use tower::ServiceExt;

    use super::*;

    fn state() -> Arc<AppState> {
        let mut data = GraphData::new();
        data.add_node(1, 43.6500, -79.4000)
            .add_node(2, 43.6510, -79.4000)
            .add_node(3, 43.6510, -79.3990)
            .add_node(7, 43.7000, -79.3000)
            .add_node(8, 43.7010, -79.3000)
            .add_street(1, 2, 115.0)
            .add_street(2, 3, 85.0)
            .add_street(7, 8, 115.0);
        let graph =
            WeightedGraph::build(&data, &FeatureSet::new(), SafetyConfig::default()).unwrap();
        let context = RoutingContext::new(
            graph,
            SearchConfig {
                max_snap_distance_m: Some(1_000.0),
                ..SearchConfig::default()
            },
        );
        Arc::new(AppState::new(context, RoutingModelConfig::new("unused.json")))
    }

    fn router() -> Router {
        let config = ServerConfig::from_toml("[model]\ngraph_path = \"unused.json\"").unwrap();
        build_router(state(), &config)
    }

    async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_service() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "safepath");
    }

    #[tokio::test]
    async fn route_returns_coordinates_and_geojson() {
        let (status, body) = post_json(
            router(),
            "/api/route",
            json!({
                "start_lat": 43.6500, "start_lng": -79.4000,
                "end_lat": 43.6510, "end_lng": -79.3990,
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let coordinates = body["coordinates"].as_array().unwrap();
        assert_eq!(coordinates.len(), 3);
        assert_eq!(coordinates[0]["lat"].as_f64(), Some(43.65));
        assert_eq!(coordinates[2]["lng"].as_f64(), Some(-79.399));
        assert_eq!(body["geojson"]["geometry"]["type"], "LineString");
        assert_eq!(
            body["geojson"]["geometry"]["coordinates"][0][0].as_f64(),
            Some(-79.4)
        );
        assert_eq!(body["path_info"]["node_count"], 3);
        assert_eq!(body["path_info"]["coordinate_count"], 3);
        assert!(body["processing_time"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn invalid_coordinates_are_bad_request() {
        let (status, body) = post_json(
            router(),
            "/api/route",
            json!({"start_lat": 123.0, "start_lng": 0.0, "end_lat": 43.65, "end_lng": -79.4}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "invalid_input");
        assert_eq!(body["coordinates"].as_array().map(Vec::len), Some(0));
        assert!(body["geojson"].is_null());
    }

    #[tokio::test]
    async fn malformed_bodies_are_bad_request() {
        let bodies = [
            json!({"start_lat": 43.65, "start_lng": -79.4, "end_lat": 43.651}),
            json!({
                "start_lat": "north", "start_lng": -79.4,
                "end_lat": 43.651, "end_lng": -79.4,
            }),
        ];
        for body in bodies {
            let (status, body) = post_json(router(), "/api/route", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert_eq!(body["kind"], "invalid_input");
            assert_eq!(body["coordinates"].as_array().map(Vec::len), Some(0));
            assert!(body["geojson"].is_null());
        }

        let request = Request::builder()
            .method("POST")
            .uri("/api/route")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn disconnected_goal_is_not_found() {
        let (status, body) = post_json(
            router(),
            "/api/route",
            json!({
                "start_lat": 43.6500, "start_lng": -79.4000,
                "end_lat": 43.7010, "end_lng": -79.3000,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "no_path_found");
    }

    #[tokio::test]
    async fn far_away_point_fails_resolution() {
        let (status, body) = post_json(
            router(),
            "/api/route",
            json!({"start_lat": 10.0, "start_lng": 10.0, "end_lat": 43.65, "end_lng": -79.4}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "node_resolution");
    }

    #[tokio::test]
    async fn reload_publishes_a_new_snapshot() {
        let state = state();
        let config = ServerConfig::from_toml("[model]\ngraph_path = \"unused.json\"").unwrap();
        let router = build_router(Arc::clone(&state), &config);
        let before = state.snapshot();

        // the model points at no feature files, so reload succeeds with nothing loaded
        let (status, body) = post_json(router, "/api/reload", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["features"]["accidents"]["loaded"], 0);
        assert_eq!(body["scoring"]["edges"], 6);
        assert_eq!(body["safety"]["accident_radius_m"], 500.0);
        assert!(!Arc::ptr_eq(&before, &state.snapshot()));
    }

    #[test]
    fn error_statuses_follow_error_kind() {
        let cases = [
            (Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                Error::NodeResolution { lat: 0.0, lon: 0.0 },
                StatusCode::NOT_FOUND,
            ),
            (Error::NoPathFound { start: 1, goal: 2 }, StatusCode::NOT_FOUND),
            (
                Error::SearchLimitExceeded { iterations: 10 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                Error::DataInconsistency("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status, status);
        }
    }
}
