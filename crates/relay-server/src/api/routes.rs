//! REST API routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use relay_core::{BackboneReport, Coordinate, PathPlan, PlanError, Topology, TowerRecord};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::request_id;
use crate::state::AppState;

/// Reference POP in Al Hofuf.
const ALHOFUF_POP: (f64, f64) = (25.3790, 49.5883);

/// Landmarks around the Al Hofuf POP used by the example endpoint.
const ALHOFUF_DESTINATIONS: [(f64, f64); 8] = [
    (25.3713, 49.5810),
    (25.3499, 49.5971),
    (25.3783, 49.5549),
    (25.3823, 49.5922),
    (25.3638, 49.6012),
    (25.3866, 49.5994),
    (25.2856, 49.4850),
    (25.3782, 49.5785),
];

type ApiError = (StatusCode, Json<Value>);

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/findpath", get(find_path))
        .route("/v1/pop", post(pop_backbone))
        .route("/v1/example/alhofuf", get(alhofuf_example))
        .route("/v1/towers", get(list_towers))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id::ensure_request_id))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

// === Request types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindPathQuery {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopQuery {
    pub pop_lat: f64,
    pub pop_lon: f64,
    /// `tree` (default) or `ring`
    #[serde(default)]
    pub topology: Option<Topology>,
}

#[derive(Debug, Deserialize)]
pub struct TopologyQuery {
    #[serde(default)]
    pub topology: Option<Topology>,
}

// === Handlers ===

async fn find_path(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FindPathQuery>,
) -> Result<Json<PathPlan>, ApiError> {
    let start = Coordinate::new(query.start_lat, query.start_lon);
    let end = Coordinate::new(query.end_lat, query.end_lon);
    let plan = run_planner(state, move |state| state.planner().find_path(start, end)).await?;
    Ok(Json(plan))
}

async fn pop_backbone(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PopQuery>,
    Json(destinations): Json<Vec<Coordinate>>,
) -> Result<Json<BackboneReport>, ApiError> {
    let hub = Coordinate::new(query.pop_lat, query.pop_lon);
    let topology = query.topology.unwrap_or_default();
    let report = run_planner(state, move |state| {
        state
            .planner()
            .find_backbone_network(hub, &destinations, topology)
    })
    .await?;
    Ok(Json(report))
}

async fn alhofuf_example(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopologyQuery>,
) -> Result<Json<BackboneReport>, ApiError> {
    let hub = Coordinate::new(ALHOFUF_POP.0, ALHOFUF_POP.1);
    let destinations: Vec<Coordinate> = ALHOFUF_DESTINATIONS
        .iter()
        .map(|&(lat, lon)| Coordinate::new(lat, lon))
        .collect();
    let topology = query.topology.unwrap_or_default();
    let report = run_planner(state, move |state| {
        state
            .planner()
            .find_backbone_network(hub, &destinations, topology)
    })
    .await?;
    Ok(Json(report))
}

async fn list_towers(State(state): State<Arc<AppState>>) -> Json<Vec<TowerRecord>> {
    Json(state.towers().to_vec())
}

// === Helpers ===

/// Run a planning job off the async runtime, keeping the request span.
async fn run_planner<T, F>(state: Arc<AppState>, job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> relay_core::Result<T> + Send + 'static,
{
    let span = tracing::Span::current();
    let outcome = tokio::task::spawn_blocking(move || span.in_scope(|| job(&state)))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "planning task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "planning task failed" })),
            )
        })?;
    outcome.map_err(plan_error)
}

fn plan_error(err: PlanError) -> ApiError {
    let status = match &err {
        PlanError::InvalidCoordinate { .. }
        | PlanError::NoDestinations
        | PlanError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        PlanError::NoInventory { .. } | PlanError::SegmentTooLong { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PlanError::Inventory(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    tracing::warn!(status = status.as_u16(), error = %err, "planning request rejected");
    (status, Json(json!({ "error": err.to_string() })))
}
