use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::error::StoreError;
use crate::results::{self, Snapshot};
use crate::store::{self, ResultsStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResultsStore>,
}

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// Build the Axum router for the results API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/resultados", get(get_results_handler).post(put_results_handler))
        .route("/api/resultados/agrupados", get(grouped_handler))
        .route("/api/estatisticas", get(stats_handler))
        .route("/api/loterias", get(lotteries_handler))
        .route("/api/status", get(status_handler))
        .fallback(index_handler)
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn index_handler() -> impl IntoResponse {
    "Results store API - use /api/resultados"
}

/// GET /api/resultados
async fn get_results_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.get().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            warn!("GET /api/resultados failed ({}): {}", state.store.name(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "resultados": [], "erro": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// POST /api/resultados – body is a whole snapshot, replacing the current one.
async fn put_results_handler(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    match store::put_json(state.store.as_ref(), &body).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "sucesso": true }))),
        Err(e) => {
            if e.is_malformed() {
                warn!("POST /api/resultados rejected: {}", e);
            } else {
                warn!("POST /api/resultados failed ({}): {}", state.store.name(), e);
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "sucesso": false, "erro": e.to_string() })),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct GroupQuery {
    loteria: Option<String>,
}

/// GET /api/resultados/agrupados?loteria=PT
async fn grouped_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<GroupQuery>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let snapshot = load(&state).await?;
    let groups = match q.loteria.as_deref() {
        Some(lottery) => results::group_for_lottery(&snapshot.resultados, lottery),
        None => results::group(&snapshot.resultados),
    };
    Ok(Json(groups).into_response())
}

/// GET /api/estatisticas – serialized straight from the summary so the
/// ranking order of the count maps reaches the client.
async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<results::StatsSummary>, (StatusCode, Json<Value>)> {
    let snapshot = load(&state).await?;
    Ok(Json(results::summarize(&snapshot.resultados)))
}

/// GET /api/loterias
async fn lotteries_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = load(&state).await?;
    Ok(Json(json!({ "loterias": results::lotteries(&snapshot.resultados) })))
}

/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = load(&state).await?;
    Ok(Json(json!({
        "backend": state.store.name(),
        "total_resultados": snapshot.resultados.len(),
        "ultima_verificacao": snapshot.last_checked(),
        "timestamp": Utc::now(),
    })))
}

async fn load(state: &AppState) -> Result<Snapshot, (StatusCode, Json<Value>)> {
    state.store.get().await.map_err(|e| {
        warn!("Snapshot read failed ({}): {}", state.store.name(), e);
        failure(e)
    })
}

fn failure(e: StoreError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "erro": e.to_string() })),
    )
}
