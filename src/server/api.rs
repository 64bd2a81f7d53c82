use crate::knowledge::{ keywords, KnowledgeStore };
use crate::models::health::{ EmergencyContact, HealthCategory, HealthCondition, HealthTip, NutritionInfo };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::get,
    Router,
    Json,
    extract::{ Path, State, Query },
    response::IntoResponse,
    http::StatusCode,
};
use serde::{ Deserialize, Serialize };
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error };

#[derive(Deserialize, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct TipsQuery {
    pub category: Option<HealthCategory>,
    pub season: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    conditions: usize,
    tips: usize,
}

#[derive(Serialize)]
struct NotFound {
    message: String,
}

#[derive(Clone)]
struct AppState {
    knowledge: Arc<KnowledgeStore>,
}

pub fn router(knowledge: Arc<KnowledgeStore>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/conditions", get(conditions_handler))
        .route("/api/conditions/{id}", get(condition_handler))
        .route("/api/tips", get(tips_handler))
        .route("/api/nutrition", get(nutrition_handler))
        .route("/api/emergency-contacts", get(contacts_handler))
        .layer(cors)
        .with_state(AppState { knowledge })
}

pub async fn start_http_server(
    http_port: u16,
    knowledge: Arc<KnowledgeStore>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    info!("Starting HTTP API server on: http://{}", addr);

    let app = router(knowledge);

    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    error!("HTTP server error: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
            }
        }
    });

    info!("HTTP server started");
    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        conditions: state.knowledge.conditions().len(),
        tips: state.knowledge.get_health_tips(None, None).len(),
    })
}

/// Same resolution as the chat path: recognised health keywords first,
/// the raw query otherwise. No query lists everything.
async fn conditions_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>
) -> Json<Vec<HealthCondition>> {
    let found = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let terms = keywords::search_terms(q);
            state.knowledge.search_health_info(&terms).into_iter().cloned().collect()
        }
        None => state.knowledge.conditions().to_vec(),
    };
    Json(found)
}

async fn condition_handler(
    State(state): State<AppState>,
    Path(id): Path<String>
) -> impl IntoResponse {
    match state.knowledge.condition(&id) {
        Some(condition) => (StatusCode::OK, Json(condition.clone())).into_response(),
        None =>
            (
                StatusCode::NOT_FOUND,
                Json(NotFound { message: format!("Unknown condition '{}'", id) }),
            ).into_response(),
    }
}

async fn tips_handler(
    State(state): State<AppState>,
    Query(query): Query<TipsQuery>
) -> Json<Vec<HealthTip>> {
    let tips = state.knowledge
        .get_health_tips(query.category, query.season.as_deref())
        .into_iter()
        .cloned()
        .collect();
    Json(tips)
}

async fn nutrition_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>
) -> Json<Vec<NutritionInfo>> {
    let found = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => state.knowledge.nutrition_for(q).into_iter().cloned().collect(),
        None => state.knowledge.nutrition().to_vec(),
    };
    Json(found)
}

async fn contacts_handler(State(state): State<AppState>) -> Json<Vec<EmergencyContact>> {
    Json(state.knowledge.emergency_contacts().to_vec())
}
