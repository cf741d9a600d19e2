use anyhow::{Context, Result};
use axum::{extract::{Path, State}, routing::{get, post}, Json, Router};
use recipe_core::dataset::{load_path, DatasetOptions};
use recipe_core::persist::{load_prefit, IndexPaths};
use recipe_core::{recommend, CorpusIndex, RankedResult, RecipeId, RecommendError, WeightingConfig, DEFAULT_TOP_K};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod errors;

use errors::ApiError;

/// Where the corpus index comes from at startup.
pub enum IndexSource {
    /// Fit from a raw recipe dataset.
    Fit { data: PathBuf, dataset: DatasetOptions, weighting: WeightingConfig },
    /// Load an index previously written by the indexer.
    Prefit { index_dir: PathBuf },
}

pub fn provision(source: &IndexSource) -> Result<CorpusIndex> {
    match source {
        IndexSource::Fit { data, dataset, weighting } => {
            let records = load_path(data, dataset)?;
            tracing::info!(path = %data.display(), recipes = records.len(), "loaded dataset");
            CorpusIndex::build_with(records, *weighting)
                .with_context(|| format!("fitting index from {}", data.display()))
        }
        IndexSource::Prefit { index_dir } => load_prefit(&IndexPaths::new(index_dir))
            .with_context(|| format!("loading index from {}", index_dir.display())),
    }
}

/// Validated body of `POST /recommend`.
#[derive(Debug, PartialEq)]
pub struct PantryInput {
    pub pantry: String,
    pub top_k: i64,
}

impl PantryInput {
    pub fn from_json(body: &Value) -> Result<Self, RecommendError> {
        let pantry = match body.get("pantry") {
            Some(Value::String(s)) => s.trim().to_lowercase(),
            Some(_) => return Err(RecommendError::InvalidInput("'pantry' must be a string".into())),
            None => return Err(RecommendError::InvalidInput("'pantry' is required".into())),
        };
        let top_k = match body.get("top_k") {
            None | Some(Value::Null) => DEFAULT_TOP_K,
            Some(v) => coerce_top_k(v)
                .ok_or_else(|| RecommendError::InvalidInput("'top_k' must be an integer".into()))?,
        };
        Ok(Self { pantry, top_k })
    }
}

/// Integers, integral floats (`2.0`) and integer strings (`"2"`). Counts beyond
/// i64 saturate.
fn coerce_top_k(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[derive(Serialize)]
pub struct RecommendResponse {
    pub results: Vec<RecipeHit>,
}

#[derive(Serialize)]
pub struct RecipeHit {
    pub recipe_id: RecipeId,
    pub recipe_name: String,
    pub ingredients: String,
    pub similarity: f32,
}

impl From<RankedResult> for RecipeHit {
    fn from(r: RankedResult) -> Self {
        Self { recipe_id: r.recipe_id, recipe_name: r.title, ingredients: r.ingredients_text, similarity: r.similarity }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<CorpusIndex>,
}

pub fn build_app(index: CorpusIndex) -> Router {
    let app_state = AppState { index: Arc::new(index) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(|| async { "ok" }))
        .route("/recommend", post(recommend_handler))
        .route("/recipe/:recipe_id", get(recipe_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn root_handler() -> Json<Value> {
    Json(serde_json::json!({ "ok": true, "message": "Recommender API running" }))
}

pub async fn recommend_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let input = PantryInput::from_json(&body)?;
    let results = recommend(&state.index, &input.pantry, input.top_k)?;
    Ok(Json(RecommendResponse { results: results.into_iter().map(RecipeHit::from).collect() }))
}

pub async fn recipe_handler(
    State(state): State<AppState>,
    Path(recipe_id): Path<RecipeId>,
) -> Result<Json<Value>, ApiError> {
    let record = state.index.record(recipe_id).ok_or_else(|| ApiError::NotFound("not found".into()))?;
    Ok(Json(serde_json::json!({
        "recipe_id": record.id,
        "recipe_name": record.title,
        "ingredients": record.ingredients_text,
    })))
}
