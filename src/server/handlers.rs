//! HTTP request handlers

use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::inference::{FeatureVector, InferenceConfig, Prediction};
use crate::preprocessing::LoanDataset;
use crate::reporting::SummaryReport;
use crate::training::{MetricsRecord, ModelKind, TrainEngine, TrainingConfig};

use super::error::{Result, ServerError};
use super::state::AppState;

// ============================================================================
// Training
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TrainParams {
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
}

fn default_test_size() -> f64 {
    TrainingConfig::default().test_size
}

fn default_random_state() -> u64 {
    TrainingConfig::default().random_state
}

/// Train both models on an uploaded CSV and replace the stored ones.
///
/// State is only touched once every model has fitted and both files are
/// saved; any earlier failure leaves the previous models and reports in place.
///
/// Concurrent trainings are not serialized. The last writer wins per file,
/// so after overlapping requests the model files and the reports can come
/// from different runs.
pub async fn train_models(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<TrainParams>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<MetricsRecord>>> {
    let Query(params) = params.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let config = TrainingConfig::new(params.test_size, params.random_state)?;

    let mut multipart = multipart.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let (file_name, data) = read_csv_upload(&mut multipart).await?;

    info!(
        file = %file_name,
        bytes = data.len(),
        test_size = config.test_size,
        random_state = config.random_state,
        "Training request received"
    );

    let store = state.store.clone();
    let outcome = tokio::task::spawn_blocking(move || -> crate::error::Result<_> {
        let dataset = LoanDataset::from_csv_bytes(&data)?;
        let outcome = TrainEngine::new(config).fit(&dataset)?;
        store.save_all(outcome.models.iter().map(|(model, _)| model))?;
        Ok(outcome)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Training task failed: {}", e)))??;

    state.reports.write().await.record(&outcome);
    info!(rows = outcome.summary.rows, defaults = outcome.summary.defaults, "Training state updated");

    Ok(Json(outcome.metrics()))
}

/// Pull the `file` field out of the form, rejecting anything but `.csv`
async fn read_csv_upload(multipart: &mut Multipart) -> Result<(String, Bytes)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !file_name.to_lowercase().ends_with(".csv") {
            return Err(ServerError::BadRequest("Please upload a CSV file.".to_string()));
        }

        let data = field.bytes().await.map_err(|e| ServerError::BadRequest(e.body_text()))?;
        return Ok((file_name, data));
    }

    Err(ServerError::BadRequest(
        "No file uploaded. Send the CSV in a multipart field named 'file'.".to_string(),
    ))
}

// ============================================================================
// Inference
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PredictParams {
    #[serde(default = "default_model")]
    pub model: ModelKind,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_model() -> ModelKind {
    InferenceConfig::default().model
}

fn default_threshold() -> f64 {
    InferenceConfig::default().classification_threshold
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<PredictParams>, QueryRejection>,
    body: std::result::Result<Json<FeatureVector>, JsonRejection>,
) -> Result<Json<Prediction>> {
    let Query(params) = params.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let Json(features) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let config = InferenceConfig::new(params.model, params.threshold)?;

    // Loading reads and deserializes the model file
    let inference = state.inference.clone();
    let prediction = tokio::task::spawn_blocking(move || inference.predict(&features, &config))
        .await
        .map_err(|e| ServerError::Internal(format!("Prediction task failed: {}", e)))??;

    Ok(Json(prediction))
}

// ============================================================================
// Reports
// ============================================================================

pub async fn reports_summary(State(state): State<Arc<AppState>>) -> Json<SummaryReport> {
    Json(state.reports.read().await.summary_report())
}

// ============================================================================
// System Handlers
// ============================================================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let models: serde_json::Map<String, serde_json::Value> = state
        .store
        .available()
        .into_iter()
        .map(|(kind, present)| (kind.to_string(), serde_json::Value::Bool(present)))
        .collect();

    Json(serde_json::json!({
        "ok": true,
        "artifacts": state.store.root().display().to_string(),
        "models": models,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

// ============================================================================
// UI Handler
// ============================================================================

pub async fn serve_index() -> Html<&'static str> {
    Html(EMBEDDED_INDEX_HTML)
}

const EMBEDDED_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Loan Default API</title>
    <style>
        body { font-family: system-ui, -apple-system, sans-serif; margin: 40px; color: #0f172a; }
        .card { border: 1px solid #e5e7eb; border-radius: 12px; padding: 16px; max-width: 760px; }
        a { color: #2563eb; text-decoration: none; }
    </style>
</head>
<body>
    <div class="card">
        <h1>Loan Default API</h1>
        <ul>
            <li><a href="/api/health">/api/health</a></li>
            <li><a href="/api/reports/summary">/api/reports/summary</a></li>
        </ul>
        <p>Train via <code>POST /api/train</code> (multipart CSV, field <code>file</code>)
        and predict via <code>POST /api/predict</code> (JSON).</p>
    </div>
</body>
</html>
"#;
