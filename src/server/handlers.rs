//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::inference::CropFeatures;
use crate::training::FEATURE_COLUMNS;

use super::error::{Result, ServerError};
use super::state::AppState;

/// Predict the crop for one set of measurements
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let features = parse_features(&body)?;

    let crop = state.predictor.predict(&features)?;
    debug!(
        temperature = features.temperature,
        humidity = features.humidity,
        ph = features.ph,
        rainfall = features.rainfall,
        crop = %crop,
        "Prediction served"
    );

    Ok(Json(json!({ "crop": crop })))
}

/// Liveness probe, independent of model state
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Validate a request body into feature values.
///
/// Every field must be present and non-null. Numbers are taken as is and
/// numeric strings are parsed; anything else is rejected by name.
pub fn parse_features(body: &Value) -> Result<CropFeatures> {
    let object = body
        .as_object()
        .ok_or_else(|| ServerError::BadRequest("Request body must be a JSON object".to_string()))?;

    let mut values = [0.0; 4];
    for (slot, name) in values.iter_mut().zip(FEATURE_COLUMNS) {
        *slot = field_value(object, name)?;
    }

    Ok(CropFeatures::from_vector(values))
}

fn field_value(object: &Map<String, Value>, name: &str) -> Result<f64> {
    let value = match object.get(name) {
        None | Some(Value::Null) => {
            return Err(ServerError::BadRequest(format!("Missing field '{}'", name)))
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ServerError::BadRequest(format!(
            "Field '{}' must be a finite number",
            name
        ))),
    }
}
