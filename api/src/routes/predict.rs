use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::services::RiskAssessmentService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}

/// Risk assessment for one transaction. `risk_score` is a number in [0, 1]
/// or the string "N/A" when no score could be recovered.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PredictResponse {
    #[serde(rename = "Transaction_ID")]
    pub transaction_id: String,
    pub risk_score: Value,
    pub category: String,
}

/// Assess the fraud risk of a transaction.
///
/// The body is an open JSON object with any fields the caller has. The optional
/// `Transaction_ID` is only echoed back, never interpreted. Oracle and
/// parsing failures come back as `category: "Error"` with `risk_score:
/// "N/A"`; only a missing or malformed body is a client error.
#[utoipa::path(
    post,
    path = "/predict",
    request_body = Value,
    responses(
        (status = 200, description = "Risk assessment for the transaction", body = PredictResponse),
        (status = 400, description = "Missing or malformed transaction body", body = riskgate_core::error::ApiError)
    ),
    tag = "risk"
)]
pub async fn predict(
    State(state): State<AppState>,
    AppJson(body): AppJson<Value>,
) -> Result<Json<PredictResponse>, AppError> {
    let transaction = match body {
        Value::Object(map) if !map.is_empty() => map,
        Value::Object(_) => {
            return Err(AppError::Validation {
                message: "No transaction data provided".to_string(),
                field: Some("body".to_string()),
                received: None,
                docs_hint: Some(
                    "Send at least one transaction field, e.g. {\"amount\": 120.5}".to_string(),
                ),
            });
        }
        other => {
            return Err(AppError::Validation {
                message: "Transaction body must be a JSON object".to_string(),
                field: Some("body".to_string()),
                received: Some(other),
                docs_hint: None,
            });
        }
    };

    let transaction_id = transaction
        .get("Transaction_ID")
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "N/A".to_string());

    let assessment = RiskAssessmentService::new(state.oracle.clone())
        .assess(&transaction)
        .await;

    Ok(Json(PredictResponse {
        transaction_id,
        risk_score: assessment.score.map_or_else(|| json!("N/A"), |s| json!(s)),
        category: assessment.category.as_str().to_string(),
    }))
}
