use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use riskgate_core::identity::IdentityRecord;

use crate::error::AppError;
use crate::services::IdentityExtractionService;
use crate::state::AppState;

const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/jpeg";

pub fn router() -> Router<AppState> {
    Router::new().route("/extract_id", post(extract_id))
}

/// Either the extracted identity fields or a structured error payload.
/// Extraction failures are a first-class outcome and ship with status 200;
/// only a missing image is a client error.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum ExtractIdResponse {
    Record(IdentityRecord),
    Error { error: String },
}

/// Extract name and date of birth from an identity document photo.
///
/// Expects a multipart form with one `image` field carrying the photo bytes.
#[utoipa::path(
    post,
    path = "/extract_id",
    request_body(content = String, content_type = "multipart/form-data",
        description = "Form with one 'image' field carrying the document photo"),
    responses(
        (status = 200, description = "Extracted identity fields, or a structured extraction error", body = ExtractIdResponse),
        (status = 400, description = "No image field in the form", body = riskgate_core::error::ApiError)
    ),
    tag = "identity"
)]
pub async fn extract_id(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractIdResponse>, AppError> {
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        AppError::Validation {
            message: format!("Invalid multipart form: {err}"),
            field: Some("image".to_string()),
            received: None,
            docs_hint: None,
        }
    })? {
        if field.name() != Some("image") {
            continue;
        }
        let media_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_IMAGE_MEDIA_TYPE.to_string());
        let bytes = field.bytes().await.map_err(|err| AppError::Validation {
            message: format!("Could not read image field: {err}"),
            field: Some("image".to_string()),
            received: None,
            docs_hint: None,
        })?;
        image = Some((bytes.to_vec(), media_type));
        break;
    }

    let Some((bytes, media_type)) = image.filter(|(bytes, _)| !bytes.is_empty()) else {
        return Err(AppError::Validation {
            message: "No image file provided".to_string(),
            field: Some("image".to_string()),
            received: None,
            docs_hint: Some(
                "Send a multipart form with one non-empty 'image' field.".to_string(),
            ),
        });
    };

    let result = IdentityExtractionService::new(state.oracle.clone())
        .extract(&bytes, &media_type)
        .await;

    Ok(Json(match result {
        Ok(record) => ExtractIdResponse::Record(record),
        Err(err) => ExtractIdResponse::Error {
            error: err.to_string(),
        },
    }))
}
