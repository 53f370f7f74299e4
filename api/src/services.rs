//! Orchestration for the two oracle-backed operations. Everything below the
//! HTTP boundary recovers into a typed result: a flaky oracle or a mangled
//! reply degrades to `Error`/`{error}` outcomes, never a 5xx. Diagnostics
//! (raw replies, missing fields) go to server-side logs only.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use riskgate_core::identity::{self, IdentityCandidate, IdentityError, IdentityRecord};
use riskgate_core::image;
use riskgate_core::parse::{FieldSpec, FieldType, ParseOutcome, parse_reply};
use riskgate_core::risk::{self, RiskAssessment};

use crate::oracle::{EncodedImage, OracleClient, OracleError, OracleRequest};
use crate::prompts;

/// Reply schema for risk scoring.
pub const RISK_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        name: "risk_score",
        kind: FieldType::Number,
    },
    FieldSpec {
        name: "type",
        kind: FieldType::Text,
    },
];

/// Reply schema for identity extraction.
pub const IDENTITY_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        kind: FieldType::Text,
    },
    FieldSpec {
        name: "dob",
        kind: FieldType::Text,
    },
];

/// Scores one transaction via the oracle. Best-effort: every failure mode
/// maps to `RiskAssessment::error()`.
#[derive(Clone)]
pub struct RiskAssessmentService {
    oracle: Arc<dyn OracleClient>,
}

impl RiskAssessmentService {
    pub fn new(oracle: Arc<dyn OracleClient>) -> Self {
        RiskAssessmentService { oracle }
    }

    pub async fn assess(&self, transaction: &Map<String, Value>) -> RiskAssessment {
        let request = OracleRequest {
            system: prompts::RISK_SYSTEM_INSTRUCTION.to_string(),
            user: prompts::risk_prompt(transaction),
            image: None,
        };

        let reply = match self.oracle.send(request).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(error = %err, "risk oracle call failed");
                return RiskAssessment::error();
            }
        };

        match parse_reply(&reply, RISK_SCHEMA) {
            ParseOutcome::Success(fields) => {
                // The model's own "type" label is advisory; the classifier
                // is the source of truth for the category.
                risk::classify(fields.number("risk_score"))
            }
            ParseOutcome::PartialFailure { missing, .. } => {
                tracing::warn!(missing = ?missing, "risk reply missing required fields");
                RiskAssessment::error()
            }
            ParseOutcome::Failure { raw } => {
                tracing::warn!(raw = %raw, "risk reply could not be parsed");
                RiskAssessment::error()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("identity oracle call failed")]
    Oracle(#[source] OracleError),
    #[error("could not read identity fields from the document")]
    Unreadable,
    #[error(transparent)]
    Invalid(#[from] IdentityError),
}

/// Extracts name and date of birth from a photographed identity document.
/// Failures come back as [`ExtractionError`] values for the route to fold
/// into an `{error}` payload, never a thrown fault.
#[derive(Clone)]
pub struct IdentityExtractionService {
    oracle: Arc<dyn OracleClient>,
}

impl IdentityExtractionService {
    pub fn new(oracle: Arc<dyn OracleClient>) -> Self {
        IdentityExtractionService { oracle }
    }

    pub async fn extract(
        &self,
        image_bytes: &[u8],
        media_type: &str,
    ) -> Result<IdentityRecord, ExtractionError> {
        let request = OracleRequest {
            system: prompts::IDENTITY_SYSTEM_INSTRUCTION.to_string(),
            user: prompts::identity_prompt(),
            image: Some(EncodedImage {
                media_type: media_type.to_string(),
                data: image::encode(image_bytes),
            }),
        };

        let reply = match self.oracle.send(request).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(error = %err, "identity oracle call failed");
                return Err(ExtractionError::Oracle(err));
            }
        };

        let candidate = match parse_reply(&reply, IDENTITY_SCHEMA) {
            ParseOutcome::Success(fields) | ParseOutcome::PartialFailure { fields, .. } => {
                // A partial reply still goes through validation so the error
                // names the field that is actually unusable.
                IdentityCandidate {
                    name: fields.text("name").map(str::to_string),
                    dob: fields.text("dob").map(str::to_string),
                }
            }
            ParseOutcome::Failure { raw } => {
                tracing::warn!(raw = %raw, "identity reply could not be parsed");
                return Err(ExtractionError::Unreadable);
            }
        };

        Ok(identity::validate(candidate)?)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Map, json};

    use riskgate_core::identity::IdentityError;
    use riskgate_core::risk::RiskCategory;

    use super::testing::ScriptedOracle;
    use super::{ExtractionError, IdentityExtractionService, RiskAssessmentService};

    fn transaction() -> Map<String, serde_json::Value> {
        let mut map = Map::new();
        map.insert("Transaction_ID".to_string(), json!("tx-1"));
        map.insert("amount".to_string(), json!(999.5));
        map
    }

    #[tokio::test]
    async fn well_formed_reply_is_classified() {
        let oracle = Arc::new(ScriptedOracle::replying(
            r#"{"risk_score": 0.85, "type": "High Risk"}"#,
        ));
        let service = RiskAssessmentService::new(oracle.clone());

        let assessment = service.assess(&transaction()).await;
        assert_eq!(assessment.score, Some(0.85));
        assert_eq!(assessment.category, RiskCategory::HighRisk);
        assert_eq!(oracle.call_count(), 1);
    }

    #[tokio::test]
    async fn fenced_reply_is_classified() {
        let oracle = Arc::new(ScriptedOracle::replying(
            "Here you go:\n```{\"risk_score\": 0.3, \"type\": \"Legitimate\"}```",
        ));
        let service = RiskAssessmentService::new(oracle);

        let assessment = service.assess(&transaction()).await;
        assert_eq!(assessment.score, Some(0.3));
        assert_eq!(assessment.category, RiskCategory::Legitimate);
    }

    #[tokio::test]
    async fn partial_reply_maps_to_error_category() {
        let oracle = Arc::new(ScriptedOracle::replying(r#""risk_score": 0.9"#));
        let service = RiskAssessmentService::new(oracle);

        let assessment = service.assess(&transaction()).await;
        assert_eq!(assessment.score, None);
        assert_eq!(assessment.category, RiskCategory::Error);
    }

    #[tokio::test]
    async fn unrelated_reply_maps_to_error_category() {
        let oracle = Arc::new(ScriptedOracle::replying("I cannot help with that."));
        let service = RiskAssessmentService::new(oracle);

        let assessment = service.assess(&transaction()).await;
        assert_eq!(assessment.category, RiskCategory::Error);
    }

    #[tokio::test]
    async fn oracle_failure_maps_to_error_category() {
        let oracle = Arc::new(ScriptedOracle::failing());
        let service = RiskAssessmentService::new(oracle);

        let assessment = service.assess(&transaction()).await;
        assert_eq!(assessment.score, None);
        assert_eq!(assessment.category, RiskCategory::Error);
    }

    #[tokio::test]
    async fn out_of_range_score_from_oracle_becomes_error() {
        let oracle = Arc::new(ScriptedOracle::replying(
            r#"{"risk_score": 3.5, "type": "High Risk"}"#,
        ));
        let service = RiskAssessmentService::new(oracle);

        let assessment = service.assess(&transaction()).await;
        assert_eq!(assessment.score, None);
        assert_eq!(assessment.category, RiskCategory::Error);
    }

    #[tokio::test]
    async fn extraction_happy_path_attaches_image() {
        let oracle = Arc::new(ScriptedOracle::replying(
            r#"{"name": "Jane Q. Public", "dob": "1990-01-02"}"#,
        ));
        let service = IdentityExtractionService::new(oracle.clone());

        let record = service
            .extract(b"fake image bytes", "image/jpeg")
            .await
            .expect("extraction should succeed");
        assert_eq!(record.name, "Jane Q. Public");
        assert_eq!(record.dob, "1990-01-02");
        assert_eq!(*oracle.last_had_image.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn invalid_dob_is_rejected_by_validator() {
        let oracle = Arc::new(ScriptedOracle::replying(
            r#"{"name": "Jane", "dob": "1990-13-40"}"#,
        ));
        let service = IdentityExtractionService::new(oracle);

        let err = service
            .extract(b"img", "image/png")
            .await
            .expect_err("impossible date must be rejected");
        assert!(matches!(
            err,
            ExtractionError::Invalid(IdentityError::InvalidDob(_))
        ));
    }

    #[tokio::test]
    async fn partial_identity_reply_names_missing_field() {
        let oracle = Arc::new(ScriptedOracle::replying(r#""name": "Jane""#));
        let service = IdentityExtractionService::new(oracle);

        let err = service.extract(b"img", "image/png").await.unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Invalid(IdentityError::MissingDob)
        ));
    }

    #[tokio::test]
    async fn unreadable_identity_reply_is_structured_error() {
        let oracle = Arc::new(ScriptedOracle::replying("no identity data here"));
        let service = IdentityExtractionService::new(oracle);

        let err = service.extract(b"img", "image/png").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Unreadable));
    }

    #[tokio::test]
    async fn oracle_failure_surfaces_as_extraction_error() {
        let oracle = Arc::new(ScriptedOracle::failing());
        let service = IdentityExtractionService::new(oracle);

        let err = service.extract(b"img", "image/png").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Oracle(_)));
    }
}
