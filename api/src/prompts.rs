//! System instructions and user prompts for both oracle operations. The
//! category bands quoted to the model mirror the classifier thresholds in
//! `riskgate_core::risk`; the classifier, not the model's own label, decides
//! the final category.

use serde_json::{Map, Value};

pub const RISK_SYSTEM_INSTRUCTION: &str = "You are a financial risk assessment expert. \
    Based on changes in sender and receiver locations, changes in MAC address, risk of money \
    laundering, and transactions at odd hours, provide a risk score between 0 and 1. Classify \
    transactions as follows: 'Legitimate' (0 to 0.4), 'Suspicious' (0.41 to 0.7), and \
    'High Risk' (0.71 to 1). Just return the JSON with risk score and classification.";

pub const IDENTITY_SYSTEM_INSTRUCTION: &str = "You are an OCR expert specialized in extracting \
    Name and Date of Birth from government-issued identity documents. Return only the extracted \
    JSON data.";

/// User prompt for risk scoring: the transaction rendered as pretty JSON
/// plus the reply format the parser's strict phase expects.
pub fn risk_prompt(transaction: &Map<String, Value>) -> String {
    let details = serde_json::to_string_pretty(&Value::Object(transaction.clone()))
        .unwrap_or_else(|_| Value::Object(transaction.clone()).to_string());

    format!(
        "Analyze the following financial transaction and assess its risk level on a scale of 0 to 1.\n\
         \n\
         Transaction Details:\n\
         {details}\n\
         \n\
         Response format: {{\"risk_score\": <score>, \"type\": \"<classification>\"}}"
    )
}

/// User prompt for identity extraction. The image itself travels as a
/// request attachment, not inside the prompt text.
pub fn identity_prompt() -> String {
    "Perform OCR on the given image of a government ID card and extract the following details:\n\
     - Full Name\n\
     - Date of Birth (DOB)\n\
     \n\
     Response format: {\"name\": \"<full_name>\", \"dob\": \"<YYYY-MM-DD>\"}"
        .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::risk_prompt;

    #[test]
    fn risk_prompt_embeds_transaction_fields() {
        let mut transaction = Map::new();
        transaction.insert("Transaction_ID".to_string(), json!("tx-42"));
        transaction.insert("amount".to_string(), json!(1250.0));

        let prompt = risk_prompt(&transaction);
        assert!(prompt.contains("tx-42"));
        assert!(prompt.contains("amount"));
        assert!(prompt.contains(r#"{"risk_score": <score>, "type": "<classification>"}"#));
    }

    #[test]
    fn risk_prompt_handles_empty_transaction() {
        let prompt = risk_prompt(&Map::new());
        assert!(prompt.contains("Transaction Details:"));
    }

    #[test]
    fn identity_prompt_names_both_fields() {
        let prompt = super::identity_prompt();
        assert!(prompt.contains("Full Name"));
        assert!(prompt.contains("Date of Birth"));
        let _: Value = serde_json::from_str(r#"{"name": "<full_name>", "dob": "<YYYY-MM-DD>"}"#)
            .expect("advertised format is itself valid JSON");
    }
}
