//! Two-phase parsing of oracle replies.
//!
//! The oracle's output is not contractually well-formed: sometimes it is a
//! clean JSON object, sometimes the object is wrapped in prose or Markdown
//! fences, sometimes only fragments of it survive. Phase 1 decodes the reply
//! strictly; phase 2 falls back to per-field pattern extraction over the raw
//! text. Every reply maps to exactly one [`ParseOutcome`]: this module never
//! panics and never returns an `Err`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Matches one labeled key-value occurrence: `"key": "text"` or `"key": 1.23`.
/// Works on arbitrary text, independent of surrounding JSON validity.
static KEY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([A-Za-z_][A-Za-z0-9_]*)"\s*:\s*(?:"([^"]*)"|(-?[0-9]+(?:\.[0-9]+)?))"#)
        .expect("valid key-value regex")
});

/// Expected type of a required field in an oracle reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Number,
    Text,
}

/// One required field of a reply schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldType,
}

/// A value recovered from an oracle reply.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

/// Fields recovered from a reply, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields(BTreeMap<String, FieldValue>);

impl ExtractedFields {
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.0.get(name) {
            Some(FieldValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    fn insert(&mut self, name: &str, value: FieldValue) {
        self.0.insert(name.to_string(), value);
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of interpreting one oracle reply against a schema.
/// Created per call, consumed immediately, never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Every required field was recovered with the expected type.
    Success(ExtractedFields),
    /// Some required fields were recovered, the named ones were not.
    PartialFailure {
        fields: ExtractedFields,
        missing: Vec<String>,
    },
    /// Nothing was recovered. The raw reply is kept as a diagnostic for
    /// server-side logs; it never reaches a client response.
    Failure { raw: String },
}

/// Interpret `raw` against `schema`.
///
/// Phase 1 strips Markdown fences and surrounding prose, then decodes the
/// remaining `{...}` span as JSON and type-checks every required field.
/// Phase 2 searches the raw text per field for a `"name": value` occurrence
/// (first match wins). Deterministic: identical input yields an identical
/// outcome.
pub fn parse_reply(raw: &str, schema: &[FieldSpec]) -> ParseOutcome {
    if let Some(fields) = strict_decode(raw, schema) {
        return ParseOutcome::Success(fields);
    }

    let fields = tolerant_extract(raw, schema);
    let missing: Vec<String> = schema
        .iter()
        .filter(|spec| match spec.kind {
            FieldType::Number => fields.number(spec.name).is_none(),
            FieldType::Text => fields.text(spec.name).is_none(),
        })
        .map(|spec| spec.name.to_string())
        .collect();

    if missing.is_empty() {
        ParseOutcome::Success(fields)
    } else if !fields.is_empty() {
        ParseOutcome::PartialFailure { fields, missing }
    } else {
        ParseOutcome::Failure {
            raw: raw.to_string(),
        }
    }
}

/// Phase 1: strict decode. Returns `Some` only if the reply contains a JSON
/// object carrying every required field with the expected type.
fn strict_decode(raw: &str, schema: &[FieldSpec]) -> Option<ExtractedFields> {
    let candidate = isolate_object(raw)?;
    let value: Value = serde_json::from_str(candidate).ok()?;
    let object = value.as_object()?;

    let mut fields = ExtractedFields::default();
    for spec in schema {
        match (spec.kind, object.get(spec.name)) {
            (FieldType::Number, Some(Value::Number(n))) => {
                fields.insert(spec.name, FieldValue::Number(n.as_f64()?));
            }
            (FieldType::Text, Some(Value::String(s))) => {
                fields.insert(spec.name, FieldValue::Text(s.clone()));
            }
            _ => return None,
        }
    }
    Some(fields)
}

/// Cut the outermost `{...}` span out of a reply that may wrap it in prose
/// or Markdown code fences. Returns `None` when no object span exists.
fn isolate_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Phase 2: per-field pattern extraction, first match wins. A quoted value
/// satisfies a Text field; a bare number satisfies a Number field. A quoted
/// numeric literal also satisfies a Number field (models quote numbers).
fn tolerant_extract(raw: &str, schema: &[FieldSpec]) -> ExtractedFields {
    let mut fields = ExtractedFields::default();

    for caps in KEY_VALUE_RE.captures_iter(raw) {
        let key = &caps[1];
        let Some(spec) = schema.iter().find(|spec| spec.name == key) else {
            continue;
        };
        let already_matched = match spec.kind {
            FieldType::Number => fields.number(spec.name).is_some(),
            FieldType::Text => fields.text(spec.name).is_some(),
        };
        if already_matched {
            continue;
        }

        match spec.kind {
            FieldType::Number => {
                let literal = caps.get(3).or_else(|| caps.get(2));
                if let Some(n) = literal.and_then(|m| m.as_str().parse::<f64>().ok()) {
                    fields.insert(spec.name, FieldValue::Number(n));
                }
            }
            FieldType::Text => {
                if let Some(m) = caps.get(2) {
                    fields.insert(spec.name, FieldValue::Text(m.as_str().to_string()));
                }
            }
        }
    }

    fields
}
