//! Turns untrusted model output into a [`ValidatedAnalysis`].
//!
//! The model is asked for strict JSON but regularly wraps it in prose or
//! markdown fences. Parsing goes:
//!
//! 1. the whole text as a JSON object;
//! 2. failing that, the slice from the first `{` to the last `}`;
//! 3. field-by-field checks against the allow-list, with defaults for
//!    absent keys and hard failures for wrong types.
//!
//! Nothing is decoded through derived `Deserialize` on the strict type, so
//! extra keys never leak through and missing keys never fail the parse.

use dreammap_core::{DreamError, Motif, Result, Sentiment, ValidatedAnalysis};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const SUMMARY: &str = "summary";
const MOTIFS: &str = "motifs";
const PERSONAL_INTERPRETATION: &str = "personalInterpretation";
const WHAT_TO_DO_NEXT: &str = "whatToDoNext";
const SENTIMENT: &str = "sentiment";

pub struct ResponseValidator;

impl ResponseValidator {
    pub fn validate(raw: &str) -> Result<ValidatedAnalysis> {
        let object = Self::parse_object(raw)?;

        Ok(ValidatedAnalysis {
            summary: Self::string_field(&object, SUMMARY, raw)?,
            motifs: Self::motifs_field(&object, raw)?,
            personal_interpretation: Self::string_field(&object, PERSONAL_INTERPRETATION, raw)?,
            what_to_do_next: Self::string_list_field(&object, WHAT_TO_DO_NEXT, raw)?,
            sentiment: Self::sentiment_field(&object, raw)?,
        })
    }

    /// Direct parse, then salvage. Only a JSON object is accepted.
    fn parse_object(raw: &str) -> Result<Map<String, Value>> {
        if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(raw) {
            return Ok(object);
        }

        let salvaged = Self::salvage(raw)
            .ok_or_else(|| DreamError::malformed("no JSON object found in model output", raw))?;

        debug!("Direct parse failed; retrying on embedded object");
        match serde_json::from_str::<Value>(salvaged) {
            Ok(Value::Object(object)) => Ok(object),
            Ok(_) => Err(DreamError::malformed("model output is not a JSON object", raw)),
            Err(e) => Err(DreamError::malformed(
                format!("embedded JSON could not be parsed: {}", e),
                raw,
            )),
        }
    }

    /// Slice from the first `{` to the last `}` inclusive.
    pub fn salvage(raw: &str) -> Option<&str> {
        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        if end > start {
            Some(&raw[start..=end])
        } else {
            None
        }
    }

    /// `null` is treated the same as an absent key.
    fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
        object.get(key).filter(|v| !v.is_null())
    }

    fn string_field(object: &Map<String, Value>, key: &str, raw: &str) -> Result<String> {
        match Self::present(object, key) {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(DreamError::malformed(
                format!("`{}` must be a string, got {}", key, type_name(other)),
                raw,
            )),
        }
    }

    fn array_field<'a>(
        object: &'a Map<String, Value>,
        key: &str,
        raw: &str,
    ) -> Result<&'a [Value]> {
        match Self::present(object, key) {
            None => Ok(&[] as &[Value]),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(other) => Err(DreamError::malformed(
                format!("`{}` must be an array, got {}", key, type_name(other)),
                raw,
            )),
        }
    }

    fn motifs_field(object: &Map<String, Value>, raw: &str) -> Result<Vec<Motif>> {
        Self::array_field(object, MOTIFS, raw)?
            .iter()
            .enumerate()
            .map(|(index, item)| -> Result<Motif> {
                let entry = item.as_object().ok_or_else(|| {
                    DreamError::malformed(
                        format!("motifs[{}] must be an object, got {}", index, type_name(item)),
                        raw,
                    )
                })?;
                let text = |key: &str| match entry.get(key) {
                    Some(Value::String(s)) => Ok(s.clone()),
                    other => Err(DreamError::malformed(
                        format!(
                            "motifs[{}].{} must be a string, got {}",
                            index,
                            key,
                            other.map(type_name).unwrap_or("nothing")
                        ),
                        raw,
                    )),
                };
                Ok(Motif {
                    symbol: text("symbol")?,
                    meaning: text("meaning")?,
                })
            })
            .collect()
    }

    fn string_list_field(object: &Map<String, Value>, key: &str, raw: &str) -> Result<Vec<String>> {
        Self::array_field(object, key, raw)?
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(DreamError::malformed(
                    format!("{}[{}] must be a string, got {}", key, index, type_name(other)),
                    raw,
                )),
            })
            .collect()
    }

    fn sentiment_field(object: &Map<String, Value>, raw: &str) -> Result<Option<Sentiment>> {
        match Self::present(object, SENTIMENT) {
            None => Ok(None),
            Some(Value::String(label)) => {
                let sentiment = Sentiment::from_label(label);
                if !sentiment.is_known() {
                    warn!(sentiment = %label, "Model returned a sentiment outside the known set");
                }
                Ok(Some(sentiment))
            }
            Some(other) => Err(DreamError::malformed(
                format!("`sentiment` must be a string, got {}", type_name(other)),
                raw,
            )),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
