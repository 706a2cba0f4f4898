//! Locator extraction from provider output.
//!
//! Providers disagree about response shape, so extraction is an explicit
//! ordered chain rather than one speculative accessor: a bare locator passes
//! through, an array yields its first element, a buffered stream payload is
//! decoded (JSON first, bare URL otherwise), and a structured body is probed
//! for the fields in [`PROBE_FIELDS`], in that order, descending into array
//! heads and nested objects. The first strategy that produces a non-empty
//! string wins; if none does, the attempt counts as a provider failure and
//! the orchestrator falls back.

use serde_json::Value;

use crate::provider::ProviderOutput;

/// Field names probed on structured output, in priority order.
pub const PROBE_FIELDS: [&str; 5] = ["url", "image", "output", "result", "images"];

/// How deep the structured probe descends (object -> array -> object).
const MAX_PROBE_DEPTH: usize = 3;

/// Errors from locator extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// The provider returned an empty result.
    #[error("provider output is empty")]
    Empty,

    /// No probed strategy produced a locator.
    #[error("no locator found in provider output")]
    NoLocator,

    /// A stream payload was not decodable text.
    #[error("stream payload is not decodable: {0}")]
    Undecodable(String),
}

/// Extract the canonical result locator from raw provider output.
///
/// # Errors
///
/// Returns an [`ExtractError`] when every strategy comes up empty; the
/// caller treats that as the provider attempt failing.
pub fn extract_locator(output: ProviderOutput) -> Result<String, ExtractError> {
    match output {
        ProviderOutput::Locator(url) => non_empty(url),
        ProviderOutput::Locators(urls) => match urls.into_iter().next() {
            Some(first) => non_empty(first),
            None => Err(ExtractError::Empty),
        },
        ProviderOutput::Raw(bytes) => decode_raw(&bytes),
        ProviderOutput::Structured(value) => {
            probe_value(&value, 0).ok_or(ExtractError::NoLocator)
        }
    }
}

fn non_empty(url: String) -> Result<String, ExtractError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        Err(ExtractError::Empty)
    } else if trimmed.len() == url.len() {
        Ok(url)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Decode a buffered stream payload: JSON if it parses, bare URL text otherwise.
fn decode_raw(bytes: &[u8]) -> Result<String, ExtractError> {
    let text =
        std::str::from_utf8(bytes).map_err(|e| ExtractError::Undecodable(e.to_string()))?;

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return probe_value(&value, 0).ok_or(ExtractError::NoLocator);
    }

    non_empty(text.to_string())
}

/// Walk a JSON value looking for the first plausible locator.
///
/// Strings win outright, arrays delegate to their first element, and objects
/// try `PROBE_FIELDS` in order. Depth is bounded so a pathological payload
/// cannot recurse away.
fn probe_value(value: &Value, depth: usize) -> Option<String> {
    if depth > MAX_PROBE_DEPTH {
        return None;
    }

    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => items.first().and_then(|item| probe_value(item, depth + 1)),
        Value::Object(map) => PROBE_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(|v| probe_value(v, depth + 1))),
        _ => None,
    }
}
