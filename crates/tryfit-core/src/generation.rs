//! Generation history records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Category, GenerationId, UserId};

/// A completed try-on generation, persisted for the user's history view.
///
/// Records are written only for successful generations, after the debit
/// committed, and are never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Unique record ID (ULID for time-ordering).
    pub id: GenerationId,

    /// The account the generation was billed to.
    pub account_id: UserId,

    /// Name of the provider that served the request.
    pub provider: String,

    /// Garment category of the request.
    pub category: Category,

    /// Locator (URL) of the generated image.
    pub result_url: String,

    /// Whether a lower-ranked provider served the request after the
    /// preferred one failed.
    pub fallback: bool,

    /// Wall-clock processing time in milliseconds.
    pub elapsed_ms: u64,

    /// When the generation completed.
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    /// Create a record for a generation that just completed.
    #[must_use]
    pub fn new(
        account_id: UserId,
        provider: String,
        category: Category,
        result_url: String,
        fallback: bool,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            id: GenerationId::generate(),
            account_id,
            provider,
            category,
            result_url,
            fallback,
            elapsed_ms,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serde_roundtrip() {
        let record = GenerationRecord::new(
            UserId::generate(),
            "replicate".into(),
            Category::Dresses,
            "https://cdn.example.com/out.png".into(),
            true,
            1200,
        );
        let json = serde_json::to_string(&record).unwrap();
        let parsed: GenerationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, record.id);
        assert_eq!(parsed.category, Category::Dresses);
        assert!(parsed.fallback);
    }
}
