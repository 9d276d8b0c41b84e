use serde::{Deserialize, Serialize};

pub const TIMEOUT_MESSAGE: &str = "Request timeout - try again later";
pub const AUTH_REQUIRED_MESSAGE: &str = "Sign in to the generation backend to enable this feature";
pub const BACKEND_NOT_FOUND_MESSAGE: &str = "Generation backend not found";

/// Read-only book context shared by every prompt built for one book.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookInfo {
    pub id: String,
    pub title: String,
    pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    BookSummary,
    ChapterPrehook,
    ChapterConclusion,
    SegmentTeaser,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::BookSummary => "summary",
            ArtifactKind::ChapterPrehook => "prephrase",
            ArtifactKind::ChapterConclusion => "conclusion",
            ArtifactKind::SegmentTeaser => "para_summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn book_summary(book_id: &str) -> Self {
        Self(format!("{}_{}", book_id, ArtifactKind::BookSummary.as_str()))
    }

    pub fn chapter_prehook(book_id: &str, fingerprint: &str) -> Self {
        Self(format!(
            "{}_{}_{}",
            book_id,
            ArtifactKind::ChapterPrehook.as_str(),
            fingerprint
        ))
    }

    pub fn chapter_conclusion(book_id: &str, fingerprint: &str) -> Self {
        Self(format!(
            "{}_{}_{}",
            book_id,
            ArtifactKind::ChapterConclusion.as_str(),
            fingerprint
        ))
    }

    /// Segment teasers are keyed on content alone so identical passages share
    /// a teaser across books.
    pub fn segment_teaser(fingerprint: &str) -> Self {
        Self(format!("{}_{}", ArtifactKind::SegmentTeaser.as_str(), fingerprint))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// On-disk shape of one cached artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub summary: String,
}

/// One contiguous slice of chapter markup, summarized independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub index: usize,
    pub raw: String,
    pub clean_text: String,
    pub clean_len: usize,
    pub paragraph_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(String),
    RejectedByValidator,
    BackendUnavailable,
    Timeout,
    AuthRequired,
    GenericFailure,
}

impl GenerationOutcome {
    /// User-facing placeholder for failures an interactive caller can act on.
    pub fn sentinel(&self) -> Option<&'static str> {
        match self {
            GenerationOutcome::BackendUnavailable => Some(BACKEND_NOT_FOUND_MESSAGE),
            GenerationOutcome::Timeout => Some(TIMEOUT_MESSAGE),
            GenerationOutcome::AuthRequired => Some(AUTH_REQUIRED_MESSAGE),
            GenerationOutcome::Success(_)
            | GenerationOutcome::RejectedByValidator
            | GenerationOutcome::GenericFailure => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationOutcome::Success(_) => "success",
            GenerationOutcome::RejectedByValidator => "rejected_by_validator",
            GenerationOutcome::BackendUnavailable => "backend_unavailable",
            GenerationOutcome::Timeout => "timeout",
            GenerationOutcome::AuthRequired => "auth_required",
            GenerationOutcome::GenericFailure => "generic_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_follow_namespace_layout() {
        assert_eq!(CacheKey::book_summary("b1").as_str(), "b1_summary");
        assert_eq!(
            CacheKey::chapter_prehook("b1", "abcd1234").as_str(),
            "b1_prephrase_abcd1234"
        );
        assert_eq!(
            CacheKey::chapter_conclusion("b1", "abcd1234").as_str(),
            "b1_conclusion_abcd1234"
        );
        assert_eq!(
            CacheKey::segment_teaser("abcd1234").as_str(),
            "para_summary_abcd1234"
        );
    }

    #[test]
    fn only_actionable_failures_carry_sentinels() {
        assert!(GenerationOutcome::Timeout.sentinel().is_some());
        assert!(GenerationOutcome::AuthRequired.sentinel().is_some());
        assert!(GenerationOutcome::BackendUnavailable.sentinel().is_some());
        assert!(GenerationOutcome::GenericFailure.sentinel().is_none());
        assert!(GenerationOutcome::RejectedByValidator.sentinel().is_none());
        assert!(GenerationOutcome::Success("x".into()).sentinel().is_none());
    }

    #[test]
    fn record_without_key_still_decodes() {
        let record: ArtifactRecord = serde_json::from_str(r#"{"summary": "hi"}"#).unwrap();
        assert_eq!(record.summary, "hi");
        assert!(record.key.is_none());
    }
}
