use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::backend::GenerationBackend;
use crate::cache::ArtifactCache;
use crate::config::AppConfig;
use crate::fingerprint::{fingerprint, CHAPTER_PREFIX_CHARS, SEGMENT_PREFIX_CHARS};
use crate::models::{BookInfo, CacheKey, GenerationOutcome, Group};
use crate::prompts;
use crate::segment;
use crate::validator::is_valid_response;

/// Produces cached teaser/summary artifacts for books and chapters.
///
/// Nothing here returns an error. Single-shot getters answer with the
/// generated text, a sentinel for actionable backend failures (timeout,
/// sign-in, missing backend), or `""` for everything else. The segment
/// fan-out omits any group that did not produce accepted text.
#[derive(Clone)]
pub struct Annotator {
    config: AppConfig,
    cache: ArtifactCache,
    backend: Arc<dyn GenerationBackend>,
    generation_limit: Arc<Semaphore>,
}

impl Annotator {
    pub fn new(config: AppConfig, cache: ArtifactCache, backend: Arc<dyn GenerationBackend>) -> Self {
        let permits = config.backend.max_concurrent.max(1);
        Self {
            config,
            cache,
            backend,
            generation_limit: Arc::new(Semaphore::new(permits)),
        }
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// The cache is consulted before the content gate, so a summary generated
    /// earlier is still served when no sample text is at hand.
    pub async fn book_summary(&self, book: &BookInfo, first_chapter_clean: &str) -> String {
        let key = CacheKey::book_summary(&book.id);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "book summary cache hit");
            return cached;
        }

        if first_chapter_clean.trim().is_empty() {
            return String::new();
        }

        let prompt = prompts::book_summary_prompt(book, first_chapter_clean);
        present(self.generate_cached(&key, &prompt).await)
    }

    pub async fn chapter_prehook(
        &self,
        book: &BookInfo,
        chapter_clean: &str,
        book_summary: &str,
    ) -> String {
        if chapter_clean.trim().is_empty() {
            return String::new();
        }

        let key = CacheKey::chapter_prehook(
            &book.id,
            &fingerprint(chapter_clean, CHAPTER_PREFIX_CHARS),
        );
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "chapter pre-hook cache hit");
            return cached;
        }

        let prompt = prompts::chapter_prehook_prompt(book, chapter_clean, book_summary);
        present(self.generate_cached(&key, &prompt).await)
    }

    pub async fn chapter_conclusion(
        &self,
        book: &BookInfo,
        chapter_clean: &str,
        book_summary: &str,
    ) -> String {
        if chapter_clean.trim().is_empty() {
            return String::new();
        }

        let key = CacheKey::chapter_conclusion(
            &book.id,
            &fingerprint(chapter_clean, CHAPTER_PREFIX_CHARS),
        );
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "chapter conclusion cache hit");
            return cached;
        }

        let prompt = prompts::chapter_conclusion_prompt(book, chapter_clean, book_summary);
        present(self.generate_cached(&key, &prompt).await)
    }

    /// Teasers for every segment of `content`, keyed by group index.
    ///
    /// All groups are requested concurrently and joined before returning.
    /// Indices whose generation failed or was rejected are simply absent.
    pub async fn segment_annotations(&self, content: &str, book: &BookInfo) -> BTreeMap<usize, String> {
        let started = Instant::now();
        let groups = segment::split(
            content,
            self.config.segments.min_group_chars,
            self.config.segments.max_groups,
        );
        if groups.is_empty() {
            return BTreeMap::new();
        }

        let group_count = groups.len();
        let results = join_all(groups.iter().map(|group| self.annotate_group(group, book))).await;

        let annotations: BTreeMap<usize, String> = results
            .into_iter()
            .filter_map(|(index, text)| text.map(|text| (index, text)))
            .collect();

        tracing::info!(
            groups = group_count,
            annotated = annotations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "segment annotations complete"
        );
        annotations
    }

    async fn annotate_group(&self, group: &Group, book: &BookInfo) -> (usize, Option<String>) {
        let clean = group.clean_text.as_str();
        if clean.is_empty() || clean.chars().count() < self.config.segments.annotation_min_chars {
            return (group.index, None);
        }

        let key = CacheKey::segment_teaser(&fingerprint(clean, SEGMENT_PREFIX_CHARS));
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(key = %key, index = group.index, "segment teaser cache hit");
            return (group.index, Some(cached));
        }

        let prompt = prompts::segment_teaser_prompt(book, clean);
        match self.generate_cached(&key, &prompt).await {
            GenerationOutcome::Success(text) => (group.index, Some(text)),
            outcome => {
                tracing::debug!(index = group.index, outcome = outcome.as_str(), "segment left without teaser");
                (group.index, None)
            }
        }
    }

    /// Calls the backend, gates the response, and caches accepted text.
    ///
    /// Only a validated `Success` is ever written to the cache.
    async fn generate_cached(&self, key: &CacheKey, prompt: &str) -> GenerationOutcome {
        let outcome = {
            let _permit = match self.generation_limit.acquire().await {
                Ok(permit) => permit,
                Err(_) => return GenerationOutcome::GenericFailure,
            };
            self.backend
                .generate(prompt, self.config.backend.timeout)
                .await
        };

        match outcome {
            GenerationOutcome::Success(text) if is_valid_response(&text) => {
                self.cache.put(key, &text).await;
                GenerationOutcome::Success(text)
            }
            GenerationOutcome::Success(_) => {
                tracing::debug!(key = %key, "backend response rejected by validator");
                GenerationOutcome::RejectedByValidator
            }
            other => other,
        }
    }
}

fn present(outcome: GenerationOutcome) -> String {
    match outcome {
        GenerationOutcome::Success(text) => text,
        other => other.sentinel().unwrap_or_default().to_string(),
    }
}
