use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{default_cache_dir, ArtifactCache};

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub executable: String,
    pub timeout: Duration,
    pub max_concurrent: usize,
}

#[derive(Clone, Debug)]
pub struct SegmentConfig {
    pub min_group_chars: usize,
    pub max_groups: usize,
    /// Groups whose clean text is shorter than this are never sent to the backend.
    pub annotation_min_chars: usize,
    /// Chapter text shorter than this is treated as empty by the artifact getters.
    pub chapter_min_chars: usize,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cache_dir: PathBuf,
    pub backend: BackendConfig,
    pub segments: SegmentConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let cache_dir = env::var("BOOKHOOKS_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_cache_dir());

        let max_groups = parse_var("SEGMENT_MAX_GROUPS").unwrap_or(10);

        Self {
            cache_dir,
            backend: BackendConfig {
                executable: env::var("BOOKHOOKS_BACKEND").unwrap_or_else(|_| "claude".to_string()),
                timeout: Duration::from_secs(parse_var("BOOKHOOKS_TIMEOUT_SECS").unwrap_or(30)),
                max_concurrent: parse_var("MAX_CONCURRENT_GENERATIONS").unwrap_or(max_groups),
            },
            segments: SegmentConfig {
                min_group_chars: parse_var("SEGMENT_MIN_CHARS").unwrap_or(500),
                max_groups,
                annotation_min_chars: parse_var("SEGMENT_ANNOTATION_MIN_CHARS").unwrap_or(0),
                chapter_min_chars: parse_var("CHAPTER_MIN_TEXT_CHARS").unwrap_or(100),
            },
        }
    }

    /// The process-wide cache when pointed at the default location, otherwise
    /// a cache rooted at `cache_dir`.
    pub fn artifact_cache(&self) -> ArtifactCache {
        if self.cache_dir == default_cache_dir() {
            ArtifactCache::shared().clone()
        } else {
            ArtifactCache::new(self.cache_dir.clone())
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            backend: BackendConfig {
                executable: "claude".to_string(),
                timeout: Duration::from_secs(30),
                max_concurrent: 10,
            },
            segments: SegmentConfig {
                min_group_chars: 500,
                max_groups: 10,
                annotation_min_chars: 0,
                chapter_min_chars: 100,
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
