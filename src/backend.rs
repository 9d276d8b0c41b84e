use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::models::GenerationOutcome;

const AUTH_ERROR_TERMS: &[&str] = &["auth", "unauthorized", "signed in", "sign in"];

/// A text-completion backend invoked once per prompt.
///
/// Implementations never return errors: every failure mode is folded into a
/// [`GenerationOutcome`] variant.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, prompt: &str, timeout: Duration) -> GenerationOutcome;
}

/// Runs `<executable> -p <prompt>` as a child process.
#[derive(Clone, Debug)]
pub struct CliBackend {
    executable: String,
}

impl CliBackend {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }
}

#[async_trait]
impl GenerationBackend for CliBackend {
    async fn generate(&self, prompt: &str, timeout: Duration) -> GenerationOutcome {
        let child = Command::new(&self.executable)
            .arg("-p")
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::warn!(executable = %self.executable, "generation backend not found");
                return GenerationOutcome::BackendUnavailable;
            }
            Err(err) => {
                tracing::warn!(executable = %self.executable, error = %err, "failed to spawn generation backend");
                return GenerationOutcome::GenericFailure;
            }
        };

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "generation backend i/o failed");
                return GenerationOutcome::GenericFailure;
            }
            Err(_) => {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "generation backend timed out");
                return GenerationOutcome::Timeout;
            }
        };

        if output.status.success() {
            return GenerationOutcome::Success(
                String::from_utf8_lossy(&output.stdout).trim().to_string(),
            );
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_auth_error(&stderr) {
            tracing::warn!("generation backend requires sign-in");
            return GenerationOutcome::AuthRequired;
        }

        tracing::debug!(
            status = ?output.status.code(),
            stderr = %truncate_for_log(stderr.trim(), 200),
            "generation backend exited with failure"
        );
        GenerationOutcome::GenericFailure
    }
}

fn is_auth_error(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    AUTH_ERROR_TERMS.iter().any(|term| lower.contains(term))
}

fn truncate_for_log(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
