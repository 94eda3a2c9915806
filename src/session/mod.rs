//! One review round trip: extract, send, place.
//!
//! A [`ReviewSession`] holds the selected review mode and guarantees that at
//! most one review runs at a time. The page markup is parsed twice: once to
//! extract the diff and once, after the backend answers, to place the
//! suggestions. Parsed pages never live across an await point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use scraper::Html;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{ClientError, RelayClient};
use crate::extract;
use crate::models::suggestion::SeverityCounts;
use crate::models::{RawFileDiff, ReviewMode, Suggestion};
use crate::normalize;
use crate::placement::{self, PlacementReport};
use crate::providers::{ProviderError, ReviewProvider};

/// A failure reported by a review backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Relay(#[from] ClientError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors from a review run.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No code changes found to review")]
    NoChanges,

    #[error("A review is already in progress")]
    AlreadyInProgress,

    #[error("Review failed: {0}")]
    Upstream(#[from] BackendError),
}

/// Anything that can turn diff data into suggestions.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    async fn request_review(
        &self,
        diff_data: &[RawFileDiff],
        mode: ReviewMode,
    ) -> Result<Vec<Suggestion>, BackendError>;
}

#[async_trait]
impl ReviewBackend for RelayClient {
    async fn request_review(
        &self,
        diff_data: &[RawFileDiff],
        mode: ReviewMode,
    ) -> Result<Vec<Suggestion>, BackendError> {
        Ok(self.review(diff_data, mode).await?)
    }
}

/// Calls a provider in-process, skipping the relay.
pub struct DirectBackend {
    provider: Arc<dyn ReviewProvider>,
}

impl DirectBackend {
    pub fn new(provider: Arc<dyn ReviewProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ReviewBackend for DirectBackend {
    async fn request_review(
        &self,
        diff_data: &[RawFileDiff],
        mode: ReviewMode,
    ) -> Result<Vec<Suggestion>, BackendError> {
        let context = normalize::normalize(diff_data);
        Ok(self.provider.review(mode, &context).await?)
    }
}

/// Progress milestones of a review run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Extracting,
    Sending { files: usize },
    Placing { suggestions: usize },
}

/// Result of a completed review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub mode: ReviewMode,
    pub files_reviewed: usize,
    pub severity_counts: SeverityCounts,
    pub placements: PlacementReport,
}

impl ReviewOutcome {
    /// Outcome for suggestions obtained elsewhere and placed on `html`.
    pub fn from_placement(mode: ReviewMode, html: &Html, suggestions: &[Suggestion]) -> Self {
        Self {
            mode,
            files_reviewed: extract::extract_document(html).files.len(),
            severity_counts: SeverityCounts::from_suggestions(suggestions),
            placements: placement::place_all(html, suggestions),
        }
    }

    /// e.g. "Successfully placed 3 of 4 comments".
    pub fn summary_line(&self) -> String {
        let summary = &self.placements.summary;
        format!(
            "Successfully placed {} of {} comments",
            summary.placed(),
            summary.total
        )
    }
}

/// Clears the in-progress flag when dropped, on every exit path.
pub struct InProgressGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Per-page review state: the selected mode and the in-progress flag.
#[derive(Debug, Default)]
pub struct ReviewSession {
    in_progress: AtomicBool,
    mode: RwLock<ReviewMode>,
}

impl ReviewSession {
    pub fn new(mode: ReviewMode) -> Self {
        Self {
            in_progress: AtomicBool::new(false),
            mode: RwLock::new(mode),
        }
    }

    pub fn mode(&self) -> ReviewMode {
        self.mode.read().map(|m| *m).unwrap_or_default()
    }

    pub fn set_mode(&self, mode: ReviewMode) {
        if let Ok(mut current) = self.mode.write() {
            *current = mode;
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Claim the session, or fail if another review holds it.
    pub fn try_begin(&self) -> Result<InProgressGuard<'_>, SessionError> {
        self.in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SessionError::AlreadyInProgress)?;
        Ok(InProgressGuard {
            flag: &self.in_progress,
        })
    }

    /// Run a review of `source` against `backend`.
    pub async fn run(
        &self,
        source: &str,
        backend: &dyn ReviewBackend,
    ) -> Result<ReviewOutcome, SessionError> {
        self.run_with_status(source, backend, &|_| {}).await
    }

    /// Like [`run`](Self::run), reporting milestones to `on_status`.
    pub async fn run_with_status(
        &self,
        source: &str,
        backend: &dyn ReviewBackend,
        on_status: &(dyn Fn(ReviewStatus) + Send + Sync),
    ) -> Result<ReviewOutcome, SessionError> {
        let _guard = self.try_begin()?;
        let mode = self.mode();

        on_status(ReviewStatus::Extracting);
        let document = extract::extract_from_str(source);
        if document.is_empty() {
            warn!("no code changes found on page");
            return Err(SessionError::NoChanges);
        }
        let diff_data = document.to_wire();
        let files_reviewed = diff_data.len();

        on_status(ReviewStatus::Sending {
            files: files_reviewed,
        });
        info!(files = files_reviewed, %mode, "sending diff for review");
        let suggestions = backend.request_review(&diff_data, mode).await?;

        on_status(ReviewStatus::Placing {
            suggestions: suggestions.len(),
        });
        let html = Html::parse_document(source);
        let placements = placement::place_all(&html, &suggestions);
        info!(
            placed = placements.summary.placed(),
            total = placements.summary.total,
            "suggestions placed"
        );

        Ok(ReviewOutcome {
            mode,
            files_reviewed,
            severity_counts: SeverityCounts::from_suggestions(&suggestions),
            placements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_clears_flag_on_drop() {
        let session = ReviewSession::default();
        {
            let _guard = session.try_begin().unwrap();
            assert!(session.is_in_progress());
            assert!(matches!(
                session.try_begin(),
                Err(SessionError::AlreadyInProgress)
            ));
        }
        assert!(!session.is_in_progress());
        assert!(session.try_begin().is_ok());
    }

    #[test]
    fn mode_can_be_changed() {
        let session = ReviewSession::new(ReviewMode::Security);
        assert_eq!(session.mode(), ReviewMode::Security);
        session.set_mode(ReviewMode::Optimization);
        assert_eq!(session.mode(), ReviewMode::Optimization);
    }
}
