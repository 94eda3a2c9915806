//! Review sessions driven by in-memory backends.

use std::sync::Mutex;

use async_trait::async_trait;
use diffscout::models::{RawFileDiff, ReviewMode, Severity, Suggestion};
use diffscout::placement::PlacementKind;
use diffscout::session::{BackendError, ReviewBackend, ReviewSession, ReviewStatus, SessionError};
use diffscout::providers::ProviderError;
use tokio::sync::Notify;

const PAGE: &str = r#"
<div class="file" data-path="a.js">
  <table class="diff-table"><tbody>
    <tr><td class="blob-num"></td><td class="blob-num"></td><td class="blob-code">@@ -1,2 +1,2 @@</td></tr>
    <tr><td class="blob-num" data-line-number="1"></td><td class="blob-num"></td><td class="blob-code blob-code-deletion">-console.log(0)</td></tr>
    <tr><td class="blob-num"></td><td class="blob-num" data-line-number="2"></td><td class="blob-code blob-code-addition">+console.log(1)</td></tr>
  </tbody></table>
</div>"#;

/// Returns a fixed reply and keeps the diff it was sent.
struct StaticBackend {
    reply: Result<Vec<Suggestion>, String>,
    received: Mutex<Option<(Vec<RawFileDiff>, ReviewMode)>>,
}

impl StaticBackend {
    fn ok(suggestions: Vec<Suggestion>) -> Self {
        Self {
            reply: Ok(suggestions),
            received: Mutex::new(None),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            received: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ReviewBackend for StaticBackend {
    async fn request_review(
        &self,
        diff_data: &[RawFileDiff],
        mode: ReviewMode,
    ) -> Result<Vec<Suggestion>, BackendError> {
        *self.received.lock().unwrap() = Some((diff_data.to_vec(), mode));
        match &self.reply {
            Ok(suggestions) => Ok(suggestions.clone()),
            Err(message) => Err(ProviderError::ApiError(message.clone()).into()),
        }
    }
}

/// Holds the review open until released.
struct GatedBackend {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl ReviewBackend for GatedBackend {
    async fn request_review(
        &self,
        _diff_data: &[RawFileDiff],
        _mode: ReviewMode,
    ) -> Result<Vec<Suggestion>, BackendError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Vec::new())
    }
}

fn console_log_warning() -> Suggestion {
    serde_json::from_str(
        r#"{"filePath":"a.js","lineNumber":2,"message":"Avoid console.log","severity":"warn"}"#,
    )
    .unwrap()
}

#[tokio::test]
async fn suggestion_is_placed_on_its_line() {
    let session = ReviewSession::new(ReviewMode::Security);
    let backend = StaticBackend::ok(vec![console_log_warning()]);

    let outcome = session.run(PAGE, &backend).await.unwrap();

    assert_eq!(outcome.mode, ReviewMode::Security);
    assert_eq!(outcome.files_reviewed, 1);
    assert_eq!(outcome.severity_counts.get(Severity::Warning), 1);

    let placed = &outcome.placements.outcomes[0];
    assert_eq!(placed.suggestion.severity, Severity::Warning);
    assert_eq!(placed.kind, Some(PlacementKind::Exact));
    assert!(placed.anchor.as_ref().unwrap().preview.contains("console.log(1)"));
    assert_eq!(outcome.summary_line(), "Successfully placed 1 of 1 comments");

    let (diff_data, mode) = backend.received.lock().unwrap().clone().unwrap();
    assert_eq!(mode, ReviewMode::Security);
    assert_eq!(diff_data[0].file_path, "a.js");
    assert_eq!(diff_data[0].diff_chunks.len(), 3);
}

#[tokio::test]
async fn page_without_changes_is_not_sent() {
    let session = ReviewSession::default();
    let backend = StaticBackend::ok(Vec::new());

    let err = session.run("<main>nothing here</main>", &backend).await.unwrap_err();
    assert!(matches!(err, SessionError::NoChanges));
    assert!(backend.received.lock().unwrap().is_none());
    assert!(!session.is_in_progress());
}

#[tokio::test]
async fn failure_clears_in_progress_flag() {
    let session = ReviewSession::default();
    let err = session
        .run(PAGE, &StaticBackend::failing("quota exceeded"))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Upstream(_)));
    assert!(err.to_string().contains("quota exceeded"));
    assert!(!session.is_in_progress());

    // A later run is accepted.
    assert!(session.run(PAGE, &StaticBackend::ok(Vec::new())).await.is_ok());
}

#[tokio::test]
async fn concurrent_review_is_rejected() {
    let session = ReviewSession::default();
    let gated = GatedBackend {
        entered: Notify::new(),
        release: Notify::new(),
    };

    let first = session.run(PAGE, &gated);
    let second = async {
        gated.entered.notified().await;
        let result = session.run(PAGE, &StaticBackend::ok(Vec::new())).await;
        gated.release.notify_one();
        result
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert!(matches!(second, Err(SessionError::AlreadyInProgress)));
    assert!(!session.is_in_progress());
}

#[tokio::test]
async fn status_milestones_are_reported_in_order() {
    let session = ReviewSession::default();
    let seen = Mutex::new(Vec::new());
    let record = |status: ReviewStatus| seen.lock().unwrap().push(status);

    session
        .run_with_status(PAGE, &StaticBackend::ok(vec![console_log_warning()]), &record)
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        [
            ReviewStatus::Extracting,
            ReviewStatus::Sending { files: 1 },
            ReviewStatus::Placing { suggestions: 1 },
        ]
    );
}
