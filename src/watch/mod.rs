//! Waiting for lazily rendered diff content.
//!
//! Saved pages are often captured before the host has finished rendering
//! the diff. This module watches the file for changes and polls it on a
//! fixed interval, returning as soon as a diff-ready marker appears or
//! giving up after a timeout. A single check happens up front so content
//! that is already present returns immediately.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use scraper::Html;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::WatchConfig;
use crate::extract;

/// What made the content count as ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Ready on the first check.
    Initial,
    /// A file-system change event.
    Watcher,
    /// The periodic poll.
    Poll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Ready(Trigger),
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
pub struct WatchSettings {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl From<&WatchConfig> for WatchSettings {
    fn from(config: &WatchConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            timeout: config.timeout(),
        }
    }
}

/// Wait until `path` contains diff content, or until the timeout.
pub async fn wait_for_diff_content(path: &Path, settings: WatchSettings) -> WatchOutcome {
    if is_ready(path).await {
        return WatchOutcome::Ready(Trigger::Initial);
    }
    info!(path = %path.display(), timeout = ?settings.timeout, "waiting for diff content");

    let (tx, mut rx) = mpsc::unbounded_channel();
    // Kept alive for the whole wait; the receiver never sees a closed channel.
    let _watcher = spawn_watcher(path, tx.clone());

    let mut poll = tokio::time::interval(settings.poll_interval);
    poll.tick().await;
    let deadline = tokio::time::sleep(settings.timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!(path = %path.display(), "gave up waiting for diff content");
                return WatchOutcome::TimedOut;
            }
            Some(()) = rx.recv() => {
                if is_ready(path).await {
                    debug!("diff content appeared (watcher)");
                    return WatchOutcome::Ready(Trigger::Watcher);
                }
            }
            _ = poll.tick() => {
                if is_ready(path).await {
                    debug!("diff content appeared (poll)");
                    return WatchOutcome::Ready(Trigger::Poll);
                }
            }
        }
    }
}

/// Watch the file's directory; change events are forwarded on `tx`.
///
/// Returns `None` (poll-only mode) when the watcher cannot be set up.
fn spawn_watcher(path: &Path, tx: mpsc::UnboundedSender<()>) -> Option<RecommendedWatcher> {
    let target = path.file_name().map(|name| name.to_os_string());
    let dir = watch_dir(path);

    let mut watcher = match notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            if event.paths.is_empty() || event.paths.iter().any(|p| p.file_name() == target.as_deref()) {
                let _ = tx.send(());
            }
        }
    }) {
        Ok(watcher) => watcher,
        Err(e) => {
            warn!(error = %e, "file watcher unavailable, polling only");
            return None;
        }
    };

    if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        warn!(error = %e, dir = %dir.display(), "could not watch directory, polling only");
        return None;
    }
    Some(watcher)
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// A missing or unreadable file simply is not ready yet.
/// Parsing runs on the blocking pool.
async fn is_ready(path: &Path) -> bool {
    let Ok(source) = tokio::fs::read_to_string(path).await else {
        return false;
    };
    tokio::task::spawn_blocking(move || extract::has_diff_content(&Html::parse_document(&source)))
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "readiness check failed");
            false
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(poll_ms: u64, timeout_ms: u64) -> WatchSettings {
        WatchSettings {
            poll_interval: Duration::from_millis(poll_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test]
    async fn ready_content_returns_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, r#"<div class="diff-view"></div>"#).unwrap();

        let outcome = wait_for_diff_content(&path, settings(50, 1000)).await;
        assert_eq!(outcome, WatchOutcome::Ready(Trigger::Initial));
    }

    #[tokio::test]
    async fn times_out_without_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<main>loading</main>").unwrap();

        let outcome = wait_for_diff_content(&path, settings(20, 150)).await;
        assert_eq!(outcome, WatchOutcome::TimedOut);
    }

    #[tokio::test]
    async fn detects_content_written_later() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<main>loading</main>").unwrap();

        let writer_path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::write(&writer_path, r#"<div class="file"></div>"#).unwrap();
        });

        let outcome = wait_for_diff_content(&path, settings(50, 5000)).await;
        assert!(matches!(outcome, WatchOutcome::Ready(Trigger::Watcher | Trigger::Poll)));
    }

    #[tokio::test]
    async fn readiness_check_tracks_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        assert!(!is_ready(&path).await);

        tokio::fs::write(&path, "<main>loading</main>").await.unwrap();
        assert!(!is_ready(&path).await);

        let rows = r#"<tr><td class="blob-code">x</td></tr>"#.repeat(5000);
        let page = format!(r#"<div class="diff-view"><table>{rows}</table></div>"#);
        tokio::fs::write(&path, page).await.unwrap();
        assert!(is_ready(&path).await);
    }

    #[tokio::test]
    async fn missing_file_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = wait_for_diff_content(&dir.path().join("absent.html"), settings(20, 100)).await;
        assert_eq!(outcome, WatchOutcome::TimedOut);
    }
}
