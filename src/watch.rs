//! File watcher: runs `check` on startup, then re-runs when a document changes.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands::{self, Format};
use crate::diagnostics;
use crate::error;
use crate::html;

/// Debounce delay between filesystem events and re-check.
const DEBOUNCE_MS: u64 = 100;

/// Whether a filesystem event touches a rendered document.
fn is_relevant(event: &notify::Event) -> bool {
    let kind_matches = matches!(
        event.kind,
        notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
    );
    return kind_matches && event.paths.iter().any(|p| return html::is_document(p));
}

/// Create a filesystem watcher that sends events on the given channel.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && is_relevant(&event)
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return error::Error::WatchFailed {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Entry point for the watch command.
///
/// Runs an initial check, then watches `root` recursively and re-checks on changes.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the root cannot be watched.
pub fn run(root: &Path, format: Format) -> Result<ExitCode, error::Error> {
    eprintln!("watch: initial check");
    let mut last_code = run_check(root, format);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| {
            return error::Error::WatchFailed {
                reason: format!("cannot watch {}: {e}", root.display()),
            };
        })?;

    eprintln!("watch: monitoring {}, press Ctrl+C to stop", root.display());

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        tracing::debug!("document change detected");
        eprintln!("watch: change detected, re-checking...");
        last_code = run_check(root, format);
    }

    return Ok(last_code);
}

/// Run check once. Returns the exit code from check, or 3 on error.
fn run_check(root: &Path, format: Format) -> ExitCode {
    return match commands::check(root, format) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(3_u8)
        },
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn event(kind: notify::EventKind, path: &str) -> notify::Event {
        return notify::Event::new(kind).add_path(PathBuf::from(path));
    }

    #[test]
    fn only_document_changes_trigger() {
        let modify = notify::EventKind::Modify(notify::event::ModifyKind::Any);
        assert!(is_relevant(&event(modify, "site/A.html")));
        assert!(!is_relevant(&event(modify, "site/notes.txt")));
        assert!(!is_relevant(&event(
            notify::EventKind::Access(notify::event::AccessKind::Any),
            "site/A.html"
        )));
    }
}
