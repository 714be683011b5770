//! Per-file diagnostic state: run lifecycle, coalescing flush, queries.

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::stats::IssueStats;
use blinter_protocol::{paths, Issue, RunState, RunStatus};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

/// Snapshot pushed to subscribers whenever a file's published list changes:
/// run start, coalesced flush, finalization, timeout, and clear.
#[derive(Debug, Clone)]
pub struct DiagnosticsUpdate {
    pub file: PathBuf,
    pub run_id: u64,
    pub state: RunState,
    /// The full published list, sorted; not a delta.
    pub issues: Vec<Issue>,
}

/// Proof of the current run for a file: the normalized target plus the
/// monotonic run id that gates `add_issue` and `finalize_run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    pub file: PathBuf,
    pub run_id: u64,
}

/// Internal per-file lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    Pending,
    Ready,
}

#[derive(Default)]
struct FileEntry {
    run_id: u64,
    phase: Phase,
    status: RunStatus,
    /// Issues buffered for the current run, in discovery order.
    pending: Vec<Issue>,
    /// Externally visible list as of the last publish, sorted.
    published: Vec<Issue>,
    flush_timer: Option<JoinHandle<()>>,
    watchdog: Option<JoinHandle<()>>,
}

impl FileEntry {
    fn cancel_timers(&mut self) {
        if let Some(timer) = self.flush_timer.take() {
            timer.abort();
        }
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.abort();
        }
    }
}

struct StoreInner {
    config: StoreConfig,
    files: Mutex<HashMap<PathBuf, FileEntry>>,
    update_tx: broadcast::Sender<DiagnosticsUpdate>,
}

/// Shared handle over the per-file diagnostic state machines.
///
/// Clones are cheap and address the same store. Every file owns an
/// independent entry; superseding, flushing and clearing one file never
/// touches another. All queries return snapshots — the live maps never
/// escape.
#[derive(Clone)]
pub struct DiagnosticsStore {
    inner: Arc<StoreInner>,
}

impl DiagnosticsStore {
    /// Create a store with validated configuration.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Store with the default 75 ms debounce and no run timeout.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::build(StoreConfig::default())
    }

    fn build(config: StoreConfig) -> Self {
        let (update_tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(StoreInner {
                config,
                files: Mutex::new(HashMap::new()),
                update_tx,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> StoreConfig {
        self.inner.config
    }

    /// Subscribe to published snapshots.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DiagnosticsUpdate> {
        self.inner.update_tx.subscribe()
    }

    /// Allocate a new run for `file`.
    ///
    /// Previously ready issues are cleared and any in-flight run is
    /// superseded immediately; its late output will be discarded by the run
    /// id checks in [`add_issue`](Self::add_issue) and
    /// [`finalize_run`](Self::finalize_run).
    pub fn start_run(&self, file: &Path) -> Result<RunTicket> {
        let file = normalize_target(file)?;
        let run_id;
        let update = {
            let mut files = self.lock_files();
            let entry = files.entry(file.clone()).or_default();
            entry.cancel_timers();
            entry.run_id += 1;
            entry.phase = Phase::Pending;
            entry.status = RunStatus::running();
            entry.pending.clear();
            entry.published.clear();
            run_id = entry.run_id;

            if let Some(timeout) = self.inner.config.run_timeout {
                let store = self.clone();
                let target = file.clone();
                entry.watchdog = Some(tokio::spawn(async move {
                    time::sleep(timeout).await;
                    store.expire_run(&target, run_id, timeout);
                }));
            }

            DiagnosticsUpdate {
                file: file.clone(),
                run_id,
                state: RunState::Running,
                issues: Vec::new(),
            }
        };
        let _ = self.inner.update_tx.send(update);
        Ok(RunTicket { file, run_id })
    }

    /// Buffer one issue for `file`'s current run and arm the coalescing
    /// flush: the first issue in a quiet window starts the timer, later ones
    /// ride along. Output from a superseded run is discarded silently.
    pub fn add_issue(&self, file: &Path, run_id: u64, issue: Issue) {
        let mut files = self.lock_files();
        let Some(entry) = files.get_mut(file) else {
            debug!("dropping issue for untracked file {}", file.display());
            return;
        };
        if entry.run_id != run_id || entry.phase != Phase::Pending {
            debug!(
                "dropping issue from superseded run {run_id} for {}",
                file.display()
            );
            return;
        }
        entry.pending.push(issue);

        if entry.flush_timer.is_none() {
            let store = self.clone();
            let target = file.to_path_buf();
            let debounce = self.inner.config.flush_debounce;
            entry.flush_timer = Some(tokio::spawn(async move {
                time::sleep(debounce).await;
                store.flush_run(&target, run_id);
            }));
        }
    }

    /// Publish `file`'s buffered issues immediately.
    ///
    /// A rendering checkpoint: the run keeps accumulating afterwards. Any
    /// armed flush timer is cancelled and its handle cleared.
    pub fn flush(&self, file: &Path) {
        let update = {
            let mut files = self.lock_files();
            let Some(entry) = files.get_mut(file) else {
                return;
            };
            if let Some(timer) = entry.flush_timer.take() {
                timer.abort();
            }
            publish(file, entry)
        };
        let _ = self.inner.update_tx.send(update);
    }

    /// Complete `file`'s run with the linter's exit code (`None` = spawn
    /// failure). Late finalization of a superseded run is discarded —
    /// cancellation is expected control flow, not a failure.
    pub fn finalize_run(&self, file: &Path, run_id: u64, exit_code: Option<i32>) {
        let update = {
            let mut files = self.lock_files();
            let Some(entry) = files.get_mut(file) else {
                return;
            };
            if entry.run_id != run_id || entry.phase != Phase::Pending {
                debug!(
                    "ignoring finalize for superseded run {run_id} of {}",
                    file.display()
                );
                return;
            }
            entry.cancel_timers();
            entry.phase = Phase::Ready;
            let update = publish(file, entry);
            entry.status = match exit_code {
                Some(0) => RunStatus::completed(IssueStats::tally(&entry.published).summary()),
                Some(code) => RunStatus::errored(format!("linter exited with status {code}")),
                None => RunStatus::errored("linter failed to start"),
            };
            DiagnosticsUpdate {
                state: entry.status.state,
                ..update
            }
        };
        let _ = self.inner.update_tx.send(update);
    }

    /// Drop all state for `file` (document close); the file returns to idle.
    pub fn clear(&self, file: &Path) {
        let update = {
            let mut files = self.lock_files();
            let Some(mut entry) = files.remove(file) else {
                return;
            };
            entry.cancel_timers();
            DiagnosticsUpdate {
                file: file.to_path_buf(),
                run_id: entry.run_id,
                state: RunState::Idle,
                issues: Vec::new(),
            }
        };
        let _ = self.inner.update_tx.send(update);
    }

    /// Last published diagnostics for `file`, sorted.
    #[must_use]
    pub fn diagnostics(&self, file: &Path) -> Vec<Issue> {
        self.lock_files()
            .get(file)
            .map(|entry| entry.published.clone())
            .unwrap_or_default()
    }

    /// Hover-style point query: published issues whose line equals `line`,
    /// in the published order.
    #[must_use]
    pub fn issues_at_line(&self, file: &Path, line: usize) -> Vec<Issue> {
        self.lock_files()
            .get(file)
            .map(|entry| {
                entry
                    .published
                    .iter()
                    .filter(|issue| issue.line == line)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Coarse run status for `file` (`Idle` when untracked).
    #[must_use]
    pub fn status(&self, file: &Path) -> RunStatus {
        self.lock_files()
            .get(file)
            .map(|entry| entry.status.clone())
            .unwrap_or_default()
    }

    /// Tally of the published list.
    #[must_use]
    pub fn stats(&self, file: &Path) -> IssueStats {
        IssueStats::tally(&self.diagnostics(file))
    }

    fn lock_files(&self) -> MutexGuard<'_, HashMap<PathBuf, FileEntry>> {
        self.inner
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Timer-driven flush; a stale run id means the timer lost a race with
    /// supersession and the publish is skipped.
    fn flush_run(&self, file: &Path, run_id: u64) {
        let update = {
            let mut files = self.lock_files();
            let Some(entry) = files.get_mut(file) else {
                return;
            };
            if entry.run_id != run_id {
                return;
            }
            entry.flush_timer = None;
            publish(file, entry)
        };
        let _ = self.inner.update_tx.send(update);
    }

    /// Watchdog expiry: finalize a still-pending run as errored. Subject to
    /// the same supersession rule as `finalize_run`.
    fn expire_run(&self, file: &Path, run_id: u64, timeout: Duration) {
        let update = {
            let mut files = self.lock_files();
            let Some(entry) = files.get_mut(file) else {
                return;
            };
            if entry.run_id != run_id || entry.phase != Phase::Pending {
                return;
            }
            warn!(
                "lint run {run_id} for {} exceeded {}ms",
                file.display(),
                timeout.as_millis()
            );
            entry.cancel_timers();
            entry.phase = Phase::Ready;
            let update = publish(file, entry);
            entry.status = RunStatus::errored(format!("run exceeded {}ms", timeout.as_millis()));
            DiagnosticsUpdate {
                state: entry.status.state,
                ..update
            }
        };
        let _ = self.inner.update_tx.send(update);
    }
}

/// Sort the pending list and copy it into the published snapshot.
///
/// Stable sort: severity rank first, line second, ties keep discovery order.
fn publish(file: &Path, entry: &mut FileEntry) -> DiagnosticsUpdate {
    entry.pending.sort_by_key(Issue::sort_key);
    entry.published = entry.pending.clone();
    DiagnosticsUpdate {
        file: file.to_path_buf(),
        run_id: entry.run_id,
        state: entry.status.state,
        issues: entry.published.clone(),
    }
}

fn normalize_target(file: &Path) -> Result<PathBuf> {
    if file.as_os_str().is_empty() {
        return Err(StoreError::InvalidPath("empty path".to_string()));
    }
    let absolute = if file.is_absolute() {
        file.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(file)
    };
    Ok(paths::normalize(&absolute))
}
