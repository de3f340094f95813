//! Change-trigger plumbing for the today view.
//!
//! Two independent subscriptions — a vault file watch and a calendar
//! rollover ticker — feed one coalescing queue, so any burst of triggers
//! collapses into at most one pending reload. Dropping a subscription
//! handle cancels it.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

/// At-most-one-pending reload signal shared between triggers and the
/// reload loop.
#[derive(Clone, Default)]
pub struct ReloadQueue {
    inner: Arc<QueueInner>,
}

#[derive(Default)]
struct QueueInner {
    pending: Mutex<bool>,
    cvar: Condvar,
}

impl ReloadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a reload as pending. Repeated signals before the next
    /// [`Self::wait_timeout`] coalesce into one.
    pub fn signal(&self) {
        let mut pending = self.inner.pending.lock().expect("reload queue lock");
        *pending = true;
        self.inner.cvar.notify_one();
    }

    /// Block until a reload is pending or `timeout` elapses, consuming the
    /// pending flag. Returns whether a reload was signalled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.inner.pending.lock().expect("reload queue lock");
        let (mut pending, _outcome) = self
            .inner
            .cvar
            .wait_timeout_while(guard, timeout, |pending| !*pending)
            .expect("reload queue lock");
        let fired = *pending;
        *pending = false;
        fired
    }
}

/// Watches the vault directory and signals the queue whenever today's note
/// is created, modified, or removed on disk. The subscription ends when the
/// handle is dropped.
pub struct FileWatch {
    _watcher: RecommendedWatcher,
}

impl FileWatch {
    pub fn start(queue: ReloadQueue, vault_root: &Path) -> notify::Result<Self> {
        let mut watcher = RecommendedWatcher::new(
            move |outcome: Result<notify::Event, notify::Error>| match outcome {
                Ok(event) => {
                    if !matches!(
                        event.kind,
                        notify::EventKind::Create(_)
                            | notify::EventKind::Modify(_)
                            | notify::EventKind::Remove(_)
                    ) {
                        return;
                    }
                    // Today is recomputed per event so the watch follows
                    // the calendar without being restarted.
                    let today_note =
                        format!("{}.md", Local::now().date_naive().format("%Y-%m-%d"));
                    let changed = event
                        .paths
                        .iter()
                        .any(|path| path.file_name() == Some(OsStr::new(&today_note)));
                    if changed {
                        debug!(note = %today_note, "daily note changed on disk");
                        queue.signal();
                    }
                }
                Err(err) => warn!(error = %err, "file watch error"),
            },
            Config::default(),
        )?;
        watcher.watch(vault_root, RecursiveMode::NonRecursive)?;
        Ok(Self { _watcher: watcher })
    }
}

/// Periodically compares the local calendar date with the date captured at
/// the last load and signals one reload when the day advances. The thread
/// stops when the handle is dropped.
pub struct RolloverTicker {
    shared: Arc<TickerShared>,
    handle: Option<JoinHandle<()>>,
}

struct TickerShared {
    state: Mutex<TickerState>,
    cvar: Condvar,
}

struct TickerState {
    stop: bool,
    loaded: NaiveDate,
}

impl RolloverTicker {
    pub fn start(queue: ReloadQueue, loaded_date: NaiveDate, period: Duration) -> Self {
        let shared = Arc::new(TickerShared {
            state: Mutex::new(TickerState {
                stop: false,
                loaded: loaded_date,
            }),
            cvar: Condvar::new(),
        });
        let handle = thread::spawn({
            let shared = Arc::clone(&shared);
            move || run_ticker(&shared, &queue, period)
        });
        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Record the date captured by the most recent load so the ticker
    /// fires once per calendar advance, not once per period.
    pub fn mark_loaded(&self, date: NaiveDate) {
        let mut state = self.shared.state.lock().expect("ticker state lock");
        state.loaded = date;
    }
}

impl Drop for RolloverTicker {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().expect("ticker state lock");
            state.stop = true;
        }
        self.shared.cvar.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_ticker(shared: &TickerShared, queue: &ReloadQueue, period: Duration) {
    let mut state = shared.state.lock().expect("ticker state lock");
    loop {
        let (next, outcome) = shared
            .cvar
            .wait_timeout(state, period)
            .expect("ticker state lock");
        state = next;
        if state.stop {
            return;
        }
        if !outcome.timed_out() {
            continue;
        }
        let now = Local::now().date_naive();
        if now > state.loaded {
            debug!(%now, "local calendar date advanced");
            state.loaded = now;
            queue.signal();
        }
    }
}
