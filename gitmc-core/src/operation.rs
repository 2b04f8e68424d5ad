//! The process-wide operation registry (spec §4.8): every long-running
//! extract/rebuild is submitted here, runs off the caller's thread, and
//! reports progress through a change stream until it reaches a terminal
//! state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{error, info, warn};

use crate::error::{CoreError, Result};

/// A cooperative cancellation flag threaded through an operation's
/// closure. Checked at coarse boundaries (per-chunk, per-file), not
/// inside inner parser loops (spec §5 "suspension points").
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns [`CoreError::Canceled`] if cancellation has been requested;
    /// convenient at a suspension point with `?`.
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            Err(CoreError::Canceled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationStatus::Succeeded | OperationStatus::Failed | OperationStatus::Canceled
        )
    }
}

/// A snapshot of one submitted operation's state, as seen by a subscriber
/// or by [`OperationManager::get`].
#[derive(Debug, Clone)]
pub struct Operation {
    pub id: u64,
    pub kind: String,
    pub status: OperationStatus,
    pub current_step: u64,
    pub total_steps: Option<u64>,
    pub message: Option<String>,
    /// The structured cause of a [`OperationStatus::Failed`] terminal state.
    /// `Arc`-wrapped so a snapshot can be cloned out to subscribers without
    /// requiring `CoreError` itself to be `Clone`.
    pub error: Option<Arc<CoreError>>,
    pub started_at: Instant,
}

impl Operation {
    fn pending(id: u64, kind: &str) -> Self {
        Self {
            id,
            kind: kind.to_owned(),
            status: OperationStatus::Pending,
            current_step: 0,
            total_steps: None,
            message: None,
            error: None,
            started_at: Instant::now(),
        }
    }
}

/// Handed to an operation's closure: lets it report progress and observe
/// cancellation without knowing about the registry that owns it.
#[derive(Clone)]
pub struct ProgressReporter {
    id: u64,
    manager: Arc<Inner>,
    token: CancellationToken,
}

impl ProgressReporter {
    /// A standalone reporter not attached to any [`OperationManager`],
    /// for tests that exercise [`crate::translate`] directly.
    #[cfg(test)]
    pub(crate) fn for_test() -> Self {
        let inner = Arc::new(Inner {
            operations: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
        });
        Self { id: 0, manager: inner, token: CancellationToken::new() }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Reports a new `current_step` (and optionally `total_steps`) for
    /// this operation. Steps must be monotonically non-decreasing on a
    /// single logical subscriber channel (spec §5 "ordering guarantees");
    /// callers are responsible for calling this in increasing order.
    pub fn report(&self, current_step: u64, total_steps: Option<u64>, message: impl Into<String>) {
        self.manager.update(self.id, |op| {
            op.status = OperationStatus::Running;
            op.current_step = current_step;
            if let Some(total) = total_steps {
                op.total_steps = Some(total);
            }
            op.message = Some(message.into());
        });
    }
}

struct Inner {
    operations: Mutex<HashMap<u64, Operation>>,
    subscribers: Mutex<Vec<Sender<Operation>>>,
}

impl Inner {
    fn update(&self, id: u64, f: impl FnOnce(&mut Operation)) {
        let snapshot = {
            let mut operations = self.operations.lock().unwrap();
            let Some(op) = operations.get_mut(&id) else { return };
            f(op);
            op.clone()
        };
        self.broadcast(snapshot);
    }

    fn broadcast(&self, snapshot: Operation) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

/// Registers and drives [`Operation`]s. One instance per process; callers
/// typically keep it behind an `Arc` shared by the GUI shell, CLI, and any
/// background workers.
pub struct OperationManager {
    inner: Arc<Inner>,
    next_id: AtomicU64,
}

impl Default for OperationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                operations: Mutex::new(HashMap::new()),
                subscribers: Mutex::new(Vec::new()),
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Submits a new operation. `factory` runs synchronously on a fresh
    /// thread, receiving a [`ProgressReporter`] it should use to report
    /// progress and check cancellation; its `Result` becomes the
    /// operation's terminal status.
    pub fn submit<F>(&self, kind: &str, factory: F) -> (u64, CancellationToken)
    where
        F: FnOnce(ProgressReporter) -> Result<()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        self.inner
            .operations
            .lock()
            .unwrap()
            .insert(id, Operation::pending(id, kind));

        let reporter = ProgressReporter { id, manager: self.inner.clone(), token: token.clone() };
        let inner = self.inner.clone();
        let kind_owned = kind.to_owned();
        std::thread::spawn(move || {
            info!("operation {id} ({kind_owned}) started");
            let outcome = factory(reporter);
            inner.update(id, |op| match outcome {
                Ok(()) => {
                    info!("operation {id} ({kind_owned}) succeeded");
                    op.status = OperationStatus::Succeeded;
                }
                Err(CoreError::Canceled) => {
                    warn!("operation {id} ({kind_owned}) canceled");
                    op.status = OperationStatus::Canceled;
                }
                Err(e) => {
                    error!("operation {id} ({kind_owned}) failed: {e}");
                    op.status = OperationStatus::Failed;
                    op.error = Some(Arc::new(e));
                }
            });
        });

        (id, token)
    }

    pub fn get(&self, id: u64) -> Option<Operation> {
        self.inner.operations.lock().unwrap().get(&id).cloned()
    }

    /// A change stream: every update to any operation, including ones
    /// submitted after this call (spec §4.8 "change stream for external
    /// subscribers").
    pub fn subscribe(&self) -> Receiver<Operation> {
        let (tx, rx) = unbounded();
        self.inner.subscribers.lock().unwrap().push(tx);
        rx
    }

    /// Removes terminal operations older than `horizon`.
    pub fn prune(&self, horizon: Duration) {
        let now = Instant::now();
        self.inner.operations.lock().unwrap().retain(|_, op| {
            !op.status.is_terminal() || now.duration_since(op.started_at) < horizon
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn successful_operation_reaches_succeeded() {
        let manager = OperationManager::new();
        let (id, _token) = manager.submit("test", |reporter| {
            reporter.report(1, Some(1), "working");
            Ok(())
        });
        for _ in 0..200 {
            if manager.get(id).unwrap().status.is_terminal() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(manager.get(id).unwrap().status, OperationStatus::Succeeded);
    }

    #[test]
    fn cancellation_transitions_to_canceled() {
        let manager = OperationManager::new();
        let (id, token) = manager.submit("test", |reporter| {
            loop {
                reporter.token().check()?;
                std::thread::sleep(Duration::from_millis(1));
            }
        });
        token.cancel();
        for _ in 0..200 {
            if manager.get(id).unwrap().status.is_terminal() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(manager.get(id).unwrap().status, OperationStatus::Canceled);
    }

    #[test]
    fn subscriber_observes_progress_updates() {
        let manager = OperationManager::new();
        let rx = manager.subscribe();
        manager.submit("test", |reporter| {
            reporter.report(1, Some(2), "step one");
            reporter.report(2, Some(2), "step two");
            Ok(())
        });
        let first = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(first.current_step, 1);
        let second = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(second.current_step, 2);
    }
}
