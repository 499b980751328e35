//! Deferred action engine
//!
//! Every user action follows the same shape: mark a label as pending, wait a
//! fixed delay, run the effect, clear the label. Tasks cannot be cancelled:
//! dropping a [`DeferredHandle`] only detaches it.

use crate::error::GuardianError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Name of an in-flight action (`logout`, `toggle-2`, `navigate`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionLabel(String);

impl ActionLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn toggle_contact(contact_id: u32) -> Self {
        Self(format!("toggle-{}", contact_id))
    }

    pub fn contribute(goal_id: &str) -> Self {
        Self(format!("contribute-{}", goal_id))
    }

    pub fn contact_service(service_id: &str) -> Self {
        Self(format!("contact-{}", service_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionLabel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ActionLabel {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Registry of labels currently in flight
#[derive(Debug, Clone, Default)]
pub struct PendingActions {
    inner: Arc<Mutex<BTreeSet<ActionLabel>>>,
}

impl PendingActions {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking effect never holds this lock, so poisoning carries no torn state.
    fn labels(&self) -> MutexGuard<'_, BTreeSet<ActionLabel>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically claims `label`; `None` when it is already pending.
    fn try_acquire(&self, label: &ActionLabel) -> Option<PendingGuard> {
        if self.labels().insert(label.clone()) {
            Some(PendingGuard {
                pending: self.clone(),
                label: label.clone(),
            })
        } else {
            None
        }
    }

    pub fn is_pending(&self, label: &str) -> bool {
        self.labels().iter().any(|l| l.as_str() == label)
    }

    pub fn is_idle(&self) -> bool {
        self.labels().is_empty()
    }

    /// Sorted copy of the pending labels
    pub fn snapshot(&self) -> Vec<ActionLabel> {
        self.labels().iter().cloned().collect()
    }
}

/// Releases its label on drop, including while unwinding from a panicking effect.
struct PendingGuard {
    pending: PendingActions,
    label: ActionLabel,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.labels().remove(&self.label);
        debug!(label = %self.label, "Pending action cleared");
    }
}

/// Awaitable result of a scheduled action
#[derive(Debug)]
pub struct DeferredHandle<T> {
    label: ActionLabel,
    join: JoinHandle<T>,
}

impl<T> DeferredHandle<T> {
    pub fn label(&self) -> &ActionLabel {
        &self.label
    }

    /// Waits for the effect's output. A panicking effect surfaces as `TaskFailed`.
    pub async fn wait(self) -> Result<T> {
        let label = self.label;
        self.join.await.map_err(|e| {
            warn!(label = %label, error = %e, "Deferred action failed");
            GuardianError::TaskFailed {
                label: label.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

impl<T> DeferredHandle<Result<T>> {
    /// Waits for a fallible effect and flattens its outcome
    pub async fn finish(self) -> Result<T> {
        self.wait().await?
    }
}

/// Schedules labelled effects after a fixed delay
#[derive(Debug, Clone, Default)]
pub struct DeferredExecutor {
    pending: PendingActions,
}

impl DeferredExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &PendingActions {
        &self.pending
    }

    /// Runs `effect` once after `delay` under `label`.
    ///
    /// Fails with [`GuardianError::ActionPending`] while the same label is in
    /// flight. Must be called from within a tokio runtime.
    pub fn schedule<F, Fut, T>(
        &self,
        label: impl Into<ActionLabel>,
        delay: Duration,
        effect: F,
    ) -> Result<DeferredHandle<T>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let label = label.into();

        let guard = self
            .pending
            .try_acquire(&label)
            .ok_or_else(|| GuardianError::ActionPending(label.to_string()))?;

        debug!(label = %label, delay_ms = delay.as_millis() as u64, "Action scheduled");

        let join = tokio::spawn(async move {
            let guard = guard;
            tokio::time::sleep(delay).await;
            let output = effect().await;
            drop(guard);
            output
        });

        Ok(DeferredHandle { label, join })
    }
}

//
// ================= Tests =================
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test(start_paused = true)]
    async fn effect_runs_once_after_delay() {
        let executor = DeferredExecutor::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let started = Instant::now();

        let handle = executor
            .schedule("logout", Duration::from_millis(1000), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                42
            })
            .unwrap();

        assert!(executor.pending().is_pending("logout"));
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        let output = assert_ok!(handle.wait().await);
        assert_eq!(output, 42);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert!(executor.pending().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn same_label_is_rejected_while_pending() {
        let executor = DeferredExecutor::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let first_counter = runs.clone();
        let first = executor
            .schedule("navigate", Duration::from_millis(500), move || async move {
                first_counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let second_counter = runs.clone();
        let second = executor.schedule("navigate", Duration::from_millis(500), move || async move {
            second_counter.fetch_add(1, Ordering::SeqCst);
        });

        match assert_err!(second) {
            GuardianError::ActionPending(label) => assert_eq!(label, "navigate"),
            other => panic!("unexpected error: {}", other),
        }

        first.wait().await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Once resolved, the label can be used again.
        let again = executor
            .schedule("navigate", Duration::from_millis(500), || async {})
            .unwrap();
        again.wait().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_labels_run_side_by_side() {
        let executor = DeferredExecutor::new();

        let a = executor
            .schedule(ActionLabel::toggle_contact(1), Duration::from_millis(800), || async { 1 })
            .unwrap();
        let b = executor
            .schedule(ActionLabel::toggle_contact(2), Duration::from_millis(800), || async { 2 })
            .unwrap();

        assert_eq!(
            executor.pending().snapshot(),
            vec![ActionLabel::new("toggle-1"), ActionLabel::new("toggle-2")]
        );

        assert_eq!(a.wait().await.unwrap(), 1);
        assert_eq!(b.wait().await.unwrap(), 2);
        assert!(executor.pending().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn pending_label_is_cleared_when_effect_panics() {
        let executor = DeferredExecutor::new();

        let handle = executor
            .schedule("contribute-1", Duration::from_millis(2000), || async {
                let explode = true;
                if explode {
                    panic!("effect blew up");
                }
            })
            .unwrap();

        let result: Result<()> = handle.wait().await;
        assert!(matches!(result, Err(GuardianError::TaskFailed { .. })));
        assert!(!executor.pending().is_pending("contribute-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_still_completes() {
        let executor = DeferredExecutor::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let handle = executor
            .schedule("call-support", Duration::from_millis(2000), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        drop(handle);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(executor.pending().is_idle());
    }
}
