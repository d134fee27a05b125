// Readiness signalling for batch loads

use super::AssetError;
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Lifecycle of the current batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// A batch is loading or deriving, or none has been submitted yet
    Loading,
    /// The last batch finished loading and derivation
    Ready,
    /// The last batch stalled or was cancelled
    Failed,
}

/// Barrier letting callers wait until the pipeline has finished a batch
///
/// Clones share the same state, so a handle can be given to any task before
/// a batch is submitted.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    state: Arc<watch::Sender<GateState>>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(GateState::Loading);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == GateState::Ready
    }

    /// Enter `Loading` for a new batch, even if the previous one was ready
    pub(crate) fn begin_batch(&self) {
        self.transition(GateState::Loading);
    }

    pub(crate) fn mark_ready(&self) {
        self.transition(GateState::Ready);
    }

    pub(crate) fn mark_failed(&self) {
        self.transition(GateState::Failed);
    }

    fn transition(&self, next: GateState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!("Readiness gate {:?} -> {:?}", previous, next);
        }
    }

    /// Wait until the current batch is ready
    ///
    /// Returns immediately once ready, after yielding one scheduler tick so
    /// work queued by the completed loads can run first. A failed batch
    /// resolves with [`AssetError::BatchAborted`].
    pub async fn wait_ready(&self) -> Result<(), AssetError> {
        let mut state = self.state.subscribe();
        let outcome = match state.wait_for(|s| *s != GateState::Loading).await {
            Ok(settled) => *settled,
            // The sender lives as long as any gate clone, including `self`
            Err(_) => GateState::Failed,
        };

        tokio::task::yield_now().await;

        match outcome {
            GateState::Ready => Ok(()),
            _ => Err(AssetError::BatchAborted),
        }
    }

    /// [`wait_ready`](Self::wait_ready) with an upper bound on the wait
    pub async fn wait_ready_timeout(&self, limit: Duration) -> Result<(), AssetError> {
        match tokio::time::timeout(limit, self.wait_ready()).await {
            Ok(result) => result,
            Err(_) => Err(AssetError::StalledLoad {
                pending: Vec::new(),
                timeout_ms: limit.as_millis() as u64,
            }),
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_gate_starts_loading() {
        let gate = ReadinessGate::new();
        assert_eq!(gate.state(), GateState::Loading);
        assert!(!gate.is_ready());
    }

    #[tokio::test]
    async fn test_wait_ready_after_ready_returns() {
        let gate = ReadinessGate::new();
        gate.mark_ready();

        // Repeated waits resolve without any further transition
        for _ in 0..3 {
            gate.wait_ready().await.unwrap();
        }
        assert!(gate.is_ready());
    }

    #[tokio::test]
    async fn test_waiters_resume_on_ready() {
        let gate = ReadinessGate::new();
        let resumed = Rc::new(Cell::new(0));

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let waiters: Vec<_> = (0..3)
                    .map(|_| {
                        let gate = gate.clone();
                        let resumed = resumed.clone();
                        tokio::task::spawn_local(async move {
                            gate.wait_ready().await.unwrap();
                            resumed.set(resumed.get() + 1);
                        })
                    })
                    .collect();

                tokio::task::yield_now().await;
                assert_eq!(resumed.get(), 0);

                gate.mark_ready();
                for waiter in waiters {
                    waiter.await.unwrap();
                }
                assert_eq!(resumed.get(), 3);
            })
            .await;
    }

    #[tokio::test]
    async fn test_new_batch_resets_gate() {
        let gate = ReadinessGate::new();
        gate.mark_ready();
        gate.begin_batch();
        assert_eq!(gate.state(), GateState::Loading);

        let result = gate.wait_ready_timeout(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(AssetError::StalledLoad { .. })));
    }

    #[tokio::test]
    async fn test_failed_batch_aborts_waiters() {
        let gate = ReadinessGate::new();
        gate.mark_failed();
        assert_eq!(gate.wait_ready().await, Err(AssetError::BatchAborted));
    }
}
