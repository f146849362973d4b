//! Single-slot confirmation gate for destructive or state-changing actions
//!
//! Exactly one confirmation may be pending at a time. The stored callback
//! runs only after an explicit `confirm()`; a failing callback re-opens the
//! dialog with the original request so the user can retry or cancel. The
//! gate never reports callback failures itself — callbacks are responsible
//! for surfacing their own errors (typically via the notification store)
//! before they return.

use crate::remote::RemoteError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Visual classification of a pending confirmation; does not affect control flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Danger,
    Warning,
    Info,
    Success,
}

/// The async action bound to a confirmation
pub type ConfirmCallback =
    Arc<dyn Fn() -> BoxFuture<'static, Result<(), RemoteError>> + Send + Sync>;

/// A request occupying the gate's single slot
#[derive(Clone)]
pub struct ConfirmationRequest {
    pub title: String,
    pub description: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub severity: Severity,
    pub on_confirm: ConfirmCallback,
}

impl ConfirmationRequest {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        on_confirm: ConfirmCallback,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            confirm_label: "Confirm".to_string(),
            cancel_label: "Cancel".to_string(),
            severity,
            on_confirm,
        }
    }

    pub fn with_labels(
        mut self,
        confirm_label: impl Into<String>,
        cancel_label: impl Into<String>,
    ) -> Self {
        self.confirm_label = confirm_label.into();
        self.cancel_label = cancel_label.into();
        self
    }
}

/// Renderable view of the active request (no callback)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestView {
    pub title: String,
    pub description: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub severity: Severity,
    /// True while the callback is running
    pub confirming: bool,
}

/// Observable gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Closed,
    Open,
    Confirming,
}

enum Slot {
    Closed,
    Open(Arc<ConfirmationRequest>),
    Confirming(Arc<ConfirmationRequest>),
}

/// Errors from gate operations
#[derive(Debug, Error)]
pub enum ConfirmError {
    /// A callback is in flight; the slot is locked until it settles
    #[error("a confirmation is already in progress")]
    Busy,
    /// The confirmed callback failed; the request remains open for retry
    #[error(transparent)]
    Callback(#[from] RemoteError),
}

/// The gate itself. Cloning shares the slot.
#[derive(Clone)]
pub struct ConfirmationGate {
    slot: Arc<Mutex<Slot>>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Closed)),
        }
    }

    /// Occupy the slot with a new request
    ///
    /// While merely `Open`, a newer request replaces the pending one
    /// (last-call-wins). While `Confirming`, the slot is locked and the
    /// request is rejected with [`ConfirmError::Busy`].
    pub async fn request(&self, request: ConfirmationRequest) -> Result<(), ConfirmError> {
        let mut slot = self.slot.lock().await;
        if matches!(*slot, Slot::Confirming(_)) {
            return Err(ConfirmError::Busy);
        }
        debug!(title = %request.title, severity = ?request.severity, "confirmation opened");
        *slot = Slot::Open(Arc::new(request));
        Ok(())
    }

    /// Discard the active request without invoking its callback
    ///
    /// No-op when `Closed` (returns false). Rejected while `Confirming`.
    pub async fn cancel(&self) -> Result<bool, ConfirmError> {
        let mut slot = self.slot.lock().await;
        match &*slot {
            Slot::Closed => Ok(false),
            Slot::Confirming(_) => Err(ConfirmError::Busy),
            Slot::Open(request) => {
                debug!(title = %request.title, "confirmation cancelled");
                *slot = Slot::Closed;
                Ok(true)
            }
        }
    }

    /// Invoke the active request's callback
    ///
    /// No-op when `Closed` (returns `Ok(false)`). On callback success the
    /// gate closes; on failure it returns to `Open` with the same request
    /// so `confirm()` can be retried, and the callback's error is returned.
    pub async fn confirm(&self) -> Result<bool, ConfirmError> {
        let request = {
            let mut slot = self.slot.lock().await;
            match &*slot {
                Slot::Closed => return Ok(false),
                Slot::Confirming(_) => return Err(ConfirmError::Busy),
                Slot::Open(request) => {
                    let request = request.clone();
                    *slot = Slot::Confirming(request.clone());
                    request
                }
            }
        };

        // Lock released while the callback runs; request (and cancel)
        // observe Confirming and refuse to disturb the slot.
        let outcome = (request.on_confirm)().await;

        let mut slot = self.slot.lock().await;
        match outcome {
            Ok(()) => {
                debug!(title = %request.title, "confirmation completed");
                *slot = Slot::Closed;
                Ok(true)
            }
            Err(err) => {
                debug!(title = %request.title, error = %err, "confirmation callback failed; request stays open");
                *slot = Slot::Open(request);
                Err(ConfirmError::Callback(err))
            }
        }
    }

    /// Current state of the slot
    pub async fn state(&self) -> GateState {
        match &*self.slot.lock().await {
            Slot::Closed => GateState::Closed,
            Slot::Open(_) => GateState::Open,
            Slot::Confirming(_) => GateState::Confirming,
        }
    }

    /// Renderable view of the active request, if any
    pub async fn active(&self) -> Option<RequestView> {
        let slot = self.slot.lock().await;
        let (request, confirming) = match &*slot {
            Slot::Closed => return None,
            Slot::Open(request) => (request, false),
            Slot::Confirming(request) => (request, true),
        };
        Some(RequestView {
            title: request.title.clone(),
            description: request.description.clone(),
            confirm_label: request.confirm_label.clone(),
            cancel_label: request.cancel_label.clone(),
            severity: request.severity,
            confirming,
        })
    }
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop_callback() -> ConfirmCallback {
        Arc::new(|| Box::pin(async { Ok(()) }))
    }

    fn counting_callback(counter: Arc<AtomicUsize>, result: Result<(), RemoteError>) -> ConfirmCallback {
        Arc::new(move || {
            let counter = counter.clone();
            let result = result.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                result
            })
        })
    }

    fn request(title: &str, cb: ConfirmCallback) -> ConfirmationRequest {
        ConfirmationRequest::new(title, format!("{title} description"), Severity::Danger, cb)
    }

    #[tokio::test]
    async fn test_confirm_on_closed_is_noop() {
        let gate = ConfirmationGate::new();
        assert_eq!(gate.state().await, GateState::Closed);
        assert!(!gate.confirm().await.unwrap());
        assert_eq!(gate.state().await, GateState::Closed);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let gate = ConfirmationGate::new();
        gate.request(request("Delete agent", noop_callback()))
            .await
            .unwrap();
        assert!(gate.cancel().await.unwrap());
        // Second cancel is a no-op
        assert!(!gate.cancel().await.unwrap());
        assert_eq!(gate.state().await, GateState::Closed);
    }

    #[tokio::test]
    async fn test_cancel_never_invokes_callback() {
        let gate = ConfirmationGate::new();
        let calls = Arc::new(AtomicUsize::new(0));
        gate.request(request("Delete", counting_callback(calls.clone(), Ok(()))))
            .await
            .unwrap();
        gate.cancel().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_then_cancel_leaves_pristine_closed_state() {
        let gate = ConfirmationGate::new();
        gate.request(request("Delete agent", noop_callback()))
            .await
            .unwrap();
        assert!(gate.active().await.is_some());

        gate.cancel().await.unwrap();
        // No leaked title/description observable afterwards
        assert!(gate.active().await.is_none());
        assert_eq!(gate.state().await, GateState::Closed);
    }

    #[tokio::test]
    async fn test_confirm_success_closes() {
        let gate = ConfirmationGate::new();
        let calls = Arc::new(AtomicUsize::new(0));
        gate.request(request("Approve", counting_callback(calls.clone(), Ok(()))))
            .await
            .unwrap();

        assert!(gate.confirm().await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(gate.state().await, GateState::Closed);
    }

    #[tokio::test]
    async fn test_retry_law_failure_keeps_same_request() {
        let gate = ConfirmationGate::new();
        let calls = Arc::new(AtomicUsize::new(0));
        gate.request(request(
            "Delete agent",
            counting_callback(calls.clone(), Err(RemoteError::transport("down"))),
        ))
        .await
        .unwrap();

        let err = gate.confirm().await.unwrap_err();
        assert!(matches!(err, ConfirmError::Callback(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Same request still active: title/description unchanged
        assert_eq!(gate.state().await, GateState::Open);
        let view = gate.active().await.unwrap();
        assert_eq!(view.title, "Delete agent");
        assert_eq!(view.description, "Delete agent description");
        assert!(!view.confirming);

        // Second confirm re-invokes the same callback
        let _ = gate.confirm().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_open_request_replaced_last_call_wins() {
        let gate = ConfirmationGate::new();
        gate.request(request("First", noop_callback())).await.unwrap();
        gate.request(request("Second", noop_callback()))
            .await
            .unwrap();
        assert_eq!(gate.active().await.unwrap().title, "Second");
    }

    #[tokio::test]
    async fn test_request_rejected_while_confirming() {
        let gate = ConfirmationGate::new();

        // A callback that parks until released
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let release_rx = Arc::new(Mutex::new(Some(release_rx)));
        let callback: ConfirmCallback = Arc::new(move || {
            let release_rx = release_rx.clone();
            Box::pin(async move {
                if let Some(rx) = release_rx.lock().await.take() {
                    let _ = rx.await;
                }
                Ok(())
            })
        });

        gate.request(request("Slow delete", callback)).await.unwrap();

        let confirming = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.confirm().await })
        };

        // Wait until the callback is actually in flight
        while gate.state().await != GateState::Confirming {
            tokio::task::yield_now().await;
        }
        assert!(gate.active().await.unwrap().confirming);

        // Slot is locked: new requests and cancels are rejected
        let err = gate.request(request("Another", noop_callback())).await;
        assert!(matches!(err, Err(ConfirmError::Busy)));
        assert!(matches!(gate.cancel().await, Err(ConfirmError::Busy)));

        release_tx.send(()).unwrap();
        assert!(confirming.await.unwrap().unwrap());
        assert_eq!(gate.state().await, GateState::Closed);
    }

    #[tokio::test]
    async fn test_default_labels() {
        let req = request("Delete", noop_callback());
        assert_eq!(req.confirm_label, "Confirm");
        assert_eq!(req.cancel_label, "Cancel");

        let req = req.with_labels("Delete", "Keep");
        assert_eq!(req.confirm_label, "Delete");
        assert_eq!(req.cancel_label, "Keep");
    }
}
