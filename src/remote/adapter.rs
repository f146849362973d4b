//! Query/mutation adapter: loading flag, cache invalidation, uniform notifications

use super::cache::PageCache;
use super::envelope::Envelope;
use super::error::RemoteError;
use crate::notify::NotificationStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Options controlling one `mutate` call
pub struct MutateOptions<T, V> {
    /// Cache prefixes to invalidate on success
    pub invalidates: Vec<String>,
    /// Overrides the envelope's `message` in the success notification
    pub success_message: Option<String>,
    /// Overrides the error's own message in the error notification
    pub error_message: Option<String>,
    /// Called after a successful mutation with the returned data and variables
    pub on_success: Option<Box<dyn FnOnce(Option<&T>, &V) + Send>>,
    /// Called after a failed mutation with the error
    pub on_error: Option<Box<dyn FnOnce(&RemoteError) + Send>>,
}

impl<T, V> MutateOptions<T, V> {
    pub fn new() -> Self {
        Self {
            invalidates: Vec::new(),
            success_message: None,
            error_message: None,
            on_success: None,
            on_error: None,
        }
    }

    pub fn invalidates<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.invalidates = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn on_success(mut self, f: impl FnOnce(Option<&T>, &V) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&RemoteError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl<T, V> Default for MutateOptions<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the loading counter on drop, so the flag clears on every
/// exit path (success, failure, or unwind).
struct LoadingGuard {
    counter: Arc<AtomicUsize>,
}

impl LoadingGuard {
    fn engage(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self {
            counter: counter.clone(),
        }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Wraps remote calls with caching, a shared loading signal, and uniform
/// success/error notification emission
///
/// Cloning shares the cache, the loading counter, and the notification
/// store.
#[derive(Clone)]
pub struct ResourceAdapter {
    notifications: NotificationStore,
    cache: PageCache,
    loading: Arc<AtomicUsize>,
}

impl ResourceAdapter {
    pub fn new(notifications: NotificationStore) -> Self {
        Self {
            notifications,
            cache: PageCache::new(),
            loading: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The shared page cache
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// The notification store this adapter reports through
    pub fn notifications(&self) -> &NotificationStore {
        &self.notifications
    }

    /// True while at least one mutation is in flight
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    /// Run a query, serving from cache when a valid entry exists under `key`
    ///
    /// On an envelope with `success: false`, emits an error notification and
    /// returns `OperationFailed`; transport failures likewise notify and
    /// propagate. Successful data is cached under `key`.
    pub async fn query<T, Fut>(&self, key: &str, fetch: Fut) -> Result<T, RemoteError>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = Result<Envelope<T>, RemoteError>>,
    {
        if let Some(cached) = self.cache.get(key) {
            match serde_json::from_value(cached) {
                Ok(data) => {
                    debug!(key = %key, "query served from cache");
                    return Ok(data);
                }
                Err(err) => {
                    // Corrupt entry: drop it and fall through to a refetch
                    warn!(key = %key, "discarding undecodable cache entry: {err}");
                    self.cache.remove(key);
                }
            }
        }

        match fetch.await {
            Ok(envelope) if envelope.success => {
                let data = envelope.into_data()?;
                if let Ok(value) = serde_json::to_value(&data) {
                    self.cache.insert(key, value);
                }
                Ok(data)
            }
            Ok(envelope) => {
                let message = envelope.failure_message();
                self.notifications.error("Request failed", &message);
                Err(RemoteError::operation_failed(message))
            }
            Err(err) => {
                self.notifications.error("Request failed", err.to_string());
                Err(err)
            }
        }
    }

    /// Run a mutation with a guaranteed-clearing loading flag
    ///
    /// Success: invalidate the named cache prefixes, emit a success
    /// notification (explicit `success_message` wins over the envelope's
    /// `message`), call `on_success`. Failure: emit an error notification
    /// (`error_message` or the error's own message), call `on_error`,
    /// leave all caches untouched, and propagate the error.
    pub async fn mutate<T, V, F, Fut>(
        &self,
        variables: V,
        mutate_fn: F,
        options: MutateOptions<T, V>,
    ) -> Result<Option<T>, RemoteError>
    where
        V: Clone,
        F: FnOnce(V) -> Fut,
        Fut: Future<Output = Result<Envelope<T>, RemoteError>>,
    {
        let _guard = LoadingGuard::engage(&self.loading);

        let outcome = mutate_fn(variables.clone()).await;
        match outcome {
            Ok(envelope) if envelope.success => {
                for prefix in &options.invalidates {
                    self.cache.invalidate_prefix(prefix);
                }
                let message = options
                    .success_message
                    .or(envelope.message)
                    .unwrap_or_else(|| "Operation completed".to_string());
                self.notifications.success("Success", message);
                if let Some(on_success) = options.on_success {
                    on_success(envelope.data.as_ref(), &variables);
                }
                Ok(envelope.data)
            }
            Ok(envelope) => {
                let err = RemoteError::operation_failed(envelope.failure_message());
                self.report_mutation_failure(&err, options.error_message, options.on_error);
                Err(err)
            }
            Err(err) => {
                self.report_mutation_failure(&err, options.error_message, options.on_error);
                Err(err)
            }
        }
    }

    fn report_mutation_failure(
        &self,
        err: &RemoteError,
        error_message: Option<String>,
        on_error: Option<Box<dyn FnOnce(&RemoteError) + Send>>,
    ) {
        let message = error_message.unwrap_or_else(|| err.to_string());
        self.notifications.error("Action failed", message);
        if let Some(on_error) = on_error {
            on_error(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationKind;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn adapter() -> ResourceAdapter {
        ResourceAdapter::new(NotificationStore::default())
    }

    #[tokio::test]
    async fn test_query_success_caches_result() {
        let adapter = adapter();
        let data = adapter
            .query("agents:page=1", async { Ok(Envelope::ok(json!([1, 2, 3]))) })
            .await
            .unwrap();
        assert_eq!(data, json!([1, 2, 3]));
        assert_eq!(adapter.cache().len(), 1);

        // Second query is served from cache: the fetch future is never polled
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_fetch = calls.clone();
        let cached: serde_json::Value = adapter
            .query("agents:page=1", async move {
                calls_in_fetch.fetch_add(1, Ordering::SeqCst);
                Ok(Envelope::ok(json!("fresh")))
            })
            .await
            .unwrap();
        assert_eq!(cached, json!([1, 2, 3]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_envelope_failure_notifies_and_errors() {
        let adapter = adapter();
        let result: Result<serde_json::Value, _> = adapter
            .query("agents:page=1", async {
                Ok(Envelope::failed("Agents are unavailable"))
            })
            .await;

        match result {
            Err(RemoteError::OperationFailed { message }) => {
                assert_eq!(message, "Agents are unavailable");
            }
            other => panic!("expected OperationFailed, got {other:?}"),
        }
        let notifications = adapter.notifications().snapshot();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Error);
        assert_eq!(notifications[0].message, "Agents are unavailable");
        // Failures are never cached
        assert!(adapter.cache().is_empty());
    }

    #[tokio::test]
    async fn test_query_transport_failure_notifies() {
        let adapter = adapter();
        let result: Result<serde_json::Value, _> = adapter
            .query("agents:page=1", async {
                Err(RemoteError::transport("connection refused"))
            })
            .await;
        assert!(matches!(result, Err(RemoteError::Transport { .. })));
        assert_eq!(adapter.notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_mutate_success_invalidates_and_notifies() {
        let adapter = adapter();
        adapter.cache().insert("agents:page=1", json!([1]));
        adapter.cache().insert("properties:page=1", json!([2]));

        let result = adapter
            .mutate(
                json!({"id": "42"}),
                |_vars| async { Ok(Envelope::<serde_json::Value>::ack()) },
                MutateOptions::new()
                    .invalidates(["agents"])
                    .success_message("Deleted"),
            )
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(!adapter.is_loading());

        // Only the named collection was invalidated
        assert!(adapter.cache().get("agents:page=1").is_none());
        assert!(adapter.cache().get("properties:page=1").is_some());

        let notifications = adapter.notifications().snapshot();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Success);
        assert_eq!(notifications[0].message, "Deleted");
    }

    #[tokio::test]
    async fn test_mutate_failure_keeps_cache_and_propagates() {
        let adapter = adapter();
        adapter.cache().insert("agents:page=1", json!([1]));

        let result = adapter
            .mutate(
                json!({"id": "42"}),
                |_vars| async {
                    Ok(Envelope::<serde_json::Value>::failed(
                        "Agent has active listings",
                    ))
                },
                MutateOptions::new().invalidates(["agents"]),
            )
            .await;

        match result {
            Err(RemoteError::OperationFailed { message }) => {
                assert_eq!(message, "Agent has active listings");
            }
            other => panic!("expected OperationFailed, got {other:?}"),
        }
        assert!(!adapter.is_loading());
        // Cache untouched on failure
        assert!(adapter.cache().get("agents:page=1").is_some());

        let notifications = adapter.notifications().snapshot();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Error);
        assert_eq!(notifications[0].message, "Agent has active listings");
    }

    #[tokio::test]
    async fn test_mutate_success_message_precedence() {
        let adapter = adapter();
        // Envelope message used when no explicit override
        adapter
            .mutate(
                (),
                |_| async {
                    Ok(Envelope::<serde_json::Value>::ack().with_message("Saved by server"))
                },
                MutateOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(adapter.notifications().snapshot()[0].message, "Saved by server");

        // Explicit success_message wins over the envelope's
        adapter
            .mutate(
                (),
                |_| async {
                    Ok(Envelope::<serde_json::Value>::ack().with_message("Saved by server"))
                },
                MutateOptions::new().success_message("Saved"),
            )
            .await
            .unwrap();
        assert_eq!(adapter.notifications().snapshot()[1].message, "Saved");
    }

    #[tokio::test]
    async fn test_mutate_callbacks_fire() {
        let adapter = adapter();
        let succeeded = Arc::new(AtomicUsize::new(0));
        let s = succeeded.clone();
        adapter
            .mutate(
                "agent-7".to_string(),
                |_| async { Ok(Envelope::ok(json!({"id": "agent-7"}))) },
                MutateOptions::new().on_success(move |data, vars| {
                    assert_eq!(vars, "agent-7");
                    assert!(data.is_some());
                    s.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await
            .unwrap();
        assert_eq!(succeeded.load(Ordering::SeqCst), 1);

        let failed = Arc::new(AtomicUsize::new(0));
        let f = failed.clone();
        let _ = adapter
            .mutate(
                (),
                |_| async { Err::<Envelope<serde_json::Value>, _>(RemoteError::transport("down")) },
                MutateOptions::new().on_error(move |err| {
                    assert!(matches!(err, RemoteError::Transport { .. }));
                    f.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loading_flag_set_during_mutation() {
        let adapter = adapter();
        let observed = {
            let probe = adapter.clone();
            adapter
                .mutate(
                    (),
                    move |_| async move {
                        let mid_flight = probe.is_loading();
                        Ok(Envelope::<serde_json::Value>::ack().with_message(format!("{mid_flight}")))
                    },
                    MutateOptions::new(),
                )
                .await
                .unwrap();
            adapter.notifications().snapshot()[0].message.clone()
        };
        assert_eq!(observed, "true");
        assert!(!adapter.is_loading());
    }
}
