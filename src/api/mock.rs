//! Scripted in-memory [`AdminApi`] for tests

use super::query::CollectionFilter;
use super::traits::{default_capabilities, AdminApi};
use crate::dispatch::{EntityAction, EntityKind};
use crate::remote::{Envelope, Page, RemoteError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One recorded call against the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub kind: EntityKind,
    pub action: String,
    pub id: Option<String>,
    pub page: Option<u32>,
    pub filter: Option<String>,
    pub reason: Option<String>,
}

struct ScriptedList {
    delay: Duration,
    result: Result<Envelope<Page<Value>>, RemoteError>,
}

/// Scripted API double
///
/// List and action results are consumed front-to-back in call order; an
/// exhausted script falls back to an empty page / plain acknowledgement.
/// Scripted delays make overlapping-fetch interleavings reproducible.
#[derive(Default)]
pub struct MockAdminApi {
    lists: Mutex<VecDeque<ScriptedList>>,
    actions: Mutex<VecDeque<Result<Envelope<Value>, RemoteError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    withdrawn: Vec<(EntityKind, EntityAction)>,
}

impl MockAdminApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Additionally report these pairs as unsupported in the capability table
    pub fn without_capability(mut self, kind: EntityKind, action: EntityAction) -> Self {
        self.withdrawn.push((kind, action));
        self
    }

    /// Queue the next list result
    pub fn script_list(&self, result: Result<Envelope<Page<Value>>, RemoteError>) {
        self.script_list_delayed(Duration::ZERO, result);
    }

    /// Queue the next list result, delivered after `delay`
    pub fn script_list_delayed(
        &self,
        delay: Duration,
        result: Result<Envelope<Page<Value>>, RemoteError>,
    ) {
        self.lists
            .lock()
            .expect("mock list script lock poisoned")
            .push_back(ScriptedList { delay, result });
    }

    /// Queue the next action (approve/reject/delete) result
    pub fn script_action(&self, result: Result<Envelope<Value>, RemoteError>) {
        self.actions
            .lock()
            .expect("mock action script lock poisoned")
            .push_back(result);
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .expect("mock call log lock poisoned")
            .clone()
    }

    fn record(&self, call: RecordedCall) {
        self.calls
            .lock()
            .expect("mock call log lock poisoned")
            .push(call);
    }

    async fn next_action(
        &self,
        kind: EntityKind,
        action: &str,
        id: &str,
        reason: Option<&str>,
    ) -> Result<Envelope<Value>, RemoteError> {
        self.record(RecordedCall {
            kind,
            action: action.to_string(),
            id: Some(id.to_string()),
            page: None,
            filter: None,
            reason: reason.map(str::to_string),
        });
        let scripted = self
            .actions
            .lock()
            .expect("mock action script lock poisoned")
            .pop_front();
        scripted.unwrap_or_else(|| Ok(Envelope::ack()))
    }
}

#[async_trait]
impl AdminApi for MockAdminApi {
    async fn list(
        &self,
        kind: EntityKind,
        filter: &CollectionFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Envelope<Page<Value>>, RemoteError> {
        self.record(RecordedCall {
            kind,
            action: "list".to_string(),
            id: None,
            page: Some(page),
            filter: Some(filter.canonical()),
            reason: None,
        });
        let scripted = self
            .lists
            .lock()
            .expect("mock list script lock poisoned")
            .pop_front();
        match scripted {
            Some(ScriptedList { delay, result }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(Envelope::ok(Page::empty(per_page))),
        }
    }

    async fn approve(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Envelope<Value>, RemoteError> {
        self.next_action(kind, "approve", id, None).await
    }

    async fn reject(
        &self,
        kind: EntityKind,
        id: &str,
        reason: Option<&str>,
    ) -> Result<Envelope<Value>, RemoteError> {
        self.next_action(kind, "reject", id, reason).await
    }

    async fn delete(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Envelope<Value>, RemoteError> {
        self.next_action(kind, "delete", id, None).await
    }

    fn supports(&self, kind: EntityKind, action: EntityAction) -> bool {
        default_capabilities(kind, action) && !self.withdrawn.contains(&(kind, action))
    }
}
