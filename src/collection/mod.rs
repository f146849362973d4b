//! Per-entity-type paginated collection controller
//!
//! One controller owns the filter set, page cursor, and the most recently
//! completed page for a single collection. Refetching is always
//! caller-triggered: filter change, page change, explicit refresh, or a
//! mutation invalidating the collection's cache prefix.

use crate::api::CollectionFilter;
use crate::remote::{Envelope, Page, RemoteError, ResourceAdapter};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Where a controller's pages come from
#[async_trait]
pub trait CollectionSource<T>: Send + Sync {
    async fn fetch_page(
        &self,
        filter: &CollectionFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Envelope<Page<T>>, RemoteError>;
}

/// Explicit fetch lifecycle
///
/// `Loading` and `Failed` carry the previously delivered page so a render
/// layer can keep stale data visible deliberately instead of relying on
/// leftover state.
#[derive(Debug, Clone)]
pub enum FetchState<T> {
    Idle,
    Loading { previous: Option<Page<T>> },
    Ready(Page<T>),
    Failed {
        error: RemoteError,
        previous: Option<Page<T>>,
    },
}

impl<T> FetchState<T> {
    /// The page a renderer should show right now, stale or fresh
    pub fn page(&self) -> Option<&Page<T>> {
        match self {
            FetchState::Idle => None,
            FetchState::Loading { previous } => previous.as_ref(),
            FetchState::Ready(page) => Some(page),
            FetchState::Failed { previous, .. } => previous.as_ref(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading { .. })
    }

    fn take_page(self) -> Option<Page<T>> {
        match self {
            FetchState::Idle => None,
            FetchState::Loading { previous } => previous,
            FetchState::Ready(page) => Some(page),
            FetchState::Failed { previous, .. } => previous,
        }
    }
}

struct Inner<T> {
    filter: CollectionFilter,
    page: u32,
    per_page: u32,
    state: FetchState<T>,
}

/// Controller for one paginated collection
///
/// Cloning shares the underlying state, so one logical collection can be
/// driven from several places (a page component and a refresh hook, say).
pub struct PaginatedCollection<T> {
    prefix: String,
    source: Arc<dyn CollectionSource<T>>,
    adapter: ResourceAdapter,
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for PaginatedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            prefix: self.prefix.clone(),
            source: self.source.clone(),
            adapter: self.adapter.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<T> PaginatedCollection<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(
        prefix: impl Into<String>,
        source: Arc<dyn CollectionSource<T>>,
        adapter: ResourceAdapter,
        per_page: u32,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            source,
            adapter,
            inner: Arc::new(Mutex::new(Inner {
                filter: CollectionFilter::new(),
                page: 1,
                per_page,
                state: FetchState::Idle,
            })),
        }
    }

    /// Replace the filter set
    ///
    /// Does not reset the page cursor: callers changing filters fetch with
    /// page 1 explicitly, via [`fetch_with`](Self::fetch_with).
    pub async fn set_filters(&self, filter: CollectionFilter) {
        self.inner.lock().await.filter = filter;
    }

    /// Move the page cursor
    ///
    /// Bounds are the caller's responsibility (navigation beyond
    /// `total_pages` is disabled in the UI); whatever page is requested is
    /// faithfully fetched, with no client-side clamping.
    pub async fn set_page(&self, page: u32) {
        self.inner.lock().await.page = page;
    }

    /// Replace filters and page together, then fetch
    pub async fn fetch_with(
        &self,
        filter: CollectionFilter,
        page: u32,
    ) -> Result<Page<T>, RemoteError> {
        {
            let mut inner = self.inner.lock().await;
            inner.filter = filter;
            inner.page = page;
        }
        self.fetch().await
    }

    /// Fetch the current filters/page through the adapter's cache
    ///
    /// While in flight the state is `Loading` with the previous page still
    /// attached. On completion the page is replaced wholesale. Note the
    /// deliberate absence of request sequencing: with overlapping fetches
    /// the last one to *complete* wins, even if it was issued first.
    /// A hardened variant would carry a monotonic request token and
    /// discard superseded completions.
    pub async fn fetch(&self) -> Result<Page<T>, RemoteError> {
        let (filter, page, per_page) = {
            let mut inner = self.inner.lock().await;
            let previous = std::mem::replace(&mut inner.state, FetchState::Idle).take_page();
            inner.state = FetchState::Loading { previous };
            (inner.filter.clone(), inner.page, inner.per_page)
        };

        let key = self.cache_key(&filter, page, per_page);
        debug!(collection = %self.prefix, key = %key, "fetching page");
        let result = self
            .adapter
            .query(&key, self.source.fetch_page(&filter, page, per_page))
            .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(fetched) => {
                inner.state = FetchState::Ready(fetched.clone());
                Ok(fetched)
            }
            Err(error) => {
                let previous =
                    std::mem::replace(&mut inner.state, FetchState::Idle).take_page();
                inner.state = FetchState::Failed {
                    error: error.clone(),
                    previous,
                };
                Err(error)
            }
        }
    }

    /// Drop this collection's cached pages and refetch the current view
    pub async fn refresh(&self) -> Result<Page<T>, RemoteError> {
        self.adapter.cache().invalidate_prefix(&self.prefix);
        self.fetch().await
    }

    /// The currently visible items (stale while loading, per the fetch state)
    pub async fn items(&self) -> Vec<T> {
        self.inner
            .lock()
            .await
            .state
            .page()
            .map(|page| page.items.clone())
            .unwrap_or_default()
    }

    pub async fn total(&self) -> u64 {
        self.inner
            .lock()
            .await
            .state
            .page()
            .map(|page| page.total)
            .unwrap_or(0)
    }

    pub async fn total_pages(&self) -> u32 {
        self.inner
            .lock()
            .await
            .state
            .page()
            .map(|page| page.total_pages)
            .unwrap_or(0)
    }

    pub async fn current_filter(&self) -> CollectionFilter {
        self.inner.lock().await.filter.clone()
    }

    pub async fn current_page(&self) -> u32 {
        self.inner.lock().await.page
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.state.is_loading()
    }

    /// Snapshot of the full fetch state for rendering
    pub async fn state(&self) -> FetchState<T> {
        self.inner.lock().await.state.clone()
    }

    fn cache_key(&self, filter: &CollectionFilter, page: u32, per_page: u32) -> String {
        format!(
            "{}:{}:page={page}:per={per_page}",
            self.prefix,
            filter.canonical()
        )
    }
}
