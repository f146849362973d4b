//! Admin dashboard core for an estate management platform
//!
//! Client-side building blocks for the admin surface:
//! - Notification store with ordered toasts and broadcast change events
//! - Confirmation gate serializing destructive actions behind a dialog
//! - Resource adapter wrapping remote calls with caching and notifications
//! - Paginated collection controller for filterable entity lists
//! - Action dispatcher mapping entity/action pairs to remote routes

pub mod api;
pub mod collection;
pub mod confirm;
pub mod dispatch;
pub mod models;
pub mod notify;
pub mod remote;

use crate::api::{AdminApi, CollectionFilter, HttpAdminClient};
use crate::collection::{CollectionSource, PaginatedCollection};
use crate::confirm::ConfirmationGate;
use crate::dispatch::{Dispatcher, EntityKind};
use crate::notify::NotificationStore;
use crate::remote::{Envelope, Page, RemoteError, ResourceAdapter};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub api: ApiYamlConfig,
    pub collections: CollectionsYamlConfig,
    pub notifications: NotificationsYamlConfig,
}

/// Remote API section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiYamlConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Bearer token; usually injected via env instead of the file
    pub token: Option<String>,
}

impl Default for ApiYamlConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api".into(),
            timeout_secs: 30,
            token: None,
        }
    }
}

/// Collection defaults section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionsYamlConfig {
    pub per_page: u32,
}

impl Default for CollectionsYamlConfig {
    fn default() -> Self {
        Self { per_page: 10 }
    }
}

/// Notification store section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsYamlConfig {
    /// Broadcast channel capacity for change events
    pub capacity: usize,
}

impl Default for NotificationsYamlConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_timeout_secs: u64,
    pub api_token: Option<String>,
    pub per_page: u32,
    pub notification_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        Ok(Self {
            api_base_url: std::env::var("ADMIN_API_URL").unwrap_or(yaml.api.base_url),
            api_timeout_secs: std::env::var("ADMIN_API_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.api.timeout_secs),
            api_token: std::env::var("ADMIN_API_TOKEN").ok().or(yaml.api.token),
            per_page: std::env::var("ADMIN_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.collections.per_page),
            notification_capacity: yaml.notifications.capacity,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Shared state
// ============================================================================

/// Adapts an [`AdminApi`] collection endpoint to a [`CollectionSource`]
struct ApiCollectionSource {
    api: Arc<dyn AdminApi>,
    kind: EntityKind,
}

#[async_trait]
impl CollectionSource<serde_json::Value> for ApiCollectionSource {
    async fn fetch_page(
        &self,
        filter: &CollectionFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Envelope<Page<serde_json::Value>>, RemoteError> {
        self.api.list(self.kind, filter, page, per_page).await
    }
}

/// Shared application state wiring all the pieces together
#[derive(Clone)]
pub struct AdminCore {
    pub api: Arc<dyn AdminApi>,
    pub notifications: NotificationStore,
    pub gate: ConfirmationGate,
    pub adapter: ResourceAdapter,
    pub dispatcher: Arc<Dispatcher>,
    pub config: Arc<Config>,
}

impl AdminCore {
    /// Create state backed by the HTTP client
    pub fn new(config: Config) -> Result<Self> {
        let api: Arc<dyn AdminApi> = Arc::new(HttpAdminClient::new(
            &config.api_base_url,
            Duration::from_secs(config.api_timeout_secs),
            config.api_token.clone(),
        )?);
        Self::with_api(api, config)
    }

    /// Create state against any [`AdminApi`] implementation
    pub fn with_api(api: Arc<dyn AdminApi>, config: Config) -> Result<Self> {
        let notifications = NotificationStore::new(config.notification_capacity);
        let gate = ConfirmationGate::new();
        let adapter = ResourceAdapter::new(notifications.clone());
        let dispatcher = Arc::new(Dispatcher::new(
            api.clone(),
            adapter.clone(),
            gate.clone(),
            notifications.clone(),
        )?);

        Ok(Self {
            api,
            notifications,
            gate,
            adapter,
            dispatcher,
            config: Arc::new(config),
        })
    }

    /// Build a paginated collection controller for one entity kind
    pub fn collection(&self, kind: EntityKind) -> PaginatedCollection<serde_json::Value> {
        let source = Arc::new(ApiCollectionSource {
            api: self.api.clone(),
            kind,
        });
        PaginatedCollection::new(
            kind.collection_path(),
            source,
            self.adapter.clone(),
            self.config.per_page,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
