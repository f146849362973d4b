//! Trait abstraction over the remote admin API

use super::query::CollectionFilter;
use crate::dispatch::{EntityAction, EntityKind};
use crate::remote::{Envelope, Page, RemoteError};
use async_trait::async_trait;

/// Every remote operation the admin core performs, behind one seam
///
/// List responses are normalized to `Page<serde_json::Value>` at this
/// boundary; typed decoding happens in [`crate::models`]. Action calls
/// return the standard envelope with an optional payload.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Fetch one page of a collection
    async fn list(
        &self,
        kind: EntityKind,
        filter: &CollectionFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Envelope<Page<serde_json::Value>>, RemoteError>;

    /// Approve an entity
    async fn approve(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Envelope<serde_json::Value>, RemoteError>;

    /// Reject an entity, with an optional reason
    async fn reject(
        &self,
        kind: EntityKind,
        id: &str,
        reason: Option<&str>,
    ) -> Result<Envelope<serde_json::Value>, RemoteError>;

    /// Delete an entity
    async fn delete(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Envelope<serde_json::Value>, RemoteError>;

    /// Declared capability table: which (kind, action) pairs have a route
    ///
    /// The dispatcher validates its registry against this at startup.
    fn supports(&self, kind: EntityKind, action: EntityAction) -> bool {
        default_capabilities(kind, action)
    }
}

/// The capability table the admin API exposes
///
/// Navigation and contact never need a remote route; every kind can be
/// deleted; approval/rejection exists only for the moderated kinds.
pub fn default_capabilities(kind: EntityKind, action: EntityAction) -> bool {
    use EntityAction::*;
    use EntityKind::*;
    match action {
        View | Edit | EntityAction::Contact | Delete => true,
        Approve | Reject => matches!(
            kind,
            Agent | Landlord | Property | Inspection | Testimonial
        ),
    }
}
