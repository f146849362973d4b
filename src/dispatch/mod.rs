//! Generic entity/action dispatch
//!
//! Translates `(entity kind, entity id)` pairs into concrete remote calls,
//! routing destructive actions through the confirmation gate and
//! navigation/contact actions straight back to the embedding shell. The
//! route table is built once at startup from the API's declared capability
//! table, so an unregistered pair is an explicit failure rather than a
//! silent `default` branch.

use crate::api::AdminApi;
use crate::confirm::{ConfirmCallback, ConfirmError, ConfirmationGate, ConfirmationRequest, Severity};
use crate::notify::NotificationStore;
use crate::remote::{MutateOptions, RemoteError, ResourceAdapter};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// The managed resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Agent,
    Landlord,
    Property,
    Inspection,
    Contact,
    Buyer,
    Testimonial,
    Administrator,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Agent,
        EntityKind::Landlord,
        EntityKind::Property,
        EntityKind::Inspection,
        EntityKind::Contact,
        EntityKind::Buyer,
        EntityKind::Testimonial,
        EntityKind::Administrator,
    ];

    /// URL path segment of the kind's collection
    pub fn collection_path(self) -> &'static str {
        match self {
            EntityKind::Agent => "agents",
            EntityKind::Landlord => "landlords",
            EntityKind::Property => "properties",
            EntityKind::Inspection => "inspections",
            EntityKind::Contact => "contacts",
            EntityKind::Buyer => "buyers",
            EntityKind::Testimonial => "testimonials",
            EntityKind::Administrator => "administrators",
        }
    }

    /// Lower-case singular label for user-facing text
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Agent => "agent",
            EntityKind::Landlord => "landlord",
            EntityKind::Property => "property",
            EntityKind::Inspection => "inspection",
            EntityKind::Contact => "contact",
            EntityKind::Buyer => "buyer",
            EntityKind::Testimonial => "testimonial",
            EntityKind::Administrator => "administrator",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every action the admin UI can take on an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityAction {
    View,
    Edit,
    Contact,
    Approve,
    Reject,
    Delete,
}

impl EntityAction {
    pub const ALL: [EntityAction; 6] = [
        EntityAction::View,
        EntityAction::Edit,
        EntityAction::Contact,
        EntityAction::Approve,
        EntityAction::Reject,
        EntityAction::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityAction::View => "view",
            EntityAction::Edit => "edit",
            EntityAction::Contact => "contact",
            EntityAction::Approve => "approve",
            EntityAction::Reject => "reject",
            EntityAction::Delete => "delete",
        }
    }

    /// True when the action changes server state and needs confirmation
    pub fn requires_confirmation(self) -> bool {
        matches!(
            self,
            EntityAction::Approve | EntityAction::Reject | EntityAction::Delete
        )
    }

    fn severity(self) -> Severity {
        match self {
            EntityAction::Approve => Severity::Success,
            EntityAction::Reject => Severity::Warning,
            EntityAction::Delete => Severity::Danger,
            _ => Severity::Info,
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            EntityAction::Approve => "approved",
            EntityAction::Reject => "rejected",
            EntityAction::Delete => "deleted",
            EntityAction::View => "viewed",
            EntityAction::Edit => "edited",
            EntityAction::Contact => "contacted",
        }
    }
}

impl fmt::Display for EntityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email/phone details used by the contact action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactChannels {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One dispatch request
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub kind: EntityKind,
    pub action: EntityAction,
    pub id: String,
    /// Human-readable name for confirmation/notification text
    pub name: Option<String>,
    pub contact: Option<ContactChannels>,
    /// Optional rejection reason
    pub reason: Option<String>,
}

impl ActionRequest {
    pub fn new(kind: EntityKind, action: EntityAction, id: impl Into<String>) -> Self {
        Self {
            kind,
            action,
            id: id.into(),
            name: None,
            contact: None,
            reason: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_contact(mut self, contact: ContactChannels) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// What the embedding shell should do next
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Navigate to an admin route
    Navigate(String),
    /// Open an external link (`mailto:` / `tel:`)
    OpenLink(String),
    /// A confirmation dialog is now pending
    ConfirmationPending,
    /// Nothing actionable; any feedback went through notifications
    Nothing,
}

/// Errors surfaced by the dispatcher itself
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The confirmation gate is locked by an in-flight callback
    #[error("a confirmation is already awaiting a decision")]
    Busy,
    /// Startup validation found a declared capability with no route
    #[error("declared capability ({kind}, {action}) has no registered route")]
    MissingRoute { kind: String, action: String },
}

/// What a destructive route needs to run
#[derive(Debug, Clone)]
pub struct ActionTarget {
    pub id: String,
    pub reason: Option<String>,
}

type ActionRoute =
    Arc<dyn Fn(ActionTarget) -> BoxFuture<'static, Result<(), RemoteError>> + Send + Sync>;

/// Routes entity actions to remote calls, through the confirmation gate
pub struct Dispatcher {
    routes: HashMap<(EntityKind, EntityAction), ActionRoute>,
    gate: ConfirmationGate,
    notifications: NotificationStore,
}

type RouteBuilder =
    fn(Arc<dyn AdminApi>, ResourceAdapter, EntityKind, EntityAction) -> ActionRoute;

impl Dispatcher {
    /// Build the route table from the API's capability table and validate it
    ///
    /// Every confirmation-requiring pair the capability table declares must
    /// map onto a route implementation this dispatcher carries. The two
    /// sides evolve independently (the table with the server, the builders
    /// with this module), so a declared-but-unimplemented pair is caught
    /// here instead of surfacing as a runtime fallback.
    pub fn new(
        api: Arc<dyn AdminApi>,
        adapter: ResourceAdapter,
        gate: ConfirmationGate,
        notifications: NotificationStore,
    ) -> Result<Self, DispatchError> {
        let mut routes: HashMap<(EntityKind, EntityAction), ActionRoute> = HashMap::new();
        for kind in EntityKind::ALL {
            for action in EntityAction::ALL {
                if !action.requires_confirmation() || !api.supports(kind, action) {
                    continue;
                }
                let builder =
                    Self::route_builder(action).ok_or_else(|| DispatchError::MissingRoute {
                        kind: kind.label().to_string(),
                        action: action.as_str().to_string(),
                    })?;
                routes.insert(
                    (kind, action),
                    builder(api.clone(), adapter.clone(), kind, action),
                );
            }
        }

        debug!(routes = routes.len(), "dispatch route table built");
        Ok(Self {
            routes,
            gate,
            notifications,
        })
    }

    /// The route implementation for an action, if this dispatcher has one
    fn route_builder(action: EntityAction) -> Option<RouteBuilder> {
        match action {
            EntityAction::Approve | EntityAction::Reject | EntityAction::Delete => {
                Some(Self::remote_route)
            }
            EntityAction::View | EntityAction::Edit | EntityAction::Contact => None,
        }
    }

    fn remote_route(
        api: Arc<dyn AdminApi>,
        adapter: ResourceAdapter,
        kind: EntityKind,
        action: EntityAction,
    ) -> ActionRoute {
        Arc::new(move |target: ActionTarget| {
            let api = api.clone();
            let adapter = adapter.clone();
            Box::pin(async move {
                let success_message = format!(
                    "{} {}",
                    capitalize(kind.label()),
                    action.past_tense()
                );
                adapter
                    .mutate(
                        target,
                        move |t: ActionTarget| async move {
                            match action {
                                EntityAction::Approve => api.approve(kind, &t.id).await,
                                EntityAction::Reject => {
                                    api.reject(kind, &t.id, t.reason.as_deref()).await
                                }
                                EntityAction::Delete => api.delete(kind, &t.id).await,
                                // Non-destructive actions never reach a remote route
                                _ => Err(RemoteError::unsupported(
                                    kind.label(),
                                    action.as_str(),
                                )),
                            }
                        },
                        MutateOptions::<serde_json::Value, ActionTarget>::new()
                            .invalidates([kind.collection_path()])
                            .success_message(success_message),
                    )
                    .await
                    .map(|_| ())
            })
        })
    }

    /// Dispatch one action
    ///
    /// Navigation and contact resolve immediately; destructive actions open
    /// the confirmation gate and resolve to `ConfirmationPending` — the
    /// remote call runs only once the user confirms.
    pub async fn dispatch(&self, request: ActionRequest) -> Result<DispatchOutcome, DispatchError> {
        let ActionRequest {
            kind,
            action,
            id,
            name,
            contact,
            reason,
        } = request;
        let display = name.unwrap_or_else(|| format!("this {}", kind.label()));
        debug!(kind = %kind, action = %action, id = %id, "dispatching action");

        match action {
            EntityAction::View => Ok(DispatchOutcome::Navigate(format!(
                "/admin/{}/{}",
                kind.collection_path(),
                id
            ))),
            EntityAction::Edit => Ok(DispatchOutcome::Navigate(format!(
                "/admin/{}/{}/edit",
                kind.collection_path(),
                id
            ))),
            EntityAction::Contact => {
                let channels = contact.unwrap_or_default();
                if let Some(email) = channels.email.filter(|e| !e.trim().is_empty()) {
                    Ok(DispatchOutcome::OpenLink(format!("mailto:{email}")))
                } else if let Some(phone) = channels.phone.filter(|p| !p.trim().is_empty()) {
                    Ok(DispatchOutcome::OpenLink(format!("tel:{phone}")))
                } else {
                    self.notifications.warning(
                        "Missing contact details",
                        format!("{display} has no email or phone number on file"),
                    );
                    Ok(DispatchOutcome::Nothing)
                }
            }
            EntityAction::Approve | EntityAction::Reject | EntityAction::Delete => {
                let (title, description, confirm_label) = confirmation_text(action, kind, &display);
                let callback = self.destructive_callback(kind, action, id, reason);
                self.gate
                    .request(
                        ConfirmationRequest::new(title, description, action.severity(), callback)
                            .with_labels(confirm_label, "Cancel"),
                    )
                    .await
                    .map_err(|err| match err {
                        ConfirmError::Busy => DispatchError::Busy,
                        // request() only fails with Busy; callback errors
                        // belong to confirm()
                        ConfirmError::Callback(_) => DispatchError::Busy,
                    })?;
                Ok(DispatchOutcome::ConfirmationPending)
            }
        }
    }

    fn destructive_callback(
        &self,
        kind: EntityKind,
        action: EntityAction,
        id: String,
        reason: Option<String>,
    ) -> ConfirmCallback {
        let route = self.routes.get(&(kind, action)).cloned();
        let notifications = self.notifications.clone();
        Arc::new(move || {
            let target = ActionTarget {
                id: id.clone(),
                reason: reason.clone(),
            };
            match &route {
                Some(route) => route(target),
                None => {
                    // Unimplemented pair: fail fast inside the callback so
                    // the gate's rejection path surfaces it
                    let notifications = notifications.clone();
                    Box::pin(async move {
                        let err = RemoteError::unsupported(kind.label(), action.as_str());
                        notifications.error("Action unavailable", err.to_string());
                        Err(err)
                    })
                }
            }
        })
    }

    /// True when a remote route exists for the pair
    pub fn has_route(&self, kind: EntityKind, action: EntityAction) -> bool {
        self.routes.contains_key(&(kind, action))
    }
}

fn confirmation_text(
    action: EntityAction,
    kind: EntityKind,
    display: &str,
) -> (String, String, String) {
    match action {
        EntityAction::Approve => (
            format!("Approve {}", kind.label()),
            format!("Approve {display}?"),
            "Approve".to_string(),
        ),
        EntityAction::Reject => (
            format!("Reject {}", kind.label()),
            format!("Are you sure you want to reject {display}?"),
            "Reject".to_string(),
        ),
        _ => (
            format!("Delete {}", kind.label()),
            format!("Are you sure you want to delete {display}? This action cannot be undone."),
            "Delete".to_string(),
        ),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
