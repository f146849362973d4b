//! Transient user-facing notifications
//!
//! Components report outcomes here; a render layer outside this crate
//! observes the store through [`NotificationStore::subscribe`].

mod store;
mod types;

pub use store::{NotificationStore, StoreEvent};
pub use types::{Notification, NotificationKind};
