//! The remote admin API boundary: filters, the `AdminApi` trait, the
//! reqwest-backed client, and a scripted mock for tests

pub mod client;
pub mod mock;
pub mod query;
pub mod traits;

pub use client::HttpAdminClient;
pub use mock::{MockAdminApi, RecordedCall};
pub use query::{CollectionFilter, FilterValue};
pub use traits::{default_capabilities, AdminApi};
