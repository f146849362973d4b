//! Remote-call plumbing: the uniform envelope, error taxonomy, page cache,
//! and the query/mutation adapter

mod adapter;
mod cache;
mod envelope;
mod error;

pub(crate) use envelope::compute_total_pages;

pub use adapter::{MutateOptions, ResourceAdapter};
pub use cache::PageCache;
pub use envelope::{Envelope, Page};
pub use error::RemoteError;
