//! The uniform remote-call envelope and the normalized page shape

use super::error::RemoteError;
use serde::{Deserialize, Serialize};

/// The wrapper every remote operation returns
///
/// Consumers branch on `success` alone; HTTP status never leaks past the
/// client boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Successful envelope with no payload (acknowledgement only)
    pub fn ack() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: None,
        }
    }

    /// Failed envelope with an error message
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    /// Attach a server-provided message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The failure message a user should see, when `success` is false
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "The request could not be completed".to_string())
    }

    /// Convert into a result, requiring a data payload on success
    pub fn into_data(self) -> Result<T, RemoteError> {
        if !self.success {
            return Err(RemoteError::operation_failed(self.failure_message()));
        }
        self.data
            .ok_or_else(|| RemoteError::transport("successful response carried no data"))
    }
}

/// One fetched page of a collection
///
/// Recomputed wholesale on every fetch; consumers treat a delivered page
/// as immutable and replace it entirely on the next fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Create a page, computing `total_pages` from `total` and `per_page`
    pub fn new(items: Vec<T>, current_page: u32, per_page: u32, total: u64) -> Self {
        Self {
            items,
            current_page,
            per_page,
            total,
            total_pages: compute_total_pages(total, per_page),
        }
    }

    /// An empty first page
    pub fn empty(per_page: u32) -> Self {
        Self::new(Vec::new(), 1, per_page, 0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Ceiling division; zero `per_page` yields zero pages rather than dividing by zero
pub(crate) fn compute_total_pages(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page as u64) as u32
}
