//! Records for the managed entity collections

use crate::remote::{Page, RemoteError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Lifecycle of an agent account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Pending,
    Active,
    Suspended,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: AgentStatus,
    /// Number of listings currently attributed to the agent
    #[serde(default)]
    pub listings: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Listing lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Draft,
    Pending,
    Active,
    Sold,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub title: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub price: u64,
    pub status: PropertyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

/// Progress of an inspection through its workflow (the wire's `stage` filter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStage {
    Requested,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub id: String,
    pub property_id: String,
    pub stage: InspectionStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspector: Option<String>,
}

/// Moderation state of a testimonial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestimonialStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: String,
    pub author: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    pub status: TestimonialStatus,
}

/// Decode a normalized JSON page into typed records
///
/// A record that does not match the expected shape is a malformed payload,
/// reported as a transport-level failure.
pub fn typed_page<T: DeserializeOwned>(
    page: Page<serde_json::Value>,
) -> Result<Page<T>, RemoteError> {
    let Page {
        items,
        current_page,
        per_page,
        total,
        total_pages,
    } = page;
    let items = items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|err| RemoteError::transport(format!("unexpected record shape: {err}")))
        })
        .collect::<Result<Vec<T>, _>>()?;
    Ok(Page {
        items,
        current_page,
        per_page,
        total,
        total_pages,
    })
}
