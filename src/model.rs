//! Operations-center entity schema
//!
//! Shared data shapes transported by the gateway. Entities are opaque to the
//! gateway: it forwards them between the protocol endpoint and the upstream
//! API, and never interprets their business fields beyond what pagination
//! and health evaluation require.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generic paginated envelope returned by list-shaped upstream collections.
///
/// `next_cursor` is `None` exactly when the upstream signaled no further
/// pages. The gateway never synthesizes or mutates cursor values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in upstream order
    pub items: Vec<T>,
    /// Opaque position token for the next page
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Tenant record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant id
    pub id: i64,
    /// Tenant name
    pub name: String,
    /// Free-form tenant metadata
    pub metadata: Value,
}

/// Workbench record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbench {
    /// Workbench id
    pub id: i64,
    /// Owning tenant
    #[serde(rename = "tenantId")]
    pub tenant_id: i64,
    /// Workbench code
    pub code: String,
    /// Workbench configuration
    pub config: Value,
}

/// Request record
///
/// Named `RequestRecord` to avoid clashing with the HTTP request types used
/// throughout the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Request id
    pub id: i64,
    /// Owning tenant
    #[serde(rename = "tenantId")]
    pub tenant_id: i64,
    /// Workbench handling this request
    #[serde(rename = "workbenchId")]
    pub workbench_id: i64,
    /// Request status
    pub status: String,
    /// Request payload
    pub payload: Value,
    /// Creation timestamp (RFC 3339, UTC when no offset)
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Task id
    pub id: i64,
    /// Parent request
    #[serde(rename = "requestId")]
    pub request_id: i64,
    /// Assigned agent, if any
    #[serde(rename = "assigneeId", skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    /// Task status
    pub status: String,
    /// Creation timestamp (RFC 3339, UTC when no offset)
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Queue record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Queue {
    /// Queue id
    pub id: i64,
    /// Queue name
    pub name: String,
    /// Workbench this queue feeds
    #[serde(rename = "workbenchId")]
    pub workbench_id: i64,
}

/// Role record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Role id
    pub id: i64,
    /// Role name
    pub name: String,
    /// Granted permissions
    pub permissions: Vec<String>,
}

/// Agent record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Agent id
    pub id: i64,
    /// Agent name
    pub name: String,
    /// Agent capability identifiers
    pub capabilities: Vec<String>,
}

/// Aggregate delivery performance counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Performance {
    /// Total tasks observed
    #[serde(rename = "totalTasks")]
    pub total_tasks: u64,
    /// Tasks completed within their SLA
    #[serde(rename = "completedOnTime")]
    pub completed_on_time: u64,
    /// Tasks that breached their SLA
    #[serde(rename = "breachCount")]
    pub breach_count: u64,
}

/// SLA judgment produced by the health evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether elapsed time stayed within the threshold (boundary inclusive)
    #[serde(rename = "slaMet")]
    pub sla_met: bool,
    /// Seconds elapsed since the event, at evaluation time. Negative when
    /// the event timestamp lies in the future (clock skew).
    pub elapsed: f64,
    /// Allowed threshold in seconds
    pub threshold: f64,
}
