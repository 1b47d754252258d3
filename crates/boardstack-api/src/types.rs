//! Request and response types for the boardstack REST API.
//!
//! Field names use camelCase via `#[serde(rename_all = "camelCase")]`.
//! Timestamps are kept as the ISO-8601 strings the backend emits (local
//! date-times without a zone).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Boards ───────────────────────────────────────────────────────────

/// A board post, from `GET /boards` and `GET /boards/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    /// ISO 8601 date-time.
    pub created_at: String,
    /// ISO 8601 date-time.
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_request: Option<VmRequest>,
}

/// Body of `POST /boards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCreateRequest {
    pub title: String,
    pub content: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_request: Option<VmRequest>,
}

/// Body of `PUT /boards/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_request: Option<VmRequest>,
}

/// VM request attached to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmRequest {
    pub name: String,
    pub flavor: String,
    pub image: String,
    pub network: String,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_pair: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
}

// ── OpenStack deployments ────────────────────────────────────────────

/// Lifecycle state of a deployment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl DeploymentStatus {
    /// `true` once the deployment can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// `true` while the deployment can still be cancelled.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

/// Body of `POST /openstack/deploy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub vm_name: String,
    pub instance_type: String,
    pub image_id: String,
    pub network_id: String,
    pub security_group: String,
    pub key_pair: String,
    /// Disk size in GB.
    pub disk_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub requested_by: String,
}

/// A deployment, from every `/openstack/deployments` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub deployment_id: String,
    #[serde(default)]
    pub instance_id: Option<String>,
    pub vm_name: String,
    pub status: DeploymentStatus,
    #[serde(default)]
    pub status_message: String,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub vm_info: Option<VmInfo>,
    #[serde(default)]
    pub networks: Option<Vec<NetworkInfo>>,
    #[serde(default)]
    pub error: Option<DeploymentError>,
    #[serde(default)]
    pub requested_by: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

/// Details of the provisioned instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmInfo {
    pub instance_id: String,
    pub instance_type: String,
    pub image_id: String,
    #[serde(default)]
    pub key_pair: Option<String>,
    #[serde(default)]
    pub disk_size: Option<u32>,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub network_id: String,
    #[serde(default)]
    pub network_name: Option<String>,
    #[serde(default)]
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub is_primary: Option<bool>,
}

/// Failure details for a deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentError {
    pub error_code: String,
    pub error_message: String,
    #[serde(default)]
    pub detail_message: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<String>,
}

/// `GET /openstack/deployments` returns a map keyed by deployment id.
pub type DeploymentMap = HashMap<String, Deployment>;

// ── Integrated system status ─────────────────────────────────────────

/// Aggregated counts, from `GET /integrated/system-status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub system: SystemInfo,
    pub boards: StatusCounts,
    pub deployments: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub status: String,
    /// Milliseconds since backend start.
    pub uptime: u64,
    pub services: ServiceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub openstack: String,
    pub board: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: u64,
    #[serde(default)]
    pub by_status: HashMap<String, u64>,
}

// ── Auth ─────────────────────────────────────────────────────────────

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// JWT issued by `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token lifetime in milliseconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}
