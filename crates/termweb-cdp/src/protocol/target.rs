//! Target domain types.
//!
//! The Target domain supports inspecting, attaching to, and managing
//! Chrome targets.

use serde::{Deserialize, Serialize};

/// Information about a target.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Target identifier.
    pub target_id: String,
    /// Target type (e.g., "page", "`background_page`", "`service_worker`").
    #[serde(rename = "type")]
    pub target_type: String,
    /// Target title.
    pub title: String,
    /// Target URL.
    pub url: String,
    /// Whether the target is attached.
    pub attached: bool,
}

/// Result of Target.getTargets.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTargetsResult {
    /// All known targets.
    pub target_infos: Vec<TargetInfo>,
}

/// Parameters for Target.attachToTarget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetParams {
    /// Target ID to attach to.
    pub target_id: String,
    /// Enables "flat" access to the session via specifying sessionId.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flatten: Option<bool>,
}

impl AttachToTargetParams {
    /// Attach with flat session access, the only mode the core uses.
    pub fn flat(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            flatten: Some(true),
        }
    }
}

/// Result of Target.attachToTarget.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
    /// Session ID for the attached target.
    pub session_id: String,
}

/// Parameters for Target.activateTarget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateTargetParams {
    /// Target ID to bring to the foreground.
    pub target_id: String,
}

/// Parameters for Target.setDiscoverTargets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDiscoverTargetsParams {
    /// Whether target discovery events are enabled.
    pub discover: bool,
}
