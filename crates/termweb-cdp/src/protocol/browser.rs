//! Browser domain types.

use serde::Serialize;

/// Parameters for Browser.grantPermissions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantPermissionsParams {
    /// Permission names to grant (e.g., "clipboardReadWrite").
    pub permissions: Vec<String>,
}

impl GrantPermissionsParams {
    /// The clipboard grants termweb needs for its copy/paste polyfill.
    pub fn clipboard() -> Self {
        Self {
            permissions: vec![
                "clipboardReadWrite".to_string(),
                "clipboardSanitizedWrite".to_string(),
            ],
        }
    }
}

/// Parameters for Browser.setDownloadBehavior.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDownloadBehaviorParams {
    /// "allow", "deny", or "default".
    pub behavior: String,
    /// Directory downloads are written to when allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
    /// Emit Browser.download* events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_enabled: Option<bool>,
}

impl SetDownloadBehaviorParams {
    /// Allow downloads into `path` with progress events enabled.
    pub fn allow_into(path: impl Into<String>) -> Self {
        Self {
            behavior: "allow".to_string(),
            download_path: Some(path.into()),
            events_enabled: Some(true),
        }
    }
}
