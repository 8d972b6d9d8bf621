//! Page domain types.
//!
//! Navigation, script injection, file chooser interception, dialogs, and
//! the screencast control surface.

use serde::{Deserialize, Serialize};

/// Parameters for Page.navigate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    /// URL to navigate to.
    pub url: String,
}

/// Result of Page.navigate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
    /// Frame the navigation happened in.
    pub frame_id: String,
    /// Loader identifier, absent for same-document navigations.
    pub loader_id: Option<String>,
    /// Error text if the navigation failed at the network layer.
    pub error_text: Option<String>,
}

/// Parameters for Page.reload.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReloadParams {
    /// Bypass the cache on reload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_cache: Option<bool>,
}

/// One entry of the navigation history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEntry {
    /// Entry id usable with Page.navigateToHistoryEntry.
    pub id: i64,
    /// Entry URL.
    pub url: String,
    /// Entry title.
    #[serde(default)]
    pub title: String,
}

/// Result of Page.getNavigationHistory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNavigationHistoryResult {
    /// Index of the current entry.
    pub current_index: i64,
    /// All history entries.
    pub entries: Vec<NavigationEntry>,
}

/// Parameters for Page.navigateToHistoryEntry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateToHistoryEntryParams {
    /// History entry to navigate to.
    pub entry_id: i64,
}

/// Parameters for Page.addScriptToEvaluateOnNewDocument.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddScriptToEvaluateOnNewDocumentParams {
    /// Script source injected into every new document.
    pub source: String,
}

/// Parameters for Page.setInterceptFileChooserDialog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetInterceptFileChooserDialogParams {
    /// Whether file chooser dialogs are intercepted as events.
    pub enabled: bool,
}

/// Parameters for Page.handleFileChooser.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleFileChooserParams {
    /// "accept" or "cancel".
    pub action: String,
    /// Absolute paths of the files to select.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

/// Parameters for Page.handleJavaScriptDialog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleJavaScriptDialogParams {
    /// Whether to accept or dismiss the dialog.
    pub accept: bool,
    /// Text to enter into a prompt before accepting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,
}

/// Screencast frame format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScreencastFormat {
    /// JPEG format.
    #[default]
    Jpeg,
    /// PNG format.
    Png,
}

/// Parameters for Page.startScreencast.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartScreencastParams {
    /// Image compression format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ScreencastFormat>,
    /// Compression quality from range [0..100].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<i32>,
    /// Maximum screenshot width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<i32>,
    /// Maximum screenshot height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<i32>,
    /// Send every n-th frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub every_nth_frame: Option<i32>,
}

impl StartScreencastParams {
    /// Create new screencast parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image format.
    #[must_use]
    pub fn format(mut self, format: ScreencastFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Set the compression quality (0-100).
    #[must_use]
    pub fn quality(mut self, quality: i32) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Set the maximum width.
    #[must_use]
    pub fn max_width(mut self, width: i32) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Set the maximum height.
    #[must_use]
    pub fn max_height(mut self, height: i32) -> Self {
        self.max_height = Some(height);
        self
    }

    /// Set which frames to capture (every nth frame).
    #[must_use]
    pub fn every_nth_frame(mut self, n: i32) -> Self {
        self.every_nth_frame = Some(n);
        self
    }
}

/// Parameters for Page.screencastFrameAck.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreencastFrameAckParams {
    /// Frame number to acknowledge.
    pub session_id: i64,
}
