//! Emulation domain types.

use serde::Serialize;

/// Parameters for Emulation.setDeviceMetricsOverride.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDeviceMetricsOverrideParams {
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    /// Device scale factor (0 keeps the current one).
    pub device_scale_factor: f64,
    /// Emulate a mobile viewport.
    pub mobile: bool,
}

impl SetDeviceMetricsOverrideParams {
    /// A desktop viewport of the given size.
    pub fn desktop(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            device_scale_factor: 1.0,
            mobile: false,
        }
    }
}
