//! Terminal-to-browser coordinate mapping.
//!
//! Pure and stateless after construction. The terminal reports input
//! either in cells or (with SGR pixel reporting) in pixels; the browser
//! expects CSS pixels in its own viewport. Between them sit the toolbar
//! row and the scaled frame the terminal actually displays.
//!
//! All arithmetic stays in floating point until the final rounding so
//! repeated cell-to-pixel-to-viewport conversions do not accumulate
//! sub-pixel bias.

/// Geometry inputs for the mapper.
#[derive(Debug, Clone, Copy)]
pub struct MapperConfig {
    /// Terminal size in pixels.
    pub term_px: (u32, u32),
    /// Terminal size in cells.
    pub term_cells: (u16, u16),
    /// Toolbar height in pixels; input above it belongs to the chrome.
    pub toolbar_px: u32,
    /// Whether the terminal reports pixel coordinates directly. When
    /// false, coordinates arrive in cells and are mapped to the cell
    /// centre.
    pub pixel_mode: bool,
    /// Size of the displayed frame in pixels.
    pub frame: (u32, u32),
    /// The Chromium viewport size the browser expects coordinates in.
    pub viewport: (u32, u32),
}

/// Maps terminal input coordinates into the browser viewport.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    cell_w: f64,
    cell_h: f64,
    toolbar_h: f64,
    pixel_mode: bool,
    frame_w: f64,
    frame_h: f64,
    chrome_w: f64,
    chrome_h: f64,
}

impl CoordinateMapper {
    /// Build a mapper from the current geometry.
    pub fn new(config: MapperConfig) -> Self {
        let term_w = f64::from(config.term_px.0);
        let term_h = f64::from(config.term_px.1);
        let cols = f64::from(config.term_cells.0.max(1));
        let rows = f64::from(config.term_cells.1.max(1));
        Self {
            cell_w: term_w / cols,
            cell_h: term_h / rows,
            toolbar_h: f64::from(config.toolbar_px),
            pixel_mode: config.pixel_mode,
            frame_w: f64::from(config.frame.0.max(1)),
            frame_h: f64::from(config.frame.1.max(1)),
            chrome_w: f64::from(config.viewport.0),
            chrome_h: f64::from(config.viewport.1),
        }
    }

    /// Map a terminal coordinate to browser viewport coordinates.
    ///
    /// Returns `None` when the position falls on the toolbar or outside
    /// the displayed frame; those inputs belong to the TUI chrome (or a
    /// letterbox band), not the page.
    pub fn terminal_to_browser(&self, tx: f64, ty: f64) -> Option<(f64, f64)> {
        let (px, py) = if self.pixel_mode {
            (tx, ty)
        } else {
            // Cell reports map to the cell centre.
            ((tx + 0.5) * self.cell_w, (ty + 0.5) * self.cell_h)
        };

        // The frame sits at the top-left of the content area; an
        // aspect-locked frame can be narrower or shorter than the
        // terminal, and input past its edge hits nothing.
        if px < 0.0 || px >= self.frame_w {
            return None;
        }
        if py < self.toolbar_h || py >= self.toolbar_h + self.frame_h {
            return None;
        }

        let bx = (px * self.chrome_w / self.frame_w).round();
        let by = ((py - self.toolbar_h) * self.chrome_h / self.frame_h).round();

        Some((
            bx.clamp(0.0, self.chrome_w - 1.0),
            by.clamp(0.0, self.chrome_h - 1.0),
        ))
    }
}

#[cfg(test)]
mod tests;
