use super::*;

/// The geometry from the centre-click scenario: 80x24 cells at 1280x480
/// pixels, 20 px toolbar, 1280x720 browser viewport.
fn scenario_mapper(pixel_mode: bool) -> CoordinateMapper {
    CoordinateMapper::new(MapperConfig {
        term_px: (1280, 480),
        term_cells: (80, 24),
        toolbar_px: 20,
        pixel_mode,
        frame: (1280, 460),
        viewport: (1280, 720),
    })
}

#[test]
fn test_centre_click_mapping() {
    let mapper = scenario_mapper(true);
    let (bx, by) = mapper.terminal_to_browser(640.0, 260.0).unwrap();
    assert_eq!(bx, 640.0);
    // by = round((260 - 20) * 720 / 460)
    assert_eq!(by, 376.0);
}

#[test]
fn test_toolbar_rejected() {
    let mapper = scenario_mapper(true);
    assert!(mapper.terminal_to_browser(640.0, 0.0).is_none());
    assert!(mapper.terminal_to_browser(640.0, 19.9).is_none());
    assert!(mapper.terminal_to_browser(640.0, 20.0).is_some());
}

#[test]
fn test_below_content_rejected() {
    let mapper = scenario_mapper(true);
    assert!(mapper.terminal_to_browser(640.0, 479.9).is_some());
    assert!(mapper.terminal_to_browser(640.0, 480.0).is_none());
    assert!(mapper.terminal_to_browser(640.0, 1000.0).is_none());
}

#[test]
fn test_horizontal_bounds() {
    let mapper = scenario_mapper(true);
    assert!(mapper.terminal_to_browser(-1.0, 100.0).is_none());
    assert!(mapper.terminal_to_browser(1280.0, 100.0).is_none());
    assert!(mapper.terminal_to_browser(0.0, 100.0).is_some());
    assert!(mapper.terminal_to_browser(1279.9, 100.0).is_some());
}

#[test]
fn test_cell_mode_uses_cell_centre() {
    let mapper = scenario_mapper(false);
    // Cell (40, 12): centre at pixel (648, 250) with 16x20 cells.
    let (bx, by) = mapper.terminal_to_browser(40.0, 12.0).unwrap();
    assert_eq!(bx, (648.0f64 * 1280.0 / 1280.0).round());
    assert_eq!(by, ((250.0f64 - 20.0) * 720.0 / 460.0).round());
}

#[test]
fn test_cell_mode_toolbar_row_rejected() {
    let mapper = scenario_mapper(false);
    // Row 0 centres at y = 10, inside the 20 px toolbar.
    assert!(mapper.terminal_to_browser(40.0, 0.0).is_none());
    // Row 1 centres at y = 30, inside the content area.
    assert!(mapper.terminal_to_browser(40.0, 1.0).is_some());
}

#[test]
fn test_vertical_letterbox_scales_by_frame_height() {
    // An aspect-locked frame shorter than the content area: 400 px of
    // page above an 60 px letterbox band.
    let mapper = CoordinateMapper::new(MapperConfig {
        term_px: (1280, 480),
        term_cells: (80, 24),
        toolbar_px: 20,
        pixel_mode: true,
        frame: (1280, 400),
        viewport: (1280, 720),
    });

    // The frame, not the content area, is the mapping denominator.
    let (_, by) = mapper.terminal_to_browser(640.0, 260.0).unwrap();
    assert_eq!(by, ((260.0f64 - 20.0) * 720.0 / 400.0).round());

    // Terminal pixels below the frame bottom (y >= 420) are letterbox,
    // not page, even though they are above the terminal's edge.
    assert!(mapper.terminal_to_browser(640.0, 419.9).is_some());
    assert!(mapper.terminal_to_browser(640.0, 420.0).is_none());
    assert!(mapper.terminal_to_browser(640.0, 470.0).is_none());
}

#[test]
fn test_horizontal_letterbox_scales_by_frame_width() {
    let mapper = CoordinateMapper::new(MapperConfig {
        term_px: (1280, 480),
        term_cells: (80, 24),
        toolbar_px: 20,
        pixel_mode: true,
        frame: (1000, 460),
        viewport: (1280, 720),
    });

    let (bx, _) = mapper.terminal_to_browser(500.0, 260.0).unwrap();
    assert_eq!(bx, (500.0f64 * 1280.0 / 1000.0).round());

    // Right of the frame edge is dead space.
    assert!(mapper.terminal_to_browser(999.9, 260.0).is_some());
    assert!(mapper.terminal_to_browser(1000.0, 260.0).is_none());
    assert!(mapper.terminal_to_browser(1100.0, 260.0).is_none());
}

#[test]
fn test_output_clamped_to_viewport() {
    let mapper = scenario_mapper(true);
    // The right edge maps to chrome_w after rounding; clamp keeps it at
    // the last addressable pixel.
    let (bx, _) = mapper.terminal_to_browser(1279.9, 100.0).unwrap();
    assert!(bx <= 1279.0);
    let (_, by) = mapper.terminal_to_browser(640.0, 479.9).unwrap();
    assert!(by <= 719.0);
}

#[test]
fn test_identity_when_geometry_matches() {
    let mapper = CoordinateMapper::new(MapperConfig {
        term_px: (800, 600),
        term_cells: (100, 30),
        toolbar_px: 0,
        pixel_mode: true,
        frame: (800, 600),
        viewport: (800, 600),
    });
    let (bx, by) = mapper.terminal_to_browser(123.0, 456.0).unwrap();
    assert_eq!((bx, by), (123.0, 456.0));
}

#[test]
fn test_degenerate_cell_counts_do_not_divide_by_zero() {
    let mapper = CoordinateMapper::new(MapperConfig {
        term_px: (100, 100),
        term_cells: (0, 0),
        toolbar_px: 0,
        pixel_mode: false,
        frame: (100, 100),
        viewport: (100, 100),
    });
    // Treated as a single cell; the centre maps inside the viewport.
    assert!(mapper.terminal_to_browser(0.0, 0.0).is_some());
}
