use overlayrs_vision::TransformState;

const SOURCES: [(u32, u32); 5] = [(640, 480), (480, 640), (1280, 720), (100, 100), (1, 3000)];
const SURFACES: [(u32, u32); 5] = [(1080, 1920), (1920, 1080), (800, 800), (37, 5), (1, 1)];

fn refreshed(source: (u32, u32), surface: (u32, u32), mirrored: bool) -> TransformState {
    let mut state = TransformState::new();
    state.set_source_info(source.0, source.1, mirrored);
    assert!(state.refresh_if_needed(surface.0, surface.1));
    state
}

#[test]
fn test_never_crops_both_axes() {
    for &source in &SOURCES {
        for &surface in &SURFACES {
            let p = refreshed(source, surface, false).projection();
            println!(
                "source {:?} surface {:?}: scale={} crop=({}, {})",
                source,
                surface,
                p.scale_factor(),
                p.width_crop_offset(),
                p.height_crop_offset()
            );
            assert!(p.scale_factor() > 0.0);
            assert!(p.width_crop_offset() >= 0.0);
            assert!(p.height_crop_offset() >= 0.0);
            assert!(p.width_crop_offset() == 0.0 || p.height_crop_offset() == 0.0);
        }
    }
}

#[test]
fn test_source_edges_bracket_cropped_span() {
    for &source in &SOURCES {
        for &surface in &SURFACES {
            let state = refreshed(source, surface, false);
            let p = state.projection();
            let left = state.map_x(0.0);
            let right = state.map_x(source.0 as f32);

            let tol = 1e-3 * p.scale_factor() * source.0 as f32 + 1e-3;
            assert!((left + p.width_crop_offset()).abs() < tol);
            assert!(
                (right - (p.scale_factor() * source.0 as f32 - p.width_crop_offset())).abs() < tol
            );

            // Mirrored bracket is the reflection about the surface center
            let mirrored = refreshed(source, surface, true);
            let w = surface.0 as f32;
            assert!((mirrored.map_x(0.0) - (w - left)).abs() < tol);
            assert!((mirrored.map_x(source.0 as f32) - (w - right)).abs() < tol);
            assert!((mirrored.map_y(17.0) - state.map_y(17.0)).abs() < tol);
        }
    }
}

#[test]
fn test_scaled_source_covers_surface() {
    for &source in &SOURCES {
        for &surface in &SURFACES {
            let state = refreshed(source, surface, false);
            let tol = 1e-2;
            assert!(state.map_x(0.0) <= tol);
            assert!(state.map_y(0.0) <= tol);
            assert!(state.map_x(source.0 as f32) >= surface.0 as f32 - tol * surface.0 as f32);
            assert!(state.map_y(source.1 as f32) >= surface.1 as f32 - tol * surface.1 as f32);
        }
    }
}

#[test]
fn test_recompute_only_after_marking_call() {
    let mut state = refreshed((640, 480), (1080, 1920), false);
    let first = state.projection();

    assert!(!state.refresh_if_needed(1080, 1920));
    assert_eq!(state.projection(), first);

    state.set_source_info(1280, 720, false);
    // Stale values are never served while dirty
    assert_eq!(state.map_length(10.0), 10.0);
    assert!(state.refresh_if_needed(1080, 1920));
    assert_ne!(state.projection(), first);

    let second = state.projection();
    assert!(!state.refresh_if_needed(1080, 1920));
    assert_eq!(state.projection(), second);
}

#[test]
fn test_documented_scenarios() {
    let state = refreshed((640, 480), (1080, 1920), false);
    let p = state.projection();
    assert!((p.scale_factor() - 4.0).abs() < 1e-4);
    assert!((p.width_crop_offset() - 720.0).abs() < 1e-2);
    assert_eq!(p.height_crop_offset(), 0.0);
    assert!((state.map_x(320.0) - 560.0).abs() < 1e-2);
    assert!((state.map_y(240.0) - 960.0).abs() < 1e-2);

    let mirrored = refreshed((640, 480), (1080, 1920), true);
    assert!((mirrored.map_x(320.0) - 520.0).abs() < 1e-2);
    assert!(mirrored.is_mirrored());
}

#[test]
fn test_unmap_returns_to_source() {
    let state = refreshed((640, 480), (1080, 1920), true);
    let p = state.projection();
    let (sx, sy) = p.map_point(100.0, 400.0);
    let (x, y) = p.unmap_point(sx, sy).expect("invertible");
    assert!((x - 100.0).abs() < 1e-2);
    assert!((y - 400.0).abs() < 1e-2);
}
