mod common;

use common::{Op, RecordingSurface};
use glam::DVec2;
use tradecall_viz::config::GridParams;
use tradecall_viz::grid::{displacement, GridBackground};
use tradecall_viz::surface::Viewport;

fn approx_eq2(a: DVec2, b: DVec2, eps: f64) -> bool {
    (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps
}

#[test]
fn no_displacement_at_or_beyond_radius() {
    let params = GridParams::default();
    let pointer = DVec2::new(321.0, 123.0);
    for angle in 0..36 {
        let dir = DVec2::from_angle(angle as f64 * std::f64::consts::TAU / 36.0);
        for distance in [200.0, 200.5, 250.0, 1e6] {
            let vertex = pointer + dir * distance;
            if vertex.distance(pointer) >= params.influence_radius {
                assert_eq!(displacement(vertex, pointer, &params), DVec2::ZERO);
            }
        }
    }
}

#[test]
fn full_force_at_pointer_and_capped_everywhere() {
    let params = GridParams::default();
    let max = params.max_displacement();
    let pointer = DVec2::new(100.0, 100.0);
    assert!((displacement(pointer, pointer, &params).length() - max).abs() < 1e-12);

    for x in (0..=400).step_by(10) {
        for y in (0..=400).step_by(10) {
            let offset = displacement(DVec2::new(x as f64, y as f64), pointer, &params);
            assert!(offset.length() <= max + 1e-12);
            assert!(offset.length() < params.spacing);
        }
    }
}

#[test]
fn strength_scales_the_push() {
    let weak = GridParams {
        strength: 0.1,
        ..GridParams::default()
    };
    let strong = GridParams::default();
    let v = DVec2::new(30.0, 40.0);
    let a = displacement(v, DVec2::ZERO, &weak);
    let b = displacement(v, DVec2::ZERO, &strong);
    assert!(approx_eq2(a * 4.0, b, 1e-12));
    // pointing away from the pointer
    assert!(b.dot(v) > 0.0);
}

#[test]
fn straight_grid_without_pointer() {
    let mut grid = GridBackground::new(GridParams::default(), Viewport::new(400.0, 200.0, 2.0));
    let mut surface = RecordingSurface::new(400.0, 200.0);
    grid.render(&mut surface);

    let lines = surface.lines();
    // 11 vertical (x = 0..=400) then 6 horizontal (y = 0..=200)
    assert_eq!(lines.len(), 17);
    for (i, line) in lines[..11].iter().enumerate() {
        assert_eq!(line.len(), 21);
        assert!(line.iter().all(|p| p.x == i as f64 * 40.0));
    }
    for (j, line) in lines[11..].iter().enumerate() {
        assert_eq!(line.len(), 41);
        assert!(line.iter().all(|p| p.y == j as f64 * 40.0));
    }
}

#[test]
fn lines_bend_near_pointer_only() {
    let params = GridParams::default();
    let mut grid = GridBackground::new(params.clone(), Viewport::new(400.0, 200.0, 1.0));
    assert_eq!(grid.pointer(), None);
    grid.set_pointer(DVec2::new(10.0, 10.0));
    grid.set_pointer(DVec2::new(200.0, 100.0));
    // latest position wins
    assert_eq!(grid.pointer(), Some(DVec2::new(200.0, 100.0)));
    let mut surface = RecordingSurface::new(400.0, 200.0);
    grid.render(&mut surface);
    let lines = surface.lines();

    // x = 0 is exactly one radius from the pointer
    assert!(lines[0].iter().all(|p| p.x == 0.0));
    // the vertex under the pointer is pushed straight up by the maximum
    let through_pointer = lines[5];
    assert!(approx_eq2(
        through_pointer[10],
        DVec2::new(200.0, 100.0 - params.max_displacement()),
        1e-9
    ));
    // a nearby vertex moves away from the pointer
    let moved = through_pointer[8];
    assert_eq!(moved.x, 200.0);
    assert!(moved.y < 80.0);
}

#[test]
fn zero_viewport_skips_drawing() {
    let mut grid = GridBackground::new(GridParams::default(), Viewport::new(0.0, 900.0, 1.0));
    let mut surface = RecordingSurface::new(0.0, 900.0);
    grid.render(&mut surface);
    assert_eq!(surface.ops, vec![Op::Clear]);

    grid.resize(Viewport::new(80.0, 80.0, 1.0));
    grid.render(&mut surface);
    assert_eq!(surface.lines().len(), 6);
}
