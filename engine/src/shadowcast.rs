//! Obstacle-aware field of view on the vision grid.

use glam::IVec2;

use crate::{ObstacleMap, VisionGrid};

/// Mark the cells visible from `origin` within `radius` cells.
///
/// With no obstacle map the result is an unobstructed disk, the same cells
/// `VisionGrid::reveal_circle` lights from the origin cell's center. Cells
/// outside the grid neither block light nor get revealed. A negative radius
/// or an origin outside the grid reveals nothing.
pub fn shadowcast(
    grid: &mut VisionGrid,
    obstacles: Option<&ObstacleMap>,
    origin: IVec2,
    radius: i32,
) {
    if radius < 0 || !grid.is_valid_cell(origin) {
        return;
    }

    // Nothing past the far corner of the grid can be lit.
    let radius = radius.min(grid.width().saturating_add(grid.height()));

    let is_opaque = |p: IVec2| obstacles.is_some_and(|o| o.is_obstacle(p));
    fov::cast(origin, radius, is_opaque, |p: IVec2| grid.reveal(p));
}

#[cfg(test)]
mod tests {
    use glam::{ivec2, Vec2};
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::VisionState;

    fn grid(w: i32, h: i32) -> VisionGrid {
        VisionGrid::new(w, h, 1.0, Vec2::ZERO).unwrap()
    }

    #[test]
    fn obstacle_scenario() {
        let mut g = grid(10, 10);
        let obstacles = ObstacleMap::from_cells(10, 10, [ivec2(5, 6)]).unwrap();
        shadowcast(&mut g, Some(&obstacles), ivec2(5, 5), 2);

        assert_eq!(
            g.to_ascii(),
            "\
..........
..........
..........
.....*....
....***...
...*****..
....***...
..........
..........
..........
"
        );
        assert!(g.state(ivec2(5, 6)).is_visible());
        assert!(g.state(ivec2(4, 4)).is_visible());
        assert!(!g.state(ivec2(5, 7)).is_visible());
        assert!(!g.state(ivec2(5, 8)).is_visible());
    }

    #[test]
    fn walls_in_room() {
        let obstacles = ObstacleMap::from_ascii(
            "
            ...........
            ...###.#...
            ...........
            ...........",
        )
        .unwrap();
        let mut g = grid(11, 4);
        shadowcast(&mut g, Some(&obstacles), ivec2(5, 3), 4);

        assert_eq!(
            g.to_ascii(),
            "\
......**...
..*******..
..*******..
.*********.
"
        );
    }

    #[test]
    fn walls_block_along_the_ray() {
        let obstacles = ObstacleMap::from_cells(
            20,
            20,
            [ivec2(10, 8), ivec2(12, 10), ivec2(8, 12)],
        )
        .unwrap();
        let mut g = grid(20, 20);
        shadowcast(&mut g, Some(&obstacles), ivec2(10, 10), 8);

        for wall in [ivec2(10, 8), ivec2(12, 10), ivec2(8, 12)] {
            assert!(g.state(wall).is_visible());
            let dir = (wall - ivec2(10, 10)) / 2;
            for k in 1..=4 {
                let behind = wall + dir * k;
                assert!(!g.state(behind).is_visible(), "{behind} lit");
            }
        }
    }

    #[test]
    fn degenerate_input() {
        let mut g = grid(6, 6);
        shadowcast(&mut g, None, ivec2(2, 2), -1);
        shadowcast(&mut g, None, ivec2(-1, 2), 3);
        shadowcast(&mut g, None, ivec2(2, 6), 3);
        assert_eq!(g.census().visible, 0);

        shadowcast(&mut g, None, ivec2(2, 2), 0);
        assert_eq!(g.census().visible, 1);

        // Huge radius gets clamped to the grid.
        shadowcast(&mut g, None, ivec2(0, 0), i32::MAX);
        assert_eq!(g.census().visible, 36);
    }

    #[test]
    fn scan_runs_past_the_edge() {
        // Origin in the corner, the disk is clipped but the in-grid part is
        // whole.
        let mut g = grid(5, 5);
        shadowcast(&mut g, None, ivec2(0, 0), 3);
        assert_eq!(
            g.to_ascii(),
            "\
****.
***..
***..
*....
.....
"
        );
    }

    #[quickcheck]
    fn open_field_matches_circle(x: u8, y: u8, r: u8) -> bool {
        let (x, y, r) = (x as i32 % 24, y as i32 % 24, r as i32 % 12);
        let origin = ivec2(x, y);

        let mut a = grid(24, 24);
        shadowcast(&mut a, None, origin, r);

        let mut b = grid(24, 24);
        let center = b.grid_to_world(origin);
        b.reveal_circle(center, r as f32);

        a.to_ascii() == b.to_ascii() && a.state(origin) == VisionState::Visible
    }

    #[quickcheck]
    fn origin_always_visible(x: u8, y: u8, r: u8, walls: Vec<(u8, u8)>) -> bool {
        let origin = ivec2(x as i32 % 16, y as i32 % 16);
        let obstacles = ObstacleMap::from_cells(
            16,
            16,
            walls
                .into_iter()
                .map(|(x, y)| ivec2(x as i32 % 16, y as i32 % 16)),
        )
        .unwrap();

        let mut g = grid(16, 16);
        shadowcast(&mut g, Some(&obstacles), origin, r as i32 % 10);
        g.state(origin).is_visible()
    }
}
