//! Collision Detection
//!
//! Grid occupancy queries and axis-separated slide movement.
//! Anything outside the grid counts as wall for movement, not for rays.

use crate::core::vec2::Vec2;
use crate::game::maze::{Cell, Grid};

/// True if the cell containing `point` blocks movement.
#[inline]
pub fn is_blocked(grid: &Grid, point: Vec2) -> bool {
    let (cx, cy) = point.cell();
    is_wall_cell(grid, cx, cy)
}

/// True if the cell is wall or outside the grid.
#[inline]
pub fn is_wall_cell(grid: &Grid, cx: i64, cy: i64) -> bool {
    grid.get(cx, cy) != Some(Cell::Floor)
}

/// True if `point` lies in a wall cell inside the grid.
///
/// Rays use this instead of [`is_blocked`]: leaving the grid does not stop
/// a ray, only an actual wall cell does.
#[inline]
pub fn stops_ray(grid: &Grid, point: Vec2) -> bool {
    let (cx, cy) = point.cell();
    grid.get(cx, cy) == Some(Cell::Wall)
}

/// Move from `from` toward `to`, resolving each axis on its own.
///
/// X is tested against the current Y and committed first; Y is then tested
/// against the resulting X. A blocked axis keeps its coordinate, so motion
/// slides along walls instead of stopping dead.
pub fn slide_move(grid: &Grid, from: Vec2, to: Vec2) -> Vec2 {
    let mut pos = from;

    if !is_blocked(grid, Vec2::new(to.x, pos.y)) {
        pos.x = to.x;
    }
    if !is_blocked(grid, Vec2::new(pos.x, to.y)) {
        pos.y = to.y;
    }

    pos
}

/// Check if two points are within `radius` of each other.
#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f64) -> bool {
    (b - a).length_squared() < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    // #####
    // #...#
    // #.#.#
    // #...#
    // #####
    fn ring() -> Grid {
        Grid::from_rows(vec![
            vec![1, 1, 1, 1, 1],
            vec![1, 0, 0, 0, 1],
            vec![1, 0, 1, 0, 1],
            vec![1, 0, 0, 0, 1],
            vec![1, 1, 1, 1, 1],
        ])
        .unwrap()
    }

    #[test]
    fn test_out_of_bounds_is_wall() {
        let grid = ring();
        assert!(is_wall_cell(&grid, -1, 1));
        assert!(is_wall_cell(&grid, 5, 1));
        assert!(is_blocked(&grid, Vec2::new(-0.5, 1.5)));
        assert!(!is_blocked(&grid, Vec2::new(1.5, 1.5)));
    }

    #[test]
    fn test_rays_stop_only_inside_grid() {
        let grid = ring();
        assert!(stops_ray(&grid, Vec2::new(0.5, 0.5)));
        assert!(stops_ray(&grid, Vec2::new(2.5, 2.5)));
        assert!(!stops_ray(&grid, Vec2::new(1.5, 1.5)));
        assert!(!stops_ray(&grid, Vec2::new(-0.5, 1.5)));
        assert!(!stops_ray(&grid, Vec2::new(5.5, 5.5)));
    }

    #[test]
    fn test_free_move() {
        let grid = ring();
        let from = Vec2::new(1.5, 1.5);
        let to = Vec2::new(2.4, 1.6);
        assert_eq!(slide_move(&grid, from, to), to);
    }

    #[test]
    fn test_slide_along_wall() {
        let grid = ring();
        // Diagonal into the top border: Y is blocked, X slides.
        let from = Vec2::new(1.5, 1.1);
        let to = Vec2::new(1.7, 0.9);
        let result = slide_move(&grid, from, to);
        assert_eq!(result.y, from.y);
        assert_eq!(result.x, 1.7);
    }

    #[test]
    fn test_blocked_axis_never_changes() {
        let grid = ring();
        // Moving right into the centre pillar from (1.9, 2.5): X blocked, Y free.
        let from = Vec2::new(1.9, 2.5);
        let to = Vec2::new(2.1, 2.6);
        let result = slide_move(&grid, from, to);
        assert_eq!(result.x, from.x);
        assert_eq!(result.y, 2.6);
    }

    #[test]
    fn test_corner_fully_blocked() {
        let grid = ring();
        let from = Vec2::new(1.1, 1.1);
        let to = Vec2::new(0.9, 0.9);
        assert_eq!(slide_move(&grid, from, to), from);
    }

    #[test]
    fn test_within_radius() {
        let a = Vec2::new(1.0, 1.0);
        assert!(within_radius(a, Vec2::new(1.3, 1.3), 0.5));
        assert!(!within_radius(a, Vec2::new(1.5, 1.0), 0.5));
    }
}
