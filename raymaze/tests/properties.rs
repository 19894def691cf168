//! Property tests for maze generation, ray casting and slide collision.

use std::collections::VecDeque;

use proptest::prelude::*;

use raymaze::game::collision::{is_blocked, slide_move};
use raymaze::game::maze::{generate, Cell, Grid};
use raymaze::game::raycast::{cast_ray, MAX_DEPTH};
use raymaze::{DeterministicRng, Vec2};

fn maze(size: usize, seed: u64) -> Grid {
    generate(size, size, &mut DeterministicRng::new(seed)).unwrap()
}

fn flood_from_start(grid: &Grid) -> usize {
    let mut seen = vec![false; grid.width() * grid.height()];
    let mut queue = VecDeque::from([(1i64, 1i64)]);
    seen[grid.width() + 1] = true;
    let mut count = 0;
    while let Some((x, y)) = queue.pop_front() {
        count += 1;
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let (nx, ny) = (x + dx, y + dy);
            let idx = ny as usize * grid.width() + nx as usize;
            if grid.is_floor(nx, ny) && !seen[idx] {
                seen[idx] = true;
                queue.push_back((nx, ny));
            }
        }
    }
    count
}

proptest! {
    #[test]
    fn test_maze_border_and_connectivity(half in 2usize..16, seed in any::<u64>()) {
        let size = half * 2 + 1;
        let grid = maze(size, seed);
        let last = size as i64 - 1;
        for i in 0..size as i64 {
            prop_assert_eq!(grid.get(i, 0), Some(Cell::Wall));
            prop_assert_eq!(grid.get(i, last), Some(Cell::Wall));
            prop_assert_eq!(grid.get(0, i), Some(Cell::Wall));
            prop_assert_eq!(grid.get(last, i), Some(Cell::Wall));
        }
        prop_assert!(grid.is_floor(1, 1));
        prop_assert_eq!(flood_from_start(&grid), grid.floor_count());
    }

    #[test]
    fn test_ray_within_depth_and_consistent(
        seed in any::<u64>(),
        cell in 0usize..1000,
        fx in 0.05f64..0.95,
        fy in 0.05f64..0.95,
        angle in -10.0f64..10.0,
    ) {
        let grid = maze(15, seed);
        let floors: Vec<(i64, i64)> = (0..15i64)
            .flat_map(|y| (0..15i64).map(move |x| (x, y)))
            .filter(|&(x, y)| grid.is_floor(x, y))
            .collect();
        let (cx, cy) = floors[cell % floors.len()];
        let origin = Vec2::new(cx as f64 + fx, cy as f64 + fy);

        let hit = cast_ray(&grid, origin, angle);
        prop_assert!(hit.distance <= MAX_DEPTH);
        prop_assert!(hit.distance > 0.0);
        let expected = origin + Vec2::from_angle(angle) * hit.distance;
        prop_assert!(expected.distance(hit.point) < 1e-9);
        if hit.wall {
            prop_assert!(is_blocked(&grid, hit.point));
        }
    }

    #[test]
    fn test_slide_never_enters_wall(
        seed in any::<u64>(),
        cell in 0usize..1000,
        dx in -0.3f64..0.3,
        dy in -0.3f64..0.3,
    ) {
        let grid = maze(11, seed);
        let floors: Vec<(i64, i64)> = (0..11i64)
            .flat_map(|y| (0..11i64).map(move |x| (x, y)))
            .filter(|&(x, y)| grid.is_floor(x, y))
            .collect();
        let (cx, cy) = floors[cell % floors.len()];
        let from = Vec2::new(cx as f64 + 0.5, cy as f64 + 0.5);
        let to = from + Vec2::new(dx, dy);

        let moved = slide_move(&grid, from, to);
        prop_assert!(!is_blocked(&grid, moved));
        // Each axis either moved fully or not at all.
        prop_assert!(moved.x == from.x || moved.x == to.x);
        prop_assert!(moved.y == from.y || moved.y == to.y);
        // A blocked x move keeps x regardless of y.
        if is_blocked(&grid, Vec2::new(to.x, from.y)) {
            prop_assert_eq!(moved.x, from.x);
        }
    }
}
