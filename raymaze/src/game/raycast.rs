//! Ray Casting
//!
//! Fixed-step ray marching against the occupancy grid. Rays advance in
//! `RAY_STEP` increments and stop at the first wall cell, so hit points carry
//! up to one step of positional error. Renderers that want to match peers
//! pixel for pixel must keep the same step.

use crate::core::vec2::Vec2;
use crate::game::collision::stops_ray;
use crate::game::maze::Grid;

/// Distance advanced per marching step (grid units).
pub const RAY_STEP: f64 = 0.1;

/// Furthest distance a ray travels (grid units).
pub const MAX_DEPTH: f64 = 16.0;

/// Result of a single cast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Distance travelled, never above the max depth
    pub distance: f64,
    /// Sample point where the ray stopped
    pub point: Vec2,
    /// False when the ray ran out of depth without hitting a wall
    pub wall: bool,
}

impl RayHit {
    /// Horizontal texture coordinate in [0, 1).
    ///
    /// Uses the fractional part of whichever coordinate runs along the face
    /// that was hit: the coordinate closer to a cell edge identifies the face.
    pub fn texture_u(&self) -> f64 {
        let fx = self.point.x.rem_euclid(1.0);
        let fy = self.point.y.rem_euclid(1.0);
        let edge_x = fx.min(1.0 - fx);
        let edge_y = fy.min(1.0 - fy);
        if edge_x < edge_y {
            fy
        } else {
            fx
        }
    }
}

/// Cast a ray from `origin` along `angle` up to [`MAX_DEPTH`].
pub fn cast_ray(grid: &Grid, origin: Vec2, angle: f64) -> RayHit {
    cast_ray_to(grid, origin, angle, MAX_DEPTH)
}

/// Cast a ray with an explicit depth limit.
///
/// Samples outside the grid are not hits; the ray keeps marching until it
/// re-enters a wall or runs out of depth.
pub fn cast_ray_to(grid: &Grid, origin: Vec2, angle: f64, max_depth: f64) -> RayHit {
    let dir = Vec2::from_angle(angle);
    let max_depth = if max_depth.is_finite() { max_depth.max(0.0) } else { MAX_DEPTH };
    let steps = (max_depth / RAY_STEP).ceil() as usize;

    for i in 1..=steps {
        let distance = (i as f64 * RAY_STEP).min(max_depth);
        let point = origin + dir * distance;
        if stops_ray(grid, point) {
            return RayHit { distance, point, wall: true };
        }
    }

    RayHit {
        distance: max_depth,
        point: origin + dir * max_depth,
        wall: false,
    }
}

/// Ray angle for a screen column. Column 0 is the leftmost ray.
#[inline]
pub fn column_angle(player_angle: f64, column: usize, column_count: usize, fov: f64) -> f64 {
    let count = column_count.max(1) as f64;
    player_angle - fov / 2.0 + column as f64 * (fov / count)
}

/// Cast the ray for one screen column.
pub fn cast_column(
    grid: &Grid,
    origin: Vec2,
    player_angle: f64,
    column: usize,
    column_count: usize,
    fov: f64,
) -> RayHit {
    cast_ray(grid, origin, column_angle(player_angle, column, column_count, fov))
}

/// True if nothing solid lies between `from` and `to`.
///
/// Casts from `from` toward `to`; the target is visible when the wall hit is
/// no closer than the target itself.
pub fn has_line_of_sight(grid: &Grid, from: Vec2, to: Vec2) -> bool {
    let distance = from.distance(to);
    let hit = cast_ray(grid, from, from.angle_to(to));
    hit.distance >= distance
}

// =============================================================================
// DEPTH BUFFER
// =============================================================================

/// Per-column wall hits for the current frame.
///
/// Rebuilt every frame; the allocation is reused.
#[derive(Clone, Debug, Default)]
pub struct DepthBuffer {
    columns: Vec<RayHit>,
}

impl DepthBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recast every column for the given viewpoint.
    pub fn fill(&mut self, grid: &Grid, origin: Vec2, player_angle: f64, columns: usize, fov: f64) {
        self.columns.clear();
        self.columns.extend(
            (0..columns).map(|col| cast_column(grid, origin, player_angle, col, columns, fov)),
        );
    }

    /// Build a fresh buffer.
    pub fn cast(grid: &Grid, origin: Vec2, player_angle: f64, columns: usize, fov: f64) -> Self {
        let mut buffer = Self::new();
        buffer.fill(grid, origin, player_angle, columns, fov);
        buffer
    }

    /// Hit for a column.
    #[inline]
    pub fn get(&self, column: usize) -> Option<&RayHit> {
        self.columns.get(column)
    }

    /// Wall distance at a screen column. `None` off screen.
    #[inline]
    pub fn distance_at(&self, column: i64) -> Option<f64> {
        if column < 0 {
            return None;
        }
        self.columns.get(column as usize).map(|hit| hit.distance)
    }

    /// Number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when no columns were cast.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate hits left to right.
    pub fn iter(&self) -> impl Iterator<Item = &RayHit> {
        self.columns.iter()
    }
}
