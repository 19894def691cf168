//! Billboard Sprites
//!
//! Projection of world-space entities onto the screen and occlusion-tested
//! drawing. Sprite-vs-sprite occlusion is painter's order: callers draw the
//! farthest sprite first. Sprite-vs-wall occlusion tests only the sprite's
//! centre column against the depth buffer.

use crate::core::vec2::{relative_angle, Vec2};
use crate::game::raycast::DepthBuffer;
use crate::render::assets::Texture;
use crate::render::frame::{Color, Frame};

/// Where a sprite lands on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Distance from the viewer
    pub distance: f64,
    /// Angle relative to the view direction
    pub angle: f64,
    /// Square side length in pixels
    pub size: f64,
    /// Left edge in pixels
    pub left: f64,
    /// Top edge in pixels
    pub top: f64,
}

impl Projection {
    /// Screen column through the sprite's centre.
    #[inline]
    pub fn center_column(&self) -> i64 {
        (self.left + self.size / 2.0).floor() as i64
    }

    /// True if the wall at the centre column is farther than the sprite.
    /// Off-screen centres count as hidden.
    pub fn visible_in(&self, depth: &DepthBuffer) -> bool {
        depth
            .distance_at(self.center_column())
            .is_some_and(|wall| self.distance < wall)
    }
}

/// Per-category projection rules.
#[derive(Clone, Copy, Debug)]
pub struct ProjectionParams {
    /// Field of view (radians)
    pub fov: f64,
    /// Extra angular margin beyond fov/2
    pub fov_margin: f64,
    /// Size multiplier on `viewport_height / distance`
    pub scale: f64,
    /// Size cap (px)
    pub size_cap: f64,
    /// Skip sprites at or beyond this distance
    pub max_distance: f64,
}

/// Project `target` for a viewer at `origin` facing `facing`.
///
/// Returns `None` when outside the field of view (with margin), beyond
/// `max_distance`, or exactly on the viewer.
pub fn project(
    origin: Vec2,
    facing: f64,
    target: Vec2,
    viewport: (usize, usize),
    params: &ProjectionParams,
) -> Option<Projection> {
    let distance = origin.distance(target);
    if distance <= f64::EPSILON || distance >= params.max_distance {
        return None;
    }

    let angle = relative_angle(origin, facing, target);
    if angle.abs() >= params.fov / 2.0 + params.fov_margin {
        return None;
    }

    let (width, height) = (viewport.0 as f64, viewport.1 as f64);
    let size = ((height / distance) * params.scale).min(params.size_cap);
    let center_x = (angle / params.fov + 0.5) * width;

    Some(Projection {
        distance,
        angle,
        size,
        left: center_x - size / 2.0,
        top: (height - size) / 2.0,
    })
}

/// Draw a texture stretched over the projection square, skipping fully
/// transparent texels.
pub fn draw_textured(frame: &mut Frame, texture: &Texture, p: &Projection) {
    let size = p.size.max(1.0);
    let x0 = p.left.floor() as i64;
    let y0 = p.top.floor() as i64;
    let x1 = (p.left + size).ceil() as i64;
    let y1 = (p.top + size).ceil() as i64;

    for y in y0.max(0)..y1.min(frame.height() as i64) {
        let v = (y as f64 + 0.5 - p.top) / size;
        if !(0.0..1.0).contains(&v) {
            continue;
        }
        for x in x0.max(0)..x1.min(frame.width() as i64) {
            let u = (x as f64 + 0.5 - p.left) / size;
            if !(0.0..1.0).contains(&u) {
                continue;
            }
            let texel = texture.sample(u, v);
            if texel.a() != 0 {
                frame.blend(x, y, texel);
            }
        }
    }
}

/// Fallback: filled circle inscribed in the projection square.
pub fn draw_fallback(frame: &mut Frame, color: Color, p: &Projection) {
    let r = p.size / 2.0;
    frame.fill_circle(p.left + r, p.top + r, r, color);
}
