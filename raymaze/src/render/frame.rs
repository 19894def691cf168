//! Software Framebuffer
//!
//! `0xAARRGGBB` pixel buffer with the handful of primitives the renderer
//! needs: rect fills, alpha blending, circles, lines and gradients. Text is
//! recorded as draw commands for the host to rasterise.
//!
//! All primitives clip to the frame; off-screen coordinates are never an error.

/// Packed `0xAARRGGBB` colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0xFF000000);
    pub const WHITE: Color = Color(0xFFFFFFFF);
    pub const RED: Color = Color(0xFFFF0000);
    pub const ORANGE: Color = Color(0xFFFFA500);
    pub const GRAY: Color = Color(0xFF808080);
    pub const TRANSPARENT: Color = Color(0x00000000);

    /// Opaque colour from components.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xFF)
    }

    /// Colour with alpha.
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Parse `#RGB` or `#RRGGBB` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let value = u32::from_str_radix(digits, 16).ok()?;
        match digits.len() {
            6 => Some(Color(0xFF000000 | value)),
            3 => {
                let r = ((value >> 8) & 0xF) * 0x11;
                let g = ((value >> 4) & 0xF) * 0x11;
                let b = (value & 0xF) * 0x11;
                Some(Color(0xFF000000 | (r << 16) | (g << 8) | b))
            }
            _ => None,
        }
    }

    #[inline]
    pub fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub fn b(self) -> u8 {
        self.0 as u8
    }

    /// Same colour with alpha set from a 0..=1 fraction.
    pub fn with_alpha(self, alpha: f64) -> Self {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u32;
        Color((self.0 & 0x00FFFFFF) | (a << 24))
    }

    /// Scale RGB by a 0..=1 factor, keeping alpha.
    pub fn shade(self, factor: f64) -> Self {
        let f = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f64 * f).round() as u8;
        Self::rgba(scale(self.r()), scale(self.g()), scale(self.b()), self.a())
    }

    /// Composite `self` over `dst` (result is opaque when `dst` is).
    #[inline]
    pub fn over(self, dst: Color) -> Color {
        let a = self.a() as u32;
        if a == 0xFF {
            return self;
        }
        if a == 0 {
            return dst;
        }
        let inv = 255 - a;
        let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv + 127) / 255) as u8;
        let out_a = (a + dst.a() as u32 * inv / 255).min(255) as u8;
        Self::rgba(mix(self.r(), dst.r()), mix(self.g(), dst.g()), mix(self.b(), dst.b()), out_a)
    }
}

/// Horizontal alignment of a text command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// A line of text for the host to draw on top of the pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct TextCommand {
    pub x: i32,
    pub y: i32,
    pub text: String,
    pub color: Color,
    /// Font size in pixels
    pub size: u32,
    pub align: TextAlign,
}

/// Rendered frame: pixels plus text overlay commands.
#[derive(Clone, Debug)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
    text: Vec<TextCommand>,
}

impl Frame {
    /// Black frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::BLACK.0; width * height],
            text: Vec::new(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw pixels, row-major.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Text commands in draw order.
    #[inline]
    pub fn text(&self) -> &[TextCommand] {
        &self.text
    }

    /// Resize (contents are cleared).
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, Color::BLACK.0);
        self.text.clear();
    }

    /// Fill with one colour and drop text commands.
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.0);
        self.text.clear();
    }

    /// Pixel at (x, y), `None` off-frame.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Option<Color> {
        self.index(x, y).map(|i| Color(self.pixels[i]))
    }

    #[inline]
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            None
        } else {
            Some(y as usize * self.width + x as usize)
        }
    }

    /// Composite one pixel.
    #[inline]
    pub fn blend(&mut self, x: i64, y: i64, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color.over(Color(self.pixels[i])).0;
        }
    }

    /// Fill a rectangle (blended when `color` is translucent).
    pub fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Color) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i64);
        let y1 = (y + h).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let opaque = color.a() == 0xFF;
        for py in y0..y1 {
            let row = py as usize * self.width;
            for px in x0..x1 {
                let i = row + px as usize;
                self.pixels[i] = if opaque { color.0 } else { color.over(Color(self.pixels[i])).0 };
            }
        }
    }

    /// Blend a colour over the whole frame.
    pub fn overlay(&mut self, color: Color) {
        self.fill_rect(0, 0, self.width as i64, self.height as i64, color);
    }

    /// Vertical gradient between `top` and `bottom` over rows `y0..y1`.
    pub fn fill_vertical_gradient(&mut self, y0: i64, y1: i64, top: Color, bottom: Color) {
        let span = (y1 - y0).max(1) as f64;
        for y in y0.max(0)..y1.min(self.height as i64) {
            let t = (y - y0) as f64 / span;
            let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
            let c = Color::rgb(lerp(top.r(), bottom.r()), lerp(top.g(), bottom.g()), lerp(top.b(), bottom.b()));
            self.fill_rect(0, y, self.width as i64, 1, c);
        }
    }

    /// Filled circle.
    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let r2 = radius * radius;
        let y0 = (cy - radius).floor() as i64;
        let y1 = (cy + radius).ceil() as i64;
        let x0 = (cx - radius).floor() as i64;
        let x1 = (cx + radius).ceil() as i64;
        for y in y0.max(0)..=y1.min(self.height as i64 - 1) {
            let dy = y as f64 + 0.5 - cy;
            for x in x0.max(0)..=x1.min(self.width as i64 - 1) {
                let dx = x as f64 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    self.blend(x, y, color);
                }
            }
        }
    }

    /// Line of the given thickness (square brush).
    pub fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, thickness: u32, color: Color) {
        let (mut x, mut y) = (x0.round() as i64, y0.round() as i64);
        let (xe, ye) = (x1.round() as i64, y1.round() as i64);
        let dx = (xe - x).abs();
        let dy = -(ye - y).abs();
        let sx = if x < xe { 1 } else { -1 };
        let sy = if y < ye { 1 } else { -1 };
        let mut err = dx + dy;
        let t = thickness.max(1) as i64;
        let off = (t - 1) / 2;

        loop {
            self.fill_rect(x - off, y - off, t, t, color);
            if x == xe && y == ye {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Queue a text command.
    pub fn text_at(&mut self, x: i32, y: i32, text: impl Into<String>, color: Color, size: u32, align: TextAlign) {
        self.text.push(TextCommand {
            x,
            y,
            text: text.into(),
            color,
            size,
            align,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#FF0000"), Some(Color::RED));
        assert_eq!(Color::from_hex("8B4513"), Some(Color(0xFF8B4513)));
        assert_eq!(Color::from_hex("#fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("nope"), None);
    }

    #[test]
    fn test_blend() {
        let half_red = Color::RED.with_alpha(0.5);
        let out = half_red.over(Color::BLACK);
        assert_eq!(out.a(), 0xFF);
        assert!((out.r() as i32 - 128).abs() <= 1);
        assert_eq!(out.g(), 0);

        assert_eq!(Color::TRANSPARENT.over(Color::WHITE), Color::WHITE);
        assert_eq!(Color::RED.over(Color::WHITE), Color::RED);
    }

    #[test]
    fn test_shade() {
        assert_eq!(Color::WHITE.shade(0.0), Color::BLACK);
        assert_eq!(Color::WHITE.shade(1.0), Color::WHITE);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut frame = Frame::new(4, 4);
        frame.fill_rect(-2, -2, 4, 4, Color::WHITE);
        assert_eq!(frame.get(0, 0), Some(Color::WHITE));
        assert_eq!(frame.get(1, 1), Some(Color::WHITE));
        assert_eq!(frame.get(2, 2), Some(Color::BLACK));
        frame.fill_rect(10, 10, 5, 5, Color::WHITE);
        assert_eq!(frame.get(10, 10), None);
    }

    #[test]
    fn test_circle_and_line() {
        let mut frame = Frame::new(20, 20);
        frame.fill_circle(10.0, 10.0, 3.0, Color::ORANGE);
        assert_eq!(frame.get(10, 10), Some(Color::ORANGE));
        assert_eq!(frame.get(0, 0), Some(Color::BLACK));

        frame.draw_line(0.0, 19.0, 19.0, 19.0, 1, Color::RED);
        assert_eq!(frame.get(0, 19), Some(Color::RED));
        assert_eq!(frame.get(19, 19), Some(Color::RED));
    }

    #[test]
    fn test_clear_drops_text() {
        let mut frame = Frame::new(2, 2);
        frame.text_at(0, 0, "hi", Color::WHITE, 20, TextAlign::Left);
        assert_eq!(frame.text().len(), 1);
        frame.clear(Color::BLACK);
        assert!(frame.text().is_empty());
    }
}
