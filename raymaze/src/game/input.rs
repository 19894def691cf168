//! Input Capture
//!
//! One frame of held keys plus edge-triggered actions, packed into a byte.
//! The host sets the bits; the tick reads them.

use serde::{Deserialize, Serialize};

/// Input state for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Action flags (packed bits):
    /// - Bit 0: forward held
    /// - Bit 1: backward held
    /// - Bit 2: turn left held
    /// - Bit 3: turn right held
    /// - Bit 4: fire pressed this frame
    /// - Bit 5: switch weapon pressed this frame
    pub flags: u8,
}

impl InputFrame {
    /// Move along the facing direction
    pub const FLAG_FORWARD: u8 = 0x01;
    /// Move against the facing direction
    pub const FLAG_BACKWARD: u8 = 0x02;
    /// Rotate counter-clockwise
    pub const FLAG_LEFT: u8 = 0x04;
    /// Rotate clockwise
    pub const FLAG_RIGHT: u8 = 0x08;
    /// Fire the equipped weapon
    pub const FLAG_FIRE: u8 = 0x10;
    /// Cycle to the next weapon
    pub const FLAG_SWITCH: u8 = 0x20;

    /// Create a new empty input frame.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Builder: set a flag.
    pub const fn with(self, flag: u8) -> Self {
        Self { flags: self.flags | flag }
    }

    #[inline]
    fn has(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Signed move direction: +1 forward, -1 back, 0 none or both.
    #[inline]
    pub fn move_axis(&self) -> f64 {
        match (self.has(Self::FLAG_FORWARD), self.has(Self::FLAG_BACKWARD)) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    /// Signed turn direction: -1 left, +1 right, 0 none or both.
    #[inline]
    pub fn turn_axis(&self) -> f64 {
        match (self.has(Self::FLAG_LEFT), self.has(Self::FLAG_RIGHT)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Fire was pressed this frame.
    #[inline]
    pub fn fire_pressed(&self) -> bool {
        self.has(Self::FLAG_FIRE)
    }

    /// Weapon switch was pressed this frame.
    #[inline]
    pub fn switch_pressed(&self) -> bool {
        self.has(Self::FLAG_SWITCH)
    }

    /// Set or clear a flag.
    #[inline]
    pub fn set(&mut self, flag: u8, pressed: bool) {
        if pressed {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_frame_default() {
        let frame = InputFrame::new();
        assert_eq!(frame.flags, 0);
        assert_eq!(frame.move_axis(), 0.0);
        assert_eq!(frame.turn_axis(), 0.0);
        assert!(!frame.fire_pressed());
    }

    #[test]
    fn test_axes() {
        let f = InputFrame::new().with(InputFrame::FLAG_FORWARD).with(InputFrame::FLAG_LEFT);
        assert_eq!(f.move_axis(), 1.0);
        assert_eq!(f.turn_axis(), -1.0);

        let both = InputFrame::new().with(InputFrame::FLAG_FORWARD).with(InputFrame::FLAG_BACKWARD);
        assert_eq!(both.move_axis(), 0.0);
    }

    #[test]
    fn test_set_flags() {
        let mut frame = InputFrame::new();

        frame.set(InputFrame::FLAG_FIRE, true);
        assert!(frame.fire_pressed());
        assert!(!frame.switch_pressed());

        frame.set(InputFrame::FLAG_SWITCH, true);
        assert!(frame.switch_pressed());

        frame.set(InputFrame::FLAG_FIRE, false);
        assert!(!frame.fire_pressed());
        assert!(frame.switch_pressed());
    }
}
