//! Trace colors for the presentation overlay

use rand::Rng;
use std::fmt;

/// Brightness ceiling (R+G+B) for colors of newly mirrored signals
pub const SIGNAL_BRIGHTNESS_CEILING: u16 = 450;

/// Brightness ceiling for colors of signal groups
pub const GROUP_BRIGHTNESS_CEILING: u16 = 500;

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color given to signals seeded from an existing structure snapshot (#4dea84)
    pub const SEED: Rgb = Rgb::new(0x4d, 0xea, 0x84);

    pub fn brightness(&self) -> u16 {
        self.r as u16 + self.g as u16 + self.b as u16
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Draw uniformly random colors until one is no brighter than `ceiling`
pub fn random_color<R: Rng + ?Sized>(rng: &mut R, ceiling: u16) -> Rgb {
    loop {
        let color = Rgb::new(rng.gen(), rng.gen(), rng.gen());
        if color.brightness() <= ceiling {
            return color;
        }
    }
}
