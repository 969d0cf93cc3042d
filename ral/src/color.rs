//! 16-bit 5-6-5 packed color

use core::fmt;

use embedded_graphics::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics::pixelcolor::Rgb565;

use crate::config::{COLOR_BACKGROUND, COLOR_TRANSPARENCY};

/// Packed RGB color: red in bits 15..11, green in 10..5, blue in 4..0
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u16);

impl Color {
    /// Color key for sprites. Pixels with this value are never drawn.
    ///
    /// An opaque color that happens to pack to the same value cannot be
    /// drawn through a sprite; it is indistinguishable from transparency.
    pub const TRANSPARENT: Color = Color(COLOR_TRANSPARENCY);

    /// Fill used for every fresh draw buffer
    pub const BACKGROUND: Color = Color(COLOR_BACKGROUND);

    pub const BLACK: Color = Color(0x0000);
    pub const WHITE: Color = Color(0xFFFF);
    pub const RED: Color = Color(0xF800);
    pub const GREEN: Color = Color(0x07E0);
    pub const BLUE: Color = Color(0x001F);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Pack 5/6/5 bit components. Out-of-range bits are masked off.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self((((r & 0x1F) as u16) << 11) | (((g & 0x3F) as u16) << 5) | ((b & 0x1F) as u16))
    }

    /// Pack 8-bit components by dropping their low bits
    pub const fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        Self::new(r >> 3, g >> 2, b >> 3)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 11) as u8 & 0x1F
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 5) as u8 & 0x3F
    }

    pub const fn b(self) -> u8 {
        self.0 as u8 & 0x1F
    }

    #[inline]
    pub const fn is_transparent(self) -> bool {
        self.0 == COLOR_TRANSPARENCY
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(0x{:04X})", self.0)
    }
}

impl From<u16> for Color {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Color> for u16 {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl From<Rgb565> for Color {
    fn from(color: Rgb565) -> Self {
        Self(RawU16::from(color).into_inner())
    }
}

impl From<Color> for Rgb565 {
    fn from(color: Color) -> Self {
        Rgb565::from(RawU16::new(color.0))
    }
}
