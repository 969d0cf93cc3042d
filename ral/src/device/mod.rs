//! Video device abstraction
//!
//! The display driver talks to the pixel-buffer DMA controller only through
//! [`VideoPlatform`] (resolution register + open) and [`VideoDevice`]
//! (the opened handle). Two backends are provided:
//!
//! - `mmio`: register-level controller behind a memory-mapped window
//! - `sim`: memory-backed controller for tests and host-side previews

pub mod mmio;
pub mod sim;

pub use mmio::{MmioPlatform, MmioVideoDma, StatusFlags};
pub use sim::{SimConfig, SimPlatform, SimVideo};

use crate::color::Color;
use crate::error::DeviceError;

/// Which buffer a draw command targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BufferSelect {
    /// The buffer currently scanned out
    Front = 0,
    /// The buffer being drawn
    Back = 1,
}

/// Resolution as reported by the controller's resolution register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u16,
    pub height: u16,
}

impl Resolution {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Decode the resolution word: width in the low half, height above it
    pub const fn from_word(word: u32) -> Self {
        Self {
            width: (word & 0xFFFF) as u16,
            height: ((word >> 16) & 0xFFFF) as u16,
        }
    }

    pub const fn to_word(self) -> u32 {
        ((self.height as u32) << 16) | self.width as u32
    }

    pub const fn pixel_count(self) -> u32 {
        self.width as u32 * self.height as u32
    }
}

/// Opened handle to a pixel-buffer DMA controller
///
/// Every drawing command takes the buffer it targets. Coordinates outside the
/// controller's resolution are backend-defined.
pub trait VideoDevice {
    /// Bytes one `width x height` buffer occupies in the arena, `None` if it
    /// does not fit in `u32`. Controllers that pad rows report the padding.
    fn frame_bytes(&self, width: u16, height: u16, bytes_per_pixel: u32) -> Option<u32> {
        (width as u32)
            .checked_mul(height as u32)?
            .checked_mul(bytes_per_pixel)
    }

    /// Program the back buffer register. The whole frame starting at `addr`
    /// must lie inside the controller's arena.
    fn set_back_buffer(&mut self, addr: u32) -> Result<(), DeviceError>;

    /// Ask the controller to exchange front and back at the next retrace
    fn request_swap(&mut self);

    /// True while a requested swap has not completed
    fn swap_in_progress(&mut self) -> bool;

    /// Fill a whole buffer with one color
    fn fill_screen(&mut self, color: Color, target: BufferSelect);

    /// Set one pixel
    fn draw_pixel(&mut self, color: Color, x: u16, y: u16, target: BufferSelect);

    /// Draw a rectangle between two inclusive corners
    #[allow(clippy::too_many_arguments)]
    fn draw_box(
        &mut self,
        color: Color,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
        target: BufferSelect,
        fill: bool,
    );
}

/// Board-level access to the controller before it is opened
pub trait VideoPlatform {
    type Device: VideoDevice;

    /// Raw resolution register contents
    fn resolution_word(&self) -> u32;

    /// Open the controller by name
    fn open_device(&mut self, name: &str) -> Result<Self::Device, DeviceError>;
}

/// Visit every pixel of the rectangle between two inclusive corners that
/// lies inside `res`. With `fill == false` only the border is visited;
/// the border is taken from the unclipped corners.
pub(crate) fn for_each_box_pixel(
    x0: u16,
    y0: u16,
    x1: u16,
    y1: u16,
    res: Resolution,
    fill: bool,
    mut f: impl FnMut(u16, u16),
) {
    let (left, right) = (x0.min(x1), x0.max(x1));
    let (top, bottom) = (y0.min(y1), y0.max(y1));
    if left >= res.width || top >= res.height {
        return;
    }
    for y in top..=bottom.min(res.height - 1) {
        for x in left..=right.min(res.width - 1) {
            if fill || x == left || x == right || y == top || y == bottom {
                f(x, y);
            }
        }
    }
}
