//! Drawing surface abstraction
//!
//! Application code draws through this trait and never touches a specific
//! display backend. Each backend owns its own resolution and device state.

use crate::color::Color;
use crate::error::DisplayError;
use crate::sprite::Sprite;

/// Drawing surface trait
///
/// Implemented by display backends (double-buffered VGA, ...).
/// Every drawing call targets the frame being built; `clear` presents it.
pub trait DisplaySurface {
    /// One-time hardware bring-up. Must succeed before any drawing.
    ///
    /// # Returns
    /// * `Err(AlreadyInitialized)` on a second call
    /// * `Err(DeviceUnavailable)` if the device could not be opened; the
    ///   surface stays unusable
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Set the pixel at `(x, y)`. Coordinates outside
    /// `[0, width) x [0, height)` are handled by the backend device.
    fn draw_pixel(&mut self, x: u16, y: u16, color: Color) -> Result<(), DisplayError>;

    /// Draw a `width x height` rectangle with its top-left corner at
    /// `(x, y)`, covering columns `x..=x+width-1` and rows `y..=y+height-1`.
    /// `fill == false` draws only the outline.
    fn draw_box(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Color,
        fill: bool,
    ) -> Result<(), DisplayError>;

    /// Filled rectangle
    fn fill_box(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Color,
    ) -> Result<(), DisplayError> {
        self.draw_box(x, y, width, height, color, true)
    }

    /// Blit `sprite` with its top-left corner at `(x, y)`.
    /// [`Color::TRANSPARENT`] cells leave the destination untouched.
    fn draw_sprite(&mut self, x: u16, y: u16, sprite: &Sprite<'_>) -> Result<(), DisplayError>;

    /// Present the frame just drawn and start a blank one
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Surface width in pixels
    fn width(&self) -> u16;

    /// Surface height in pixels
    fn height(&self) -> u16;
}
