//! Double-buffered VGA display driver
//!
//! Drives a pixel-buffer DMA controller with two buffers in the SRAM arena.
//! All drawing goes to the back buffer; `clear` swaps the buffers, waits for
//! the controller to confirm, and blanks the new back buffer.
//!
//! # Buffer handshake (init)
//! ```text
//! back := first   swap   wait     -> front = first
//! back := second  swap            -> front = second, back = first
//! fill back with background
//! ```
//!
//! The controller HAL exchanges its front/back registers as soon as a swap
//! is requested; the status flag only tells when the retrace has happened.
//! [`FrameBuffers`] mirrors the registers, so it flips at request time too.

use core::mem;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Dimensions, OriginDimensions, Size},
    pixelcolor::Rgb565,
    primitives::Rectangle,
    Pixel,
};

use crate::color::Color;
use crate::config::{DisplayConfig, SpriteBounds, SwapWait};
use crate::device::{BufferSelect, Resolution, VideoDevice, VideoPlatform};
use crate::error::DisplayError;
use crate::sprite::Sprite;
use crate::surface::DisplaySurface;

/// Every draw command targets the back buffer
const DRAW_TARGET: BufferSelect = BufferSelect::Back;

/// Driver lifecycle, as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// `init` has not run
    Uninitialized,
    /// Buffers are set up; drawing is allowed
    Ready,
    /// `init` failed; the surface is unusable
    Failed,
}

/// Addresses of the displayed and the drawn buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBuffers {
    /// Buffer scanned out
    pub front: u32,
    /// Buffer being drawn
    pub back: u32,
}

impl FrameBuffers {
    /// Lay out two consecutive `frame_bytes` regions, the first one frame
    /// past `arena_base`. Both must end inside the `arena_len` byte arena.
    pub fn new(arena_base: u32, arena_len: u32, frame_bytes: u32) -> Result<Self, DisplayError> {
        let front = arena_base
            .checked_add(frame_bytes)
            .ok_or(DisplayError::ArenaOverflow)?;
        let back = front
            .checked_add(frame_bytes)
            .ok_or(DisplayError::ArenaOverflow)?;
        let end = back as u64 + frame_bytes as u64;
        if end > arena_base as u64 + arena_len as u64 {
            return Err(DisplayError::ArenaOverflow);
        }
        Ok(Self { front, back })
    }

    /// Same pair with the roles exchanged
    pub fn swapped(self) -> Self {
        Self {
            front: self.back,
            back: self.front,
        }
    }
}

enum Stage<D> {
    Uninitialized,
    Ready {
        device: D,
        buffers: FrameBuffers,
        /// A swap was requested but its completion has not been observed
        swap_pending: bool,
    },
    Failed,
}

/// Busy-poll the controller until the requested swap has happened
fn wait_for_swap<D: VideoDevice>(device: &mut D, wait: SwapWait) -> Result<(), DisplayError> {
    match wait {
        SwapWait::Forever => {
            while device.swap_in_progress() {
                core::hint::spin_loop();
            }
            Ok(())
        }
        SwapWait::Spins(limit) => {
            for _ in 0..limit {
                if !device.swap_in_progress() {
                    return Ok(());
                }
                core::hint::spin_loop();
            }
            Err(DisplayError::SwapTimeout)
        }
    }
}

/// Double-buffered display on a pixel-buffer DMA controller
pub struct VgaDisplay<P: VideoPlatform> {
    platform: P,
    config: DisplayConfig,
    width: u16,
    height: u16,
    stage: Stage<P::Device>,
    frames_presented: u32,
}

impl<P: VideoPlatform> VgaDisplay<P> {
    pub fn new(platform: P) -> Self {
        Self::with_config(platform, DisplayConfig::default())
    }

    pub fn with_config(platform: P, config: DisplayConfig) -> Self {
        Self {
            platform,
            config,
            width: config.default_width,
            height: config.default_height,
            stage: Stage::Uninitialized,
            frames_presented: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        match self.stage {
            Stage::Uninitialized => DriverState::Uninitialized,
            Stage::Ready { .. } => DriverState::Ready,
            Stage::Failed => DriverState::Failed,
        }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Current front/back assignment, once initialized
    pub fn buffers(&self) -> Option<FrameBuffers> {
        match self.stage {
            Stage::Ready { buffers, .. } => Some(buffers),
            _ => None,
        }
    }

    /// Number of frames presented by `clear`
    pub fn frames_presented(&self) -> u32 {
        self.frames_presented
    }

    pub fn device(&self) -> Option<&P::Device> {
        match &self.stage {
            Stage::Ready { device, .. } => Some(device),
            _ => None,
        }
    }

    pub fn device_mut(&mut self) -> Option<&mut P::Device> {
        match &mut self.stage {
            Stage::Ready { device, .. } => Some(device),
            _ => None,
        }
    }

    /// Tear the driver down and hand back the controller, if it was opened
    pub fn shutdown(mut self) -> Option<P::Device> {
        match mem::replace(&mut self.stage, Stage::Uninitialized) {
            Stage::Ready { device, .. } => {
                log::debug!("pixel buffer controller released");
                Some(device)
            }
            _ => None,
        }
    }

    fn ready_device(&mut self) -> Result<&mut P::Device, DisplayError> {
        match &mut self.stage {
            Stage::Ready { device, .. } => Ok(device),
            Stage::Uninitialized => Err(DisplayError::NotInitialized),
            Stage::Failed => Err(DisplayError::DeviceUnavailable),
        }
    }

    /// Take the controller's resolution where it differs from ours
    fn adopt_resolution(&mut self, reported: Resolution) {
        if reported.width == 0 || reported.height == 0 {
            log::warn!(
                "controller reports {}x{}, keeping {}x{}",
                reported.width,
                reported.height,
                self.width,
                self.height
            );
            return;
        }
        if reported.width != self.width {
            log::warn!(
                "screen width ({}) does not match the default ({})",
                reported.width,
                self.width
            );
            self.width = reported.width;
        }
        if reported.height != self.height {
            log::warn!(
                "screen height ({}) does not match the default ({})",
                reported.height,
                self.height
            );
            self.height = reported.height;
        }
    }

    /// Program both buffers and leave the controller drawing into one of them
    fn bring_up(&self, device: &mut P::Device) -> Result<FrameBuffers, DisplayError> {
        // Controllers that pad rows need more than width * height pixels
        let frame = device
            .frame_bytes(self.width, self.height, self.config.bytes_per_pixel)
            .ok_or(DisplayError::ArenaOverflow)?;
        let layout = FrameBuffers::new(self.config.arena_base, self.config.arena_len, frame)?;
        log::debug!(
            "frame buffers at 0x{:08x} and 0x{:08x} ({}x{}, {} bytes each)",
            layout.front,
            layout.back,
            self.width,
            self.height,
            frame
        );

        device.set_back_buffer(layout.front)?;
        device.request_swap();
        wait_for_swap(device, self.config.swap_wait)?;

        device.set_back_buffer(layout.back)?;
        device.request_swap();

        device.fill_screen(self.config.background, DRAW_TARGET);
        Ok(layout.swapped())
    }

    fn blit(&mut self, x: u16, y: u16, sprite: &Sprite<'_>) -> Result<(), DisplayError> {
        let (mut rows, mut cols) = (sprite.height(), sprite.width());
        if self.config.sprite_bounds == SpriteBounds::ClampToSurface {
            rows = rows.min(self.height.saturating_sub(y));
            cols = cols.min(self.width.saturating_sub(x));
        }
        let device = self.ready_device()?;
        for i in 0..rows {
            let (Some(dy), Some(row)) = (y.checked_add(i), sprite.row(i)) else {
                break;
            };
            for (j, &color) in (0..cols).zip(row) {
                if color.is_transparent() {
                    continue;
                }
                let Some(dx) = x.checked_add(j) else {
                    break;
                };
                device.draw_pixel(color, dx, dy, DRAW_TARGET);
            }
        }
        Ok(())
    }
}

impl<P: VideoPlatform> DisplaySurface for VgaDisplay<P> {
    fn init(&mut self) -> Result<(), DisplayError> {
        match self.stage {
            Stage::Uninitialized => {}
            Stage::Ready { .. } => return Err(DisplayError::AlreadyInitialized),
            Stage::Failed => return Err(DisplayError::DeviceUnavailable),
        }

        let reported = Resolution::from_word(self.platform.resolution_word());

        let mut device = match self.platform.open_device(self.config.device_name) {
            Ok(device) => device,
            Err(e) => {
                log::error!(
                    "cannot open pixel buffer controller {}: {}",
                    self.config.device_name,
                    e
                );
                self.stage = Stage::Failed;
                return Err(DisplayError::DeviceUnavailable);
            }
        };

        self.adopt_resolution(reported);

        match self.bring_up(&mut device) {
            Ok(buffers) => {
                self.stage = Stage::Ready {
                    device,
                    buffers,
                    swap_pending: false,
                };
                Ok(())
            }
            Err(e) => {
                log::error!("display bring-up failed: {}", e);
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    fn draw_pixel(&mut self, x: u16, y: u16, color: Color) -> Result<(), DisplayError> {
        self.ready_device()?.draw_pixel(color, x, y, DRAW_TARGET);
        Ok(())
    }

    fn draw_box(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Color,
        fill: bool,
    ) -> Result<(), DisplayError> {
        let device = self.ready_device()?;
        if width == 0 || height == 0 {
            return Ok(());
        }
        // The controller's box primitive takes inclusive end coordinates
        let x1 = (x as u32 + width as u32 - 1).min(u16::MAX as u32) as u16;
        let y1 = (y as u32 + height as u32 - 1).min(u16::MAX as u32) as u16;
        device.draw_box(color, x, y, x1, y1, DRAW_TARGET, fill);
        Ok(())
    }

    fn draw_sprite(&mut self, x: u16, y: u16, sprite: &Sprite<'_>) -> Result<(), DisplayError> {
        self.blit(x, y, sprite)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let wait = self.config.swap_wait;
        let background = self.config.background;
        match &mut self.stage {
            Stage::Ready {
                device,
                buffers,
                swap_pending,
            } => {
                if !*swap_pending {
                    device.request_swap();
                    *buffers = buffers.swapped();
                    *swap_pending = true;
                    log::trace!("swap requested, front 0x{:08x}", buffers.front);
                }
                wait_for_swap(device, wait)?;
                *swap_pending = false;

                device.fill_screen(background, DRAW_TARGET);
                self.frames_presented = self.frames_presented.wrapping_add(1);
                Ok(())
            }
            Stage::Uninitialized => Err(DisplayError::NotInitialized),
            Stage::Failed => Err(DisplayError::DeviceUnavailable),
        }
    }

    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }
}

impl<P: VideoPlatform> Drop for VgaDisplay<P> {
    fn drop(&mut self) {
        if let Stage::Ready { .. } = self.stage {
            log::debug!("pixel buffer controller released");
        }
    }
}

// =============================================================================
// embedded-graphics DrawTarget implementation
// =============================================================================

impl<P: VideoPlatform> OriginDimensions for VgaDisplay<P> {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl<P: VideoPlatform> DrawTarget for VgaDisplay<P> {
    type Color = Rgb565;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = (self.width as i32, self.height as i32);
        let device = self.ready_device()?;
        for Pixel(coord, color) in pixels.into_iter() {
            if coord.x >= 0 && coord.y >= 0 && coord.x < width && coord.y < height {
                device.draw_pixel(color.into(), coord.x as u16, coord.y as u16, DRAW_TARGET);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let device = self.ready_device()?;
        if let Some(bottom_right) = area.bottom_right() {
            let top_left = area.top_left;
            device.draw_box(
                color.into(),
                top_left.x as u16,
                top_left.y as u16,
                bottom_right.x as u16,
                bottom_right.y as u16,
                DRAW_TARGET,
                true,
            );
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.ready_device()?.fill_screen(color.into(), DRAW_TARGET);
        Ok(())
    }
}


#[cfg(test)]
mod draw_target_tests {
    use super::*;
    use crate::device::sim::{SimConfig, SimPlatform};
    use embedded_graphics::{
        pixelcolor::RgbColor,
        prelude::{Point, Primitive},
        primitives::PrimitiveStyle,
        Drawable,
    };

    fn ready() -> VgaDisplay<SimPlatform> {
        let mut d = VgaDisplay::new(SimPlatform::new(SimConfig::default()));
        DisplaySurface::init(&mut d).unwrap();
        d
    }

    fn back(d: &VgaDisplay<SimPlatform>) -> &crate::device::SimVideo {
        d.device().unwrap()
    }

    #[test]
    fn test_size() {
        let d = ready();
        assert_eq!(d.size(), Size::new(320, 240));
    }

    #[test]
    fn test_pixels_through_driver() {
        let mut d = ready();
        Pixel(Point::new(3, 4), Rgb565::RED).draw(&mut d).unwrap();
        Pixel(Point::new(-1, 4), Rgb565::RED).draw(&mut d).unwrap();
        Pixel(Point::new(320, 4), Rgb565::RED).draw(&mut d).unwrap();
        assert_eq!(back(&d).pixel(BufferSelect::Back, 3, 4), Some(Color::RED));
        assert_eq!(back(&d).count_pixels(BufferSelect::Back, Color::RED), 1);
        assert_eq!(back(&d).clipped_writes(), 0);
    }

    #[test]
    fn test_filled_rectangle_uses_box_primitive() {
        let mut d = ready();
        Rectangle::new(Point::new(316, 2), Size::new(10, 3))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::BLUE))
            .draw(&mut d)
            .unwrap();
        // Clipped to the four columns left of the right edge
        assert_eq!(back(&d).count_pixels(BufferSelect::Back, Color::BLUE), 4 * 3);
        assert_eq!(back(&d).pixel(BufferSelect::Back, 319, 4), Some(Color::BLUE));
    }

    #[test]
    fn test_clear_fills_back_buffer_without_swap() {
        let mut d = ready();
        DrawTarget::clear(&mut d, Rgb565::GREEN).unwrap();
        assert_eq!(back(&d).count_pixels(BufferSelect::Back, Color::GREEN), 320 * 240);
        assert_eq!(back(&d).swaps_requested(), 2);
        assert_eq!(d.frames_presented(), 0);
    }

    #[test]
    fn test_requires_init() {
        let mut d = VgaDisplay::new(SimPlatform::new(SimConfig::default()));
        assert_eq!(
            Pixel(Point::new(0, 0), Rgb565::RED).draw(&mut d),
            Err(DisplayError::NotInitialized)
        );
    }
}
