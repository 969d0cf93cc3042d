//! Simulated pixel-buffer DMA controller
//!
//! Backs both buffers with heap memory laid out like the SRAM arena, so the
//! display driver's address arithmetic is exercised unchanged. Register
//! behavior follows the controller HAL:
//!
//! - `request_swap` exchanges the front and back registers immediately and
//!   then reports "swap in progress" for `swap_latency` status polls.
//! - Draw commands address `buffer + (y * width + x) * bytes_per_pixel` and
//!   store the color in the low half of the pixel word.
//! - Pixels outside the resolution are clipped and counted. Writes that fall
//!   outside the arena are dropped and counted.

use core::sync::atomic::{AtomicBool, Ordering};

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use super::{for_each_box_pixel, BufferSelect, Resolution, VideoDevice, VideoPlatform};
use crate::color::Color;
use crate::config::{BYTES_PER_PIXEL, DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH, SRAM_BASE};
use crate::error::DeviceError;

/// Swap latency that never completes
pub const SWAP_NEVER_COMPLETES: u32 = u32::MAX;

/// Simulated board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Resolution reported by the resolution register
    pub resolution: Resolution,
    pub arena_base: u32,
    /// Arena size in bytes
    pub arena_len: u32,
    pub bytes_per_pixel: u32,
    /// Status polls that report "in progress" after each swap request
    pub swap_latency: u32,
    /// Make `open_device` fail
    pub fail_open: bool,
}

impl SimConfig {
    /// Arena sized for an unused leading frame followed by two buffers
    pub fn for_resolution(resolution: Resolution) -> Self {
        let frame = resolution.pixel_count().saturating_mul(BYTES_PER_PIXEL);
        Self {
            resolution,
            arena_base: SRAM_BASE,
            arena_len: frame.saturating_mul(3),
            bytes_per_pixel: BYTES_PER_PIXEL,
            swap_latency: 2,
            fail_open: false,
        }
    }

    pub fn with_swap_latency(mut self, polls: u32) -> Self {
        self.swap_latency = polls;
        self
    }

    pub fn with_failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::for_resolution(Resolution::new(DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT))
    }
}

/// Simulated board: resolution register plus a single openable controller
pub struct SimPlatform {
    config: SimConfig,
    open_calls: u32,
    opened_name: Option<String>,
    claim: Arc<AtomicBool>,
}

impl SimPlatform {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            open_calls: 0,
            opened_name: None,
            claim: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of `open_device` calls, successful or not
    pub fn open_calls(&self) -> u32 {
        self.open_calls
    }

    /// Name the controller was last opened under
    pub fn opened_name(&self) -> Option<&str> {
        self.opened_name.as_deref()
    }
}

impl VideoPlatform for SimPlatform {
    type Device = SimVideo;

    fn resolution_word(&self) -> u32 {
        self.config.resolution.to_word()
    }

    fn open_device(&mut self, name: &str) -> Result<SimVideo, DeviceError> {
        self.open_calls += 1;
        if self.config.fail_open {
            return Err(DeviceError::NotFound);
        }
        if self.claim.swap(true, Ordering::Acquire) {
            return Err(DeviceError::Busy);
        }
        self.opened_name = Some(String::from(name));
        let mut device = SimVideo::new(self.config);
        device.claim = Some(Arc::clone(&self.claim));
        Ok(device)
    }
}

/// Opened simulated controller
pub struct SimVideo {
    config: SimConfig,
    memory: Vec<u8>,
    front: u32,
    back: u32,
    pending_polls: u32,
    back_buffer_log: Vec<u32>,
    swaps_requested: u32,
    status_polls: u32,
    clipped_writes: u32,
    dropped_writes: u32,
    /// Platform claim released on drop
    claim: Option<Arc<AtomicBool>>,
}

impl SimVideo {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            memory: vec![0u8; config.arena_len as usize],
            front: config.arena_base,
            back: config.arena_base,
            pending_polls: 0,
            back_buffer_log: Vec::new(),
            swaps_requested: 0,
            status_polls: 0,
            clipped_writes: 0,
            dropped_writes: 0,
            claim: None,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.config.resolution
    }

    /// Address currently scanned out
    pub fn front_addr(&self) -> u32 {
        self.front
    }

    /// Address currently targeted by back-buffer draws
    pub fn back_addr(&self) -> u32 {
        self.back
    }

    /// Every address programmed through `set_back_buffer`, in order
    pub fn back_buffer_log(&self) -> &[u32] {
        &self.back_buffer_log
    }

    pub fn swaps_requested(&self) -> u32 {
        self.swaps_requested
    }

    pub fn status_polls(&self) -> u32 {
        self.status_polls
    }

    /// Pixel writes outside the resolution
    pub fn clipped_writes(&self) -> u32 {
        self.clipped_writes
    }

    /// Pixel writes that landed outside the arena
    pub fn dropped_writes(&self) -> u32 {
        self.dropped_writes
    }

    /// Change the latency of subsequent swap requests
    pub fn set_swap_latency(&mut self, polls: u32) {
        self.config.swap_latency = polls;
    }

    fn buffer_addr(&self, target: BufferSelect) -> u32 {
        match target {
            BufferSelect::Front => self.front,
            BufferSelect::Back => self.back,
        }
    }

    /// Arena offset of a pixel word, `None` when it falls outside the arena
    fn offset_of(&self, buffer: u32, x: u16, y: u16) -> Option<usize> {
        let index = y as u64 * self.config.resolution.width as u64 + x as u64;
        let addr = buffer as u64 + index * self.config.bytes_per_pixel as u64;
        let base = self.config.arena_base as u64;
        if addr < base || addr + 2 > base + self.memory.len() as u64 {
            return None;
        }
        Some((addr - base) as usize)
    }

    fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.config.resolution.width && y < self.config.resolution.height
    }

    fn write_pixel(&mut self, buffer: u32, x: u16, y: u16, color: Color) {
        if !self.in_bounds(x, y) {
            self.clipped_writes += 1;
            return;
        }
        match self.offset_of(buffer, x, y) {
            Some(off) => self.memory[off..off + 2].copy_from_slice(&color.raw().to_le_bytes()),
            None => self.dropped_writes += 1,
        }
    }

    /// Read one pixel of the buffer at `buffer`
    pub fn pixel_at(&self, buffer: u32, x: u16, y: u16) -> Option<Color> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let off = self.offset_of(buffer, x, y)?;
        Some(Color(u16::from_le_bytes([self.memory[off], self.memory[off + 1]])))
    }

    /// Read one pixel of the front or back buffer
    pub fn pixel(&self, target: BufferSelect, x: u16, y: u16) -> Option<Color> {
        self.pixel_at(self.buffer_addr(target), x, y)
    }

    /// Count pixels of `target` equal to `color`
    pub fn count_pixels(&self, target: BufferSelect, color: Color) -> usize {
        let res = self.config.resolution;
        let buffer = self.buffer_addr(target);
        (0..res.height)
            .flat_map(|y| (0..res.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel_at(buffer, x, y) == Some(color))
            .count()
    }
}

impl Drop for SimVideo {
    fn drop(&mut self) {
        if let Some(claim) = &self.claim {
            claim.store(false, Ordering::Release);
        }
    }
}

impl VideoDevice for SimVideo {
    fn set_back_buffer(&mut self, addr: u32) -> Result<(), DeviceError> {
        let res = self.config.resolution;
        let frame = self
            .frame_bytes(res.width, res.height, self.config.bytes_per_pixel)
            .ok_or(DeviceError::AddressOutOfRange)?;
        let base = self.config.arena_base as u64;
        let end = addr as u64 + frame.max(1) as u64;
        if (addr as u64) < base || end > base + self.memory.len() as u64 {
            return Err(DeviceError::AddressOutOfRange);
        }
        self.back = addr;
        self.back_buffer_log.push(addr);
        Ok(())
    }

    fn request_swap(&mut self) {
        core::mem::swap(&mut self.front, &mut self.back);
        self.swaps_requested += 1;
        self.pending_polls = self.config.swap_latency;
    }

    fn swap_in_progress(&mut self) -> bool {
        self.status_polls = self.status_polls.wrapping_add(1);
        if self.pending_polls == 0 {
            return false;
        }
        if self.pending_polls != SWAP_NEVER_COMPLETES {
            self.pending_polls -= 1;
        }
        true
    }

    fn fill_screen(&mut self, color: Color, target: BufferSelect) {
        let res = self.config.resolution;
        let buffer = self.buffer_addr(target);
        for y in 0..res.height {
            for x in 0..res.width {
                self.write_pixel(buffer, x, y, color);
            }
        }
    }

    fn draw_pixel(&mut self, color: Color, x: u16, y: u16, target: BufferSelect) {
        let buffer = self.buffer_addr(target);
        self.write_pixel(buffer, x, y, color);
    }

    fn draw_box(
        &mut self,
        color: Color,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
        target: BufferSelect,
        fill: bool,
    ) {
        let buffer = self.buffer_addr(target);
        let res = self.config.resolution;
        for_each_box_pixel(x0, y0, x1, y1, res, fill, |x, y| {
            self.write_pixel(buffer, x, y, color)
        });
    }
}
