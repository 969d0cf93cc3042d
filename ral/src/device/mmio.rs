//! Pixel-buffer DMA controller driver (memory-mapped registers)
//!
//! # Register map (32-bit words from the controller base)
//! ```text
//! 0x0  BUFFER       front buffer address, any write requests a swap
//! 0x4  BACK_BUFFER  back buffer address
//! 0x8  RESOLUTION   width in bits 15..0, height in bits 31..16
//! 0xC  STATUS       see StatusFlags
//! ```
//!
//! Buffers live in the SRAM arena. Pixel words are addressed linearly
//! (`buffer + (y * width + x) * bytes_per_pixel`) or, in XY mode, with a row
//! stride of `width.next_power_of_two()` pixels. The color occupies the low
//! 16 bits of each word. A frame therefore spans `height` padded rows, which
//! is what [`VideoDevice::frame_bytes`] reports.

use core::ptr::{read_volatile, write_volatile};
use core::sync::atomic::{AtomicBool, Ordering};

use alloc::sync::Arc;

use super::{for_each_box_pixel, BufferSelect, Resolution, VideoDevice, VideoPlatform};
use crate::color::Color;
use crate::config::{BYTES_PER_PIXEL, PIXEL_DMA_BASE, PIXEL_DMA_NAME, SRAM_BASE, SRAM_LEN};
use crate::error::DeviceError;

// Register indices (u32 words)
const REG_BUFFER: usize = 0;
const REG_BACK_BUFFER: usize = 1;
const REG_RESOLUTION: usize = 2;
const REG_STATUS: usize = 3;

bitflags::bitflags! {
    /// Controller status register
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct StatusFlags: u32 {
        /// A requested swap has not happened yet
        const SWAP_PENDING = 1 << 0;
        /// Pixels are addressed by (x, y) bit fields instead of linearly
        const XY_ADDRESSING = 1 << 1;
    }
}

/// Where the controller and its SRAM arena are mapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmioLayout {
    /// Virtual address of the register block
    pub regs_base: usize,
    /// Virtual address at which the arena's first byte is mapped
    pub arena_window: usize,
    /// Bus address of the arena, as programmed into the buffer registers
    pub arena_base: u32,
    /// Arena size in bytes
    pub arena_len: u32,
    pub bytes_per_pixel: u32,
}

impl MmioLayout {
    /// Board layout: identity-mapped registers and SRAM
    pub const BOARD: MmioLayout = MmioLayout {
        regs_base: PIXEL_DMA_BASE,
        arena_window: SRAM_BASE as usize,
        arena_base: SRAM_BASE,
        arena_len: SRAM_LEN,
        bytes_per_pixel: BYTES_PER_PIXEL,
    };
}

/// Board access to one pixel-buffer DMA controller
pub struct MmioPlatform {
    layout: MmioLayout,
    name: &'static str,
    /// Held by the opened device until it is dropped
    claim: Arc<AtomicBool>,
}

impl MmioPlatform {
    /// # Safety
    /// - `layout.regs_base` must point at the controller's four registers
    /// - `layout.arena_window` must map `layout.arena_len` writable bytes
    /// - No other code may access either region while a device opened from
    ///   this platform is alive
    pub unsafe fn new(layout: MmioLayout, name: &'static str) -> Self {
        Self {
            layout,
            name,
            claim: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Controller on the board's fixed addresses
    ///
    /// # Safety
    /// Same requirements as [`MmioPlatform::new`] for [`MmioLayout::BOARD`].
    pub unsafe fn board() -> Self {
        Self::new(MmioLayout::BOARD, PIXEL_DMA_NAME)
    }

    fn read_reg(&self, reg: usize) -> u32 {
        // SAFETY: regs_base points at four u32 registers (see `new`)
        unsafe { read_volatile((self.layout.regs_base as *const u32).add(reg)) }
    }
}

impl VideoPlatform for MmioPlatform {
    type Device = MmioVideoDma;

    fn resolution_word(&self) -> u32 {
        self.read_reg(REG_RESOLUTION)
    }

    fn open_device(&mut self, name: &str) -> Result<MmioVideoDma, DeviceError> {
        if name != self.name {
            return Err(DeviceError::NotFound);
        }
        if self.claim.swap(true, Ordering::Acquire) {
            return Err(DeviceError::Busy);
        }
        let resolution = Resolution::from_word(self.resolution_word());
        let regs = self.layout.regs_base as *mut u32;
        // SAFETY: regs_base points at four u32 registers (see `new`)
        let (front, back) = unsafe {
            (
                read_volatile(regs.add(REG_BUFFER)),
                read_volatile(regs.add(REG_BACK_BUFFER)),
            )
        };
        log::debug!(
            "pixel dma {}: {}x{}, front 0x{:08x}, back 0x{:08x}",
            name,
            resolution.width,
            resolution.height,
            front,
            back
        );
        Ok(MmioVideoDma {
            layout: self.layout,
            claim: Arc::clone(&self.claim),
            regs,
            resolution,
            front,
            back,
        })
    }
}

/// Opened controller handle
pub struct MmioVideoDma {
    layout: MmioLayout,
    claim: Arc<AtomicBool>,
    regs: *mut u32,
    resolution: Resolution,
    front: u32,
    back: u32,
}

impl MmioVideoDma {
    fn read_reg(&self, reg: usize) -> u32 {
        // SAFETY: `regs` was validated when the platform was created
        unsafe { read_volatile(self.regs.add(reg)) }
    }

    fn write_reg(&mut self, reg: usize, value: u32) {
        // SAFETY: `regs` was validated when the platform was created
        unsafe { write_volatile(self.regs.add(reg), value) }
    }

    pub fn status(&self) -> StatusFlags {
        StatusFlags::from_bits_truncate(self.read_reg(REG_STATUS))
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn buffer_addr(&self, target: BufferSelect) -> u32 {
        match target {
            BufferSelect::Front => self.front,
            BufferSelect::Back => self.back,
        }
    }

    fn contains(&self, addr: u64, len: u64) -> bool {
        let base = self.layout.arena_base as u64;
        addr >= base && addr + len <= base + self.layout.arena_len as u64
    }

    /// Pointer to the color half of a pixel word, `None` outside the
    /// resolution or the arena
    fn pixel_ptr(&self, buffer: u32, x: u16, y: u16, xy_mode: bool) -> Option<*mut u16> {
        if x >= self.resolution.width || y >= self.resolution.height {
            return None;
        }
        let stride = row_stride(self.resolution.width, xy_mode) as u64;
        let index = y as u64 * stride + x as u64;
        let addr = buffer as u64 + index * self.layout.bytes_per_pixel as u64;
        if !self.contains(addr, 2) {
            return None;
        }
        let offset = (addr - self.layout.arena_base as u64) as usize;
        Some((self.layout.arena_window + offset) as *mut u16)
    }

    fn write_pixel(&mut self, buffer: u32, x: u16, y: u16, color: Color, xy_mode: bool) {
        if let Some(ptr) = self.pixel_ptr(buffer, x, y, xy_mode) {
            // SAFETY: pixel_ptr only returns addresses inside the arena window
            unsafe { write_volatile(ptr, color.raw()) }
        }
    }

    fn xy_mode(&self) -> bool {
        self.status().contains(StatusFlags::XY_ADDRESSING)
    }
}

/// Pixels per row as the controller addresses them
fn row_stride(width: u16, xy_mode: bool) -> u32 {
    if xy_mode {
        (width as u32).next_power_of_two()
    } else {
        width as u32
    }
}

impl Drop for MmioVideoDma {
    fn drop(&mut self) {
        self.claim.store(false, Ordering::Release);
    }
}

impl VideoDevice for MmioVideoDma {
    fn frame_bytes(&self, width: u16, height: u16, bytes_per_pixel: u32) -> Option<u32> {
        row_stride(width, self.xy_mode())
            .checked_mul(height as u32)?
            .checked_mul(bytes_per_pixel)
    }

    fn set_back_buffer(&mut self, addr: u32) -> Result<(), DeviceError> {
        let res = self.resolution;
        let frame = self
            .frame_bytes(res.width, res.height, self.layout.bytes_per_pixel)
            .ok_or(DeviceError::AddressOutOfRange)?;
        if !self.contains(addr as u64, frame.max(1) as u64) {
            return Err(DeviceError::AddressOutOfRange);
        }
        self.write_reg(REG_BACK_BUFFER, addr);
        self.back = addr;
        Ok(())
    }

    fn request_swap(&mut self) {
        self.write_reg(REG_BUFFER, 1);
        core::mem::swap(&mut self.front, &mut self.back);
    }

    fn swap_in_progress(&mut self) -> bool {
        self.status().contains(StatusFlags::SWAP_PENDING)
    }

    fn fill_screen(&mut self, color: Color, target: BufferSelect) {
        let buffer = self.buffer_addr(target);
        let xy_mode = self.xy_mode();
        for y in 0..self.resolution.height {
            for x in 0..self.resolution.width {
                self.write_pixel(buffer, x, y, color, xy_mode);
            }
        }
    }

    fn draw_pixel(&mut self, color: Color, x: u16, y: u16, target: BufferSelect) {
        let buffer = self.buffer_addr(target);
        let xy_mode = self.xy_mode();
        self.write_pixel(buffer, x, y, color, xy_mode);
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
        let xy_mode = self.xy_mode();
        let res = self.resolution;
        for_each_box_pixel(x0, y0, x1, y1, res, fill, |x, y| {
            self.write_pixel(buffer, x, y, color, xy_mode)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    const BASE: u32 = 0x0800_0000;

    struct Board {
        regs: Vec<u32>,
        arena: Vec<u8>,
    }

    impl Board {
        fn new(width: u16, height: u16) -> Self {
            Self::with_arena(width, height, width as usize * height as usize * 4 * 3)
        }

        fn with_arena(width: u16, height: u16, arena_len: usize) -> Self {
            let mut regs = vec![0u32; 4];
            regs[REG_RESOLUTION] = Resolution::new(width, height).to_word();
            regs[REG_BUFFER] = BASE;
            regs[REG_BACK_BUFFER] = BASE;
            Self {
                regs,
                arena: vec![0u8; arena_len],
            }
        }

        fn platform(&mut self) -> MmioPlatform {
            let layout = MmioLayout {
                regs_base: self.regs.as_mut_ptr() as usize,
                arena_window: self.arena.as_mut_ptr() as usize,
                arena_base: BASE,
                arena_len: self.arena.len() as u32,
                bytes_per_pixel: 4,
            };
            unsafe { MmioPlatform::new(layout, "/dev/test_dma") }
        }

        fn color_at(&self, offset: usize) -> u16 {
            u16::from_le_bytes([self.arena[offset], self.arena[offset + 1]])
        }
    }

    #[test]
    fn test_open_checks_name_and_claim() {
        let mut board = Board::new(16, 8);
        let mut platform = board.platform();
        assert_eq!(platform.resolution_word(), (8 << 16) | 16);
        assert_eq!(platform.open_device("/dev/other").err(), Some(DeviceError::NotFound));
        let dev = platform.open_device("/dev/test_dma").unwrap();
        assert_eq!(dev.resolution(), Resolution::new(16, 8));
        assert_eq!(platform.open_device("/dev/test_dma").err(), Some(DeviceError::Busy));
    }

    #[test]
    fn test_register_programming() {
        let mut board = Board::new(16, 8);
        let mut platform = board.platform();
        let mut dev = platform.open_device("/dev/test_dma").unwrap();

        let frame = 16 * 8 * 4;
        dev.set_back_buffer(BASE + frame).unwrap();
        assert_eq!(
            dev.set_back_buffer(BASE + 3 * frame),
            Err(DeviceError::AddressOutOfRange)
        );
        // Starts inside the arena but the frame runs past its end
        assert_eq!(
            dev.set_back_buffer(BASE + 2 * frame + 4),
            Err(DeviceError::AddressOutOfRange)
        );
        dev.set_back_buffer(BASE + 2 * frame).unwrap();
        dev.set_back_buffer(BASE + frame).unwrap();
        dev.request_swap();
        assert!(!dev.swap_in_progress());
        drop(dev);
        assert_eq!(board.regs[REG_BACK_BUFFER], BASE + frame);
        assert_eq!(board.regs[REG_BUFFER], 1);
    }

    #[test]
    fn test_swap_pending_flag() {
        let mut board = Board::new(16, 8);
        board.regs[REG_STATUS] = StatusFlags::SWAP_PENDING.bits();
        let mut platform = board.platform();
        let mut dev = platform.open_device("/dev/test_dma").unwrap();
        assert!(dev.swap_in_progress());
        assert_eq!(dev.status(), StatusFlags::SWAP_PENDING);
    }

    #[test]
    fn test_linear_pixel_addressing() {
        let mut board = Board::new(16, 8);
        let frame = 16 * 8 * 4;
        {
            let mut platform = board.platform();
            let mut dev = platform.open_device("/dev/test_dma").unwrap();
            dev.set_back_buffer(BASE + frame).unwrap();
            dev.draw_pixel(Color(0xBEEF), 5, 3, BufferSelect::Back);
            dev.draw_pixel(Color(0xBEEF), 16, 0, BufferSelect::Back);
        }
        let offset = frame as usize + (3 * 16 + 5) * 4;
        assert_eq!(board.color_at(offset), 0xBEEF);
        assert_eq!(board.arena.iter().filter(|&&b| b != 0).count(), 2);
    }

    #[test]
    fn test_xy_pixel_addressing() {
        let mut board = Board::new(12, 4);
        board.regs[REG_STATUS] = StatusFlags::XY_ADDRESSING.bits();
        {
            let mut platform = board.platform();
            let mut dev = platform.open_device("/dev/test_dma").unwrap();
            dev.draw_pixel(Color(0x0101), 1, 1, BufferSelect::Back);
        }
        // Row stride rounds 12 up to 16 pixels
        assert_eq!(board.color_at((16 + 1) * 4), 0x0101);
    }

    #[test]
    fn test_box_and_fill() {
        let mut board = Board::new(8, 8);
        {
            let mut platform = board.platform();
            let mut dev = platform.open_device("/dev/test_dma").unwrap();
            dev.fill_screen(Color(0x00FF), BufferSelect::Back);
            dev.draw_box(Color(0xFF00), 2, 2, 4, 4, BufferSelect::Back, false);
        }
        let count = |c: u16| {
            (0..64)
                .filter(|i| board.color_at(i * 4) == c)
                .count()
        };
        assert_eq!(count(0xFF00), 8);
        assert_eq!(count(0x00FF), 56);
    }

    #[test]
    fn test_claim_released_when_device_drops() {
        let mut board = Board::new(16, 8);
        let mut platform = board.platform();
        let dev = platform.open_device("/dev/test_dma").unwrap();
        assert_eq!(platform.open_device("/dev/test_dma").err(), Some(DeviceError::Busy));
        drop(dev);
        assert!(platform.open_device("/dev/test_dma").is_ok());
    }

    #[test]
    fn test_xy_frame_bytes_include_row_padding() {
        let mut board = Board::with_arena(12, 4, 16 * 4 * 4 * 3);
        let mut platform = board.platform();
        let dev = platform.open_device("/dev/test_dma").unwrap();
        assert_eq!(dev.frame_bytes(12, 4, 4), Some(12 * 4 * 4));
        drop(dev);

        board.regs[REG_STATUS] = StatusFlags::XY_ADDRESSING.bits();
        let mut platform = board.platform();
        let mut dev = platform.open_device("/dev/test_dma").unwrap();
        assert_eq!(dev.frame_bytes(12, 4, 4), Some(16 * 4 * 4));
        // Two padded frames past the first fill the arena exactly
        assert!(dev.set_back_buffer(BASE + 2 * 256).is_ok());
        assert_eq!(
            dev.set_back_buffer(BASE + 2 * 256 + 4),
            Err(DeviceError::AddressOutOfRange)
        );
    }

    #[test]
    fn test_display_in_xy_mode_keeps_front_buffer_intact() {
        use crate::config::DisplayConfig;
        use crate::surface::DisplaySurface;
        use crate::vga::VgaDisplay;

        let frame = 16 * 4 * 4;
        let mut board = Board::with_arena(12, 4, frame * 3);
        board.regs[REG_STATUS] = StatusFlags::XY_ADDRESSING.bits();

        let buffers = {
            let config = DisplayConfig::new().with_device_name("/dev/test_dma");
            let mut display = VgaDisplay::with_config(board.platform(), config);
            display.init().unwrap();
            assert_eq!((display.width(), display.height()), (12, 4));
            display.draw_pixel(0, 3, Color(0xBEEF)).unwrap();
            display.draw_pixel(11, 3, Color(0xBEEF)).unwrap();
            display.buffers().unwrap()
        };

        assert_eq!(buffers.back, BASE + frame as u32);
        assert_eq!(buffers.front, BASE + 2 * frame as u32);
        let back = frame;
        let front = 2 * frame;
        assert_eq!(board.color_at(back + 3 * 16 * 4), 0xBEEF);
        assert_eq!(board.color_at(back + (3 * 16 + 11) * 4), 0xBEEF);
        // Displayed buffer was never drawn into
        assert!(board.arena[front..].iter().all(|&b| b == 0));
        assert_eq!(board.color_at(back), Color::BACKGROUND.raw());
    }
}
