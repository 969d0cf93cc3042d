//! Display configuration constants and runtime settings.

/// Screen width assumed until the controller reports its own (pixels).
/// The VGA output usually upscales this (320 -> 640).
pub const DEFAULT_SCREEN_WIDTH: u16 = 320;
/// Screen height assumed until the controller reports its own (pixels).
pub const DEFAULT_SCREEN_HEIGHT: u16 = 240;

/// Base of the SRAM arena holding both pixel buffers
pub const SRAM_BASE: u32 = 0x0800_0000;
/// Size of the SRAM arena in bytes
pub const SRAM_LEN: u32 = 0x0040_0000;

/// Register block of the pixel-buffer DMA controller
pub const PIXEL_DMA_BASE: usize = 0xFF20_3020;

/// Bytes reserved per pixel: 2 for the 5-6-5 color plus 2 reserved
pub const BYTES_PER_PIXEL: u32 = (core::mem::size_of::<u16>() * 2) as u32;

/// Name of the pixel-buffer DMA controller
pub const PIXEL_DMA_NAME: &str = "/dev/video_pixel_dma";

/// Sprite color key ("do not draw")
pub const COLOR_TRANSPARENCY: u16 = 0xDEAD;
/// Background fill for every fresh draw buffer
pub const COLOR_BACKGROUND: u16 = 0x4E19;

/// How long to wait for the controller to confirm a buffer swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapWait {
    /// Spin until the controller reports completion, however long that takes
    Forever,
    /// Give up after this many status polls
    Spins(u32),
}

/// Iteration bounds for sprite blits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteBounds {
    /// Walk the whole sprite; off-screen pixels go to the device unclipped
    Sprite,
    /// Walk the sprite but stop at the right and bottom surface edges
    ClampToSurface,
}

/// Settings resolved once when a display driver is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    pub default_width: u16,
    pub default_height: u16,
    pub arena_base: u32,
    /// Bytes available to the buffer pair, counted from `arena_base`
    pub arena_len: u32,
    pub bytes_per_pixel: u32,
    pub device_name: &'static str,
    pub background: crate::Color,
    pub swap_wait: SwapWait,
    pub sprite_bounds: SpriteBounds,
}

impl DisplayConfig {
    pub const fn new() -> Self {
        Self {
            default_width: DEFAULT_SCREEN_WIDTH,
            default_height: DEFAULT_SCREEN_HEIGHT,
            arena_base: SRAM_BASE,
            arena_len: SRAM_LEN,
            bytes_per_pixel: BYTES_PER_PIXEL,
            device_name: PIXEL_DMA_NAME,
            background: crate::Color::BACKGROUND,
            swap_wait: SwapWait::Forever,
            sprite_bounds: SpriteBounds::Sprite,
        }
    }

    pub const fn with_swap_wait(mut self, swap_wait: SwapWait) -> Self {
        self.swap_wait = swap_wait;
        self
    }

    pub const fn with_sprite_bounds(mut self, sprite_bounds: SpriteBounds) -> Self {
        self.sprite_bounds = sprite_bounds;
        self
    }

    pub const fn with_arena_base(mut self, arena_base: u32) -> Self {
        self.arena_base = arena_base;
        self
    }

    pub const fn with_arena_len(mut self, arena_len: u32) -> Self {
        self.arena_len = arena_len;
        self
    }

    pub const fn with_device_name(mut self, device_name: &'static str) -> Self {
        self.device_name = device_name;
        self
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::new()
    }
}
