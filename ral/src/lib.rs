//! Rendering abstraction layer for a double-buffered 16-bit framebuffer
//!
//! Application code draws through [`DisplaySurface`]; [`VgaDisplay`] drives a
//! pixel-buffer DMA controller with a front/back buffer swap pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Application code               │
//! └─────────────────────┬───────────────────────┘
//!                       │  DisplaySurface
//! ┌─────────────────────┴───────────────────────┐
//! │         VgaDisplay (swap + blit logic)      │
//! └─────────────────────┬───────────────────────┘
//!                       │  VideoPlatform / VideoDevice
//!            ┌──────────┴──────────┐
//!       ┌────┴────┐           ┌────┴────┐
//!       │  mmio   │           │   sim   │
//!       └─────────┘           └─────────┘
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod color;
pub mod config;
pub mod device;
pub mod error;
pub mod sprite;
pub mod surface;
pub mod vga;

pub use color::Color;
pub use config::{DisplayConfig, SpriteBounds, SwapWait};
pub use device::{BufferSelect, Resolution, VideoDevice, VideoPlatform};
pub use error::{DeviceError, DisplayError, SpriteError};
pub use sprite::Sprite;
pub use surface::DisplaySurface;
pub use vga::{DriverState, FrameBuffers, VgaDisplay};
