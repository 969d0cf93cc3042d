//! Error types for the display layer

use core::fmt;

/// Errors reported by a video device or platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// No controller with the requested name
    NotFound,
    /// Controller exists but is already claimed
    Busy,
    /// Buffer address does not fit the controller's memory window
    AddressOutOfRange,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound => f.write_str("video device not found"),
            DeviceError::Busy => f.write_str("video device busy"),
            DeviceError::AddressOutOfRange => f.write_str("buffer address out of range"),
        }
    }
}

/// Display surface errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// `init` has not run yet
    NotInitialized,
    /// `init` was already called on this surface
    AlreadyInitialized,
    /// Opening the controller failed; the surface is unusable
    DeviceUnavailable,
    /// Buffer pair does not fit the 32-bit address space
    ArenaOverflow,
    /// Controller did not confirm a swap within the configured spin budget
    SwapTimeout,
    /// Error passed up from the device
    Device(DeviceError),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::NotInitialized => f.write_str("display not initialized"),
            DisplayError::AlreadyInitialized => f.write_str("display already initialized"),
            DisplayError::DeviceUnavailable => f.write_str("display device unavailable"),
            DisplayError::ArenaOverflow => f.write_str("frame buffers exceed address space"),
            DisplayError::SwapTimeout => f.write_str("buffer swap timed out"),
            DisplayError::Device(e) => write!(f, "device error: {}", e),
        }
    }
}

impl From<DeviceError> for DisplayError {
    fn from(e: DeviceError) -> Self {
        DisplayError::Device(e)
    }
}

/// Sprite construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteError {
    /// Pixel count does not equal width * height
    DimensionMismatch { expected: usize, actual: usize },
    /// A row in a row-slice sprite has the wrong length
    RaggedRow { row: usize },
}

impl fmt::Display for SpriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteError::DimensionMismatch { expected, actual } => {
                write!(f, "sprite has {} pixels, expected {}", actual, expected)
            }
            SpriteError::RaggedRow { row } => write!(f, "sprite row {} has the wrong length", row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_device_error_converts() {
        let e: DisplayError = DeviceError::Busy.into();
        assert_eq!(e, DisplayError::Device(DeviceError::Busy));
        assert_eq!(e.to_string(), "device error: video device busy");
    }

    #[test]
    fn test_sprite_error_message() {
        let e = SpriteError::DimensionMismatch { expected: 4, actual: 3 };
        assert_eq!(e.to_string(), "sprite has 3 pixels, expected 4");
    }
}
