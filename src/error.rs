//! Unified error type for painlog.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (with the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Buffer too small for the requested operation.
    BufferOverflow,

    // Hardware
    /// I²C transaction to the accelerometer failed, or the part did not
    /// identify itself.
    Sensor,

    /// I²C transaction to the display failed.
    Display,

    /// The SoftDevice returned a BLE-level error.
    Ble(BleErrorTag),
}

/// Why the outbound channel did not deliver a message.
///
/// Diagnostic only; no variant changes what happens next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// A previous message still occupies the outbound buffer.
    Busy,
    /// No companion is connected.
    NotConnected,
    /// The payload does not fit the outbound budget.
    BufferOverflow,
    /// The companion did not confirm in time.
    Timeout,
    /// Raw error code from the radio stack.
    Raw(u32),
}

/// Lightweight BLE error tag (no dynamic alloc).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleErrorTag {
    AdvertiseFailed,
}

// Convenience conversions

impl From<BleErrorTag> for Error {
    fn from(e: BleErrorTag) -> Self {
        Error::Ble(e)
    }
}
