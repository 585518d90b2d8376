//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// UI

/// Banner shown under the clock.
pub const MAIN_TEXT: &str = "Pain App";

/// Lowest pain level the user can enter.
pub const PAIN_MIN: u8 = 0;

/// Highest pain level the user can enter.
pub const PAIN_MAX: u8 = 10;

/// Level the entry widget starts at every time it opens.
pub const PAIN_DEFAULT: u8 = 5;

/// The pain prompt is re-evaluated whenever the wall-clock seconds are a
/// multiple of this value.
pub const PROMPT_INTERVAL_SECS: u8 = 15;

// Accelerometer

/// Accelerometer output data rate (Hz).
pub const ACCEL_SAMPLING_RATE_HZ: u64 = 10;

/// Number of samples the sample buffer keeps. A new delivery always
/// overwrites the oldest slot.
pub const SAMPLE_CAPACITY: usize = 1;

/// 7-bit I²C address of the LIS3DH (SDO/SA0 tied low).
pub const ACCEL_I2C_ADDR: u8 = 0x18;

// Outbound messages

/// Dictionary key: raw x/y/z readings.
pub const KEY_DATA: u32 = 1337;
/// Dictionary key: sample sequence number.
pub const KEY_COUNT: u32 = 1338;
/// Dictionary key: capture timestamp (ms).
pub const KEY_TIME: u32 = 1339;
/// Dictionary key: pain level or [`EMPTY_VALUE`].
pub const KEY_PAIN: u32 = 1340;
/// Dictionary key: pain commit time (s) or [`EMPTY_VALUE`].
pub const KEY_PAIN_TIME: u32 = 1341;

/// Wire sentinel for "field not applicable".
pub const EMPTY_VALUE: i32 = -1;

/// Outbound message budget (bytes). Payloads must fit in this.
pub const OUTBOUND_BUFFER_SIZE: usize = 600;

/// Depth of the run-loop event queue.
pub const EVENT_QUEUE_DEPTH: usize = 8;

// BLE

/// GAP device name advertised to the companion.
pub const BLE_DEVICE_NAME: &str = "PainLog";

/// ATT MTU negotiated with the companion; one payload must fit in a
/// single notification.
pub const BLE_ATT_MTU: u16 = 128;

/// Advertising interval (in 0.625 ms units). 400 = 250 ms.
pub const BLE_ADV_INTERVAL: u32 = 400;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`. Adjust for your custom PCB.
//
//   Button UP      → P0.11
//   Button SELECT  → P0.24
//   Button DOWN    → P0.12
//   OLED SDA/SCL   → P0.26 / P0.27 (TWIM0)
//   Accel SDA/SCL  → P0.30 / P0.31 (TWIM1)

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;
