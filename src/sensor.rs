//! LIS3DH accelerometer over async I²C.
//!
//! The part runs in high-resolution mode at ±2 g with its own 10 Hz output
//! data rate; [`accel_task`] polls it on the same period and posts each
//! reading as an [`Event::Accel`].

use embassy_time::{Duration, Ticker, Timer};
use embedded_hal_async::i2c::I2c;

use crate::app::{Event, EventSender};
use crate::clock;
use crate::config::{ACCEL_I2C_ADDR, ACCEL_SAMPLING_RATE_HZ};
use crate::error::Error;
use crate::sample::RawSample;

const REG_WHO_AM_I: u8 = 0x0F;
const REG_CTRL1: u8 = 0x20;
const REG_CTRL4: u8 = 0x23;
const REG_OUT_X_L: u8 = 0x28;

/// Sub-address auto-increment for multi-byte reads.
const AUTO_INCREMENT: u8 = 0x80;

const WHO_AM_I_LIS3DH: u8 = 0x33;

/// ODR 10 Hz, X/Y/Z enabled.
const CTRL1_10HZ_XYZ: u8 = 0x27;
/// Block data update, high-resolution, ±2 g.
const CTRL4_BDU_HR: u8 = 0x88;

pub struct Lis3dh<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Lis3dh<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Check the part ID and start continuous conversion.
    pub async fn init(&mut self) -> Result<(), Error> {
        let mut id = [0u8; 1];
        self.i2c
            .write_read(ACCEL_I2C_ADDR, &[REG_WHO_AM_I], &mut id)
            .await
            .map_err(|_| Error::Sensor)?;
        if id[0] != WHO_AM_I_LIS3DH {
            warn!("Accel: unexpected WHO_AM_I {=u8:#x}", id[0]);
            return Err(Error::Sensor);
        }

        self.write_reg(REG_CTRL1, CTRL1_10HZ_XYZ).await?;
        self.write_reg(REG_CTRL4, CTRL4_BDU_HR).await
    }

    /// Latest x/y/z reading in milli-g.
    pub async fn read(&mut self) -> Result<[i16; 3], Error> {
        let mut raw = [0u8; 6];
        self.i2c
            .write_read(ACCEL_I2C_ADDR, &[REG_OUT_X_L | AUTO_INCREMENT], &mut raw)
            .await
            .map_err(|_| Error::Sensor)?;
        Ok(axes_from_registers(raw))
    }

    async fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error> {
        self.i2c
            .write(ACCEL_I2C_ADDR, &[reg, value])
            .await
            .map_err(|_| Error::Sensor)
    }
}

/// Output registers hold left-justified 12-bit values; at ±2 g HR one
/// count is 1 mg.
fn axes_from_registers(raw: [u8; 6]) -> [i16; 3] {
    [
        i16::from_le_bytes([raw[0], raw[1]]) >> 4,
        i16::from_le_bytes([raw[2], raw[3]]) >> 4,
        i16::from_le_bytes([raw[4], raw[5]]) >> 4,
    ]
}

/// Sample the accelerometer forever, posting readings to the run-loop.
///
/// A reading that finds the event queue full is dropped: the sample
/// buffer would have overwritten it anyway.
pub async fn accel_task<I2C: I2c>(i2c: I2C, events: &EventSender) -> ! {
    let mut accel = Lis3dh::new(i2c);
    while let Err(e) = accel.init().await {
        warn!("Accel: init failed: {}", e);
        Timer::after(Duration::from_secs(1)).await;
    }
    info!("Accel: LIS3DH running at {} Hz", ACCEL_SAMPLING_RATE_HZ);

    let mut ticker = Ticker::every(Duration::from_millis(1000 / ACCEL_SAMPLING_RATE_HZ));
    loop {
        ticker.next().await;
        let [x, y, z] = match accel.read().await {
            Ok(axes) => axes,
            Err(e) => {
                warn!("Accel: read failed: {}", e);
                continue;
            }
        };

        let sample = RawSample {
            x,
            y,
            z,
            timestamp_ms: clock::now_millis(),
        };
        if events.try_send(Event::Accel(sample)).is_err() {
            debug!("Accel: event queue full, reading dropped");
        }
    }
}
