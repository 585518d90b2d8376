//! Outbound sample record (key/value dictionary).
//!
//! Layout:
//! ```text
//! Byte 0: tuple count
//! Then, per tuple:
//!   [4 key LE][1 type][2 length LE][length bytes value]
//!   type: 0 = byte array, 2 = unsigned int, 3 = signed int (all LE)
//! ```
//!
//! A sample record holds five tuples:
//!
//! | key  | type  | len | value                              |
//! |------|-------|-----|------------------------------------|
//! | 1337 | bytes | 6   | x, y, z as `i16` LE                |
//! | 1338 | uint  | 4   | sample sequence number             |
//! | 1339 | uint  | 8   | capture time (ms)                  |
//! | 1340 | int   | 4   | pain level, -1 when none           |
//! | 1341 | int   | 8   | pain commit time (s), -1 when none |

use crate::config::{KEY_COUNT, KEY_DATA, KEY_PAIN, KEY_PAIN_TIME, KEY_TIME};
use crate::error::Error;
use crate::sample::Sample;

/// Size of a tuple header (key + type + length).
const TUPLE_HEADER_SIZE: usize = 7;

/// Encoded size of a sample record.
pub const PAYLOAD_SIZE: usize = 1 + 5 * TUPLE_HEADER_SIZE + 6 + 4 + 8 + 4 + 8;

/// Tuple value type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TupleType {
    ByteArray = 0,
    Uint = 2,
    Int = 3,
}

impl TupleType {
    fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(TupleType::ByteArray),
            2 => Some(TupleType::Uint),
            3 => Some(TupleType::Int),
            _ => None,
        }
    }
}

/// The five logical fields of one outbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Payload {
    pub axes: [i16; 3],
    pub seq: u32,
    pub time_ms: u64,
    /// -1 when the sample carries no pain event.
    pub pain_level: i32,
    /// -1 when the sample carries no pain event.
    pub pain_time: i64,
}

impl Payload {
    pub fn from_sample(sample: &Sample) -> Self {
        Self {
            axes: sample.axes(),
            seq: sample.seq,
            time_ms: sample.time_ms,
            pain_level: sample.pain_level(),
            pain_time: sample.pain_time(),
        }
    }

    pub fn carries_pain(&self) -> bool {
        self.pain_level >= 0
    }

    /// Serialise into `buf`. Returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut axes = [0u8; 6];
        for (chunk, axis) in axes.chunks_exact_mut(2).zip(self.axes) {
            chunk.copy_from_slice(&axis.to_le_bytes());
        }

        let mut writer = DictWriter::new(buf)?;
        writer.push(KEY_DATA, TupleType::ByteArray, &axes)?;
        writer.push(KEY_COUNT, TupleType::Uint, &self.seq.to_le_bytes())?;
        writer.push(KEY_TIME, TupleType::Uint, &self.time_ms.to_le_bytes())?;
        writer.push(KEY_PAIN, TupleType::Int, &self.pain_level.to_le_bytes())?;
        writer.push(KEY_PAIN_TIME, TupleType::Int, &self.pain_time.to_le_bytes())?;
        Ok(writer.finish())
    }

    /// Parse a record produced by [`Payload::encode`].
    ///
    /// Tuple order does not matter; unknown keys are skipped. Returns
    /// `None` if the record is truncated or a known field is missing or
    /// has the wrong width.
    pub fn decode(data: &[u8]) -> Option<Self> {
        let (&count, mut rest) = data.split_first()?;

        let mut axes = None;
        let mut seq = None;
        let mut time_ms = None;
        let mut pain_level = None;
        let mut pain_time = None;

        for _ in 0..count {
            if rest.len() < TUPLE_HEADER_SIZE {
                return None;
            }
            let key = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
            let kind = TupleType::from_u8(rest[4])?;
            let len = u16::from_le_bytes([rest[5], rest[6]]) as usize;
            let value = rest.get(TUPLE_HEADER_SIZE..TUPLE_HEADER_SIZE + len)?;
            rest = &rest[TUPLE_HEADER_SIZE + len..];

            match (key, kind) {
                (KEY_DATA, TupleType::ByteArray) => {
                    let bytes: [u8; 6] = value.try_into().ok()?;
                    axes = Some([
                        i16::from_le_bytes([bytes[0], bytes[1]]),
                        i16::from_le_bytes([bytes[2], bytes[3]]),
                        i16::from_le_bytes([bytes[4], bytes[5]]),
                    ]);
                }
                (KEY_COUNT, TupleType::Uint) => {
                    seq = Some(u32::from_le_bytes(value.try_into().ok()?));
                }
                (KEY_TIME, TupleType::Uint) => {
                    time_ms = Some(u64::from_le_bytes(value.try_into().ok()?));
                }
                (KEY_PAIN, TupleType::Int) => {
                    pain_level = Some(i32::from_le_bytes(value.try_into().ok()?));
                }
                (KEY_PAIN_TIME, TupleType::Int) => {
                    pain_time = Some(i64::from_le_bytes(value.try_into().ok()?));
                }
                _ => {}
            }
        }

        Some(Self {
            axes: axes?,
            seq: seq?,
            time_ms: time_ms?,
            pain_level: pain_level?,
            pain_time: pain_time?,
        })
    }
}

/// Appends tuples to a caller-provided buffer, keeping the count byte.
struct DictWriter<'a> {
    buf: &'a mut [u8],
    offset: usize,
    count: u8,
}

impl<'a> DictWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Result<Self, Error> {
        if buf.is_empty() {
            return Err(Error::BufferOverflow);
        }
        Ok(Self {
            buf,
            offset: 1,
            count: 0,
        })
    }

    fn push(&mut self, key: u32, kind: TupleType, value: &[u8]) -> Result<(), Error> {
        let end = self.offset + TUPLE_HEADER_SIZE + value.len();
        if end > self.buf.len() {
            return Err(Error::BufferOverflow);
        }

        let header = &mut self.buf[self.offset..self.offset + TUPLE_HEADER_SIZE];
        header[0..4].copy_from_slice(&key.to_le_bytes());
        header[4] = kind as u8;
        header[5..7].copy_from_slice(&(value.len() as u16).to_le_bytes());
        self.buf[self.offset + TUPLE_HEADER_SIZE..end].copy_from_slice(value);

        self.offset = end;
        self.count += 1;
        Ok(())
    }

    fn finish(mut self) -> usize {
        self.buf[0] = self.count;
        self.offset
    }
}
