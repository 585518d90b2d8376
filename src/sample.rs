//! Accelerometer samples and the sample slot.
//!
//! The buffer holds [`SAMPLE_CAPACITY`] samples (one, on this device) and
//! never refuses a delivery: when full, the oldest slot is overwritten,
//! even if it was never sent. The newest sample is "ready" until the
//! companion acknowledges it.

use heapless::Deque;

use crate::config::{EMPTY_VALUE, SAMPLE_CAPACITY};
use crate::pain::{PainEvent, PainState};

/// One reading as delivered by the accelerometer driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    /// Capture time on the device clock (ms).
    pub timestamp_ms: u64,
}

/// A stored reading, optionally annotated with the pain event committed
/// since the previous reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// Delivery sequence number, starting at 1.
    pub seq: u32,
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub time_ms: u64,
    pub pain: Option<PainEvent>,
}

impl Sample {
    pub fn carries_pain(&self) -> bool {
        self.pain.is_some()
    }

    /// Pain level as sent on the wire, or [`EMPTY_VALUE`].
    pub fn pain_level(&self) -> i32 {
        self.pain
            .map_or(EMPTY_VALUE, |p| i32::from(p.level.get()))
    }

    /// Pain commit time as sent on the wire, or [`EMPTY_VALUE`].
    pub fn pain_time(&self) -> i64 {
        self.pain
            .map_or(i64::from(EMPTY_VALUE), |p| p.committed_at as i64)
    }

    pub fn axes(&self) -> [i16; 3] {
        [self.x, self.y, self.z]
    }
}

/// Fixed-capacity, overwrite-oldest sample store.
pub struct SampleBuffer<const N: usize = SAMPLE_CAPACITY> {
    slots: Deque<Sample, N>,
    /// Sequence number of the last sample the companion confirmed.
    acknowledged: Option<u32>,
    delivered: u32,
    overwritten: u32,
}

impl<const N: usize> SampleBuffer<N> {
    const NOT_EMPTY: () = assert!(N > 0, "SampleBuffer needs at least one slot");

    pub const fn new() -> Self {
        let () = Self::NOT_EMPTY;
        Self {
            slots: Deque::new(),
            acknowledged: None,
            delivered: 0,
            overwritten: 0,
        }
    }

    /// Store `raw`, merging the pending pain event (if any) into it.
    ///
    /// The pending event is consumed. Always succeeds; a full buffer drops
    /// its oldest sample.
    pub fn deliver(&mut self, raw: RawSample, pain: &mut PainState) -> Sample {
        self.delivered = self.delivered.wrapping_add(1);
        let sample = Sample {
            seq: self.delivered,
            x: raw.x,
            y: raw.y,
            z: raw.z,
            time_ms: raw.timestamp_ms,
            pain: pain.take_pending(),
        };

        if self.slots.is_full() {
            if let Some(old) = self.slots.pop_front() {
                if self.is_pending(&old) {
                    self.overwritten = self.overwritten.wrapping_add(1);
                    debug!("Sample {} overwritten before acknowledgement", old.seq);
                }
            }
        }
        let stored = self.slots.push_back(sample);
        debug_assert!(stored.is_ok(), "a slot was freed above");
        sample
    }

    /// Newest sample, if it still needs to reach the companion.
    pub fn ready(&self) -> Option<&Sample> {
        self.slots.back().filter(|s| self.is_pending(s))
    }

    /// Mark the sample with sequence number `seq` as delivered.
    ///
    /// Acknowledging an older sample leaves a newer one ready.
    pub fn acknowledge(&mut self, seq: u32) {
        self.acknowledged = Some(seq);
    }

    /// Unacknowledged sample the next delivery will overwrite, if any.
    pub fn next_eviction(&self) -> Option<&Sample> {
        if !self.slots.is_full() {
            return None;
        }
        self.slots.front().filter(|s| self.is_pending(s))
    }

    /// Whether sample `seq` is still stored.
    pub fn holds(&self, seq: u32) -> bool {
        self.slots.iter().any(|s| s.seq == seq)
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.slots.back()
    }

    /// Total deliveries since boot.
    pub fn delivered(&self) -> u32 {
        self.delivered
    }

    /// Samples dropped by a newer delivery before they were acknowledged.
    pub fn overwritten(&self) -> u32 {
        self.overwritten
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    fn is_pending(&self, sample: &Sample) -> bool {
        self.acknowledged != Some(sample.seq)
    }
}

impl<const N: usize> Default for SampleBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(x: i16, timestamp_ms: u64) -> RawSample {
        RawSample {
            x,
            y: -x,
            z: 1000,
            timestamp_ms,
        }
    }

    fn committed(level_steps: u8, now: u64) -> PainState {
        let mut pain = PainState::new();
        pain.open_entry(false);
        for _ in 0..level_steps {
            pain.increment();
        }
        pain.commit(now);
        pain
    }

    #[test]
    fn delivery_without_pain_uses_sentinels() {
        let mut buffer: SampleBuffer = SampleBuffer::new();
        let mut pain = PainState::new();
        let sample = buffer.deliver(raw(12, 40), &mut pain);

        assert_eq!(sample.seq, 1);
        assert_eq!(sample.axes(), [12, -12, 1000]);
        assert_eq!(sample.time_ms, 40);
        assert_eq!(sample.pain_level(), -1);
        assert_eq!(sample.pain_time(), -1);
        assert_eq!(buffer.ready(), Some(&sample));
    }

    #[test]
    fn delivery_consumes_pending_pain_once() {
        let mut buffer: SampleBuffer = SampleBuffer::new();
        let mut pain = committed(2, 100);

        let b = buffer.deliver(raw(1, 1_000), &mut pain);
        assert_eq!(b.pain_level(), 7);
        assert_eq!(b.pain_time(), 100);
        assert_eq!(pain.pending(), None);

        let c = buffer.deliver(raw(2, 1_100), &mut pain);
        assert!(!c.carries_pain());
    }

    #[test]
    fn single_slot_overwrites_unsent_sample() {
        let mut buffer: SampleBuffer = SampleBuffer::new();
        let mut pain = PainState::new();
        buffer.deliver(raw(1, 0), &mut pain);
        let second = buffer.deliver(raw(2, 100), &mut pain);

        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.latest(), Some(&second));
        assert_eq!(buffer.overwritten(), 1);
        assert_eq!(buffer.delivered(), 2);
    }

    #[test]
    fn acknowledged_sample_is_no_longer_ready() {
        let mut buffer: SampleBuffer = SampleBuffer::new();
        let mut pain = PainState::new();
        let sample = buffer.deliver(raw(1, 0), &mut pain);
        buffer.acknowledge(sample.seq);
        assert_eq!(buffer.ready(), None);

        // Replacing an acknowledged sample is not a loss.
        buffer.deliver(raw(2, 100), &mut pain);
        assert_eq!(buffer.overwritten(), 0);
    }

    #[test]
    fn late_ack_for_older_sample_keeps_newer_ready() {
        let mut buffer: SampleBuffer = SampleBuffer::new();
        let mut pain = PainState::new();
        let first = buffer.deliver(raw(1, 0), &mut pain);
        let second = buffer.deliver(raw(2, 100), &mut pain);
        buffer.acknowledge(first.seq);
        assert_eq!(buffer.ready(), Some(&second));
    }

    #[test]
    fn every_delivery_is_stored() {
        let mut pain = PainState::new();
        let mut single: SampleBuffer = SampleBuffer::new();
        let mut triple: SampleBuffer<3> = SampleBuffer::new();
        for t in 0..10 {
            let a = single.deliver(raw(t as i16, t * 100), &mut pain);
            let b = triple.deliver(raw(t as i16, t * 100), &mut pain);
            assert_eq!(single.latest(), Some(&a));
            assert_eq!(triple.latest(), Some(&b));
        }
        assert!(triple.holds(8));
        assert!(!triple.holds(7));
    }

    #[test]
    fn next_eviction_skips_acknowledged_and_partial_buffers() {
        let mut pain = PainState::new();
        let mut buffer: SampleBuffer<2> = SampleBuffer::new();
        let first = buffer.deliver(raw(1, 0), &mut pain);
        assert_eq!(buffer.next_eviction(), None);

        buffer.deliver(raw(2, 100), &mut pain);
        assert_eq!(buffer.next_eviction(), Some(&first));
        buffer.acknowledge(first.seq);
        assert_eq!(buffer.next_eviction(), None);
    }

    #[test]
    fn larger_buffer_evicts_oldest() {
        let mut buffer: SampleBuffer<2> = SampleBuffer::new();
        let mut pain = PainState::new();
        buffer.deliver(raw(1, 0), &mut pain);
        buffer.deliver(raw(2, 100), &mut pain);
        assert_eq!(buffer.overwritten(), 0);
        let third = buffer.deliver(raw(3, 200), &mut pain);
        assert_eq!(buffer.overwritten(), 1);
        assert_eq!(buffer.latest(), Some(&third));
    }
}
