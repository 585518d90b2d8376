//! Outbound message pipeline: one message in flight at a time.
//!
//! The controller owns every counter and obligation flag. A send puts the
//! ready sample on the [`Outbox`]; the channel later reports exactly one of
//! [`TransmissionController::on_acknowledged`] or
//! [`TransmissionController::on_failed`]. Failures only reopen the gate -
//! the obligation flags stay set until a later send of the same data
//! succeeds.

use crate::config::OUTBOUND_BUFFER_SIZE;
use crate::error::SendError;
use crate::pain::PainEvent;
use crate::payload::Payload;
use crate::sample::SampleBuffer;

/// Bounded, asynchronous message channel to the companion.
///
/// `send` only queues the payload; the outcome arrives later as an event.
/// An `Err` means the channel refused the payload outright and no outcome
/// will follow.
pub trait Outbox {
    fn send(&mut self, payload: &[u8]) -> Result<(), SendError>;
}

/// Process-lifetime counters. Never reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmissionStats {
    /// Messages accepted by the channel.
    pub sent: u32,
    pub acknowledged: u32,
    /// Failed deliveries, including outright refusals.
    pub failed: u32,
}

/// Result of [`TransmissionController::attempt_send`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendAttempt {
    /// Payload handed to the channel; outcome pending.
    Sent { seq: u32 },
    /// A previous message is still in flight.
    InFlight,
    /// No unacknowledged sample to send.
    NothingReady,
    /// The channel refused the payload; counted as a failure.
    Refused(SendError),
}

/// What the channel reports for one accepted payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendOutcome {
    Acknowledged,
    Failed(SendError),
}

/// Holds a channel outcome from the moment it is known until the run-loop
/// has it, so a link torn down in between still owes exactly one report.
#[derive(Debug, Default)]
pub struct OutcomeSlot {
    held: Option<SendOutcome>,
}

impl OutcomeSlot {
    pub const fn new() -> Self {
        Self { held: None }
    }

    pub fn hold(&mut self, outcome: SendOutcome) {
        self.held = Some(outcome);
    }

    /// The run-loop received the held outcome.
    pub fn delivered(&mut self) {
        self.held = None;
    }

    /// Outcome still owed to the run-loop. Consume-once.
    pub fn take_unreported(&mut self) -> Option<SendOutcome> {
        self.held.take()
    }
}

/// The message currently handed to the channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InFlight {
    pub seq: u32,
    pub pain: Option<PainEvent>,
}

#[derive(Debug, Default)]
pub struct TransmissionController {
    stats: TransmissionStats,
    awaiting_accel_ack: bool,
    awaiting_pain_ack: bool,
    awaiting_pain_merge: bool,
    in_flight: Option<InFlight>,
}

impl TransmissionController {
    pub const fn new() -> Self {
        Self {
            stats: TransmissionStats {
                sent: 0,
                acknowledged: 0,
                failed: 0,
            },
            awaiting_accel_ack: false,
            awaiting_pain_ack: false,
            awaiting_pain_merge: false,
            in_flight: None,
        }
    }

    /// Send the ready sample from `buffer`, unless a message is in flight.
    pub fn attempt_send<const N: usize>(
        &mut self,
        buffer: &SampleBuffer<N>,
        outbox: &mut impl Outbox,
    ) -> SendAttempt {
        if self.in_flight.is_some() {
            return SendAttempt::InFlight;
        }
        let Some(sample) = buffer.ready() else {
            return SendAttempt::NothingReady;
        };

        let payload = Payload::from_sample(sample);
        let mut buf = [0u8; OUTBOUND_BUFFER_SIZE];
        let result = payload
            .encode(&mut buf)
            .map_err(|_| SendError::BufferOverflow)
            .and_then(|len| outbox.send(&buf[..len]));

        // The obligation exists from the first attempt, accepted or not.
        self.awaiting_accel_ack = true;
        if sample.carries_pain() {
            self.awaiting_pain_ack = true;
        }

        match result {
            Ok(()) => {
                self.stats.sent = self.stats.sent.wrapping_add(1);
                self.in_flight = Some(InFlight {
                    seq: sample.seq,
                    pain: sample.pain,
                });
                debug!("Tx: sample {} in flight", sample.seq);
                SendAttempt::Sent { seq: sample.seq }
            }
            Err(reason) => {
                self.stats.failed = self.stats.failed.wrapping_add(1);
                warn!(
                    "Tx: send refused, fail count {} reason {}",
                    self.stats.failed,
                    reason
                );
                SendAttempt::Refused(reason)
            }
        }
    }

    /// The in-flight message reached the companion.
    ///
    /// Returns the acknowledged sample's sequence number, or `None` for an
    /// ack with nothing in flight (ignored).
    pub fn on_acknowledged(&mut self) -> Option<u32> {
        let Some(done) = self.in_flight.take() else {
            warn!("Tx: ack with no message in flight");
            return None;
        };

        self.awaiting_accel_ack = false;
        if done.pain.is_some() {
            self.awaiting_pain_ack = false;
        }
        self.stats.acknowledged = self.stats.acknowledged.wrapping_add(1);
        debug!("Tx: sample {} acknowledged", done.seq);
        Some(done.seq)
    }

    /// The in-flight message was lost. Obligation flags stay set.
    ///
    /// Returns the lost message so its pain event can be merged again if
    /// its sample has since been overwritten; `None` for a failure report
    /// with nothing in flight (ignored).
    pub fn on_failed(&mut self, reason: SendError) -> Option<InFlight> {
        let Some(lost) = self.in_flight.take() else {
            warn!("Tx: failure report with no message in flight");
            return None;
        };

        self.stats.failed = self.stats.failed.wrapping_add(1);
        warn!(
            "Tx: sample {} failed to send, fail count {} reason {}",
            lost.seq,
            self.stats.failed,
            reason
        );
        Some(lost)
    }

    /// A pain level was committed and waits for the next sample.
    pub fn on_pain_committed(&mut self) {
        self.awaiting_pain_ack = true;
        self.awaiting_pain_merge = true;
    }

    /// The committed pain level was merged into a sample.
    pub fn on_pain_merged(&mut self) {
        self.awaiting_pain_merge = false;
    }

    /// A pain level whose sample never reached the companion is waiting
    /// for the next sample again. `awaiting_pain_ack` is untouched.
    pub fn on_pain_requeued(&mut self) {
        self.awaiting_pain_merge = true;
    }

    pub fn message_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the in-flight message carries a pain level.
    pub fn pain_in_flight(&self) -> bool {
        self.in_flight.map_or(false, |m| m.pain.is_some())
    }

    /// Sequence number of the in-flight sample.
    pub fn in_flight_seq(&self) -> Option<u32> {
        self.in_flight.map(|m| m.seq)
    }

    pub fn awaiting_accel_ack(&self) -> bool {
        self.awaiting_accel_ack
    }

    pub fn awaiting_pain_ack(&self) -> bool {
        self.awaiting_pain_ack
    }

    pub fn awaiting_pain_merge(&self) -> bool {
        self.awaiting_pain_merge
    }

    pub fn stats(&self) -> TransmissionStats {
        self.stats
    }
}
