//! Library interface for painlog.
//!
//! Everything above the hardware - sample buffer, pain entry workflow,
//! transmission bookkeeping, prompt scheduling, payload codec - is plain
//! `no_std` logic that builds and tests on the host:
//!
//! Usage: `cargo test --lib` / `cargo test`
//!
//! The `embedded` feature adds the nRF52840 drivers and tasks (BLE link,
//! accelerometer, buttons, display) used by `main.rs`.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod app;
pub mod config;
pub mod error;
pub mod pain;
pub mod payload;
pub mod sample;
pub mod ticker;
pub mod transmission;
pub mod ui;

#[cfg(feature = "embedded")]
pub mod ble;
#[cfg(feature = "embedded")]
pub mod clock;
#[cfg(feature = "embedded")]
pub mod sensor;

pub use app::{App, Event};
pub use error::{Error, SendError};
pub use pain::{PainEvent, PainLevel, PainState};
pub use payload::Payload;
pub use sample::{RawSample, Sample, SampleBuffer};
pub use ticker::Ticker;
pub use transmission::{Outbox, SendAttempt, TransmissionController, TransmissionStats};

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests - cross-module behaviour
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    struct AcceptAll;

    impl Outbox for AcceptAll {
        fn send(&mut self, _payload: &[u8]) -> Result<(), SendError> {
            Ok(())
        }
    }

    fn raw(timestamp_ms: u64) -> RawSample {
        RawSample {
            x: 10,
            y: -20,
            z: 980,
            timestamp_ms,
        }
    }

    fn commit_level(pain: &mut PainState, level: u8, now: u64) {
        assert!(pain.open_entry(false));
        while pain.level().unwrap().get() < level {
            pain.increment();
        }
        while pain.level().unwrap().get() > level {
            pain.decrement();
        }
        pain.commit(now);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Sample / pain merge
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn pain_merges_into_exactly_one_sample() {
        let mut buffer: SampleBuffer = SampleBuffer::new();
        let mut pain = PainState::new();

        let a = buffer.deliver(raw(0), &mut pain);
        assert_eq!((a.pain_level(), a.pain_time()), (-1, -1));

        commit_level(&mut pain, 7, 100);
        assert_eq!(
            pain.pending(),
            Some(PainEvent {
                level: PainLevel::new(7),
                committed_at: 100
            })
        );

        let b = buffer.deliver(raw(100), &mut pain);
        assert_eq!((b.pain_level(), b.pain_time()), (7, 100));
        assert_eq!(pain.pending(), None);

        let c = buffer.deliver(raw(200), &mut pain);
        assert_eq!((c.pain_level(), c.pain_time()), (-1, -1));
    }

    #[test]
    fn only_last_commit_before_delivery_survives() {
        let mut buffer: SampleBuffer = SampleBuffer::new();
        let mut pain = PainState::new();
        commit_level(&mut pain, 3, 50);
        commit_level(&mut pain, 9, 60);

        let sample = buffer.deliver(raw(0), &mut pain);
        assert_eq!((sample.pain_level(), sample.pain_time()), (9, 60));
    }

    // ════════════════════════════════════════════════════════════════════════
    // Transmission
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn failed_pain_send_retries_and_clears_on_ack() {
        let mut buffer: SampleBuffer = SampleBuffer::new();
        let mut pain = PainState::new();
        let mut tx = TransmissionController::new();
        let mut outbox = AcceptAll;

        buffer.deliver(raw(0), &mut pain);
        commit_level(&mut pain, 7, 100);
        tx.on_pain_committed();
        buffer.deliver(raw(100), &mut pain);
        tx.on_pain_merged();

        tx.attempt_send(&buffer, &mut outbox);
        assert_eq!(tx.stats().sent, 1);
        assert!(tx.message_in_flight());
        assert!(tx.awaiting_pain_ack());

        tx.on_failed(SendError::Timeout);
        assert_eq!(tx.stats().failed, 1);
        assert!(!tx.message_in_flight());
        assert!(tx.awaiting_pain_ack());

        assert_eq!(
            tx.attempt_send(&buffer, &mut outbox),
            SendAttempt::Sent { seq: 2 }
        );
        tx.on_acknowledged();
        assert_eq!(tx.stats().acknowledged, 1);
        assert!(!tx.awaiting_pain_ack());
        assert!(!tx.awaiting_accel_ack());
    }

    #[test]
    fn prompt_is_blocked_until_commit_is_acknowledged() {
        let mut app = App::new();
        let mut outbox = AcceptAll;

        app.handle(Event::Tick { now: 15 }, &mut outbox);
        app.handle(
            Event::Button {
                button: ui::ButtonEvent::Select,
                now: 16,
            },
            &mut outbox,
        );
        app.handle(Event::Accel(raw(16_000)), &mut outbox);

        // Two boundaries pass without an ack: the widget stays closed.
        app.handle(Event::Tick { now: 30 }, &mut outbox);
        app.handle(Event::Tick { now: 45 }, &mut outbox);
        assert!(!app.view().display().is_visible());

        app.handle(Event::SendAcknowledged, &mut outbox);
        app.handle(Event::Tick { now: 60 }, &mut outbox);
        assert!(app.view().display().is_visible());
    }
}
