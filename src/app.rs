//! Single-threaded run-loop core.
//!
//! Every external source (clock, accelerometer, buttons, message channel)
//! becomes an [`Event`]; [`App::handle`] processes one event to completion
//! before the next. Handlers never block and do constant work.

use crate::error::SendError;
use crate::pain::{PainEvent, PainState};
use crate::sample::{RawSample, SampleBuffer};
use crate::ticker::Ticker;
use crate::transmission::{InFlight, Outbox, SendAttempt, SendOutcome, TransmissionController};
use crate::ui::{ButtonEvent, View};

/// Input to the run-loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Once per second; `now` in device seconds.
    Tick { now: u64 },
    /// New accelerometer reading.
    Accel(RawSample),
    /// Debounced button press at `now` (device seconds).
    Button { button: ButtonEvent, now: u64 },
    /// The companion confirmed the in-flight message.
    SendAcknowledged,
    /// The in-flight message was not delivered.
    SendFailed(SendError),
}

impl From<SendOutcome> for Event {
    fn from(outcome: SendOutcome) -> Self {
        match outcome {
            SendOutcome::Acknowledged => Event::SendAcknowledged,
            SendOutcome::Failed(reason) => Event::SendFailed(reason),
        }
    }
}

/// Producer half of the run-loop queue, shared by every hardware task.
#[cfg(feature = "embedded")]
pub type EventSender = embassy_sync::channel::Sender<
    'static,
    embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex,
    Event,
    { crate::config::EVENT_QUEUE_DEPTH },
>;

pub struct App {
    samples: SampleBuffer,
    pain: PainState,
    tx: TransmissionController,
    ticker: Ticker,
}

impl App {
    pub const fn new() -> Self {
        Self {
            samples: SampleBuffer::new(),
            pain: PainState::new(),
            tx: TransmissionController::new(),
            ticker: Ticker::new(),
        }
    }

    /// Process one event. Returns `true` when the view changed.
    pub fn handle(&mut self, event: Event, outbox: &mut impl Outbox) -> bool {
        let redraw = match event {
            Event::Tick { now } => {
                self.ticker.on_tick(now, self.tx.awaiting_pain_ack(), &mut self.pain);
                // A tick is also a chance to retry a failed send.
                self.try_send(outbox);
                true
            }
            Event::Accel(raw) => {
                self.requeue_displaced_pain();
                let sample = self.samples.deliver(raw, &mut self.pain);
                if sample.carries_pain() {
                    self.tx.on_pain_merged();
                }
                self.try_send(outbox);
                false
            }
            Event::Button { button, now } => self.on_button(button, now),
            Event::SendAcknowledged => {
                if let Some(seq) = self.tx.on_acknowledged() {
                    self.samples.acknowledge(seq);
                }
                false
            }
            Event::SendFailed(reason) => {
                let lost = self.tx.on_failed(reason);
                // Still stored: the retry resends it as is.
                if let Some(InFlight { seq, pain: Some(event) }) = lost {
                    if !self.samples.holds(seq) {
                        self.requeue_pain(event);
                    }
                }
                false
            }
        };

        redraw
    }

    fn on_button(&mut self, button: ButtonEvent, now: u64) -> bool {
        match button {
            ButtonEvent::Up => self.pain.increment().is_some(),
            ButtonEvent::Down => self.pain.decrement().is_some(),
            ButtonEvent::Select => {
                if self.pain.commit(now).is_some() {
                    self.tx.on_pain_committed();
                    true
                } else {
                    false
                }
            }
        }
    }

    fn try_send(&mut self, outbox: &mut impl Outbox) {
        if let SendAttempt::Sent { seq } = self.tx.attempt_send(&self.samples, outbox) {
            debug!("App: sent sample {}", seq);
        }
    }

    /// Before a delivery overwrites an unsent pain sample, hand its event
    /// back so the new sample carries it. A sample in flight is left to its
    /// outcome: an ack settles it, a failure requeues it.
    fn requeue_displaced_pain(&mut self) {
        let Some(old) = self.samples.next_eviction() else {
            return;
        };
        let (seq, pain) = (old.seq, old.pain);
        if let Some(event) = pain {
            if self.tx.in_flight_seq() != Some(seq) {
                self.requeue_pain(event);
            }
        }
    }

    fn requeue_pain(&mut self, event: PainEvent) {
        if self.pain.requeue(event) {
            self.tx.on_pain_requeued();
        }
    }

    /// Snapshot for the display shell.
    pub fn view(&self) -> View {
        View::new(self.ticker.clock().text(), self.pain.level())
    }

    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn pain(&self) -> &PainState {
        &self.pain
    }

    pub fn transmission(&self) -> &TransmissionController {
        &self.tx
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
