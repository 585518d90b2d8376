//! Pain entry workflow.
//!
//! ```text
//!   Idle ──open_entry──▶ Editing ──commit──▶ Idle + pending PainEvent
//!    ▲                     │  ▲                      │
//!    └────cancel_entry─────┘  └─ increment/decrement  └─ take_pending (next sample)
//! ```
//!
//! "Committed" is not a separate entry state: it is the pending event that
//! waits for the next accelerometer delivery. At most one event is pending;
//! a second commit replaces the first.

use crate::config::{PAIN_DEFAULT, PAIN_MAX, PAIN_MIN};
use crate::ui::DisplayState;

/// A pain level, always within `PAIN_MIN..=PAIN_MAX`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PainLevel(u8);

impl PainLevel {
    /// Level the entry widget opens at.
    pub const DEFAULT: Self = Self(PAIN_DEFAULT);

    /// Clamp `level` into the valid range.
    pub const fn new(level: u8) -> Self {
        if level > PAIN_MAX {
            Self(PAIN_MAX)
        } else if level < PAIN_MIN {
            Self(PAIN_MIN)
        } else {
            Self(level)
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// One step up, saturating at `PAIN_MAX`.
    pub fn raised(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    /// One step down, saturating at `PAIN_MIN`.
    pub fn lowered(self) -> Self {
        Self::new(self.0.saturating_sub(1))
    }
}

impl Default for PainLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A committed pain level and the wall-clock second it was confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PainEvent {
    pub level: PainLevel,
    /// Seconds on the device clock.
    pub committed_at: u64,
}

/// Where the entry widget is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryState {
    /// Widget hidden, nothing being edited.
    Idle,
    /// Widget visible, level adjustable.
    Editing(PainLevel),
}

/// Current entry plus the pending (committed, not yet merged) event.
#[derive(Debug)]
pub struct PainState {
    entry: EntryState,
    pending: Option<PainEvent>,
}

impl PainState {
    pub const fn new() -> Self {
        Self {
            entry: EntryState::Idle,
            pending: None,
        }
    }

    /// Open the entry widget at the default level.
    ///
    /// Refused while an earlier commit still awaits acknowledgement, or when
    /// the widget is already open. Returns whether the widget opened.
    pub fn open_entry(&mut self, awaiting_pain_ack: bool) -> bool {
        if awaiting_pain_ack || self.entry != EntryState::Idle {
            return false;
        }
        self.entry = EntryState::Editing(PainLevel::DEFAULT);
        true
    }

    /// Raise the level being edited. No-op outside `Editing`.
    pub fn increment(&mut self) -> Option<PainLevel> {
        self.adjust(PainLevel::raised)
    }

    /// Lower the level being edited. No-op outside `Editing`.
    pub fn decrement(&mut self) -> Option<PainLevel> {
        self.adjust(PainLevel::lowered)
    }

    fn adjust(&mut self, step: fn(PainLevel) -> PainLevel) -> Option<PainLevel> {
        match self.entry {
            EntryState::Editing(level) => {
                let next = step(level);
                self.entry = EntryState::Editing(next);
                Some(next)
            }
            EntryState::Idle => None,
        }
    }

    /// Confirm the edited level at `now` (device seconds) and close the widget.
    ///
    /// The event replaces any event still waiting for a sample. Returns
    /// `None` (and changes nothing) outside `Editing`.
    pub fn commit(&mut self, now: u64) -> Option<PainEvent> {
        let EntryState::Editing(level) = self.entry else {
            return None;
        };

        let event = PainEvent {
            level,
            committed_at: now,
        };
        if let Some(replaced) = self.pending.replace(event) {
            debug!(
                "Pain: pending level {} replaced before merge",
                replaced.level.get()
            );
        }
        self.entry = EntryState::Idle;
        info!("Pain: committed level {} at {}", level.get(), now);
        Some(event)
    }

    /// Put back an event whose sample never reached the companion, so the
    /// next delivery carries it again. A newer commit wins. Returns whether
    /// the event is pending again.
    pub fn requeue(&mut self, event: PainEvent) -> bool {
        if let Some(newer) = self.pending {
            debug!(
                "Pain: lost level {} superseded by level {}",
                event.level.get(),
                newer.level.get()
            );
            return false;
        }
        self.pending = Some(event);
        info!("Pain: level {} from {} queued again", event.level.get(), event.committed_at);
        true
    }

    /// Close the widget without committing. Returns whether it was open.
    pub fn cancel_entry(&mut self) -> bool {
        let was_open = self.is_editing();
        self.entry = EntryState::Idle;
        was_open
    }

    /// Hand the pending event to a sample. Consume-once.
    pub fn take_pending(&mut self) -> Option<PainEvent> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<PainEvent> {
        self.pending
    }

    pub fn entry(&self) -> EntryState {
        self.entry
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.entry, EntryState::Editing(_))
    }

    /// Level currently shown in the widget, if open.
    pub fn level(&self) -> Option<PainLevel> {
        match self.entry {
            EntryState::Editing(level) => Some(level),
            EntryState::Idle => None,
        }
    }

    pub fn display(&self) -> DisplayState {
        if self.is_editing() {
            DisplayState::Visible
        } else {
            DisplayState::Hidden
        }
    }
}

impl Default for PainState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing() -> PainState {
        let mut pain = PainState::new();
        assert!(pain.open_entry(false));
        pain
    }

    #[test]
    fn level_is_clamped_on_construction() {
        assert_eq!(PainLevel::new(0).get(), 0);
        assert_eq!(PainLevel::new(7).get(), 7);
        assert_eq!(PainLevel::new(11).get(), 10);
        assert_eq!(PainLevel::new(255).get(), 10);
    }

    #[test]
    fn open_entry_starts_at_default() {
        let pain = editing();
        assert_eq!(pain.level(), Some(PainLevel::new(5)));
        assert_eq!(pain.display(), DisplayState::Visible);
    }

    #[test]
    fn open_entry_refused_while_awaiting_ack() {
        let mut pain = PainState::new();
        assert!(!pain.open_entry(true));
        assert_eq!(pain.entry(), EntryState::Idle);
        assert_eq!(pain.display(), DisplayState::Hidden);
    }

    #[test]
    fn open_entry_does_not_reset_an_open_widget() {
        let mut pain = editing();
        pain.increment();
        assert!(!pain.open_entry(false));
        assert_eq!(pain.level(), Some(PainLevel::new(6)));
    }

    #[test]
    fn twenty_increments_stop_at_max() {
        let mut pain = editing();
        for _ in 0..20 {
            pain.increment();
        }
        assert_eq!(pain.level(), Some(PainLevel::new(10)));
    }

    #[test]
    fn twenty_decrements_stop_at_min() {
        let mut pain = editing();
        for _ in 0..20 {
            pain.decrement();
        }
        assert_eq!(pain.level(), Some(PainLevel::new(0)));
    }

    #[test]
    fn mixed_adjustments_stay_in_range() {
        let mut pain = editing();
        // Deterministic walk that hits both walls.
        let steps = [1i8, 1, 1, 1, 1, 1, 1, -1, 1, 1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, 1];
        for step in steps {
            let level = if step > 0 {
                pain.increment()
            } else {
                pain.decrement()
            };
            let level = level.unwrap().get();
            assert!(level <= 10);
        }
        assert_eq!(pain.level(), Some(PainLevel::new(1)));
    }

    #[test]
    fn adjustments_ignored_when_idle() {
        let mut pain = PainState::new();
        assert_eq!(pain.increment(), None);
        assert_eq!(pain.decrement(), None);
        assert_eq!(pain.entry(), EntryState::Idle);
    }

    #[test]
    fn commit_from_idle_is_noop() {
        let mut pain = PainState::new();
        assert_eq!(pain.commit(100), None);
        assert_eq!(pain.pending(), None);
        assert_eq!(pain.entry(), EntryState::Idle);
    }

    #[test]
    fn commit_stamps_time_and_closes_widget() {
        let mut pain = editing();
        pain.increment();
        pain.increment();
        let event = pain.commit(100).unwrap();
        assert_eq!(event.level.get(), 7);
        assert_eq!(event.committed_at, 100);
        assert_eq!(pain.pending(), Some(event));
        assert_eq!(pain.display(), DisplayState::Hidden);
    }

    #[test]
    fn second_commit_replaces_pending_event() {
        let mut pain = editing();
        pain.commit(100);

        assert!(pain.open_entry(false));
        pain.decrement();
        pain.commit(130);

        let pending = pain.take_pending().unwrap();
        assert_eq!(pending.level.get(), 4);
        assert_eq!(pending.committed_at, 130);
        assert_eq!(pain.take_pending(), None);
    }

    #[test]
    fn requeue_restores_lost_event_unless_superseded() {
        let lost = PainEvent {
            level: PainLevel::new(3),
            committed_at: 40,
        };
        let mut pain = PainState::new();
        assert!(pain.requeue(lost));
        assert_eq!(pain.pending(), Some(lost));

        let mut pain = editing();
        let newer = pain.commit(90).unwrap();
        assert!(!pain.requeue(lost));
        assert_eq!(pain.pending(), Some(newer));
    }

    #[test]
    fn cancel_entry_discards_edit() {
        let mut pain = editing();
        pain.increment();
        assert!(pain.cancel_entry());
        assert_eq!(pain.pending(), None);
        assert!(!pain.cancel_entry());
    }
}
