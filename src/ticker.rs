//! 1 Hz clock tick: keeps the clock text current and nudges the pain
//! prompt on a fixed phase.

use core::fmt::Write;

use heapless::String;

use crate::config::PROMPT_INTERVAL_SECS;
use crate::pain::PainState;

const SECS_PER_DAY: u64 = 86_400;

/// Visibility change requested by the prompt schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PromptAction {
    /// Open the entry widget for a new level.
    Show,
    /// Close the widget while a committed level is still unacknowledged.
    Hide,
}

/// Decide what the prompt should do on a tick.
///
/// Acts only on phase seconds, and only when the widget's visibility
/// disagrees with the acknowledgement state, so repeated ticks on the same
/// second never toggle twice.
pub fn prompt_action(seconds: u8, awaiting_pain_ack: bool, visible: bool) -> Option<PromptAction> {
    if seconds % PROMPT_INTERVAL_SECS != 0 {
        return None;
    }

    match (awaiting_pain_ack, visible) {
        (false, false) => Some(PromptAction::Show),
        (true, true) => Some(PromptAction::Hide),
        _ => None,
    }
}

/// Time of day on the device clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WallClock {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl WallClock {
    /// Time of day for `secs` seconds since midnight of day zero.
    pub fn from_secs(secs: u64) -> Self {
        let of_day = secs % SECS_PER_DAY;
        Self {
            hours: (of_day / 3600) as u8,
            minutes: (of_day / 60 % 60) as u8,
            seconds: (of_day % 60) as u8,
        }
    }

    /// `HH:MM:SS`.
    pub fn text(&self) -> String<8> {
        let mut s = String::new();
        // 8 characters always fit.
        let _ = write!(s, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds);
        s
    }
}

/// Once-per-second handler.
#[derive(Debug, Default)]
pub struct Ticker {
    clock: WallClock,
}

impl Ticker {
    pub const fn new() -> Self {
        Self {
            clock: WallClock {
                hours: 0,
                minutes: 0,
                seconds: 0,
            },
        }
    }

    /// Advance the clock to `now` (device seconds) and apply the prompt
    /// schedule to `pain`.
    pub fn on_tick(
        &mut self,
        now: u64,
        awaiting_pain_ack: bool,
        pain: &mut PainState,
    ) -> Option<PromptAction> {
        self.clock = WallClock::from_secs(now);

        let action = prompt_action(self.clock.seconds, awaiting_pain_ack, pain.is_editing())?;
        match action {
            PromptAction::Show => {
                if !pain.open_entry(awaiting_pain_ack) {
                    return None;
                }
                info!("Prompt: pain entry opened");
            }
            PromptAction::Hide => {
                pain.cancel_entry();
                info!("Prompt: pain entry hidden while awaiting ack");
            }
        }
        Some(action)
    }

    pub fn clock(&self) -> WallClock {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::DisplayState;

    #[test]
    fn prompt_acts_only_on_phase_seconds() {
        for s in 0..60u8 {
            let action = prompt_action(s, false, false);
            if s % 15 == 0 {
                assert_eq!(action, Some(PromptAction::Show), "second {}", s);
            } else {
                assert_eq!(action, None, "second {}", s);
            }
        }
    }

    #[test]
    fn prompt_rule_table() {
        assert_eq!(prompt_action(30, false, false), Some(PromptAction::Show));
        assert_eq!(prompt_action(30, false, true), None);
        assert_eq!(prompt_action(30, true, false), None);
        assert_eq!(prompt_action(30, true, true), Some(PromptAction::Hide));
    }

    #[test]
    fn clock_splits_time_of_day() {
        let clock = WallClock::from_secs(SECS_PER_DAY * 3 + 13 * 3600 + 7 * 60 + 45);
        assert_eq!(clock, WallClock { hours: 13, minutes: 7, seconds: 45 });
        assert_eq!(clock.text().as_str(), "13:07:45");
        assert_eq!(WallClock::from_secs(0).text().as_str(), "00:00:00");
    }

    #[test]
    fn tick_on_boundary_opens_entry_once() {
        let mut ticker = Ticker::new();
        let mut pain = PainState::new();

        assert_eq!(ticker.on_tick(45, false, &mut pain), Some(PromptAction::Show));
        pain.increment();
        // Same boundary again: already visible, level untouched.
        assert_eq!(ticker.on_tick(45, false, &mut pain), None);
        assert_eq!(pain.level().map(|l| l.get()), Some(6));
    }

    #[test]
    fn tick_off_boundary_does_nothing() {
        let mut ticker = Ticker::new();
        let mut pain = PainState::new();
        assert_eq!(ticker.on_tick(44, false, &mut pain), None);
        assert_eq!(pain.display(), DisplayState::Hidden);
        assert_eq!(ticker.clock().seconds, 44);
    }

    #[test]
    fn tick_hides_widget_while_awaiting_ack() {
        let mut ticker = Ticker::new();
        let mut pain = PainState::new();
        pain.open_entry(false);

        assert_eq!(ticker.on_tick(60, true, &mut pain), Some(PromptAction::Hide));
        assert_eq!(pain.display(), DisplayState::Hidden);
        assert_eq!(ticker.on_tick(60, true, &mut pain), None);
    }

    #[test]
    fn committed_widget_reopens_on_next_boundary_once_acknowledged() {
        let mut ticker = Ticker::new();
        let mut pain = PainState::new();
        ticker.on_tick(15, false, &mut pain);
        pain.commit(16);

        // Still awaiting: stays hidden.
        assert_eq!(ticker.on_tick(30, true, &mut pain), None);
        // Acknowledged: the next boundary reopens it at the default level.
        assert_eq!(ticker.on_tick(45, false, &mut pain), Some(PromptAction::Show));
        assert_eq!(pain.level().map(|l| l.get()), Some(5));
    }
}
