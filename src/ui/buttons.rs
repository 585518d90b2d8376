//! GPIO button input with async debouncing.
//!
//! Three physical buttons (active-low with internal pull-up):
//!   - UP     - raise the pain level
//!   - SELECT - commit the level
//!   - DOWN   - lower the pain level
//!
//! Each button is handled by its own task, which waits for a GPIO edge,
//! debounces it and posts an [`Event::Button`] to the run-loop.

use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_time::{Duration, Timer};

use crate::app::{Event, EventSender};
use crate::clock;
use crate::config::BUTTON_DEBOUNCE_MS;
use crate::ui::ButtonEvent;

/// Run a single button loop.
///
/// Waits for the pin to go low (pressed), debounces, posts the event,
/// then waits for release before repeating.
pub async fn button_task(pin: AnyPin, button: ButtonEvent, events: &EventSender) -> ! {
    let mut btn = Input::new(pin, Pull::Up);

    loop {
        btn.wait_for_falling_edge().await;
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if btn.is_low() {
            debug!("Button: {}", button);
            events
                .send(Event::Button {
                    button,
                    now: clock::now_secs(),
                })
                .await;

            // No auto-repeat: one event per press.
            btn.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
        }
    }
}
