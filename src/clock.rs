//! Device clock and the 1 Hz tick source.

use embassy_time::{Duration, Instant, Ticker};

use crate::app::{Event, EventSender};

/// Seconds since boot; the device's only notion of time.
pub fn now_secs() -> u64 {
    Instant::now().as_secs()
}

pub fn now_millis() -> u64 {
    Instant::now().as_millis()
}

/// Post an [`Event::Tick`] once per second.
pub async fn tick_task(events: &EventSender) -> ! {
    let mut ticker = Ticker::every(Duration::from_secs(1));
    loop {
        ticker.next().await;
        events.send(Event::Tick { now: now_secs() }).await;
    }
}
