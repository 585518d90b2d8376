//! painlog firmware entry point (nRF52840 + SoftDevice S140).
//!
//! Spawns one task per event source and runs the [`App`] dispatcher on the
//! main task. Every source feeds the same event queue, so the core logic
//! sees one event at a time.

#![no_std]
#![no_main]

use defmt::{info, unwrap, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{AnyPin, Pin};
use embassy_nrf::interrupt::Priority;
use embassy_nrf::peripherals::{TWISPI0, TWISPI1};
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use nrf_softdevice::Softdevice;
use panic_probe as _;
use static_cell::StaticCell;

use painlog::app::{App, Event, EventSender};
use painlog::ble::{self, LinkOutbox, RecordChannel, Server};
use painlog::config::EVENT_QUEUE_DEPTH;
use painlog::ui::display::{self, Display};
use painlog::ui::{buttons, ButtonEvent};
use painlog::{clock, sensor};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
    SPIM1_SPIS1_TWIM1_TWIS1_SPI1_TWI1 => twim::InterruptHandler<peripherals::TWISPI1>;
});

static EVENTS: Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_DEPTH> = Channel::new();
static RECORDS: RecordChannel = Channel::new();
static EVENT_TX: StaticCell<EventSender> = StaticCell::new();
static SERVER: StaticCell<Server> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    ble::softdevice_task(sd).await
}

#[embassy_executor::task]
async fn link_task(sd: &'static Softdevice, server: &'static Server, events: &'static EventSender) -> ! {
    ble::link_task(sd, server, RECORDS.receiver(), events).await
}

#[embassy_executor::task(pool_size = 3)]
async fn button_task(pin: AnyPin, button: ButtonEvent, events: &'static EventSender) -> ! {
    buttons::button_task(pin, button, events).await
}

#[embassy_executor::task]
async fn accel_task(i2c: Twim<'static, TWISPI1>, events: &'static EventSender) -> ! {
    sensor::accel_task(i2c, events).await
}

#[embassy_executor::task]
async fn tick_task(events: &'static EventSender) -> ! {
    clock::tick_task(events).await
}

fn render(display: &mut Display<Twim<'static, TWISPI0>>, app: &App) {
    if let Err(e) = display::draw(display, &app.view()) {
        warn!("Display: {}", e);
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("painlog starting");

    // The SoftDevice reserves priorities 0, 1 and 4.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    let sd = Softdevice::enable(&ble::softdevice_config());
    let server = SERVER.init(unwrap!(Server::new(sd)));
    unwrap!(spawner.spawn(softdevice_task(sd)));

    let events: &'static EventSender = EVENT_TX.init(EVENTS.sender());

    unwrap!(spawner.spawn(link_task(sd, server, events)));
    unwrap!(spawner.spawn(button_task(p.P0_11.degrade(), ButtonEvent::Up, events)));
    unwrap!(spawner.spawn(button_task(p.P0_24.degrade(), ButtonEvent::Select, events)));
    unwrap!(spawner.spawn(button_task(p.P0_12.degrade(), ButtonEvent::Down, events)));

    let accel_i2c = Twim::new(p.TWISPI1, Irqs, p.P0_30, p.P0_31, twim::Config::default());
    unwrap!(spawner.spawn(accel_task(accel_i2c, events)));
    unwrap!(spawner.spawn(tick_task(events)));

    let oled_i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let mut oled = unwrap!(display::init(oled_i2c));

    let mut app = App::new();
    let mut outbox = LinkOutbox::new(&RECORDS);

    // First frame right away rather than on the first tick.
    app.handle(Event::Tick { now: clock::now_secs() }, &mut outbox);
    render(&mut oled, &app);

    loop {
        let event = EVENTS.receive().await;
        if app.handle(event, &mut outbox) {
            render(&mut oled, &app);
        }
    }
}
