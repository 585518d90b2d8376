//! Advertising and connection handling for the companion link.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload,
};
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::Softdevice;

use crate::app::{Event, EventSender};
use crate::ble::{set_connected, PainLogServiceEvent, Record, Server, ServerEvent};
use crate::config::{BLE_ADV_INTERVAL, BLE_DEVICE_NAME};
use crate::error::{BleErrorTag, Error, SendError};
use crate::transmission::{OutcomeSlot, SendOutcome};

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .full_name(BLE_DEVICE_NAME)
    .build();

static SCAN_DATA: [u8; 0] = [];

/// Advertise, serve one connection at a time, forward queued records.
///
/// Records still queued when a connection drops are reported as failed so
/// the run-loop can retry them on the next connection.
pub async fn link_task(
    sd: &'static Softdevice,
    server: &'static Server,
    records: Receiver<'static, CriticalSectionRawMutex, Record, 1>,
    events: &EventSender,
) -> ! {
    loop {
        let conn = match advertise(sd).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("BLE: {}", e);
                continue;
            }
        };

        info!("BLE: companion connected");
        set_connected(true);

        let serve = gatt_server::run(&conn, server, |event| match event {
            ServerEvent::PainLog(PainLogServiceEvent::RecordCccdWrite { notifications }) => {
                info!("BLE: notifications {}", notifications);
            }
        });
        let mut unreported = OutcomeSlot::new();
        let forward = forward_records(&conn, server, &records, events, &mut unreported);

        if let Either::First(_) = select(serve, forward).await {
            info!("BLE: companion disconnected");
        }
        set_connected(false);

        // A record taken off the channel whose outcome never reached the
        // run-loop.
        if let Some(outcome) = unreported.take_unreported() {
            events.send(outcome.into()).await;
        }
        while records.try_receive().is_ok() {
            events
                .send(Event::SendFailed(SendError::NotConnected))
                .await;
        }
    }
}

async fn advertise(sd: &'static Softdevice) -> Result<Connection, Error> {
    let config = peripheral::Config {
        interval: BLE_ADV_INTERVAL,
        ..Default::default()
    };
    let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
        adv_data: &ADV_DATA,
        scan_data: &SCAN_DATA,
    };
    peripheral::advertise_connectable(sd, adv, &config)
        .await
        .map_err(|_| BleErrorTag::AdvertiseFailed.into())
}

async fn forward_records(
    conn: &Connection,
    server: &Server,
    records: &Receiver<'static, CriticalSectionRawMutex, Record, 1>,
    events: &EventSender,
    unreported: &mut OutcomeSlot,
) -> ! {
    loop {
        let record = records.receive().await;
        let outcome = match server.pain_log.record_notify(conn, &record) {
            Ok(()) => SendOutcome::Acknowledged,
            Err(e) => {
                warn!("BLE: notify failed: {}", e);
                SendOutcome::Failed(e.into())
            }
        };
        // Held until queued; if this future is dropped while waiting for
        // queue space, the caller reports it.
        unreported.hold(outcome);
        events.send(outcome.into()).await;
        unreported.delivered();
    }
}
