//! Bluetooth Low Energy link to the companion app.
//!
//! The SoftDevice S140 runs in **Peripheral** role and exposes one GATT
//! service with a single notify characteristic carrying encoded sample
//! records. The run-loop never touches the radio:
//!
//! 1. [`LinkOutbox`] (the run-loop's [`Outbox`]) drops a payload into a
//!    one-slot channel, refusing it when the link is down or busy.
//! 2. [`link_task`] advertises, serves the connection and forwards each
//!    queued payload as a notification.
//! 3. The outcome of every forwarded payload comes back into the event
//!    queue as [`Event::SendAcknowledged`] or [`Event::SendFailed`].

pub mod link;

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use nrf_softdevice::ble::gatt_server::NotifyValueError;
use nrf_softdevice::{raw, Softdevice};

use crate::config::{BLE_ATT_MTU, BLE_DEVICE_NAME};
use crate::error::SendError;
use crate::payload::PAYLOAD_SIZE;
use crate::transmission::Outbox;

pub use link::link_task;

/// One encoded sample record.
pub type Record = [u8; PAYLOAD_SIZE];

/// Hand-off between the run-loop and [`link_task`]. One slot: the
/// transmission controller never has more than one message in flight.
pub type RecordChannel = Channel<CriticalSectionRawMutex, Record, 1>;

static CONNECTED: AtomicBool = AtomicBool::new(false);

pub(crate) fn set_connected(connected: bool) {
    CONNECTED.store(connected, Ordering::Release);
}

pub fn is_connected() -> bool {
    CONNECTED.load(Ordering::Acquire)
}

#[nrf_softdevice::gatt_service(uuid = "5a1e0001-8f2b-4c3d-9e4f-70a1b2c3d4e5")]
pub struct PainLogService {
    /// Latest sample record.
    #[characteristic(uuid = "5a1e0002-8f2b-4c3d-9e4f-70a1b2c3d4e5", read, notify)]
    pub record: Record,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub pain_log: PainLogService,
}

/// [`Outbox`] backed by the [`RecordChannel`].
pub struct LinkOutbox {
    records: &'static RecordChannel,
}

impl LinkOutbox {
    pub fn new(records: &'static RecordChannel) -> Self {
        Self { records }
    }
}

impl Outbox for LinkOutbox {
    fn send(&mut self, payload: &[u8]) -> Result<(), SendError> {
        if !is_connected() {
            return Err(SendError::NotConnected);
        }
        if payload.len() > PAYLOAD_SIZE {
            return Err(SendError::BufferOverflow);
        }

        let mut record = [0u8; PAYLOAD_SIZE];
        record[..payload.len()].copy_from_slice(payload);
        self.records.try_send(record).map_err(|TrySendError::Full(_)| SendError::Busy)
    }
}

impl From<NotifyValueError> for SendError {
    fn from(err: NotifyValueError) -> Self {
        match err {
            NotifyValueError::Disconnected => SendError::NotConnected,
            NotifyValueError::Raw(code) => SendError::Raw(code as u32),
        }
    }
}

/// SoftDevice configuration: one peripheral link with an MTU large enough
/// for a whole record in one notification.
pub fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: BLE_ATT_MTU,
        }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: BLE_DEVICE_NAME.as_ptr() as _,
            current_len: BLE_DEVICE_NAME.len() as u16,
            max_len: BLE_DEVICE_NAME.len() as u16,
            write_perm: unsafe { core::mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

/// Run the SoftDevice event loop.
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}
