//! BLE advertiser adapter.
//!
//! Implements [`Advertiser`] — broadcast-only, no GATT server, no
//! connections.  Each burst the scheduler hands over an
//! [`Advertisement`]; this adapter encodes it to a raw advertising data
//! block and loads it into the controller.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GAP via raw `esp_idf_svc::sys` calls.
//! - **all other targets**: simulation stubs that keep the last data block
//!   for inspection.

use log::info;

use crate::advertising::{AdvData, Advertisement, AdvertisingKind};
use crate::app::ports::Advertiser;
use crate::error::RadioError;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

/// Advertising interval in 0.625 ms units (100 ms).
pub const ADV_INTERVAL_UNITS: u16 = 0xA0;

// ───────────────────────────────────────────────────────────────
// Adapter state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    /// Stack not brought up (or bring-up failed).
    Off,
    /// Stack up, not advertising.
    Ready,
    Advertising,
}

pub struct BleAdvertiser {
    state: BleState,
    kind: AdvertisingKind,
    data: AdvData,
}

impl Default for BleAdvertiser {
    fn default() -> Self {
        Self::new()
    }
}

impl BleAdvertiser {
    pub fn new() -> Self {
        Self {
            state: BleState::Off,
            kind: AdvertisingKind::NonConnectable,
            data: AdvData::new(),
        }
    }

    pub fn state(&self) -> BleState {
        self.state
    }

    /// Last data block handed to the controller.
    pub fn adv_data(&self) -> &[u8] {
        &self.data
    }

    fn require_enabled(&self) -> Result<(), RadioError> {
        if self.state == BleState::Off {
            return Err(RadioError::NotEnabled);
        }
        Ok(())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_enable(&mut self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        // SAFETY: called once from the main thread before any other BLE
        // call; the controller config is a plain value copied by the driver.
        unsafe {
            // BLE only; classic BT memory goes back to the heap.
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK as i32 {
                return Err(RadioError::StackInit(ret));
            }
            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK as i32 {
                return Err(RadioError::StackInit(ret));
            }
            let ret = esp_bluedroid_init();
            if ret != ESP_OK as i32 {
                return Err(RadioError::StackInit(ret));
            }
            let ret = esp_bluedroid_enable();
            if ret != ESP_OK as i32 {
                return Err(RadioError::StackInit(ret));
            }
            let ret = esp_ble_gap_register_callback(Some(ble_gap_event_handler));
            if ret != ESP_OK as i32 {
                return Err(RadioError::StackInit(ret));
            }
        }
        info!("BLE(espidf): Bluedroid up, broadcast only");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_enable(&mut self) -> Result<(), RadioError> {
        info!("BLE(sim): stack up");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_configure(&mut self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        // SAFETY: the stack copies the block before returning.
        let ret = unsafe { esp_ble_gap_config_adv_data_raw(self.data.as_mut_ptr(), self.data.len() as u32) };
        if ret != ESP_OK as i32 {
            return Err(RadioError::Configure(ret));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_configure(&mut self) -> Result<(), RadioError> {
        log::debug!("BLE(sim): adv data {:02x?}", self.data.as_slice());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        let adv_type = match self.kind {
            AdvertisingKind::NonConnectable => esp_ble_adv_type_t_ADV_TYPE_NONCONN_IND,
        };
        // SAFETY: zeroed tail fields (peer address) are unused for
        // undirected advertising; the struct is copied by the stack.
        let ret = unsafe {
            let mut adv_params = esp_ble_adv_params_t {
                adv_int_min: ADV_INTERVAL_UNITS,
                adv_int_max: ADV_INTERVAL_UNITS,
                adv_type,
                own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
                channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
                adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
                ..core::mem::zeroed()
            };
            esp_ble_gap_start_advertising(&mut adv_params)
        };
        if ret != ESP_OK as i32 {
            return Err(RadioError::Start(ret));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), RadioError> {
        log::debug!("BLE(sim): advertising ({:?})", self.kind);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) -> Result<(), RadioError> {
        // SAFETY: stopping when not advertising is reported, not undefined.
        let ret = unsafe { esp_idf_svc::sys::esp_ble_gap_stop_advertising() };
        if ret != esp_idf_svc::sys::ESP_OK as i32 {
            return Err(RadioError::Stop(ret));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) -> Result<(), RadioError> {
        log::debug!("BLE(sim): advertising stopped");
        Ok(())
    }
}

impl Advertiser for BleAdvertiser {
    fn enable(&mut self) -> Result<(), RadioError> {
        if self.state != BleState::Off {
            return Ok(());
        }
        self.platform_enable()?;
        self.state = BleState::Ready;
        Ok(())
    }

    fn configure(&mut self, advertisement: &Advertisement) -> Result<(), RadioError> {
        self.require_enabled()?;
        self.kind = advertisement.kind();
        self.data = advertisement.encode()?;
        self.platform_configure()
    }

    fn start(&mut self) -> Result<(), RadioError> {
        self.require_enabled()?;
        self.platform_start()?;
        self.state = BleState::Advertising;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RadioError> {
        self.require_enabled()?;
        self.platform_stop()?;
        self.state = BleState::Ready;
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_RAW_SET_COMPLETE_EVT => {
            // SAFETY: the stack passes a valid param block for this event.
            let status = unsafe { (*param).adv_data_raw_cmpl.status };
            if status != esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                log::warn!("BLE: adv data rejected (status={})", status);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            // SAFETY: as above.
            let status = unsafe { (*param).adv_start_cmpl.status };
            if status != esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                log::warn!("BLE: advertising start failed (status={})", status);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BeaconConfig;
    use crate::sensors::SupplyReading;

    #[test]
    fn calls_before_enable_are_rejected() {
        let mut ble = BleAdvertiser::new();
        let adv = Advertisement::from_config(&BeaconConfig::default());
        assert_eq!(ble.configure(&adv), Err(RadioError::NotEnabled));
        assert_eq!(ble.start(), Err(RadioError::NotEnabled));
        assert_eq!(ble.state(), BleState::Off);
    }

    #[test]
    fn burst_cycle_tracks_state_and_data() {
        let mut ble = BleAdvertiser::new();
        let mut adv = Advertisement::from_config(&BeaconConfig::default());
        adv.set_reading(SupplyReading { battery_mv: 3_300, supply_mv: 4_200 });

        ble.enable().unwrap();
        ble.configure(&adv).unwrap();
        ble.start().unwrap();
        assert_eq!(ble.state(), BleState::Advertising);
        assert_eq!(adv.decode_reading(ble.adv_data()), Some(adv.payload().reading()));

        ble.stop().unwrap();
        assert_eq!(ble.state(), BleState::Ready);
        // Second enable is a no-op.
        ble.enable().unwrap();
        assert_eq!(ble.state(), BleState::Ready);
    }
}
