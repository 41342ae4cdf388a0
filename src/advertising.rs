//! Advertisement payload and descriptor.
//!
//! The beacon broadcasts a legacy, non-connectable advertisement laid out
//! as four AD structures:
//!
//! | AD type | Content                                   | Bytes |
//! |---------|-------------------------------------------|-------|
//! | `0x01`  | Flags: LE General Discoverable, no BR/EDR | 3     |
//! | `0x09`  | Complete local name                       | 2 + n |
//! | `0xFF`  | Company A (LE16) + battery mV (LE16)      | 6     |
//! | `0xFF`  | Company B (LE16) + supply mV (LE16)       | 6     |
//!
//! Only the two millivolt fields change between bursts.  They live in
//! [`AdvertisementPayload`], which is written through `&mut` before the
//! radio borrows the descriptor, so a half-updated payload can never be
//! transmitted.

use heapless::{String, Vec};

use crate::config::{BeaconConfig, MAX_LOCAL_NAME_LEN};
use crate::error::RadioError;
use crate::sensors::SupplyReading;

/// Maximum size of a legacy advertising data block.
pub const MAX_ADV_DATA_LEN: usize = 31;

const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
const AD_TYPE_MANUFACTURER_DATA: u8 = 0xFF;
/// LE General Discoverable | BR/EDR Not Supported.
const ADV_FLAGS: u8 = 0x06;

/// Encoded advertising data block.
pub type AdvData = Vec<u8, MAX_ADV_DATA_LEN>;

// ───────────────────────────────────────────────────────────────
// Payload
// ───────────────────────────────────────────────────────────────

/// The two little-endian millivolt fields carried by the advertisement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvertisementPayload {
    battery: [u8; 2],
    supply: [u8; 2],
}

impl AdvertisementPayload {
    /// Overwrite both fields from a fresh reading.
    pub fn write(&mut self, reading: SupplyReading) {
        self.battery = reading.battery_mv.to_le_bytes();
        self.supply = reading.supply_mv.to_le_bytes();
    }

    pub fn battery_bytes(&self) -> [u8; 2] {
        self.battery
    }

    pub fn supply_bytes(&self) -> [u8; 2] {
        self.supply
    }

    pub fn reading(&self) -> SupplyReading {
        SupplyReading {
            battery_mv: u16::from_le_bytes(self.battery),
            supply_mv: u16::from_le_bytes(self.supply),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Descriptor
// ───────────────────────────────────────────────────────────────

/// Advertising PDU type.  Only the non-connectable form is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingKind {
    /// `ADV_NONCONN_IND`: broadcast only, no scan response, no connections.
    NonConnectable,
}

/// Static advertisement configuration plus the per-burst payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    kind: AdvertisingKind,
    local_name: String<MAX_LOCAL_NAME_LEN>,
    battery_company_id: u16,
    supply_company_id: u16,
    payload: AdvertisementPayload,
}

impl Advertisement {
    pub fn new(local_name: String<MAX_LOCAL_NAME_LEN>, battery_company_id: u16, supply_company_id: u16) -> Self {
        Self {
            kind: AdvertisingKind::NonConnectable,
            local_name,
            battery_company_id,
            supply_company_id,
            payload: AdvertisementPayload::default(),
        }
    }

    pub fn from_config(config: &BeaconConfig) -> Self {
        Self::new(
            config.local_name.clone(),
            config.battery_company_id,
            config.supply_company_id,
        )
    }

    pub fn kind(&self) -> AdvertisingKind {
        self.kind
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn payload(&self) -> &AdvertisementPayload {
        &self.payload
    }

    /// Refresh the payload.  This is the only per-burst mutation.
    pub fn set_reading(&mut self, reading: SupplyReading) {
        self.payload.write(reading);
    }

    /// Serialise into a legacy advertising data block.
    pub fn encode(&self) -> Result<AdvData, RadioError> {
        let mut out = AdvData::new();
        let name = self.local_name.as_bytes();

        push_all(&mut out, &[2, AD_TYPE_FLAGS, ADV_FLAGS])?;
        push_all(&mut out, &[name.len() as u8 + 1, AD_TYPE_COMPLETE_LOCAL_NAME])?;
        push_all(&mut out, name)?;
        push_manufacturer(&mut out, self.battery_company_id, self.payload.battery_bytes())?;
        push_manufacturer(&mut out, self.supply_company_id, self.payload.supply_bytes())?;
        Ok(out)
    }

    /// Recover the reading from a received advertising data block.
    ///
    /// Scans every AD structure and picks the manufacturer elements that
    /// carry this descriptor's company ids.  Returns `None` if either one
    /// is missing or malformed.
    pub fn decode_reading(&self, data: &[u8]) -> Option<SupplyReading> {
        let mut battery = None;
        let mut supply = None;

        let mut rest = data;
        while let Some((&len, tail)) = rest.split_first() {
            let len = len as usize;
            if len == 0 {
                break;
            }
            if tail.len() < len {
                return None;
            }
            let (structure, next) = tail.split_at(len);
            rest = next;

            if let [AD_TYPE_MANUFACTURER_DATA, c0, c1, v0, v1] = *structure {
                let company = u16::from_le_bytes([c0, c1]);
                let value = u16::from_le_bytes([v0, v1]);
                if company == self.battery_company_id {
                    battery = Some(value);
                } else if company == self.supply_company_id {
                    supply = Some(value);
                }
            }
        }

        Some(SupplyReading {
            battery_mv: battery?,
            supply_mv: supply?,
        })
    }
}

fn push_all(out: &mut AdvData, bytes: &[u8]) -> Result<(), RadioError> {
    out.extend_from_slice(bytes)
        .map_err(|()| RadioError::PayloadTooLarge)
}

fn push_manufacturer(out: &mut AdvData, company_id: u16, value: [u8; 2]) -> Result<(), RadioError> {
    let [c0, c1] = company_id.to_le_bytes();
    push_all(out, &[5, AD_TYPE_MANUFACTURER_DATA, c0, c1, value[0], value[1]])
}
