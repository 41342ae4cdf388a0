//! Supply-voltage sensing.
//!
//! Two ADC channels sit behind resistive dividers: one on the battery,
//! one on the charger / solar input.  [`supply::AdcSupplySampler`] reads
//! both and maps them to millivolts; the rest of the firmware only ever
//! sees a [`SupplyReading`].

pub mod supply;

/// Full scale of the normalised 16-bit conversion result.
pub const FULL_SCALE_RAW: u16 = u16::MAX;

/// One sample of both supply channels, in millivolts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupplyReading {
    pub battery_mv: u16,
    pub supply_mv: u16,
}

/// Linear map from a 16-bit full-scale reading to millivolts:
/// `raw / 65535 × reference_mv`.
pub fn raw_to_millivolts(raw: u16, reference_mv: u16) -> u16 {
    (u32::from(raw) * u32::from(reference_mv) / u32::from(FULL_SCALE_RAW)) as u16
}

/// Stretch a `bits`-wide conversion result to 16-bit full scale by bit
/// replication, so the narrow full-scale code maps to `0xFFFF`.
pub fn widen_to_16(raw: u16, bits: u32) -> u16 {
    debug_assert!((8..=16).contains(&bits), "unsupported ADC width: {bits}");
    if bits >= 16 {
        return raw;
    }
    let raw = raw & ((1u16 << bits) - 1);
    (raw << (16 - bits)) | (raw >> (2 * bits - 16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_maps_to_reference() {
        assert_eq!(raw_to_millivolts(u16::MAX, 4_200), 4_200);
        assert_eq!(raw_to_millivolts(0, 4_200), 0);
    }

    #[test]
    fn midscale_is_half_reference() {
        assert_eq!(raw_to_millivolts(32_768, 4_200), 2_100);
    }

    #[test]
    fn twelve_bit_full_scale_widens_to_sixteen() {
        assert_eq!(widen_to_16(4_095, 12), u16::MAX);
        assert_eq!(widen_to_16(0, 12), 0);
        assert_eq!(widen_to_16(2_048, 12), 0x8008);
    }
}
