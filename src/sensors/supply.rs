//! Battery and charger-input voltage sampler.
//!
//! Both channels sit on ADC1 behind dividers that scale the full
//! [`adc_reference_mv`](crate::config::BeaconConfig::adc_reference_mv)
//! range onto the ADC input.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: one-shot ADC1 reads via hw_init helpers, 12-bit results
//! widened to 16-bit full scale.
//! On host/test: raw 16-bit values injected with `sim_set_*`, defaulting
//! to full scale.

use core::sync::atomic::{AtomicU16, Ordering};

use log::trace;

use super::{SupplyReading, raw_to_millivolts};
use crate::app::ports::SensorSampler;

static SIM_BATTERY_RAW: AtomicU16 = AtomicU16::new(u16::MAX);
static SIM_SUPPLY_RAW: AtomicU16 = AtomicU16::new(u16::MAX);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_raw(raw: u16) {
    SIM_BATTERY_RAW.store(raw, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_supply_raw(raw: u16) {
    SIM_SUPPLY_RAW.store(raw, Ordering::Relaxed);
}

pub struct AdcSupplySampler {
    reference_mv: u16,
    last: SupplyReading,
}

impl AdcSupplySampler {
    pub fn new(reference_mv: u16) -> Self {
        Self {
            reference_mv,
            last: SupplyReading::default(),
        }
    }

    /// Most recent reading, zero before the first sample.
    pub fn last(&self) -> SupplyReading {
        self.last
    }

    #[cfg(target_os = "espidf")]
    fn read_battery_raw(&self) -> u16 {
        use crate::drivers::hw_init;
        super::widen_to_16(hw_init::adc1_read(crate::pins::BATTERY_ADC_CHANNEL), hw_init::ADC_BITS)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_battery_raw(&self) -> u16 {
        SIM_BATTERY_RAW.load(Ordering::Relaxed)
    }

    #[cfg(target_os = "espidf")]
    fn read_supply_raw(&self) -> u16 {
        use crate::drivers::hw_init;
        super::widen_to_16(hw_init::adc1_read(crate::pins::SUPPLY_ADC_CHANNEL), hw_init::ADC_BITS)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_supply_raw(&self) -> u16 {
        SIM_SUPPLY_RAW.load(Ordering::Relaxed)
    }
}

impl SensorSampler for AdcSupplySampler {
    fn sample(&mut self) -> SupplyReading {
        let battery_raw = self.read_battery_raw();
        let supply_raw = self.read_supply_raw();
        self.last = SupplyReading {
            battery_mv: raw_to_millivolts(battery_raw, self.reference_mv),
            supply_mv: raw_to_millivolts(supply_raw, self.reference_mv),
        };
        trace!(
            "supply: raw {}/{} -> {}mV/{}mV",
            battery_raw, supply_raw, self.last.battery_mv, self.last.supply_mv
        );
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both tests touch the shared injection statics, so they run as one.
    #[test]
    fn scales_injected_raw_values() {
        let mut sampler = AdcSupplySampler::new(4_200);
        assert_eq!(sampler.last(), SupplyReading::default());

        sim_set_battery_raw(u16::MAX);
        sim_set_supply_raw(32_768);
        let r = sampler.sample();
        assert_eq!(r, SupplyReading { battery_mv: 4_200, supply_mv: 2_100 });
        assert_eq!(sampler.last(), r);

        sim_set_battery_raw(0);
        assert_eq!(sampler.sample().battery_mv, 0);

        sim_set_battery_raw(u16::MAX);
        sim_set_supply_raw(u16::MAX);
    }
}
