//! Athene timer firmware library.
//!
//! Power-cycles a companion module on a fixed schedule and, between
//! sessions, broadcasts battery and supply voltages as a BLE beacon.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module; on the host,
//! [`sim`] stands in for the hardware.

#![deny(unused_must_use)]

pub mod advertising;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod sensors;
pub mod session;

pub mod adapters;
pub mod drivers;
pub mod pins;

#[cfg(target_os = "espidf")]
mod esp_link_shims;

#[cfg(not(target_os = "espidf"))]
pub mod sim;
