//! Application core — pure beacon logic, zero I/O.
//!
//! The main loop, its outbound events and the port traits every adapter
//! implements.  Hardware is only reached through [`ports`], so the whole
//! loop runs on the host against [`crate::sim`].

pub mod events;
pub mod ports;
pub mod service;
