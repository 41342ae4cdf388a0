//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `ble`          | Advertiser         | Bluedroid GAP (broadcast)|
//! | `log_sink`     | EventSink          | Serial log output        |
//! | `time`         | Clock              | ESP32 system timer       |
//!
//! The ADC sampler lives in [`crate::sensors::supply`]; the rail and done
//! line drivers in [`crate::drivers`].

pub mod ble;
pub mod log_sink;
pub mod time;
