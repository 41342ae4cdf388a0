//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the simulated world in `athene::sim`.  All tests run on the
//! host (x86_64) in virtual time with no real hardware required.

#![cfg(not(target_os = "espidf"))]

mod mock_hw;
mod service_loop_tests;
mod session_tests;
