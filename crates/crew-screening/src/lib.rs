//! Maritime crew screening core.
//!
//! Fuses career-contract history, interview answers, certification compliance and vessel
//! tracking verification into a single hire/review/reject recommendation. HTTP wiring and
//! process bootstrapping live in the `crew-screening-service` binary.

pub mod config;
pub mod error;
pub mod screening;
pub mod telemetry;
