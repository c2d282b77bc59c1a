//! Shared utilities for the content repository
//!
//! Currently just the single-flight memo cell every cache in the crate is
//! built on.

mod single_flight;

pub use single_flight::{FlightState, SingleFlight};
