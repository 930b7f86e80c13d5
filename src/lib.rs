//! # Layer III bit reservoir
//!
//! Bit reservoir controller for constant bitrate MPEG Layer III encoders.
//! Each granule may borrow bits banked by earlier frames so that demanding
//! passages get more than the mean allocation, while the reservoir stays
//! within what main_data_begin can address and what a decoder buffer holds.
//!
//! The controller does not code audio or write bytes: it bounds how many
//! bits a granule may use, keeps the books once the coder has run, and pads
//! granule lengths (or requests ancillary data) to absorb any slack.
//!

pub mod budget;
pub mod config;
pub mod error;
pub mod reservoir;
pub mod types;

#[cfg(feature = "diagnostics")]
pub mod diagnostics;

#[cfg(test)]
mod tests;

pub use budget::FrameBudget;
pub use config::{Channels, EncodingParams, MpegVersion, ReservoirPolicy};
pub use error::{ConfigError, Error, ReservoirError, ReservoirResult, SideInfoError};
pub use reservoir::{distribute_stuffing, BitReservoir, FrameEndReport, StuffingPlan};
pub use types::{FrameContext, GranuleInfo, SideInfo, MAX_GRANULE_BITS};
