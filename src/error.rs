//! Error types for the bit reservoir
//!
//! This module defines all error types used by the reservoir controller,
//! its configuration layer and the side information table.

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reservoir accounting errors
    #[error("Reservoir error: {0}")]
    Reservoir(#[from] ReservoirError),

    /// Side information table errors
    #[error("Side info error: {0}")]
    SideInfo(#[from] SideInfoError),
}

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Unsupported sample rate
    #[error("Unsupported sample rate: {0} Hz")]
    UnsupportedSampleRate(u32),

    /// Unsupported bitrate for the MPEG version selected by the sample rate
    #[error("Unsupported bitrate: {bitrate} kbps at {sample_rate} Hz")]
    UnsupportedBitrate { bitrate: u32, sample_rate: u32 },

    /// Invalid channel count
    #[error("Invalid channel count: {0}")]
    InvalidChannels(u32),

    /// A reservoir policy parameter is out of range
    #[error("Invalid reservoir policy: {field} = {value}")]
    InvalidPolicy { field: &'static str, value: f64 },
}

/// Reservoir accounting errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReservoirError {
    /// The reservoir offset committed by the bitstream writer does not match
    /// the occupancy tracked by the controller. The session cannot continue.
    #[error(
        "Reservoir desynchronized: controller holds {expected} bits, frame declares {actual} bits"
    )]
    ProtocolDesync { expected: i64, actual: u32 },
}

/// Side information table errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SideInfoError {
    /// Granule/channel slot outside the table dimensions
    #[error("Slot ({granule}, {channel}) outside side info table of {granules} x {channels}")]
    SlotOutOfRange {
        granule: usize,
        channel: usize,
        granules: usize,
        channels: usize,
    },
}

/// Specialized result types for different modules
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type ReservoirResult<T> = std::result::Result<T, ReservoirError>;
pub type SideInfoResult<T> = std::result::Result<T, SideInfoError>;
pub type Result<T> = std::result::Result<T, Error>;
