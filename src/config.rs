//! Configuration management for the bit reservoir
//!
//! This module provides the stream parameters the reservoir depends on
//! (MPEG version, channel layout, bitrate) and the tuning policy that
//! drives per-granule bit allowances.

use crate::error::{ConfigError, ConfigResult};

/// Sample rates accepted by each MPEG version
pub const MPEG1_SAMPLE_RATES: [u32; 3] = [44100, 48000, 32000];
pub const MPEG2_SAMPLE_RATES: [u32; 3] = [22050, 24000, 16000];
pub const MPEG25_SAMPLE_RATES: [u32; 3] = [11025, 12000, 8000];

/// Layer III bitrates in kbps (free format excluded)
pub const MPEG1_BITRATES: [u32; 14] =
    [32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
pub const MPEG2_BITRATES: [u32; 14] = [8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

/// MPEG version enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize, serde::Deserialize))]
pub enum MpegVersion {
    /// MPEG-1
    Mpeg1,
    /// MPEG-2 (lower sampling frequencies)
    Mpeg2,
    /// MPEG-2.5
    Mpeg25,
}

impl MpegVersion {
    /// Select the version from a sample rate
    pub fn from_sample_rate(sample_rate: u32) -> ConfigResult<Self> {
        if MPEG1_SAMPLE_RATES.contains(&sample_rate) {
            Ok(MpegVersion::Mpeg1)
        } else if MPEG2_SAMPLE_RATES.contains(&sample_rate) {
            Ok(MpegVersion::Mpeg2)
        } else if MPEG25_SAMPLE_RATES.contains(&sample_rate) {
            Ok(MpegVersion::Mpeg25)
        } else {
            Err(ConfigError::UnsupportedSampleRate(sample_rate))
        }
    }

    /// Granules carried by one frame
    pub fn granules_per_frame(self) -> usize {
        match self {
            MpegVersion::Mpeg1 => 2,
            MpegVersion::Mpeg2 | MpegVersion::Mpeg25 => 1,
        }
    }

    /// Width of the main_data_begin field in the side information
    pub fn main_data_begin_bits(self) -> u32 {
        match self {
            MpegVersion::Mpeg1 => 9,
            MpegVersion::Mpeg2 | MpegVersion::Mpeg25 => 8,
        }
    }

    /// Largest reservoir main_data_begin can express, in bits
    /// (511 bytes for MPEG-1, 255 bytes otherwise).
    pub fn reservoir_limit(self) -> i32 {
        ((1 << self.main_data_begin_bits()) - 1) * 8
    }

    /// Valid Layer III bitrates for this version
    pub fn bitrates(self) -> &'static [u32] {
        match self {
            MpegVersion::Mpeg1 => &MPEG1_BITRATES,
            MpegVersion::Mpeg2 | MpegVersion::Mpeg25 => &MPEG2_BITRATES,
        }
    }
}

/// Number of audio channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize, serde::Deserialize))]
pub enum Channels {
    /// Mono audio (1 channel)
    Mono = 1,
    /// Stereo audio (2 channels)
    Stereo = 2,
}

impl Channels {
    pub fn count(self) -> usize {
        self as usize
    }
}

impl TryFrom<u32> for Channels {
    type Error = ConfigError;

    fn try_from(value: u32) -> ConfigResult<Self> {
        match value {
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            other => Err(ConfigError::InvalidChannels(other)),
        }
    }
}

impl From<Channels> for i32 {
    fn from(channels: Channels) -> Self {
        channels as i32
    }
}

impl From<Channels> for i64 {
    fn from(channels: Channels) -> Self {
        channels as i64
    }
}

/// Tuning constants for per-granule bit allowances
///
/// The defaults are the empirical values of the ISO reference encoder and
/// must be kept for bit-exact output. They are exposed so that callers can
/// experiment with more or less aggressive reservoir usage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize, serde::Deserialize))]
pub struct ReservoirPolicy {
    /// Multiplier turning perceptual entropy into a bit demand
    pub entropy_to_bits: f64,
    /// Minimum demand above the mean before the reservoir is tapped
    pub min_extra_demand: i32,
    /// Share of the current occupancy one granule may draw, in percent
    pub draw_limit_percent: i32,
    /// Occupancy level, in percent of capacity, above which the
    /// reservoir is forcibly drained
    pub drawdown_threshold_percent: i32,
}

impl Default for ReservoirPolicy {
    fn default() -> Self {
        Self {
            entropy_to_bits: 3.1,
            min_extra_demand: 100,
            draw_limit_percent: 60,
            drawdown_threshold_percent: 80,
        }
    }
}

impl ReservoirPolicy {
    /// Validate the policy
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.entropy_to_bits.is_finite() || self.entropy_to_bits <= 0.0 {
            return Err(ConfigError::InvalidPolicy {
                field: "entropy_to_bits",
                value: self.entropy_to_bits,
            });
        }
        if self.min_extra_demand < 0 {
            return Err(ConfigError::InvalidPolicy {
                field: "min_extra_demand",
                value: self.min_extra_demand as f64,
            });
        }
        if !(0..=100).contains(&self.draw_limit_percent) {
            return Err(ConfigError::InvalidPolicy {
                field: "draw_limit_percent",
                value: self.draw_limit_percent as f64,
            });
        }
        if !(0..=100).contains(&self.drawdown_threshold_percent) {
            return Err(ConfigError::InvalidPolicy {
                field: "drawdown_threshold_percent",
                value: self.drawdown_threshold_percent as f64,
            });
        }
        Ok(())
    }
}

/// Stream parameters the frame budget is derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingParams {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Target bitrate in kbps
    pub bitrate_kbps: u32,
    /// Number of audio channels
    pub channels: Channels,
}

impl Default for EncodingParams {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            bitrate_kbps: 128,
            channels: Channels::Stereo,
        }
    }
}

impl EncodingParams {
    /// Validate the sample rate and bitrate combination
    pub fn validate(&self) -> ConfigResult<()> {
        let version = self.mpeg_version()?;
        if !version.bitrates().contains(&self.bitrate_kbps) {
            return Err(ConfigError::UnsupportedBitrate {
                bitrate: self.bitrate_kbps,
                sample_rate: self.sample_rate,
            });
        }
        Ok(())
    }

    /// Get the MPEG version based on sample rate
    pub fn mpeg_version(&self) -> ConfigResult<MpegVersion> {
        MpegVersion::from_sample_rate(self.sample_rate)
    }
}
