//! Frame budget calculation
//!
//! Derives the frame length and the mean bits per granule for every frame of a
//! constant bitrate stream. Frames alternate between `whole` and `whole + 1`
//! slots (the padding bit) so that the long-run rate matches the bitrate.

use crate::config::{Channels, EncodingParams, MpegVersion};
use crate::error::ConfigResult;
use crate::types::FrameContext;

/// Samples per channel in one granule
pub const GRANULE_SIZE: u32 = 576;

/// Layer III slots are one byte
const BITS_PER_SLOT: u32 = 8;

/// Bits every frame spends before main data: the 32-bit header plus the
/// side information (17/32 bytes for MPEG-1, 9/17 bytes otherwise), no CRC
pub fn header_and_side_info_bits(version: MpegVersion, channels: Channels) -> u32 {
    let bytes = match (version, channels) {
        (MpegVersion::Mpeg1, Channels::Mono) => 4 + 17,
        (MpegVersion::Mpeg1, Channels::Stereo) => 4 + 32,
        (_, Channels::Mono) => 4 + 9,
        (_, Channels::Stereo) => 4 + 17,
    };
    8 * bytes
}

/// Per-frame bit budget of a constant bitrate stream
#[derive(Debug, Clone)]
pub struct FrameBudget {
    version: MpegVersion,
    channels: Channels,
    whole_slots_per_frame: u32,
    frac_slots_per_frame: f64,
    slot_lag: f64,
}

impl FrameBudget {
    /// Create a budget for validated stream parameters
    pub fn new(params: &EncodingParams) -> ConfigResult<Self> {
        params.validate()?;
        let version = params.mpeg_version()?;
        let granules = version.granules_per_frame() as u32;

        let bits_per_frame =
            f64::from(granules * GRANULE_SIZE) * 1000.0 * f64::from(params.bitrate_kbps);
        let avg_slots_per_frame =
            bits_per_frame / (f64::from(BITS_PER_SLOT) * f64::from(params.sample_rate));
        let whole_slots_per_frame = avg_slots_per_frame as u32;
        let frac_slots_per_frame = avg_slots_per_frame - f64::from(whole_slots_per_frame);

        Ok(Self {
            version,
            channels: params.channels,
            whole_slots_per_frame,
            frac_slots_per_frame,
            slot_lag: -frac_slots_per_frame,
        })
    }

    pub fn version(&self) -> MpegVersion {
        self.version
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn whole_slots_per_frame(&self) -> u32 {
        self.whole_slots_per_frame
    }

    /// Decide padding for the next frame and advance the slot lag
    fn next_padding(&mut self) -> bool {
        if self.frac_slots_per_frame > 0.0 {
            let padding = self.slot_lag <= self.frac_slots_per_frame - 1.0;
            self.slot_lag += if padding { 1.0 } else { 0.0 } - self.frac_slots_per_frame;
            padding
        } else {
            false
        }
    }

    /// Produce the context for the next frame. `reservoir_offset_bits` is the
    /// main_data_begin the writer committed to, in bits.
    pub fn next_frame(&mut self, reservoir_offset_bits: u32) -> FrameContext {
        let padding = self.next_padding();
        let frame_length_bits = BITS_PER_SLOT * (self.whole_slots_per_frame + u32::from(padding));
        let granules = self.version.granules_per_frame() as u32;
        let overhead = header_and_side_info_bits(self.version, self.channels);
        let mean_bits = frame_length_bits.saturating_sub(overhead) / granules;

        FrameContext::new(self.version, self.channels, frame_length_bits, mean_bits)
            .with_reservoir_offset_bits(reservoir_offset_bits)
    }
}
