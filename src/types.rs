//! Type definitions shared between the reservoir and its callers
//!
//! `FrameContext` carries the per-frame inputs produced by the header and
//! framing logic, `SideInfo` is the granule/channel table whose coded
//! lengths the reservoir reads and pads.

use std::ops::{Index, IndexMut};

use crate::config::{Channels, MpegVersion};
use crate::error::{SideInfoError, SideInfoResult};

pub const MAX_CHANNELS: usize = 2;
pub const MAX_GRANULES: usize = 2;

/// Largest value of the 12-bit part2_3_length field
pub const MAX_GRANULE_BITS: u32 = 4095;

/// Upper bound on a frame plus the reservoir preceding it (decoder buffer)
pub const MAX_FRAME_PLUS_RESERVOIR_BITS: i32 = 7680;

/// Per-frame inputs to the reservoir
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameContext {
    pub version: MpegVersion,
    pub channels: Channels,
    /// Bits the frame occupies on the wire, header included
    pub frame_length_bits: u32,
    /// Mean bits available to each granule before reservoir borrowing
    pub mean_bits: u32,
    /// main_data_begin committed by the writer for this frame, in bits
    pub reservoir_offset_bits: u32,
}

impl FrameContext {
    pub fn new(
        version: MpegVersion,
        channels: Channels,
        frame_length_bits: u32,
        mean_bits: u32,
    ) -> Self {
        Self {
            version,
            channels,
            frame_length_bits,
            mean_bits,
            reservoir_offset_bits: 0,
        }
    }

    /// Set the reservoir offset from a main_data_begin value in bytes
    pub fn with_main_data_begin(mut self, bytes: u32) -> Self {
        self.reservoir_offset_bits = bytes * 8;
        self
    }

    /// Set the reservoir offset in bits
    pub fn with_reservoir_offset_bits(mut self, bits: u32) -> Self {
        self.reservoir_offset_bits = bits;
        self
    }

    pub fn granules_per_frame(&self) -> usize {
        self.version.granules_per_frame()
    }

    /// Mean bits for one channel of one granule
    pub fn mean_bits_per_channel(&self) -> i64 {
        i64::from(self.mean_bits) / i64::from(self.channels)
    }
}

/// Granule information the reservoir cares about (part of gr_info)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize, serde::Deserialize))]
pub struct GranuleInfo {
    /// part2_3_length: scalefactor and Huffman bits, stuffing included
    pub coded_length_bits: u32,
}

impl GranuleInfo {
    pub fn new(coded_length_bits: u32) -> Self {
        Self { coded_length_bits }
    }
}

/// Side information table indexed by (granule, channel)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideInfo {
    granules: usize,
    channels: usize,
    gr: [[GranuleInfo; MAX_CHANNELS]; MAX_GRANULES],
    /// Stuffing bits that did not fit in any granule; the writer emits
    /// them as ancillary data.
    pub drain_bits: u64,
}

impl SideInfo {
    /// Create an empty table sized for the version and channel layout
    pub fn new(version: MpegVersion, channels: Channels) -> Self {
        Self {
            granules: version.granules_per_frame(),
            channels: channels.count(),
            gr: [[GranuleInfo::default(); MAX_CHANNELS]; MAX_GRANULES],
            drain_bits: 0,
        }
    }

    /// Create an empty table matching a frame
    pub fn for_frame(frame: &FrameContext) -> Self {
        Self::new(frame.version, frame.channels)
    }

    pub fn granules(&self) -> usize {
        self.granules
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of (granule, channel) slots in use
    pub fn slot_count(&self) -> usize {
        self.granules * self.channels
    }

    fn check(&self, granule: usize, channel: usize) -> SideInfoResult<()> {
        if granule < self.granules && channel < self.channels {
            Ok(())
        } else {
            Err(SideInfoError::SlotOutOfRange {
                granule,
                channel,
                granules: self.granules,
                channels: self.channels,
            })
        }
    }

    pub fn get(&self, granule: usize, channel: usize) -> SideInfoResult<&GranuleInfo> {
        self.check(granule, channel)?;
        Ok(&self.gr[granule][channel])
    }

    pub fn get_mut(&mut self, granule: usize, channel: usize) -> SideInfoResult<&mut GranuleInfo> {
        self.check(granule, channel)?;
        Ok(&mut self.gr[granule][channel])
    }

    /// Coded lengths in stuffing order: granule outer, channel inner
    pub fn coded_lengths(&self) -> Vec<u32> {
        self.slots().map(|gi| gi.coded_length_bits).collect()
    }

    /// Overwrite the coded lengths in stuffing order
    pub(crate) fn set_coded_lengths(&mut self, lengths: &[u32]) {
        debug_assert_eq!(lengths.len(), self.slot_count());
        let channels = self.channels;
        for (slot, &length) in lengths.iter().enumerate() {
            self.gr[slot / channels][slot % channels].coded_length_bits = length;
        }
    }

    /// Sum of all coded lengths in the frame
    pub fn total_coded_bits(&self) -> u64 {
        self.slots().map(|gi| gi.coded_length_bits as u64).sum()
    }

    fn slots(&self) -> impl Iterator<Item = &GranuleInfo> + '_ {
        self.gr[..self.granules]
            .iter()
            .flat_map(move |granule| granule[..self.channels].iter())
    }
}

impl Index<(usize, usize)> for SideInfo {
    type Output = GranuleInfo;

    fn index(&self, (granule, channel): (usize, usize)) -> &GranuleInfo {
        self.check(granule, channel).unwrap_or_else(|e| panic!("{}", e));
        &self.gr[granule][channel]
    }
}

impl IndexMut<(usize, usize)> for SideInfo {
    fn index_mut(&mut self, (granule, channel): (usize, usize)) -> &mut GranuleInfo {
        self.check(granule, channel).unwrap_or_else(|e| panic!("{}", e));
        &mut self.gr[granule][channel]
    }
}
