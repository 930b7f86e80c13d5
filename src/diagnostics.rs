//! Per-frame reservoir trace
//!
//! This module records the reservoir state at every frame boundary so that
//! a session can be compared against a reference encoder or inspected
//! after the fact. Traces serialize to JSON.
//!
//! This module is only available when the "diagnostics" feature is enabled.

use serde::{Deserialize, Serialize};

use crate::config::{Channels, MpegVersion};
use crate::types::FrameContext;

/// Reservoir state for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Frame number (1-based)
    pub frame_number: u64,
    pub version: MpegVersion,
    pub channels: Channels,
    pub frame_length_bits: u32,
    pub mean_bits: u32,
    /// Capacity computed at frame start
    pub capacity: i64,
    /// Occupancy at frame start
    pub occupancy_begin: i64,
    /// Coded length of each granule, in the order they were committed
    pub coded_lengths: Vec<u32>,
    pub stuffing_bits: u64,
    pub drain_bits: u64,
    /// Occupancy after the frame was closed
    pub occupancy_end: i64,
}

/// Trace of a whole session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservoirTrace {
    /// Creation timestamp
    pub created_at: String,
    /// Stop recording after this many frames
    pub frame_limit: Option<usize>,
    pub frames: Vec<FrameRecord>,
}

impl Default for ReservoirTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservoirTrace {
    pub fn new() -> Self {
        Self {
            created_at: chrono::Local::now().to_rfc3339(),
            frame_limit: None,
            frames: Vec::new(),
        }
    }

    /// Only keep the first `limit` frames
    pub fn with_frame_limit(limit: usize) -> Self {
        Self {
            frame_limit: Some(limit),
            ..Self::new()
        }
    }

    fn is_full(&self) -> bool {
        self.frame_limit.map_or(false, |limit| self.frames.len() >= limit)
    }

    pub(crate) fn start_frame(
        &mut self,
        frame_number: u64,
        frame: &FrameContext,
        capacity: i64,
        occupancy: i64,
    ) {
        if self.is_full() {
            return;
        }
        self.frames.push(FrameRecord {
            frame_number,
            version: frame.version,
            channels: frame.channels,
            frame_length_bits: frame.frame_length_bits,
            mean_bits: frame.mean_bits,
            capacity,
            occupancy_begin: occupancy,
            coded_lengths: Vec::new(),
            stuffing_bits: 0,
            drain_bits: 0,
            occupancy_end: occupancy,
        });
    }

    fn current(&mut self, frame_number: u64) -> Option<&mut FrameRecord> {
        self.frames
            .last_mut()
            .filter(|record| record.frame_number == frame_number)
    }

    pub(crate) fn record_granule(&mut self, frame_number: u64, coded_length_bits: u32) {
        if let Some(record) = self.current(frame_number) {
            record.coded_lengths.push(coded_length_bits);
        }
    }

    pub(crate) fn finish_frame(
        &mut self,
        frame_number: u64,
        stuffing_bits: u64,
        drain_bits: u64,
        occupancy: i64,
    ) {
        if let Some(record) = self.current(frame_number) {
            record.stuffing_bits = stuffing_bits;
            record.drain_bits = drain_bits;
            record.occupancy_end = occupancy;
        }
    }

    /// Recorded frames
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// Total bits spilled into ancillary data
    pub fn total_drain_bits(&self) -> u64 {
        self.frames.iter().map(|f| f.drain_bits).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
