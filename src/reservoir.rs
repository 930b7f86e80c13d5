//! Bit reservoir implementation for Layer III encoding
//!
//! This module implements the bit reservoir mechanism described in C.1.5.4.2.2 of the IS.
//! Granules may borrow bits banked by earlier frames, as long as the reservoir never
//! grows past what main_data_begin can address or what the decoder buffer can hold.
//!
//! Call order per frame:
//! `begin_frame` → (`max_bits_for_granule` → coding → `adjust_after_granule`) per granule
//! → `end_frame`.
//!
//! Occupancy is kept in `i64` and stuffing in `u64` so that any `u32` mean or
//! coded length is accounted for exactly.

use log::{debug, error, trace, warn};

use crate::config::{Channels, ReservoirPolicy};
use crate::error::{ConfigResult, ReservoirError, ReservoirResult};
use crate::types::{FrameContext, SideInfo, MAX_FRAME_PLUS_RESERVOIR_BITS, MAX_GRANULE_BITS};

#[cfg(feature = "diagnostics")]
use crate::diagnostics::ReservoirTrace;

/// Bit reservoir for managing bit allocation across frames
///
/// One instance lives for the whole encoding session. Every frame depends on
/// the exact state left by the previous one, so calls must be serialized.
#[derive(Debug, Clone)]
pub struct BitReservoir {
    /// Bits currently banked (ResvSize)
    resv_size: i64,
    /// Capacity for the current frame (ResvMax)
    resv_max: i64,
    policy: ReservoirPolicy,
    frames: u64,
    #[cfg(feature = "diagnostics")]
    trace: Option<ReservoirTrace>,
}

/// Outcome of closing a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameEndReport {
    /// Bits removed from the reservoir to respect capacity and byte alignment
    pub stuffing_bits: u64,
    /// Part of `stuffing_bits` that had to go to ancillary data
    pub drain_bits: u64,
}

/// Coded lengths after stuffing, in slot order, and the bits left over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StuffingPlan {
    pub lengths: Vec<u32>,
    pub drain_bits: u64,
}

impl Default for BitReservoir {
    fn default() -> Self {
        Self::new()
    }
}

impl BitReservoir {
    /// Create an empty reservoir with the reference tuning
    pub fn new() -> Self {
        Self {
            resv_size: 0,
            resv_max: 0,
            policy: ReservoirPolicy::default(),
            frames: 0,
            #[cfg(feature = "diagnostics")]
            trace: None,
        }
    }

    /// Create an empty reservoir with a custom tuning policy
    pub fn with_policy(policy: ReservoirPolicy) -> ConfigResult<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            ..Self::new()
        })
    }

    /// Called at the beginning of a frame. Updates the capacity and checks
    /// that main_data_begin was set by the formatter to our reservoir size.
    pub fn begin_frame(&mut self, frame: &FrameContext) -> ReservoirResult<()> {
        if i64::from(frame.reservoir_offset_bits) != self.resv_size {
            error!(
                "frame {}: main_data_begin declares {} bits, reservoir holds {}",
                self.frames, frame.reservoir_offset_bits, self.resv_size
            );
            return Err(ReservoirError::ProtocolDesync {
                expected: self.resv_size,
                actual: frame.reservoir_offset_bits,
            });
        }

        // capacity + frame length <= 7680
        let frame_length = i64::from(frame.frame_length_bits);
        let resv_max = (i64::from(MAX_FRAME_PLUS_RESERVOIR_BITS) - frame_length).max(0);

        // main_data_begin cannot point further back than this
        self.resv_max = resv_max.min(i64::from(frame.version.reservoir_limit()));
        self.frames += 1;

        debug!(
            "frame {}: reservoir {} / {} bits ({} bit frame)",
            self.frames, self.resv_size, self.resv_max, frame.frame_length_bits
        );

        #[cfg(feature = "diagnostics")]
        if let Some(trace) = self.trace.as_mut() {
            trace.start_frame(self.frames, frame, self.resv_max, self.resv_size);
        }

        Ok(())
    }

    /// Called at the beginning of each granule to get the max bit
    /// allowance for the current granule based on reservoir size
    /// and perceptual entropy.
    pub fn max_bits_for_granule(&self, frame: &FrameContext, perceptual_entropy: f64) -> u32 {
        let ceiling = i64::from(MAX_GRANULE_BITS);
        let mean_bits = frame.mean_bits_per_channel();
        let max_bits = mean_bits.min(ceiling);

        if self.resv_max == 0 {
            return max_bits as u32;
        }

        let demand = perceptual_entropy * self.policy.entropy_to_bits - mean_bits as f64;
        let more_bits = demand as i64;
        let mut add_bits = 0;
        if more_bits > i64::from(self.policy.min_extra_demand) {
            let frac = self.resv_size.max(0) * i64::from(self.policy.draw_limit_percent) / 100;
            add_bits = more_bits.min(frac);
        }

        // drain faster once the reservoir is nearly full
        let threshold = self.resv_max * i64::from(self.policy.drawdown_threshold_percent) / 100;
        let over_bits = self.resv_size - threshold - add_bits;
        if over_bits > 0 {
            add_bits += over_bits;
        }

        let allowed = (max_bits + add_bits).clamp(0, ceiling);
        trace!(
            "pe {:.1}: demand {} extra {} -> {} bits",
            perceptual_entropy,
            more_bits,
            add_bits,
            allowed
        );
        allowed as u32
    }

    /// Called after a granule's bit allocation. Readjusts the size of
    /// the reservoir to reflect the granule's usage.
    pub fn adjust_after_granule(&mut self, frame: &FrameContext, coded_length_bits: u32) {
        let delta = frame.mean_bits_per_channel() - i64::from(coded_length_bits);
        self.resv_size = self.resv_size.saturating_add(delta);
        trace!(
            "granule used {} bits, reservoir now {}",
            coded_length_bits,
            self.resv_size
        );

        #[cfg(feature = "diagnostics")]
        if let Some(trace) = self.trace.as_mut() {
            trace.record_granule(self.frames, coded_length_bits);
        }
    }

    /// Called after all granules in a frame have been allocated. Makes sure
    /// that the reservoir size is within limits, possibly by adding stuffing
    /// bits. Stuffing bits are added by increasing a granule's coded length;
    /// the bitstream formatter writes them out. Bits that fit nowhere are
    /// reported in `side_info.drain_bits` for the ancillary data.
    ///
    /// `side_info` must have the granule and channel layout of `frame`.
    pub fn end_frame(&mut self, frame: &FrameContext, side_info: &mut SideInfo) -> FrameEndReport {
        debug_assert_eq!(
            side_info.granules(),
            frame.granules_per_frame(),
            "side info granules do not match the frame"
        );
        debug_assert_eq!(
            side_info.channels(),
            frame.channels.count(),
            "side info channels do not match the frame"
        );
        side_info.drain_bits = 0;

        // just in case mean_bits is odd
        if frame.channels == Channels::Stereo && frame.mean_bits & 1 != 0 {
            self.resv_size = self.resv_size.saturating_add(1);
        }

        let over_bits = self.resv_size.saturating_sub(self.resv_max).max(0);
        self.resv_size -= over_bits;
        let mut stuffing_bits = over_bits.unsigned_abs();

        // we must be byte aligned
        if self.resv_size > 0 {
            let align_bits = self.resv_size % 8;
            stuffing_bits += align_bits.unsigned_abs();
            self.resv_size -= align_bits;
        } else if self.resv_size < 0 {
            warn!(
                "frame {}: granules overspent the reservoir by {} bits",
                self.frames,
                self.resv_size.unsigned_abs()
            );
        }

        let mut report = FrameEndReport {
            stuffing_bits,
            drain_bits: 0,
        };

        if stuffing_bits > 0 {
            let plan = distribute_stuffing(&side_info.coded_lengths(), stuffing_bits);
            side_info.set_coded_lengths(&plan.lengths);
            side_info.drain_bits = plan.drain_bits;
            report.drain_bits = plan.drain_bits;

            if plan.drain_bits > 0 {
                warn!(
                    "frame {}: spilling {} stuffing bits into ancillary data",
                    self.frames, plan.drain_bits
                );
            }
        }

        debug!(
            "frame {}: reservoir {} bits after {} stuffing bits",
            self.frames, self.resv_size, stuffing_bits
        );

        #[cfg(feature = "diagnostics")]
        if let Some(trace) = self.trace.as_mut() {
            trace.finish_frame(
                self.frames,
                report.stuffing_bits,
                report.drain_bits,
                self.resv_size,
            );
        }

        report
    }

    /// Bits currently banked
    pub fn occupancy(&self) -> i64 {
        self.resv_size
    }

    /// Capacity computed by the last `begin_frame`
    pub fn capacity(&self) -> i64 {
        self.resv_max
    }

    /// main_data_begin for the next frame, in bytes
    pub fn main_data_begin(&self) -> u32 {
        u32::try_from(self.resv_size.max(0) / 8).unwrap_or(u32::MAX)
    }

    /// Frames started so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn policy(&self) -> &ReservoirPolicy {
        &self.policy
    }

    /// Empty the reservoir for a new session, keeping the policy
    pub fn reset(&mut self) {
        self.resv_size = 0;
        self.resv_max = 0;
        self.frames = 0;
    }

    /// Start recording a per-frame trace
    #[cfg(feature = "diagnostics")]
    pub fn enable_trace(&mut self, trace: ReservoirTrace) {
        self.trace = Some(trace);
    }

    #[cfg(feature = "diagnostics")]
    pub fn trace(&self) -> Option<&ReservoirTrace> {
        self.trace.as_ref()
    }

    #[cfg(feature = "diagnostics")]
    pub fn take_trace(&mut self) -> Option<ReservoirTrace> {
        self.trace.take()
    }
}

/// Spread `stuffing_bits` over the coded lengths of a frame, given in
/// granule-major order.
///
/// Plan A puts everything into the first slot, which was preferred by
/// someone designing a real-time decoder. If that would reach the 12-bit
/// ceiling, plan B fills the slots in order up to the ceiling. Whatever is
/// left becomes `drain_bits`.
pub fn distribute_stuffing(lengths: &[u32], stuffing_bits: u64) -> StuffingPlan {
    let mut lengths = lengths.to_vec();
    if stuffing_bits == 0 {
        return StuffingPlan {
            lengths,
            drain_bits: 0,
        };
    }

    if let Some(first) = lengths.first_mut() {
        let total = u64::from(*first).saturating_add(stuffing_bits);
        if total < u64::from(MAX_GRANULE_BITS) {
            // below 4095, fits the field
            *first = total as u32;
            return StuffingPlan {
                lengths,
                drain_bits: 0,
            };
        }
    }

    let mut remaining = stuffing_bits;
    for length in lengths.iter_mut() {
        if remaining == 0 {
            break;
        }
        let room = MAX_GRANULE_BITS.saturating_sub(*length);
        let bits_this_gr = u64::from(room).min(remaining) as u32;
        *length += bits_this_gr;
        remaining -= u64::from(bits_this_gr);
    }

    StuffingPlan {
        lengths,
        drain_bits: remaining,
    }
}
