//! Pipeline timing parameters.
//!
//! The analyzer models a classic five-stage in-order pipeline:
//!
//! | Parameter | Default | Meaning |
//! |-----------|---------|---------|
//! | `latency` | 3 cycles | issue distance before a result can be read from the register file |
//! | `fill_cycles` | 4 cycles | pipeline fill charged once per window |
//! | `load_use_gap` | 2 cycles | minimum distance between a load and its first consumer when forwarding |
//!
//! The gap exists because a loaded value is only available after the
//! memory stage, so it cannot be forwarded to the very next instruction.

use serde::{Deserialize, Serialize};

/// Cycles before a written register can be read without forwarding.
pub const RESULT_LATENCY: u32 = 3;

/// Fixed pipeline fill cost added to every analysis.
pub const PIPELINE_FILL_CYCLES: u64 = 4;

/// Minimum issue distance between a load and a consumer of its result.
pub const LOAD_USE_GAP: u32 = 2;

/// Timing parameters used by [`InstructionWindow`](super::InstructionWindow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineModel {
    pub latency: u32,
    pub fill_cycles: u64,
    pub load_use_gap: u32,
}

impl Default for PipelineModel {
    fn default() -> Self {
        Self::classic()
    }
}

impl PipelineModel {
    /// The five-stage pipeline.
    pub const fn classic() -> Self {
        Self {
            latency: RESULT_LATENCY,
            fill_cycles: PIPELINE_FILL_CYCLES,
            load_use_gap: LOAD_USE_GAP,
        }
    }

    /// Load-use gap clamped below the latency so forwarding always
    /// leaves a positive distance.
    pub fn effective_load_use_gap(&self) -> u32 {
        self.load_use_gap.min(self.latency.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_defaults() {
        let model = PipelineModel::default();
        assert_eq!(model.latency, 3);
        assert_eq!(model.fill_cycles, 4);
        assert_eq!(model.load_use_gap, 2);
        assert_eq!(model.effective_load_use_gap(), 2);
    }

    #[test]
    fn test_gap_clamped() {
        let model = PipelineModel { latency: 2, fill_cycles: 4, load_use_gap: 5 };
        assert_eq!(model.effective_load_use_gap(), 1);
    }

    #[test]
    fn test_partial_toml() {
        let model: PipelineModel = toml::from_str("latency = 5").unwrap();
        assert_eq!(model.latency, 5);
        assert_eq!(model.fill_cycles, PIPELINE_FILL_CYCLES);
    }
}
