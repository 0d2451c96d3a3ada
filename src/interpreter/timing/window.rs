//! Instruction windows and pipeline stall analysis.
//!
//! An [`InstructionWindow`] is an ordered trace of assembled instructions
//! plus a side table of per-slot analysis results. Instructions stay
//! immutable; [`analyze`](InstructionWindow::analyze) and
//! [`analyze_with_forwarding`](InstructionWindow::analyze_with_forwarding)
//! only write the side table, and both clear it before running so a
//! repeated call yields the same result.
//!
//! # Cycle model
//!
//! One instruction issues per cycle. A register written at slot `i` can
//! be read without a stall once the issue distance (slots in between,
//! plus their stalls) reaches the result latency. A closer reader is
//! stalled by the shortfall, and that stall pushes every later slot back
//! too, so the running distance grows by the same amount.
//!
//! ```text
//! lw   t2,0(t0)      distance 0
//! add  t3,t2,t4      distance 1  -> 2 stalls (latency 3)
//! ```
//!
//! With forwarding the reader takes the value from a bypass instead. Only
//! a load consumed before the load-use gap still stalls; everyone else
//! records the forwarding distance `latency - distance` for the source
//! field (rs or rt) it reads through.

use std::fmt;

use crate::interpreter::assemble::parse_line;
use crate::interpreter::instruction::Instruction;
use crate::interpreter::traits::MatchError;
use crate::isa::Location;

use super::hazards::depanalyze;
use super::latency::PipelineModel;

/// Forwarding distances per source field. `None` when nothing forwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardingPair {
    pub rs: Option<u32>,
    pub rt: Option<u32>,
}

impl ForwardingPair {
    fn record(&mut self, location: Location, distance: u32) {
        let slot = match location {
            Location::Rs => &mut self.rs,
            Location::Rt => &mut self.rt,
            _ => return,
        };
        *slot = Some(slot.map_or(distance, |d| d.min(distance)));
    }
}

/// Analysis results for one window slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotTiming {
    pub stalls: u32,
    pub forwarding: ForwardingPair,
}

/// Ordered instruction trace with its timing side table.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct InstructionWindow {
    instructions: Vec<Instruction>,
    timing: Vec<SlotTiming>,
    model: PipelineModel,
}

impl InstructionWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: PipelineModel) -> Self {
        Self { model, ..Self::default() }
    }

    pub fn model(&self) -> PipelineModel {
        self.model
    }

    pub fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
        self.timing.push(SlotTiming::default());
    }

    /// Assemble `line` and append it. Returns `false` for lines with no
    /// instruction (blank, comment-only or label-only).
    pub fn push_text(&mut self, line: &str) -> Result<bool, MatchError> {
        match parse_line(line)?.instruction {
            Some(inst) => {
                self.push(inst);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Timing of slot `index` from the last analysis.
    pub fn timing(&self, index: usize) -> Option<&SlotTiming> {
        self.timing.get(index)
    }

    pub fn reset_timing(&mut self) {
        self.timing.iter_mut().for_each(|t| *t = SlotTiming::default());
    }

    /// Apply hazard-free adjacent swaps driven by `bits`.
    ///
    /// Scans adjacent pairs from the top. Each pair with no bidirectional
    /// hazard consumes one bit and is swapped when the bit is set. Passes
    /// repeat until the bits run out or a pass finds nothing swappable.
    /// Returns the index of the first slot of each swap performed.
    ///
    /// Clears the timing table, since results no longer match the order.
    pub fn reorder(&mut self, bits: &[bool]) -> Vec<usize> {
        self.reset_timing();
        let mut swaps = Vec::new();
        let mut next = 0;

        while next < bits.len() {
            let mut swappable = false;
            for i in 0..self.instructions.len().saturating_sub(1) {
                let hazards = depanalyze(&self.instructions[i], &self.instructions[i + 1], true);
                if !hazards.is_empty() {
                    continue;
                }
                swappable = true;
                if bits[next] {
                    self.instructions.swap(i, i + 1);
                    swaps.push(i);
                }
                next += 1;
                if next >= bits.len() {
                    break;
                }
            }
            if !swappable {
                break;
            }
        }

        log::debug!("reorder: {} of {} bits used, {} swaps", next, bits.len(), swaps.len());
        swaps
    }

    /// Stall analysis without forwarding. Returns total cycles including
    /// pipeline fill.
    pub fn analyze(&mut self) -> u64 {
        self.reset_timing();
        let latency = self.model.latency;
        let mut cycles = self.model.fill_cycles;

        for i in 0..self.instructions.len() {
            cycles += 1 + u64::from(self.timing[i].stalls);
            for reg in self.instructions[i].args().iter().filter_map(|a| a.written_register()) {
                let mut distance = 0;
                for j in i + 1..self.instructions.len() {
                    distance += 1 + self.timing[j].stalls;
                    if distance >= latency {
                        break;
                    }
                    for arg in self.instructions[j].args() {
                        if arg.read_register() == Some(reg) {
                            let stall = latency - distance;
                            log::trace!("slot {} waits {} on r{} from slot {}", j, stall, reg, i);
                            self.timing[j].stalls += stall;
                            distance += stall;
                        }
                    }
                }
            }
        }

        log::debug!("analyze: {} instructions, {} cycles", self.len(), cycles);
        cycles
    }

    /// Stall analysis with full bypassing. Only load-use pairs closer than
    /// the load-use gap stall; other readers record a forwarding distance.
    pub fn analyze_with_forwarding(&mut self) -> u64 {
        self.reset_timing();
        let latency = self.model.latency;
        let gap = self.model.effective_load_use_gap();
        let mut cycles = self.model.fill_cycles;

        for i in 0..self.instructions.len() {
            cycles += 1 + u64::from(self.timing[i].stalls);
            let is_load = self.instructions[i].is_load();
            for reg in self.instructions[i].args().iter().filter_map(|a| a.written_register()) {
                let mut distance = 0;
                for j in i + 1..self.instructions.len() {
                    distance += 1 + self.timing[j].stalls;
                    if distance >= latency {
                        break;
                    }
                    let consumer = &self.instructions[j];
                    for arg in consumer.args() {
                        if arg.read_register() != Some(reg) {
                            continue;
                        }
                        if is_load && distance < gap {
                            let stall = gap - distance;
                            log::trace!("slot {} load-use stall {} on r{}", j, stall, reg);
                            self.timing[j].stalls += stall;
                            distance += stall;
                        }
                        if let Some(location) = arg.location {
                            self.timing[j].forwarding.record(location, latency - distance);
                        }
                    }
                    // A later write hides this producer from the slots after it.
                    if consumer.writes_register(reg) {
                        break;
                    }
                }
            }
        }

        log::debug!("analyze_with_forwarding: {} instructions, {} cycles", self.len(), cycles);
        cycles
    }

    /// One line per slot: the instruction, its stalls and forwarding.
    pub fn listing(&self) -> Vec<String> {
        self.instructions
            .iter()
            .zip(&self.timing)
            .map(|(inst, t)| {
                format!(
                    "{:<24} stalls {}  fwd rs {} rt {}",
                    inst.to_string(),
                    t.stalls,
                    distance_text(t.forwarding.rs),
                    distance_text(t.forwarding.rt),
                )
            })
            .collect()
    }
}

fn distance_text(distance: Option<u32>) -> String {
    distance.map_or_else(|| "-".to_string(), |d| d.to_string())
}

impl fmt::Debug for InstructionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstructionWindow")
            .field("len", &self.instructions.len())
            .field("model", &self.model)
            .field("listing", &self.listing())
            .finish()
    }
}

impl FromIterator<Instruction> for InstructionWindow {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        let mut window = InstructionWindow::new();
        iter.into_iter().for_each(|inst| window.push(inst));
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(lines: &[&str]) -> InstructionWindow {
        let mut w = InstructionWindow::new();
        for line in lines {
            assert!(w.push_text(line).unwrap(), "no instruction in {line}");
        }
        w
    }

    #[test]
    fn test_load_use_stalls() {
        let mut w = window(&["lw t2,0(t0)", "add t3,t2,t4"]);
        assert_eq!(w.analyze(), 8);
        assert_eq!(w.timing(0).unwrap().stalls, 0);
        assert_eq!(w.timing(1).unwrap().stalls, 2);
    }

    #[test]
    fn test_load_use_forwarding() {
        let mut w = window(&["lw t2,0(t0)", "add t3,t2,t4"]);
        assert_eq!(w.analyze_with_forwarding(), 7);
        let t = w.timing(1).unwrap();
        assert_eq!(t.stalls, 1);
        assert_eq!(t.forwarding, ForwardingPair { rs: Some(1), rt: None });
    }

    #[test]
    fn test_forwarding_on_rt() {
        let mut w = window(&["add t0,t1,t2", "sub t3,t4,t0"]);
        assert_eq!(w.analyze_with_forwarding(), 6);
        let t = w.timing(1).unwrap();
        assert_eq!(t.stalls, 0);
        assert_eq!(t.forwarding, ForwardingPair { rs: None, rt: Some(2) });
    }

    #[test]
    fn test_independent_no_stalls() {
        let mut w = window(&["add t0,t1,t2", "or s0,s1,s2", "and s3,s4,s5"]);
        assert_eq!(w.analyze(), 7);
        assert!((0..3).all(|i| w.timing(i).unwrap().stalls == 0));
    }

    #[test]
    fn test_distance_two_stalls_once() {
        let mut w = window(&["add t0,t1,t2", "or s0,s1,s2", "sub t3,t0,t4"]);
        assert_eq!(w.analyze(), 8);
        assert_eq!(w.timing(2).unwrap().stalls, 1);
    }

    #[test]
    fn test_stalls_compound() {
        // The first reader's stall covers the second reader too.
        let mut w = window(&["add t0,t1,t2", "sub t3,t0,t4", "or t5,t0,t6"]);
        w.analyze();
        assert_eq!(w.timing(1).unwrap().stalls, 2);
        assert_eq!(w.timing(2).unwrap().stalls, 0);
    }

    #[test]
    fn test_zero_register_never_stalls() {
        let mut w = window(&["add zero,t1,t2", "add t3,zero,zero"]);
        assert_eq!(w.analyze(), 6);
    }

    #[test]
    fn test_reanalysis_is_stable() {
        let mut w = window(&["lw t2,0(t0)", "add t3,t2,t4", "sw t3,4(t0)"]);
        let first = w.analyze();
        assert_eq!(w.analyze(), first);
        let fwd = w.analyze_with_forwarding();
        assert_eq!(w.analyze_with_forwarding(), fwd);
        assert_eq!(w.analyze(), first);
    }

    #[test]
    fn test_forwarding_stops_at_rewrite() {
        let mut w = window(&["add t0,t1,t2", "addi t0,t0,1", "sub t3,t0,t4"]);
        w.analyze_with_forwarding();
        assert_eq!(w.timing(1).unwrap().forwarding.rs, Some(2));
        // Slot 2 forwards from slot 1 only.
        assert_eq!(w.timing(2).unwrap().forwarding.rs, Some(2));
    }

    #[test]
    fn test_reorder_swaps_independent_pair() {
        let mut w = window(&["add t0,t1,t2", "or s0,s1,s2"]);
        let swaps = w.reorder(&[true]);
        assert_eq!(swaps, vec![0]);
        assert_eq!(w.instructions()[0].mnemonic(), "or");
        assert_eq!(w.instructions()[1].mnemonic(), "add");
    }

    #[test]
    fn test_reorder_respects_hazards() {
        let mut w = window(&["add t0,t1,t2", "sub t3,t0,t4"]);
        let before = w.instructions().to_vec();
        assert!(w.reorder(&[true, true, true]).is_empty());
        assert_eq!(w.instructions(), &before[..]);
    }

    #[test]
    fn test_reorder_memory_pairs_stay() {
        let mut w = window(&["sw t0,0(sp)", "lw t1,8(gp)"]);
        assert!(w.reorder(&[true]).is_empty());
    }

    #[test]
    fn test_reorder_consumes_bits_per_pair() {
        let mut w = window(&["add t0,t1,t2", "or s0,s1,s2", "and s3,s4,s5"]);
        // Pass 1: pair 0 skipped (bit false), pair 1 swapped.
        let swaps = w.reorder(&[false, true]);
        assert_eq!(swaps, vec![1]);
        let names: Vec<_> = w.instructions().iter().map(|i| i.mnemonic()).collect();
        assert_eq!(names, vec!["add", "and", "or"]);
    }

    #[test]
    fn test_reorder_empty_inputs() {
        let mut w = window(&["add t0,t1,t2"]);
        assert!(w.reorder(&[true, true]).is_empty());
        let mut w = window(&["add t0,t1,t2", "or s0,s1,s2"]);
        assert!(w.reorder(&[]).is_empty());
    }

    #[test]
    fn test_push_text_skips_blank() {
        let mut w = InstructionWindow::new();
        assert!(!w.push_text("# comment").unwrap());
        assert!(!w.push_text("top:").unwrap());
        assert!(w.push_text("top: nop").unwrap());
        assert_eq!(w.len(), 1);
        assert!(w.push_text("bogus t0").is_err());
    }

    #[test]
    fn test_listing() {
        let mut w = window(&["lw t2,0(t0)", "add t3,t2,t4"]);
        w.analyze_with_forwarding();
        let listing = w.listing();
        assert_eq!(listing.len(), 2);
        assert!(listing[0].starts_with("lw    t2,0(t0)"));
        assert!(listing[0].ends_with("stalls 0  fwd rs - rt -"));
        assert!(listing[1].ends_with("stalls 1  fwd rs 1 rt -"));
    }

    #[test]
    fn test_custom_model() {
        let model = PipelineModel { latency: 5, fill_cycles: 0, load_use_gap: 2 };
        let mut w = InstructionWindow::with_model(model);
        w.push_text("add t0,t1,t2").unwrap();
        w.push_text("sub t3,t0,t4").unwrap();
        assert_eq!(w.analyze(), 6);
        assert_eq!(w.timing(1).unwrap().stalls, 4);
    }
}
