//! Hazard and pipeline timing analysis.
//!
//! - **Hazards**: pairwise RAW/WAW/memory classification ([`depanalyze`])
//! - **Latency**: the fixed pipeline model ([`PipelineModel`])
//! - **Window**: instruction traces with stall and forwarding analysis and
//!   hazard-safe reordering ([`InstructionWindow`])
//!
//! # Usage
//!
//! ```
//! use mips_emu::interpreter::timing::InstructionWindow;
//!
//! let mut window = InstructionWindow::new();
//! window.push_text("lw  t2,0(t0)").unwrap();
//! window.push_text("add t3,t2,t4").unwrap();
//! assert_eq!(window.analyze(), 8);
//! assert_eq!(window.timing(1).unwrap().stalls, 2);
//! ```

pub mod hazards;
pub mod latency;
pub mod window;

pub use hazards::{depanalyze, HazardSet, HazardType};
pub use latency::{PipelineModel, LOAD_USE_GAP, PIPELINE_FILL_CYCLES, RESULT_LATENCY};
pub use window::{ForwardingPair, InstructionWindow, SlotTiming};
