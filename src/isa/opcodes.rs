//! Instruction descriptor table.
//!
//! The table is an ordered list of [`InstructionDescriptor`]s. Several
//! descriptors may share a mnemonic; the matcher tries them in declaration
//! order and keeps the first one whose operand shapes accept the text, so
//! the order below is part of the semantics. Encodings, masks and
//! dependency flags are transcribed from the MIPS I opcode table.
//!
//! Each descriptor carries a [`Semantics`] variant that the execution
//! dispatcher matches on. It is resolved from the mnemonic when the
//! descriptor is built, so an instruction never needs a by-name handler
//! lookup at run time.

use std::collections::HashMap;
use std::sync::OnceLock;

use thiserror::Error;

use super::flags::DepFlags;
use super::operands::{OperandKind, OperandShape, ShapeSpec};

/// Secondary descriptor flag: the entry is an alias of another instruction.
pub const INSN2_ALIAS: u32 = 0x0000_0001;

/// Architecture level: MIPS I.
pub const ISA_MIPS1: u32 = 0x0000_0001;

/// Sign interpretation of ALU inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// ALU function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    /// Quotient to `lo`, remainder to `hi`.
    DivRem,
    And,
    Or,
    Xor,
    Nor,
    Not,
    Neg,
    ShiftLeft,
    /// Logical when unsigned, arithmetic when signed.
    ShiftRight,
    SetLess,
    Copy,
    LoadUpper,
}

impl AluOp {
    /// Number of inputs the function takes.
    pub const fn arity(self) -> usize {
        match self {
            AluOp::Not | AluOp::Neg | AluOp::Copy | AluOp::LoadUpper => 1,
            _ => 2,
        }
    }
}

/// Branch condition over up to two registers (second defaults to zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCond {
    Always,
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl BranchCond {
    pub fn holds(self, a: i32, b: i32) -> bool {
        match self {
            BranchCond::Always => true,
            BranchCond::Eq => a == b,
            BranchCond::Ne => a != b,
            BranchCond::Ge => a >= b,
            BranchCond::Gt => a > b,
            BranchCond::Le => a <= b,
            BranchCond::Lt => a < b,
        }
    }
}

/// Memory access width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemWidth {
    Byte,
    Half,
    Word,
}

impl MemWidth {
    pub const fn bits(self) -> u32 {
        match self {
            MemWidth::Byte => 8,
            MemWidth::Half => 16,
            MemWidth::Word => 32,
        }
    }

    pub const fn bytes(self) -> u32 {
        self.bits() / 8
    }
}

/// One half of the hi/lo accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccHalf {
    Hi,
    Lo,
}

/// Execution behavior of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semantics {
    Nop,
    Alu(AluOp, Signedness),
    Branch(BranchCond),
    Jump,
    Load { width: MemWidth, signed: bool },
    Store(MemWidth),
    FromAccumulator(AccHalf),
    ToAccumulator(AccHalf),
    /// Recognized by the assembler but has no execution handler.
    Unsupported,
}

impl Semantics {
    /// Handler for a mnemonic.
    pub fn for_mnemonic(mnemonic: &str) -> Semantics {
        use AluOp::*;
        use Signedness::*;

        match mnemonic {
            "nop" | "ssnop" | "ehb" => Semantics::Nop,

            "li" | "move" => Semantics::Alu(Copy, Unsigned),
            "add" | "addi" => Semantics::Alu(Add, Signed),
            "addu" | "addiu" => Semantics::Alu(Add, Unsigned),
            "sub" => Semantics::Alu(Sub, Signed),
            "subu" => Semantics::Alu(Sub, Unsigned),
            "mult" => Semantics::Alu(Mul, Signed),
            "multu" => Semantics::Alu(Mul, Unsigned),
            "div" => Semantics::Alu(DivRem, Signed),
            "divu" => Semantics::Alu(DivRem, Unsigned),
            "and" | "andi" => Semantics::Alu(And, Unsigned),
            "or" | "ori" => Semantics::Alu(Or, Unsigned),
            "xor" | "xori" => Semantics::Alu(Xor, Unsigned),
            "nor" => Semantics::Alu(Nor, Unsigned),
            "not" => Semantics::Alu(Not, Unsigned),
            "neg" => Semantics::Alu(Neg, Signed),
            "negu" => Semantics::Alu(Neg, Unsigned),
            "sll" | "sllv" => Semantics::Alu(ShiftLeft, Unsigned),
            "srl" | "srlv" => Semantics::Alu(ShiftRight, Unsigned),
            "sra" | "srav" => Semantics::Alu(ShiftRight, Signed),
            "slt" | "slti" => Semantics::Alu(SetLess, Signed),
            "sltu" | "sltiu" => Semantics::Alu(SetLess, Unsigned),
            "lui" => Semantics::Alu(LoadUpper, Unsigned),

            "b" | "bal" => Semantics::Branch(BranchCond::Always),
            "beq" | "beqz" => Semantics::Branch(BranchCond::Eq),
            "bne" | "bnez" => Semantics::Branch(BranchCond::Ne),
            "bgez" | "bgezal" => Semantics::Branch(BranchCond::Ge),
            "bgtz" => Semantics::Branch(BranchCond::Gt),
            "blez" => Semantics::Branch(BranchCond::Le),
            "bltz" | "bltzal" => Semantics::Branch(BranchCond::Lt),

            "j" | "jal" | "jr" | "jalr" => Semantics::Jump,

            "lb" => Semantics::Load { width: MemWidth::Byte, signed: true },
            "lbu" => Semantics::Load { width: MemWidth::Byte, signed: false },
            "lh" => Semantics::Load { width: MemWidth::Half, signed: true },
            "lhu" => Semantics::Load { width: MemWidth::Half, signed: false },
            "lw" => Semantics::Load { width: MemWidth::Word, signed: true },
            "sb" => Semantics::Store(MemWidth::Byte),
            "sh" => Semantics::Store(MemWidth::Half),
            "sw" => Semantics::Store(MemWidth::Word),

            "mfhi" => Semantics::FromAccumulator(AccHalf::Hi),
            "mflo" => Semantics::FromAccumulator(AccHalf::Lo),
            "mthi" => Semantics::ToAccumulator(AccHalf::Hi),
            "mtlo" => Semantics::ToAccumulator(AccHalf::Lo),

            _ => Semantics::Unsupported,
        }
    }
}

/// Static description of one encoding of a mnemonic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionDescriptor {
    pub mnemonic: &'static str,
    /// Operand shape specs, e.g. `["t", "o(b)"]`.
    pub operands: &'static [&'static str],
    /// Fixed bits of the encoding.
    pub match_bits: u32,
    /// Which bits of a word `match_bits` covers.
    pub mask: u32,
    pub deps: DepFlags,
    pub secondary: u32,
    pub membership: u32,
    pub exclusions: u32,
    pub semantics: Semantics,
}

impl InstructionDescriptor {
    /// Build a MIPS I descriptor; the handler is resolved from the mnemonic.
    pub fn new(
        mnemonic: &'static str,
        operands: &'static [&'static str],
        match_bits: u32,
        mask: u32,
        deps: DepFlags,
    ) -> Self {
        Self {
            mnemonic,
            operands,
            match_bits,
            mask,
            deps,
            secondary: 0,
            membership: ISA_MIPS1,
            exclusions: 0,
            semantics: Semantics::for_mnemonic(mnemonic),
        }
    }

    /// Mark as an alias entry.
    pub fn alias(mut self) -> Self {
        self.secondary |= INSN2_ALIAS;
        self
    }

    /// Override the handler.
    pub fn with_semantics(mut self, semantics: Semantics) -> Self {
        self.semantics = semantics;
        self
    }

    #[inline]
    pub fn is_alias(&self) -> bool {
        self.secondary & INSN2_ALIAS != 0
    }

    /// True if the fixed bits of `word` match this descriptor.
    #[inline]
    pub fn matches_word(&self, word: u32) -> bool {
        word & self.mask == self.match_bits
    }

    /// Operand fields that collide with each other or with the fixed bits.
    ///
    /// Operands OR their bits into `match_bits`, so any shared bit would
    /// corrupt the encoding.
    pub fn field_conflicts(&self) -> Vec<FieldConflict> {
        let spans: Vec<(usize, u32)> = self
            .operands
            .iter()
            .enumerate()
            .flat_map(|(i, spec)| operand_spans(spec).into_iter().map(move |span| (i, span)))
            .filter(|&(_, span)| span != 0)
            .collect();

        let mut conflicts = Vec::new();
        for (n, &(first, a)) in spans.iter().enumerate() {
            if a & self.mask != 0 {
                conflicts.push(FieldConflict::FixedBits { operand: first, bits: a & self.mask });
            }
            for &(second, b) in &spans[n + 1..] {
                if a & b != 0 {
                    conflicts.push(FieldConflict::Overlap { first, second, bits: a & b });
                }
            }
        }
        conflicts
    }
}

/// A collision found by [`InstructionDescriptor::field_conflicts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldConflict {
    #[error("operands {first} and {second} share bits {bits:#010x}")]
    Overlap { first: usize, second: usize, bits: u32 },

    #[error("operand {operand} overlaps fixed bits {bits:#010x}")]
    FixedBits { operand: usize, bits: u32 },
}

/// Encoded bit spans of one operand spec; compound specs have two parts.
fn operand_spans(spec: &str) -> [u32; 2] {
    fn span(shape: &OperandShape) -> u32 {
        match shape.location {
            Some(loc) if shape.kind != OperandKind::Ignored => loc.span(),
            _ => 0,
        }
    }
    match ShapeSpec::parse(spec) {
        Ok(ShapeSpec::Single(shape)) => [span(shape), 0],
        Ok(ShapeSpec::Compound { offset, base }) => [span(offset), span(base)],
        Err(_) => [0, 0],
    }
}

/// Ordered descriptor collection with a per-mnemonic index.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    descriptors: Vec<InstructionDescriptor>,
    by_mnemonic: HashMap<&'static str, Vec<usize>>,
}

static STANDARD: OnceLock<OpcodeTable> = OnceLock::new();

impl OpcodeTable {
    /// Build a table. Declaration order of `descriptors` is preserved as
    /// the overload priority.
    pub fn new(descriptors: Vec<InstructionDescriptor>) -> Self {
        let mut by_mnemonic: HashMap<&'static str, Vec<usize>> = HashMap::new();
        for (idx, desc) in descriptors.iter().enumerate() {
            if let Some(bad) = desc.operands.iter().find(|spec| ShapeSpec::parse(spec).is_err()) {
                log::warn!("descriptor '{}' has unknown operand shape '{}'", desc.mnemonic, bad);
            }
            for conflict in desc.field_conflicts() {
                log::warn!("descriptor '{}' {:?}: {}", desc.mnemonic, desc.operands, conflict);
            }
            by_mnemonic.entry(desc.mnemonic).or_default().push(idx);
        }
        Self { descriptors, by_mnemonic }
    }

    /// The built-in MIPS I table, constructed on first use.
    pub fn standard() -> &'static OpcodeTable {
        STANDARD.get_or_init(|| {
            let table = OpcodeTable::new(standard_descriptors());
            log::debug!("Built opcode table: {} descriptors, {} mnemonics", table.len(), table.by_mnemonic.len());
            table
        })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptors(&self) -> &[InstructionDescriptor] {
        &self.descriptors
    }

    pub fn contains(&self, mnemonic: &str) -> bool {
        self.by_mnemonic.contains_key(mnemonic)
    }

    /// Descriptors for `mnemonic`, in priority order.
    pub fn candidates<'a>(&'a self, mnemonic: &str) -> impl Iterator<Item = &'a InstructionDescriptor> + 'a {
        self.by_mnemonic
            .get(mnemonic)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&i| &self.descriptors[i])
    }

    /// First descriptor whose fixed bits match `word`.
    pub fn identify(&self, word: u32) -> Option<&InstructionDescriptor> {
        self.descriptors.iter().find(|d| d.matches_word(word))
    }

    /// Like [`identify`](Self::identify) but skips alias entries when a
    /// non-alias encoding also matches.
    pub fn identify_canonical(&self, word: u32) -> Option<&InstructionDescriptor> {
        self.descriptors
            .iter()
            .find(|d| !d.is_alias() && d.matches_word(word))
            .or_else(|| self.identify(word))
    }
}

/// The MIPS I integer subset, in priority order.
fn standard_descriptors() -> Vec<InstructionDescriptor> {
    use InstructionDescriptor as D;

    const WR_T: DepFlags = DepFlags::WRITE_RT;
    const WR_D: DepFlags = DepFlags::WRITE_RD;
    const RD_S: DepFlags = DepFlags::READ_RS;
    const RD_T: DepFlags = DepFlags::READ_RT;
    const RD_B: DepFlags = DepFlags::READ_BASE;
    const UBD: DepFlags = DepFlags::UNCOND_BRANCH;
    const CBD: DepFlags = DepFlags::COND_BRANCH;
    const WR_31: DepFlags = DepFlags::WRITE_LINK;
    const LDD: DepFlags = DepFlags::LOAD;
    const SM: DepFlags = DepFlags::STORE;
    const TRAP: DepFlags = DepFlags::TRAP;
    const WR_HILO: DepFlags = DepFlags::WRITE_HILO;
    const IS_M: DepFlags = DepFlags::MULTIPLY;

    vec![
        D::new("nop", &[], 0x0000_0000, 0xffff_ffff, DepFlags::NONE).alias(),
        D::new("ssnop", &[], 0x0000_0040, 0xffff_ffff, DepFlags::NONE).alias(),
        D::new("ehb", &[], 0x0000_00c0, 0xffff_ffff, DepFlags::NONE).alias(),
        D::new("li", &["t", "j"], 0x2400_0000, 0xffe0_0000, WR_T).alias(),
        D::new("li", &["t", "i"], 0x3400_0000, 0xffe0_0000, WR_T).alias(),
        D::new("move", &["d", "s"], 0x0000_0021, 0xfc1f_07ff, WR_D | RD_S).alias(),
        D::new("move", &["d", "s"], 0x0000_0025, 0xfc1f_07ff, WR_D | RD_S).alias(),
        D::new("b", &["p"], 0x1000_0000, 0xffff_0000, UBD).alias(),
        D::new("b", &["p"], 0x0401_0000, 0xffff_0000, UBD).alias(),
        D::new("bal", &["p"], 0x0411_0000, 0xffff_0000, UBD | WR_31).alias(),
        D::new("add", &["d", "v", "t"], 0x0000_0020, 0xfc00_07ff, WR_D | RD_S | RD_T),
        D::new("addi", &["t", "r", "j"], 0x2000_0000, 0xfc00_0000, WR_T | RD_S),
        D::new("addiu", &["t", "r", "j"], 0x2400_0000, 0xfc00_0000, WR_T | RD_S),
        D::new("addu", &["d", "v", "t"], 0x0000_0021, 0xfc00_07ff, WR_D | RD_S | RD_T),
        D::new("and", &["d", "v", "t"], 0x0000_0024, 0xfc00_07ff, WR_D | RD_S | RD_T),
        D::new("andi", &["t", "r", "i"], 0x3000_0000, 0xfc00_0000, WR_T | RD_S),
        D::new("beqz", &["s", "p"], 0x1000_0000, 0xfc1f_0000, CBD | RD_S),
        D::new("beq", &["s", "t", "p"], 0x1000_0000, 0xfc00_0000, CBD | RD_S | RD_T),
        D::new("bgez", &["s", "p"], 0x0401_0000, 0xfc1f_0000, CBD | RD_S),
        D::new("bgezal", &["s", "p"], 0x0411_0000, 0xfc1f_0000, CBD | RD_S | WR_31),
        D::new("bgtz", &["s", "p"], 0x1c00_0000, 0xfc1f_0000, CBD | RD_S),
        D::new("blez", &["s", "p"], 0x1800_0000, 0xfc1f_0000, CBD | RD_S),
        D::new("bltz", &["s", "p"], 0x0400_0000, 0xfc1f_0000, CBD | RD_S),
        D::new("bltzal", &["s", "p"], 0x0410_0000, 0xfc1f_0000, CBD | RD_S | WR_31),
        D::new("bnez", &["s", "p"], 0x1400_0000, 0xfc1f_0000, CBD | RD_S),
        D::new("bne", &["s", "t", "p"], 0x1400_0000, 0xfc00_0000, CBD | RD_S | RD_T),
        D::new("break", &[], 0x0000_000d, 0xffff_ffff, TRAP),
        D::new("break", &["c"], 0x0000_000d, 0xfc00_ffff, TRAP),
        D::new("break", &["c", "q"], 0x0000_000d, 0xfc00_003f, TRAP),
        D::new("div", &["s", "t"], 0x0000_001a, 0xfc00_ffff, RD_S | RD_T | WR_HILO),
        D::new("div", &["z", "s", "t"], 0x0000_001a, 0xfc00_ffff, RD_S | RD_T | WR_HILO),
        D::new("divu", &["s", "t"], 0x0000_001b, 0xfc00_ffff, RD_S | RD_T | WR_HILO),
        D::new("divu", &["z", "s", "t"], 0x0000_001b, 0xfc00_ffff, RD_S | RD_T | WR_HILO),
        D::new("jr", &["s"], 0x0000_0008, 0xfc1f_ffff, UBD | RD_S),
        D::new("j", &["s"], 0x0000_0008, 0xfc1f_ffff, UBD | RD_S),
        D::new("j", &["a"], 0x0800_0000, 0xfc00_0000, UBD),
        D::new("jalr", &["s"], 0x0000_f809, 0xfc1f_ffff, UBD | RD_S | WR_D),
        D::new("jalr", &["d", "s"], 0x0000_0009, 0xfc1f_07ff, UBD | RD_S | WR_D),
        D::new("jal", &["a"], 0x0c00_0000, 0xfc00_0000, UBD | WR_31),
        D::new("lb", &["t", "o(b)"], 0x8000_0000, 0xfc00_0000, LDD | RD_B | WR_T),
        D::new("lbu", &["t", "o(b)"], 0x9000_0000, 0xfc00_0000, LDD | RD_B | WR_T),
        D::new("lh", &["t", "o(b)"], 0x8400_0000, 0xfc00_0000, LDD | RD_B | WR_T),
        D::new("lhu", &["t", "o(b)"], 0x9400_0000, 0xfc00_0000, LDD | RD_B | WR_T),
        D::new("lui", &["t", "u"], 0x3c00_0000, 0xffe0_0000, WR_T),
        D::new("lw", &["t", "o(b)"], 0x8c00_0000, 0xfc00_0000, LDD | RD_B | WR_T),
        D::new("mfhi", &["d"], 0x0000_0010, 0xffff_07ff, WR_D | DepFlags::READ_HI),
        D::new("mflo", &["d"], 0x0000_0012, 0xffff_07ff, WR_D | DepFlags::READ_LO),
        D::new("mthi", &["s"], 0x0000_0011, 0xfc1f_ffff, RD_S | DepFlags::WRITE_HI),
        D::new("mtlo", &["s"], 0x0000_0013, 0xfc1f_ffff, RD_S | DepFlags::WRITE_LO),
        D::new("mult", &["s", "t"], 0x0000_0018, 0xfc00_ffff, RD_S | RD_T | WR_HILO | IS_M),
        D::new("multu", &["s", "t"], 0x0000_0019, 0xfc00_ffff, RD_S | RD_T | WR_HILO | IS_M),
        D::new("neg", &["d", "w"], 0x0000_0022, 0xffe0_07ff, WR_D | RD_T),
        D::new("negu", &["d", "w"], 0x0000_0023, 0xffe0_07ff, WR_D | RD_T),
        D::new("nor", &["d", "v", "t"], 0x0000_0027, 0xfc00_07ff, WR_D | RD_S | RD_T),
        D::new("not", &["d", "v"], 0x0000_0027, 0xfc1f_07ff, WR_D | RD_S | RD_T),
        D::new("or", &["d", "v", "t"], 0x0000_0025, 0xfc00_07ff, WR_D | RD_S | RD_T),
        D::new("ori", &["t", "r", "i"], 0x3400_0000, 0xfc00_0000, WR_T | RD_S),
        D::new("sb", &["t", "o(b)"], 0xa000_0000, 0xfc00_0000, SM | RD_T | RD_B),
        D::new("sh", &["t", "o(b)"], 0xa400_0000, 0xfc00_0000, SM | RD_T | RD_B),
        D::new("sllv", &["d", "t", "s"], 0x0000_0004, 0xfc00_07ff, WR_D | RD_T | RD_S),
        D::new("sll", &["d", "w", "s"], 0x0000_0004, 0xfc00_07ff, WR_D | RD_T | RD_S),
        D::new("sll", &["d", "w", "<"], 0x0000_0000, 0xffe0_003f, WR_D | RD_T),
        D::new("slt", &["d", "v", "t"], 0x0000_002a, 0xfc00_07ff, WR_D | RD_S | RD_T),
        D::new("slti", &["t", "r", "j"], 0x2800_0000, 0xfc00_0000, WR_T | RD_S),
        D::new("sltiu", &["t", "r", "j"], 0x2c00_0000, 0xfc00_0000, WR_T | RD_S),
        D::new("sltu", &["d", "v", "t"], 0x0000_002b, 0xfc00_07ff, WR_D | RD_S | RD_T),
        D::new("srav", &["d", "t", "s"], 0x0000_0007, 0xfc00_07ff, WR_D | RD_T | RD_S),
        D::new("sra", &["d", "w", "s"], 0x0000_0007, 0xfc00_07ff, WR_D | RD_T | RD_S),
        D::new("sra", &["d", "w", "<"], 0x0000_0003, 0xffe0_003f, WR_D | RD_T),
        D::new("srlv", &["d", "t", "s"], 0x0000_0006, 0xfc00_07ff, WR_D | RD_T | RD_S),
        D::new("srl", &["d", "w", "s"], 0x0000_0006, 0xfc00_07ff, WR_D | RD_T | RD_S),
        D::new("srl", &["d", "w", "<"], 0x0000_0002, 0xffe0_003f, WR_D | RD_T),
        D::new("sub", &["d", "v", "t"], 0x0000_0022, 0xfc00_07ff, WR_D | RD_S | RD_T),
        D::new("subu", &["d", "v", "t"], 0x0000_0023, 0xfc00_07ff, WR_D | RD_S | RD_T),
        D::new("sw", &["t", "o(b)"], 0xac00_0000, 0xfc00_0000, SM | RD_T | RD_B),
        D::new("syscall", &[], 0x0000_000c, 0xffff_ffff, TRAP),
        D::new("syscall", &["B"], 0x0000_000c, 0xfc00_003f, TRAP),
        D::new("xor", &["d", "v", "t"], 0x0000_0026, 0xfc00_07ff, WR_D | RD_S | RD_T),
        D::new("xori", &["t", "r", "i"], 0x3800_0000, 0xfc00_0000, WR_T | RD_S),
    ]
}
