//! General-purpose register naming.

/// Number of general-purpose registers.
pub const NUM_GPRS: usize = 32;

/// Link register written by `jal`, `bal` and friends.
pub const LINK_REGISTER: u8 = 31;

/// Conventional software names, indexed by register number.
pub const REGISTER_NAMES: [&str; NUM_GPRS] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3",
    "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7",
    "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7",
    "t8", "t9", "k0", "k1", "gp", "sp", "s8", "ra",
];

/// Look up a register by its software name (without sigil).
pub fn register_number(name: &str) -> Option<u8> {
    REGISTER_NAMES
        .iter()
        .position(|&n| n == name)
        .map(|n| n as u8)
}

/// Name of register `reg`, e.g. `t0`.
pub fn register_name(reg: u8) -> &'static str {
    REGISTER_NAMES.get(reg as usize).copied().unwrap_or("?")
}

/// Parse register operand text.
///
/// Accepts `t0`, `$t0` and `$8`. A bare number without the `$` sigil is
/// not a register, so `sll t0,t1,4` can fall through to the shift-amount
/// form of `sll`.
pub fn parse_register(text: &str) -> Option<u8> {
    let text = text.trim();
    if let Some(n) = register_number(text) {
        return Some(n);
    }
    let body = text.strip_prefix('$')?;
    if let Some(n) = register_number(body) {
        return Some(n);
    }
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match body.parse::<u32>() {
        Ok(n) if (n as usize) < NUM_GPRS => Some(n as u8),
        _ => None,
    }
}
