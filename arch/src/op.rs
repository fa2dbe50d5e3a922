use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The sixteen machine opcodes, numbered by their top nibble.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    FromPrimitive,
    IntoPrimitive,
    EnumString,
    Display,
)]
#[repr(u8)]
pub enum Opcode {
    #[default]
    BR,
    ADD,
    LD,
    ST,
    JSR,
    AND,
    LDR,
    STR,
    DBUG,
    NOT,
    LDI,
    STI,
    JSRR,
    RET,
    LEA,
    TRAP,
}

impl Opcode {
    /// Opcode placed in bits 15..12.
    pub const fn bits(self) -> u16 {
        (self as u16) << 12
    }

    pub fn of_word(word: u16) -> Opcode {
        Opcode::from((word >> 12) as u8)
    }
}

// Condition flags of BR, already shifted into bits 11..9.
pub const COND_N: u16 = 0b100 << 9;
pub const COND_Z: u16 = 0b010 << 9;
pub const COND_P: u16 = 0b001 << 9;

// Link bit of JSR/JSRR.
pub const LINK: u16 = 1 << 11;

// Immediate-mode flag of ADD/AND.
pub const IMM: u16 = 1 << 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibble() {
        for n in 0..16u16 {
            let op = Opcode::of_word(n << 12 | 0x0ABC);
            assert_eq!(op.bits(), n << 12);
        }
        assert_eq!(Opcode::of_word(0x1042), Opcode::ADD);
        assert_eq!(Opcode::of_word(0xF025), Opcode::TRAP);
        assert_eq!(Opcode::LEA.to_string(), "LEA");
    }
}
