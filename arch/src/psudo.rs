use strum::Display;

use crate::op::{Opcode, IMM};

/// Pseudo instructions whose expansion is picked from the argument values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Psudo {
    /// `SUB rd, rs1, rs2`
    Sub,
    /// `LSH rd, n`: n doublings of rd
    Lsh,
}

/// Number of words an expansion takes, in terms of the argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Words(usize),
    /// As many words as the value of the argument.
    Arg(usize),
    /// `equal` words when the two arguments hold the same value.
    IfEqual {
        lhs: usize,
        rhs: usize,
        equal: usize,
        otherwise: usize,
    },
}

impl Psudo {
    pub fn length(self) -> Length {
        match self {
            Psudo::Sub => Length::IfEqual {
                lhs: 1,
                rhs: 2,
                equal: 1,
                otherwise: 3,
            },
            Psudo::Lsh => Length::Arg(1),
        }
    }

    /// Values are already range checked against the record's slots.
    pub fn expand(self, args: &[u16]) -> Vec<u16> {
        match (self, args) {
            (Psudo::Sub, &[rd, rs1, rs2]) => {
                if rs1 == rs2 {
                    vec![and_imm(rd, rd, 0)]
                } else if rd == rs2 {
                    vec![not(rd, rd), add(rd, rd, rs1), add_imm(rd, rd, 1)]
                } else {
                    vec![not(rd, rs1), add(rd, rd, rs2), not(rd, rd)]
                }
            }
            (Psudo::Lsh, &[rd, n]) => vec![add(rd, rd, rd); n as usize],
            _ => vec![],
        }
    }
}

fn add(rd: u16, rs1: u16, rs2: u16) -> u16 {
    Opcode::ADD.bits() | rd << 9 | rs1 << 6 | rs2
}

fn add_imm(rd: u16, rs: u16, imm: u16) -> u16 {
    Opcode::ADD.bits() | IMM | rd << 9 | rs << 6 | (imm & 0x1F)
}

fn and_imm(rd: u16, rs: u16, imm: u16) -> u16 {
    Opcode::AND.bits() | IMM | rd << 9 | rs << 6 | (imm & 0x1F)
}

fn not(rd: u16, rs: u16) -> u16 {
    Opcode::NOT.bits() | rd << 9 | rs << 6 | 0x3F
}
