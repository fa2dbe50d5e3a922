use std::{collections::HashMap, fmt};

use bimap::BiMap;
use once_cell::sync::Lazy;

use crate::{
    op::{Opcode, COND_N, COND_P, COND_Z, IMM, LINK},
    psudo::Psudo,
};

// ----------------------------------------------------------------------------
// Slot

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    U4,
    S5,
    U6,
    U8,
    /// Page offset. Only the low nine bits are kept, never range checked.
    Page9,
}

impl Width {
    pub fn bits(self) -> u8 {
        match self {
            Width::U4 => 4,
            Width::S5 => 5,
            Width::U6 => 6,
            Width::U8 => 8,
            Width::Page9 => 9,
        }
    }

    pub fn range(self) -> Option<(i32, i32)> {
        match self {
            Width::U4 => Some((0, 15)),
            Width::S5 => Some((-16, 15)),
            Width::U6 => Some((0, 63)),
            Width::U8 => Some((0, 255)),
            Width::Page9 => None,
        }
    }

    pub fn signed(self) -> bool {
        matches!(self, Width::S5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Reg,
    Imm(Width),
}

impl Slot {
    pub fn mask(self) -> u16 {
        match self {
            Slot::Reg => 0x7,
            Slot::Imm(w) => (1 << w.bits()) - 1,
        }
    }

    pub fn range(self) -> Option<(i32, i32)> {
        match self {
            Slot::Reg => Some((0, 7)),
            Slot::Imm(w) => w.range(),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Reg => write!(f, "register"),
            Slot::Imm(Width::S5) => write!(f, "5-bit signed immediate"),
            Slot::Imm(Width::Page9) => write!(f, "page offset"),
            Slot::Imm(w) => write!(f, "{}-bit unsigned immediate", w.bits()),
        }
    }
}

// ----------------------------------------------------------------------------
// Record

/// Argument `arg` is spliced at bit `shift` of the template.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub arg: usize,
    pub shift: u8,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub bits: u16,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone)]
pub struct Format {
    pub mnemonic: &'static str,
    pub slots: Vec<Slot>,
    pub templates: Vec<Template>,
    /// Set for records whose words depend on the argument values.
    pub special: Option<Psudo>,
}

impl Format {
    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_special(&self) -> bool {
        self.special.is_some()
    }

    pub fn has_page_field(&self) -> bool {
        self.slots.contains(&Slot::Imm(Width::Page9))
    }
}

fn f(arg: usize, shift: u8) -> Field {
    Field { arg, shift }
}

fn t(bits: u16, fields: Vec<Field>) -> Template {
    Template { bits, fields }
}

fn rec(mnemonic: &'static str, slots: Vec<Slot>, templates: Vec<Template>) -> Format {
    Format {
        mnemonic,
        slots,
        templates,
        special: None,
    }
}

fn special(mnemonic: &'static str, slots: Vec<Slot>, psudo: Psudo) -> Format {
    Format {
        mnemonic,
        slots,
        templates: vec![],
        special: Some(psudo),
    }
}

/// Branch mnemonics and their condition bits.
pub static BRANCH: Lazy<BiMap<&'static str, u16>> = Lazy::new(|| {
    let mut map = BiMap::new();
    map.insert("BRN", COND_N);
    map.insert("BRZ", COND_Z);
    map.insert("BRP", COND_P);
    map.insert("BRNZ", COND_N | COND_Z);
    map.insert("BRNP", COND_N | COND_P);
    map.insert("BRZP", COND_Z | COND_P);
    map.insert("BRNZP", COND_N | COND_Z | COND_P);
    map
});

/// Trap vectors with a mnemonic of their own.
pub static TRAPS: Lazy<BiMap<&'static str, u16>> = Lazy::new(|| {
    let mut map = BiMap::new();
    map.insert("GETC", 0x20);
    map.insert("OUT", 0x21);
    map.insert("PUTS", 0x22);
    map.insert("IN", 0x23);
    map.insert("HALT", 0x25);
    map
});

pub static FORMATS: Lazy<Vec<Format>> = Lazy::new(|| {
    use Opcode::*;
    let r = Slot::Reg;
    let s5 = Slot::Imm(Width::S5);
    let cnt4 = Slot::Imm(Width::U4);
    let idx6 = Slot::Imm(Width::U6);
    let vec8 = Slot::Imm(Width::U8);
    let pg = Slot::Imm(Width::Page9);

    let drr = || vec![f(0, 9), f(1, 6), f(2, 0)];
    let dr = || vec![f(0, 9), f(1, 6)];
    let dp = || vec![f(0, 9), f(1, 0)];
    let dd = || vec![f(0, 9), f(0, 6)];

    let mut list = vec![
        rec("ADD", vec![r, r, r], vec![t(ADD.bits(), drr())]),
        rec("ADD", vec![r, r, s5], vec![t(ADD.bits() | IMM, drr())]),
        rec("AND", vec![r, r, r], vec![t(AND.bits(), drr())]),
        rec("AND", vec![r, r, s5], vec![t(AND.bits() | IMM, drr())]),
        rec("NOT", vec![r, r], vec![t(NOT.bits() | 0x3F, dr())]),
        rec("BR", vec![pg], vec![t(BR.bits() | COND_N | COND_Z | COND_P, vec![f(0, 0)])]),
        rec("LD", vec![r, pg], vec![t(LD.bits(), dp())]),
        rec("ST", vec![r, pg], vec![t(ST.bits(), dp())]),
        rec("LDI", vec![r, pg], vec![t(LDI.bits(), dp())]),
        rec("STI", vec![r, pg], vec![t(STI.bits(), dp())]),
        rec("LEA", vec![r, pg], vec![t(LEA.bits(), dp())]),
        rec("JSR", vec![pg], vec![t(JSR.bits() | LINK, vec![f(0, 0)])]),
        rec("JMP", vec![pg], vec![t(JSR.bits(), vec![f(0, 0)])]),
        rec("LDR", vec![r, r, idx6], vec![t(LDR.bits(), drr())]),
        rec("STR", vec![r, r, idx6], vec![t(STR.bits(), drr())]),
        rec("JSRR", vec![r, idx6], vec![t(JSRR.bits() | LINK, vec![f(0, 6), f(1, 0)])]),
        rec("JMPR", vec![r, idx6], vec![t(JSRR.bits(), vec![f(0, 6), f(1, 0)])]),
        rec("RET", vec![], vec![t(RET.bits(), vec![])]),
        rec("DBUG", vec![], vec![t(DBUG.bits(), vec![])]),
        rec("TRAP", vec![vec8], vec![t(TRAP.bits(), vec![f(0, 0)])]),
        // Pseudo instructions with a fixed expansion
        rec("NOP", vec![], vec![t(BR.bits(), vec![])]),
        rec("MOV", vec![r, r], vec![t(ADD.bits() | IMM, dr())]),
        rec("CLR", vec![r], vec![t(AND.bits() | IMM, dd())]),
        rec("INC", vec![r], vec![t(ADD.bits() | IMM | 0x01, dd())]),
        rec("DEC", vec![r], vec![t(ADD.bits() | IMM | 0x1F, dd())]),
        rec(
            "NEG",
            vec![r, r],
            vec![
                t(NOT.bits() | 0x3F, dr()),
                t(ADD.bits() | IMM | 0x01, dd()),
            ],
        ),
        // Pseudo instructions chosen by argument value
        special("SUB", vec![r, r, r], Psudo::Sub),
        special("LSH", vec![r, cnt4], Psudo::Lsh),
    ];

    for (name, cond) in BRANCH.iter() {
        list.push(rec(*name, vec![pg], vec![t(BR.bits() | cond, vec![f(0, 0)])]));
    }
    for (name, vector) in TRAPS.iter() {
        list.push(rec(*name, vec![], vec![t(TRAP.bits() | vector, vec![])]));
    }
    list
});

/// Records grouped by `(mnemonic, arity)`.
static INDEX: Lazy<HashMap<(String, usize), Vec<&'static Format>>> = Lazy::new(|| {
    let mut map: HashMap<(String, usize), Vec<&'static Format>> = HashMap::new();
    for format in FORMATS.iter() {
        map.entry((format.mnemonic.to_string(), format.arity()))
            .or_default()
            .push(format);
    }
    map
});

pub fn lookup(mnemonic: &str, arity: usize) -> Option<&'static [&'static Format]> {
    INDEX
        .get(&(mnemonic.to_ascii_uppercase(), arity))
        .map(|list| list.as_slice())
}

pub fn is_mnemonic(name: &str) -> bool {
    let key = name.to_ascii_uppercase();
    FORMATS.iter().any(|format| format.mnemonic == key)
}

/// Mnemonics naming an opcode directly rather than a pseudo instruction.
pub fn is_machine(mnemonic: &str) -> bool {
    mnemonic.parse::<Opcode>().is_ok()
        || BRANCH.contains_left(mnemonic)
        || matches!(mnemonic, "JMP" | "JMPR")
}

/// Arities the mnemonic is defined with.
pub fn arities(mnemonic: &str) -> Vec<usize> {
    let key = mnemonic.to_ascii_uppercase();
    let mut list: Vec<usize> = FORMATS
        .iter()
        .filter(|format| format.mnemonic == key)
        .map(|format| format.arity())
        .collect();
    list.sort();
    list.dedup();
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_fit_slots() {
        for format in FORMATS.iter() {
            for template in &format.templates {
                let mut used = 0u16;
                for field in &template.fields {
                    let mask = format.slots[field.arg].mask() << field.shift;
                    assert_eq!(template.bits & mask, 0, "{}", format.mnemonic);
                    used |= mask;
                }
                assert_eq!(used & 0xF000, 0, "{}", format.mnemonic);
            }
        }
    }

    #[test]
    fn every_argument_is_spliced() {
        for format in FORMATS.iter().filter(|format| !format.is_special()) {
            for arg in 0..format.arity() {
                assert!(
                    format
                        .templates
                        .iter()
                        .any(|t| t.fields.iter().any(|f| f.arg == arg)),
                    "{} arg {}",
                    format.mnemonic,
                    arg
                );
            }
        }
    }

    #[test]
    fn lookup_by_arity() {
        assert_eq!(lookup("add", 3).map(|list| list.len()), Some(2));
        assert_eq!(lookup("ADD", 2).map(|list| list.len()), None);
        assert_eq!(lookup("brz", 1).map(|list| list.len()), Some(1));
        assert!(is_mnemonic("halt"));
        assert!(!is_mnemonic("LABEL"));
        assert_eq!(arities("NOT"), vec![2]);
    }
}
