use color_print::cformat;
use thiserror::Error;

use crate::format::{self, Format, Slot, Width, FORMATS};

/// What an argument looks like before its value is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Register,
    /// Expression built from numbers only.
    Immediate,
    /// Expression naming a symbol. May still turn out to be a register number.
    Ambiguous,
    /// `=value`, stored in the literal pool.
    Literal,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    Exact,
    Provisional,
    No,
}

impl Kind {
    fn fits(self, slot: Slot) -> Fit {
        match (self, slot) {
            (Kind::Register, Slot::Reg) => Fit::Exact,
            (Kind::Immediate, Slot::Imm(_)) => Fit::Exact,
            (Kind::Literal, Slot::Imm(Width::Page9)) => Fit::Exact,
            (Kind::Ambiguous, _) => Fit::Provisional,
            _ => Fit::No,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Unknown operation: `{0}`")]
    UnknownOperation(String),

    #[error("`{0}` takes {1} argument(s), got {2}")]
    WrongArity(String, String, usize),

    #[error("Immediate used where register expected, or vice versa: `{0}`")]
    KindMismatch(String),

    #[error("Ambiguous instruction: `{0}` matches {1} formats")]
    Ambiguous(String, usize),

    #[error("Value {0} out of range for {1} ({2}..={3})")]
    OutOfRange(i32, Slot, i32, i32),

    #[error("`{0}` expects {1} value(s), got {2}")]
    ValueCount(String, usize, usize),
}

/// Every record of `mnemonic` whose slots accept `kinds`.
pub fn candidates(mnemonic: &str, kinds: &[Kind]) -> Result<Vec<&'static Format>, EncodeError> {
    let list = match format::lookup(mnemonic, kinds.len()) {
        Some(list) => list,
        None => {
            let arities = format::arities(mnemonic);
            if arities.is_empty() {
                return Err(EncodeError::UnknownOperation(mnemonic.to_string()));
            }
            let arities: Vec<String> = arities.iter().map(|n| n.to_string()).collect();
            return Err(EncodeError::WrongArity(
                mnemonic.to_ascii_uppercase(),
                arities.join(" or "),
                kinds.len(),
            ));
        }
    };
    Ok(list
        .iter()
        .copied()
        .filter(|format| {
            format
                .slots
                .iter()
                .zip(kinds)
                .all(|(slot, kind)| kind.fits(*slot) != Fit::No)
        })
        .collect())
}

/// Picks the one record `mnemonic` assembles to with these argument kinds.
///
/// Ambiguous arguments fit any slot. When that leaves more than one record,
/// the records taking the most ambiguous arguments as immediates win.
pub fn resolve(mnemonic: &str, kinds: &[Kind]) -> Result<&'static Format, EncodeError> {
    let list = candidates(mnemonic, kinds)?;
    match list.len() {
        0 => Err(EncodeError::KindMismatch(mnemonic.to_ascii_uppercase())),
        1 => Ok(list[0]),
        _ => {
            let score = |format: &Format| {
                format
                    .slots
                    .iter()
                    .zip(kinds)
                    .filter(|(slot, kind)| **kind == Kind::Ambiguous && matches!(slot, Slot::Imm(_)))
                    .count()
            };
            let best = list.iter().map(|format| score(*format)).max().unwrap_or(0);
            let winners: Vec<&'static Format> = list
                .into_iter()
                .filter(|format| score(*format) == best)
                .collect();
            match winners.as_slice() {
                [one] => Ok(*one),
                _ => Err(EncodeError::Ambiguous(
                    mnemonic.to_ascii_uppercase(),
                    winners.len(),
                )),
            }
        }
    }
}

pub fn encode(mnemonic: &str, kinds: &[Kind], values: &[i32]) -> Result<Vec<u16>, EncodeError> {
    resolve(mnemonic, kinds)?.encode(values)
}

fn check(slot: Slot, value: i32) -> Result<u16, EncodeError> {
    if let Some((min, max)) = slot.range() {
        if value < min || value > max {
            return Err(EncodeError::OutOfRange(value, slot, min, max));
        }
    }
    Ok(value as u16 & slot.mask())
}

impl Format {
    pub fn encode(&self, values: &[i32]) -> Result<Vec<u16>, EncodeError> {
        if values.len() != self.arity() {
            return Err(EncodeError::ValueCount(
                self.mnemonic.to_string(),
                self.arity(),
                values.len(),
            ));
        }
        let args = self
            .slots
            .iter()
            .zip(values)
            .map(|(slot, value)| check(*slot, *value))
            .collect::<Result<Vec<u16>, _>>()?;

        if let Some(psudo) = self.special {
            return Ok(psudo.expand(&args));
        }
        Ok(self
            .templates
            .iter()
            .map(|template| {
                template
                    .fields
                    .iter()
                    .fold(template.bits, |word, field| {
                        word | args[field.arg] << field.shift
                    })
            })
            .collect())
    }
}

// ----------------------------------------------------------------------------
// Decode

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub mnemonic: &'static str,
    pub slots: &'static [Slot],
    pub values: Vec<i32>,
}

impl Format {
    fn decode(&'static self, words: &[u16]) -> Option<Decoded> {
        if self.is_special() || self.templates.len() != words.len() {
            return None;
        }
        let mut values: Vec<Option<i32>> = vec![None; self.arity()];
        for (template, &word) in self.templates.iter().zip(words) {
            let mut fixed = 0xFFFF;
            for field in &template.fields {
                fixed &= !(self.slots[field.arg].mask() << field.shift);
            }
            if word & fixed != template.bits {
                return None;
            }
            for field in &template.fields {
                let slot = self.slots[field.arg];
                let raw = (word >> field.shift) & slot.mask();
                let value = match slot {
                    Slot::Imm(w) if w.signed() => {
                        let pad = 16 - w.bits();
                        (((raw << pad) as i16) >> pad) as i32
                    }
                    _ => raw as i32,
                };
                match values[field.arg] {
                    Some(prev) if prev != value => return None,
                    _ => values[field.arg] = Some(value),
                }
            }
        }
        Some(Decoded {
            mnemonic: self.mnemonic,
            slots: &self.slots,
            values: values.into_iter().collect::<Option<Vec<i32>>>()?,
        })
    }
}

/// Every fixed-expansion record that produces exactly these words.
pub fn decode(words: &[u16]) -> Vec<Decoded> {
    FORMATS
        .iter()
        .filter_map(|format| format.decode(words))
        .collect()
}

/// The record a single word most likely came from: real opcodes before aliases.
pub fn disassemble(word: u16) -> Option<Decoded> {
    let list = decode(&[word]);
    list.iter()
        .find(|d| format::is_machine(d.mnemonic))
        .or(list.first())
        .cloned()
}

impl Decoded {
    pub fn cformat(&self) -> String {
        let args: Vec<String> = self
            .slots
            .iter()
            .zip(&self.values)
            .map(|(slot, value)| match slot {
                Slot::Reg => format!("R{}", value),
                Slot::Imm(Width::Page9) => format!("x{:03X}", value),
                Slot::Imm(_) => format!("#{}", value),
            })
            .collect();
        cformat!("<r>{:<6}</><b>{}</>", self.mnemonic, args.join(", "))
    }
}
