use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    assembler::Assembler,
    error::Error,
    expr::Expr,
    location::Location,
    symbol::{END, START},
};

/// Symbol table and literal pool after expansion, as written by `-i`.
#[derive(Debug, Serialize)]
pub struct SymbolDump {
    pub segment: String,
    pub start: Option<Location>,
    pub end: Option<Location>,
    pub symbols: IndexMap<String, SymbolEntry>,
    pub literals: Vec<LiteralEntry>,
}

#[derive(Debug, Serialize)]
pub struct SymbolEntry {
    pub value: Option<String>,
    pub line: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LiteralEntry {
    pub value: String,
    pub address: String,
}

impl SymbolDump {
    pub fn new(asm: &Assembler) -> Self {
        let symbols = asm
            .symbols
            .sorted()
            .into_iter()
            .map(|(name, symbol)| {
                let entry = SymbolEntry {
                    value: symbol.value.as_ref().map(|e| e.to_string()),
                    line: symbol.defined_at.map(|idx| idx + 1),
                };
                (name.to_string(), entry)
            })
            .collect();
        let literals = match asm.literals.start() {
            Some(start) => asm
                .literals
                .iter()
                .enumerate()
                .map(|(i, value)| LiteralEntry {
                    value: format!("x{:04X}", value),
                    address: format!("x{:04X}", start.wrapping_add(i as u16)),
                })
                .collect(),
            None => vec![],
        };
        SymbolDump {
            segment: asm.segment.clone().unwrap_or_default(),
            start: Location::of(&Expr::sym(START), &asm.symbols).ok(),
            end: Location::of(&Expr::sym(END), &asm.symbols).ok(),
            symbols,
            literals,
        }
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}
