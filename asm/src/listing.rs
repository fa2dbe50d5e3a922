use arch::encoder::disassemble;
use color_print::cformat;

use crate::{location::Location, object::Reloc, parser::Line};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub address: Option<Location>,
    pub word: Option<u16>,
    pub reloc: Reloc,
    /// Source line, set on the first word of a statement only.
    pub line: Option<usize>,
}

/// Every emitted word next to the line it came from.
#[derive(Debug, Clone, Default)]
pub struct Listing(Vec<Row>);

impl Listing {
    pub fn word(&mut self, at: Location, word: u16, reloc: Reloc, line: Option<usize>) {
        self.0.push(Row {
            address: Some(at),
            word: Some(word),
            reloc,
            line,
        });
    }

    pub fn source(&mut self, at: Option<Location>, line: usize) {
        self.0.push(Row {
            address: at,
            word: None,
            reloc: Reloc::None,
            line: Some(line),
        });
    }

    pub fn rows(&self) -> &[Row] {
        &self.0
    }

    pub fn print(&self, path: &str, lines: &[Line]) {
        println!(
            "{}+------[{}]{}",
            "-".repeat(21),
            path,
            "-".repeat(45usize.saturating_sub(path.len()))
        );
        for row in &self.0 {
            println!("{}", row.cformat(lines));
        }
        println!("---------------------+-----------------------------------------------------");
    }
}

impl Row {
    pub fn cformat(&self, lines: &[Line]) -> String {
        let addr = match self.address {
            Some(at) => format!("[{}]", at),
            None => " ".repeat(7),
        };
        let word = match self.word {
            Some(word) => cformat!("<y>{:04X}</>{:<2}", word, self.reloc.to_string()),
            None => " ".repeat(6),
        };
        let source = match self.line.and_then(|idx| lines.get(idx)) {
            Some(line) => format!("{:>4}: {}", line.no(), line.raw),
            None => String::new(),
        };
        let inst = match self.word.and_then(disassemble) {
            Some(decoded) if self.line.is_some() => decoded.cformat(),
            _ => String::new(),
        };
        match inst.is_empty() {
            true => format!("{} {} | {}", addr, word, source),
            false => format!("{} {} | {} {}", addr, word, source, cformat!("<s>; {}</>", inst)),
        }
    }
}
