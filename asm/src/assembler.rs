use crate::{
    error::Error,
    expr::Expr,
    listing::Listing,
    literal::LiteralTable,
    msg::Msgs,
    object::Object,
    parser::Line,
    stmt::Stmt,
    symbol::SymbolTable,
};

/// State of one assembly run. Both passes read and write it in turn.
#[derive(Debug, Default)]
pub struct Assembler {
    pub lines: Vec<Line>,
    /// Statement of each line, `None` for blank or rejected lines.
    pub stmts: Vec<Option<Stmt>>,
    pub symbols: SymbolTable,
    pub literals: LiteralTable,
    pub msgs: Msgs,
    pub segment: Option<String>,
    /// `.END` operand and its line.
    pub exec: Option<(Expr, usize)>,
    /// `=expr` operands waiting for symbol expansion.
    pub(crate) pending: Vec<(Expr, usize)>,
}

#[derive(Debug, Default)]
pub struct Output {
    /// Withheld when any error was reported.
    pub object: Option<Object>,
    pub listing: Listing,
}

impl Assembler {
    pub fn new(source: &str) -> Self {
        let mut asm = Assembler::default();
        for (idx, raw) in source.lines().enumerate() {
            let line = Line::parse(idx, raw).unwrap_or_else(|err| {
                asm.msgs.error(err, Some(idx));
                Line {
                    idx,
                    raw: raw.to_string(),
                    ..Default::default()
                }
            });
            asm.lines.push(line);
        }
        asm.stmts = vec![None; asm.lines.len()];
        asm
    }

    pub fn run(&mut self) -> Output {
        self.pass1();
        self.pass2()
    }

    pub fn has_error(&self) -> bool {
        self.msgs.has_error()
    }

    pub fn raw_lines(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.raw.clone()).collect()
    }

    pub(crate) fn error(&mut self, err: Error, line: usize) {
        self.msgs.error(err, Some(line));
    }

    pub(crate) fn bind(&mut self, name: &str, value: Expr, line: usize) {
        if let Err(err) = self.symbols.bind(name, value, Some(line)) {
            self.error(err, line);
            if let Some(prev) = self.symbols.get(name).and_then(|s| s.defined_at) {
                self.msgs.note("First defined here".to_string(), Some(prev));
            }
        }
    }
}

/// Assembles a whole source text.
pub fn assemble(source: &str) -> (Assembler, Output) {
    let mut asm = Assembler::new(source);
    let output = asm.run();
    (asm, output)
}
