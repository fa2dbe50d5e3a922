//! Address assignment.
//!
//! Labels are bound to `base + offset`. The base starts as the program
//! start symbol; whenever a statement's length is not yet known, a fresh
//! `%rb<n>` symbol takes over as base so later labels stay expressible.

use crate::{
    assembler::Assembler,
    error::Error,
    expr::Expr,
    location::Location,
    stmt::{Arg, Directive, Stmt},
    symbol::{self, SymbolTable, END, START},
};

#[derive(Debug)]
struct Cursor {
    base: Expr,
    offset: u16,
    rebases: usize,
}

impl Cursor {
    fn new() -> Self {
        Cursor {
            base: Expr::sym(START),
            offset: 0,
            rebases: 0,
        }
    }

    fn here(&self) -> Expr {
        Expr::offset(self.base.clone(), self.offset)
    }

    fn at_start(&self) -> bool {
        self.offset == 0 && self.rebases == 0
    }

    fn advance(&mut self, len: Expr, symbols: &mut SymbolTable) -> Result<(), Error> {
        if let Some(n) = len.evaluate(symbols)? {
            self.offset = self.offset.wrapping_add(n as u16);
            return Ok(());
        }
        self.rebases += 1;
        let name = symbol::rebase(self.rebases);
        symbols.bind(&name, Expr::add(self.here(), len), None)?;
        self.base = Expr::Sym(name);
        self.offset = 0;
        Ok(())
    }
}

impl Assembler {
    pub fn pass1(&mut self) {
        let mut cursor = Cursor::new();
        let mut orig_seen = false;
        let mut end_line: Option<usize> = None;

        for idx in 0..self.lines.len() {
            let line = self.lines[idx].clone();
            if line.is_blank() {
                continue;
            }
            if let Some(end) = end_line {
                self.msgs.warn(
                    format!("Ignored after `.END` on line {}", end + 1),
                    Some(idx),
                );
                continue;
            }

            let stmt = Stmt::parse(&line).unwrap_or_else(|err| {
                self.error(err, idx);
                None
            });
            if let Some(stmt) = &stmt {
                for arg in stmt.args() {
                    for name in arg.symbols() {
                        self.symbols.reference(&name, idx);
                    }
                }
            }

            let label = line.label.as_deref().map(symbol::truncate);
            match &stmt {
                Some(Stmt::Directive(Directive::Orig, args)) => {
                    if orig_seen {
                        self.error(Error::DuplicateOrig, idx);
                    } else if !cursor.at_start() {
                        self.error(Error::OrigNotFirst, idx);
                    } else {
                        self.orig(idx, label, args.first());
                    }
                    orig_seen = true;
                }
                Some(Stmt::Directive(Directive::Equ, args)) => {
                    match (label, args.first().and_then(Arg::as_expr)) {
                        (Some(label), Some(expr)) => self.bind(&label, expr, idx),
                        (None, _) => self.error(Error::MissingLabel(".EQU".to_string()), idx),
                        _ => {}
                    }
                }
                Some(Stmt::Directive(Directive::End, args)) => {
                    if label.is_some() {
                        self.error(Error::UnexpectedLabel(".END".to_string()), idx);
                    }
                    self.exec = args.first().and_then(Arg::as_expr).map(|e| (e, idx));
                    end_line = Some(idx);
                }
                _ => {
                    if let Some(label) = label {
                        self.bind(&label, cursor.here(), idx);
                    }
                }
            }

            if let Some(stmt) = &stmt {
                for arg in stmt.args() {
                    if let Arg::Literal(expr) = arg {
                        self.pending.push((expr.clone(), idx));
                    }
                }
                if let Err(err) = cursor.advance(stmt.length(), &mut self.symbols) {
                    self.error(err, idx);
                }
            }
            self.stmts[idx] = stmt;
        }

        if let Err(err) = self.symbols.bind(END, cursor.here(), None) {
            self.msgs.error(err, None);
        }
        if end_line.is_none() {
            self.msgs.warn("Missing `.END`".to_string(), None);
        }
        self.finish();
    }

    fn orig(&mut self, idx: usize, label: Option<String>, start: Option<&Arg>) {
        match label {
            Some(name) => {
                self.symbols.remove(&name);
                self.bind(&name, Expr::sym(START), idx);
                self.segment = Some(name);
            }
            None => self
                .msgs
                .warn("`.ORIG` without a segment name".to_string(), Some(idx)),
        }
        let Some(expr) = start.and_then(Arg::as_expr) else {
            return;
        };
        match expr.evaluate(&self.symbols) {
            Ok(Some(value)) => self.bind(START, Expr::Num(value), idx),
            Ok(None) => self.error(Error::StartNotConstant(expr.to_string()), idx),
            Err(err) => self.error(err, idx),
        }
    }

    /// Expands symbols, then values and places the literal pool.
    fn finish(&mut self) {
        for (name, err) in self.symbols.expand_all() {
            let line = self.symbols.get(&name).and_then(|s| s.defined_at);
            self.msgs.error(err, line);
        }

        for (expr, idx) in std::mem::take(&mut self.pending) {
            match expr.evaluate(&self.symbols) {
                Ok(Some(value)) => self.literals.intern(value),
                Ok(None) => self.error(Error::NotConstant(expr.to_string()), idx),
                Err(err) => self.error(err, idx),
            }
        }

        match Location::of(&Expr::sym(END), &self.symbols) {
            Ok(end) => self.literals.fix_start(end.address),
            Err(err) => self.msgs.error(err, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass1(src: &str) -> Assembler {
        let mut asm = Assembler::new(src);
        asm.pass1();
        asm
    }

    fn location(asm: &Assembler, name: &str) -> Option<Location> {
        Location::of(&Expr::sym(name), &asm.symbols).ok()
    }

    #[test]
    fn labels_follow_lengths() {
        let asm = pass1(
            "prog .ORIG x3000\n\
             a    NEG R0, R1\n\
             b    .STRZ \"hi\"\n\
             c    .BLKW 4\n\
             d    .FILL 1\n\
             e    HALT\n\
             .END",
        );
        assert!(!asm.has_error());
        assert_eq!(location(&asm, "prog"), Some(Location::absolute(0x3000)));
        assert_eq!(location(&asm, "a"), Some(Location::absolute(0x3000)));
        assert_eq!(location(&asm, "b"), Some(Location::absolute(0x3002)));
        assert_eq!(location(&asm, "c"), Some(Location::absolute(0x3005)));
        assert_eq!(location(&asm, "d"), Some(Location::absolute(0x3009)));
        assert_eq!(location(&asm, "e"), Some(Location::absolute(0x300A)));
        assert_eq!(location(&asm, END), Some(Location::absolute(0x300B)));
    }

    #[test]
    fn relocatable_labels() {
        let asm = pass1("p .ORIG\nADD R0, R0, R0\nhere .FILL here\n.END");
        assert_eq!(location(&asm, "here"), Some(Location::relative(1)));
        assert_eq!(location(&asm, START), Some(Location::relative(0)));
    }

    #[test]
    fn rebase_on_forward_length() {
        let asm = pass1(
            "p .ORIG x100\n\
             buf .BLKW size\n\
             after .FILL 0\n\
             size .EQU 3 * 2\n\
             .END",
        );
        assert!(!asm.has_error(), "{:?}", asm.msgs);
        assert!(asm.symbols.is_bound("%rb1"));
        assert_eq!(location(&asm, "after"), Some(Location::absolute(0x106)));
        assert_eq!(location(&asm, END), Some(Location::absolute(0x107)));
    }

    #[test]
    fn equ_and_literals() {
        let asm = pass1(
            "p .ORIG x3000\n\
             LD R0, =k + 1\n\
             LD R1, =5\n\
             LD R2, =6\n\
             k .EQU 5\n\
             .END",
        );
        assert!(!asm.has_error(), "{:?}", asm.msgs);
        assert_eq!(asm.literals.len(), 2);
        assert_eq!(asm.literals.locate(5), Some(0x3003));
        assert_eq!(asm.literals.locate(6), Some(0x3004));
    }

    #[test]
    fn directive_errors() {
        let asm = pass1("a .ORIG\nb .ORIG\n.EQU 4\nx .END\nADD R0, R0, R0");
        let errors: Vec<String> = asm.msgs.errors().map(|(e, _)| e.to_string()).collect();
        assert_eq!(
            errors,
            vec![
                Error::DuplicateOrig.to_string(),
                Error::MissingLabel(".EQU".to_string()).to_string(),
                Error::UnexpectedLabel(".END".to_string()).to_string(),
            ]
        );
        // The line after `.END` is only warned about
        assert_eq!(asm.msgs.len(), 4);
    }

    #[test]
    fn double_definition() {
        let asm = pass1("p .ORIG\nx ADD R0, R0, R0\nx .FILL 1\n.END");
        let errors: Vec<(String, Option<usize>)> = asm
            .msgs
            .errors()
            .map(|(e, line)| (e.to_string(), line))
            .collect();
        assert_eq!(errors, vec![(Error::AlreadyDefined("x".to_string()).to_string(), Some(2))]);
    }

    #[test]
    fn recursion_reported_at_definition() {
        let asm = pass1("p .ORIG\na .EQU b\nb .EQU a\n.END");
        let lines: Vec<Option<usize>> = asm.msgs.errors().map(|(_, line)| line).collect();
        assert_eq!(lines, vec![Some(1), Some(2)]);
    }

    #[test]
    fn start_must_be_constant() {
        let asm = pass1("p .ORIG later\nlater .FILL 0\n.END");
        assert!(matches!(
            asm.msgs.errors().next(),
            Some((Error::StartNotConstant(_), Some(0)))
        ));
    }

    #[test]
    fn missing_end_and_orig_warn() {
        let asm = pass1(".ORIG x10\nHALT");
        assert!(!asm.has_error());
        assert_eq!(asm.msgs.len(), 2);
        assert_eq!(asm.segment, None);
    }
}
