//! Code generation.

use arch::{
    encoder::EncodeError,
    format::{Slot, Width},
};

use crate::{
    assembler::{Assembler, Output},
    error::Error,
    expr::Expr,
    listing::Listing,
    location::Location,
    object::{Object, Record, Reloc},
    stmt::{Arg, Directive, Stmt},
    symbol::{END, START},
};

impl Assembler {
    pub fn pass2(&mut self) -> Output {
        let undefined: Vec<(String, Option<usize>)> = self
            .symbols
            .undefined()
            .into_iter()
            .map(|(name, symbol)| (name.to_string(), symbol.referenced_at))
            .collect();
        for (name, line) in undefined {
            self.msgs.error(Error::UndefinedSymbol(name), line);
        }

        let mut records = vec![];
        let mut listing = Listing::default();

        let start = match Location::of(&Expr::sym(START), &self.symbols) {
            Ok(start) => start,
            Err(err) => {
                self.msgs.error(err, None);
                Location::relative(0)
            }
        };
        match self.program_length() {
            Ok(length) => records.push(Record::Header {
                name: self.segment.clone().unwrap_or_default(),
                start: if start.relative { 0 } else { start.address },
                length,
            }),
            Err(err) => self.msgs.error(err, None),
        }

        let mut loc = start;
        for idx in 0..self.lines.len() {
            let Some(stmt) = self.stmts[idx].clone() else {
                listing.source(None, idx);
                continue;
            };
            // Undefined symbols were reported above
            let unresolved = stmt
                .args()
                .iter()
                .flat_map(Arg::symbols)
                .any(|name| !self.symbols.is_bound(&name));
            let generated = match unresolved {
                true => Ok(vec![]),
                false => self.generate(&stmt, loc),
            };
            match generated {
                Ok(words) if words.is_empty() => listing.source(Some(loc), idx),
                Ok(words) => {
                    for (i, (word, reloc)) in words.into_iter().enumerate() {
                        let at = loc.offset(i as u16);
                        records.push(Record::Text {
                            address: at.address,
                            word,
                            reloc,
                        });
                        listing.word(at, word, reloc, (i == 0).then_some(idx));
                    }
                }
                Err(err) => {
                    self.error(err, idx);
                    listing.source(Some(loc), idx);
                }
            }
            let len = stmt.length();
            match len.evaluate(&self.symbols) {
                Ok(Some(n)) => loc = loc.offset(n as u16),
                Ok(None) if unresolved => {}
                Ok(None) => self.error(Error::TooComplex(len.to_string()), idx),
                Err(err) => self.error(err, idx),
            }
        }

        if let (Some(pool), Ok(end)) = (
            self.literals.start(),
            Location::of(&Expr::sym(END), &self.symbols),
        ) {
            for (i, value) in self.literals.iter().enumerate() {
                let at = Location {
                    relative: end.relative,
                    address: pool.wrapping_add(i as u16),
                };
                records.push(Record::Text {
                    address: at.address,
                    word: value,
                    reloc: Reloc::None,
                });
                listing.word(at, value, Reloc::None, None);
            }
        }

        let (exec, line) = match &self.exec {
            Some((expr, line)) => (expr.clone(), Some(*line)),
            None => (Expr::sym(START), None),
        };
        match Location::of(&exec, &self.symbols) {
            Ok(at) => records.push(Record::Exec {
                address: at.address,
                reloc: if at.relative { Reloc::Word } else { Reloc::None },
            }),
            Err(_) => self
                .msgs
                .error(Error::ExecTooComplex(exec.to_string()), line),
        }

        let object = match self.msgs.has_error() {
            true => None,
            false => Some(Object(records)),
        };
        Output { object, listing }
    }

    /// `end - start` plus the literal pool, as a plain number.
    fn program_length(&self) -> Result<u16, Error> {
        let span = Expr::sub(Expr::sym(END), Expr::sym(START));
        let linear = span.linearize(&self.symbols, true)?;
        match linear.as_constant() {
            Some(n) => Ok((n as u16).wrapping_add(self.literals.len() as u16)),
            None => Err(Error::LengthTooComplex(linear.to_expr().to_string())),
        }
    }

    /// Address a page-offset operand points at.
    fn target(&self, arg: &Arg) -> Result<Location, Error> {
        match arg {
            Arg::Literal(expr) => {
                let value = expr
                    .evaluate(&self.symbols)?
                    .ok_or_else(|| Error::NotConstant(expr.to_string()))?;
                let pool = Location::of(&Expr::sym(END), &self.symbols)?;
                let address = self
                    .literals
                    .locate(value)
                    .ok_or_else(|| Error::TooComplex(format!("={}", expr)))?;
                Ok(Location { address, ..pool })
            }
            Arg::Expr(expr) => Location::of(expr, &self.symbols),
            _ => Err(Error::TooComplex(format!("{:?}", arg))),
        }
    }

    /// Words of one statement placed at `loc`, each with its relocation.
    fn generate(&self, stmt: &Stmt, loc: Location) -> Result<Vec<(u16, Reloc)>, Error> {
        match stmt {
            Stmt::Directive(Directive::Fill, args) => {
                let expr = args.first().and_then(Arg::as_expr).unwrap_or(Expr::Num(0));
                let value = Location::of(&expr, &self.symbols)?;
                let reloc = if value.relative { Reloc::Word } else { Reloc::None };
                Ok(vec![(value.address, reloc)])
            }
            Stmt::Directive(Directive::Strz, args) => match args.first() {
                Some(Arg::Str(s)) => Ok(s
                    .chars()
                    .map(|c| c as u32 as u16)
                    .chain([0])
                    .map(|word| (word, Reloc::None))
                    .collect()),
                _ => Ok(vec![]),
            },
            Stmt::Directive(..) => Ok(vec![]),
            Stmt::Inst {
                mnemonic,
                args,
                format,
            } => {
                let mut reloc = Reloc::None;
                let mut values = vec![];
                for (slot, arg) in format.slots.iter().zip(args) {
                    let value = match (slot, arg) {
                        (_, Arg::Reg(reg)) => reg.index() as i32,
                        (Slot::Imm(Width::Page9), Arg::Expr(_) | Arg::Literal(_)) => {
                            let target = self.target(arg)?;
                            let next = loc.offset(1);
                            if target.relative != next.relative {
                                return Err(Error::TooComplex(format!("{}", target)));
                            }
                            if target.page() != next.page() {
                                return Err(Error::OffPage(target.address, next.address));
                            }
                            if target.relative {
                                reloc = Reloc::Page;
                            }
                            target.address as i32
                        }
                        (_, Arg::Expr(expr)) => {
                            let value = Location::of(expr, &self.symbols)?;
                            if value.relative {
                                return Err(Error::RelocatableImmediate(expr.to_string()));
                            }
                            value.address as i16 as i32
                        }
                        _ => return Err(EncodeError::KindMismatch(mnemonic.clone()).into()),
                    };
                    values.push(value);
                }
                let words = format.encode(&values)?;
                Ok(words.into_iter().map(|word| (word, reloc)).collect())
            }
        }
    }
}
