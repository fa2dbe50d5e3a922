use arch::{
    encoder::{self, Kind},
    format::Format,
    psudo::Length,
    reg::Reg,
};
use strum::{Display, EnumString};

use crate::{
    error::Error,
    expr::{self, Expr},
    parser::{Line, Operand},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum Directive {
    #[strum(serialize = ".ORIG")]
    Orig,
    #[strum(serialize = ".EQU")]
    Equ,
    #[strum(serialize = ".END")]
    End,
    #[strum(serialize = ".STRZ")]
    Strz,
    #[strum(serialize = ".FILL")]
    Fill,
    #[strum(serialize = ".BLKW")]
    Blkw,
}

impl Directive {
    /// Smallest and largest argument counts.
    fn arity(self) -> (usize, usize) {
        match self {
            Directive::Orig | Directive::End => (0, 1),
            _ => (1, 1),
        }
    }

    fn arg_kind(self) -> &'static str {
        match self {
            Directive::Strz => "a string",
            _ => "an expression",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Reg(Reg),
    Str(String),
    Literal(Expr),
    Expr(Expr),
}

impl Arg {
    pub fn parse(operand: &Operand) -> Result<Arg, Error> {
        Ok(match operand {
            Operand::Reg(reg) => Arg::Reg(*reg),
            Operand::Str(s) => Arg::Str(s.clone()),
            Operand::Literal(text) => Arg::Literal(expr::parse(text)?),
            Operand::Expr(text) => Arg::Expr(expr::parse(text)?),
        })
    }

    /// Decided by spelling alone, so both passes agree.
    pub fn kind(&self) -> Kind {
        match self {
            Arg::Reg(_) => Kind::Register,
            Arg::Str(_) => Kind::String,
            Arg::Literal(_) => Kind::Literal,
            Arg::Expr(e) if e.has_symbols() => Kind::Ambiguous,
            Arg::Expr(_) => Kind::Immediate,
        }
    }

    /// Numeric view of a register or expression argument.
    pub fn as_expr(&self) -> Option<Expr> {
        match self {
            Arg::Reg(reg) => Some(Expr::Num(reg.index() as i16)),
            Arg::Expr(e) => Some(e.clone()),
            _ => None,
        }
    }

    pub fn symbols(&self) -> Vec<String> {
        match self {
            Arg::Literal(e) | Arg::Expr(e) => e.symbols(),
            _ => vec![],
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Directive(Directive, Vec<Arg>),
    Inst {
        mnemonic: String,
        args: Vec<Arg>,
        format: &'static Format,
    },
}

impl Stmt {
    /// `None` for lines with no opcode.
    pub fn parse(line: &Line) -> Result<Option<Stmt>, Error> {
        let Some(opcode) = &line.opcode else {
            return Ok(None);
        };
        let args = line
            .args
            .iter()
            .map(Arg::parse)
            .collect::<Result<Vec<_>, _>>()?;

        if opcode.starts_with('.') {
            let directive: Directive = opcode
                .parse()
                .map_err(|_| Error::UnknownDirective(opcode.clone()))?;
            let (min, max) = directive.arity();
            if args.len() < min || args.len() > max {
                let expect = match min == max {
                    true => min.to_string(),
                    false => format!("{} to {}", min, max),
                };
                return Err(Error::ArgumentCount(opcode.clone(), expect, args.len()));
            }
            let ok = args.iter().all(|arg| match directive {
                Directive::Strz => matches!(arg, Arg::Str(_)),
                _ => matches!(arg, Arg::Expr(_)),
            });
            if !ok {
                return Err(Error::ArgumentKind(opcode.clone(), directive.arg_kind()));
            }
            return Ok(Some(Stmt::Directive(directive, args)));
        }

        let kinds: Vec<Kind> = args.iter().map(Arg::kind).collect();
        let format = encoder::resolve(opcode, &kinds)?;
        Ok(Some(Stmt::Inst {
            mnemonic: opcode.clone(),
            args,
            format,
        }))
    }

    pub fn args(&self) -> &[Arg] {
        match self {
            Stmt::Directive(_, args) => args,
            Stmt::Inst { args, .. } => args,
        }
    }

    /// Words this statement occupies. Depends on symbol values for
    /// `.BLKW` and value-dependent pseudo instructions.
    pub fn length(&self) -> Expr {
        match self {
            Stmt::Directive(Directive::Strz, args) => match args.first() {
                Some(Arg::Str(s)) => Expr::num(s.chars().count() as i32 + 1),
                _ => Expr::Num(0),
            },
            Stmt::Directive(Directive::Fill, _) => Expr::Num(1),
            Stmt::Directive(Directive::Blkw, args) => {
                args.first().and_then(Arg::as_expr).unwrap_or(Expr::Num(0))
            }
            Stmt::Directive(..) => Expr::Num(0),
            Stmt::Inst { args, format, .. } => {
                let Some(psudo) = format.special else {
                    return Expr::num(format.templates.len() as i32);
                };
                let arg = |i: usize| args.get(i).and_then(Arg::as_expr).unwrap_or(Expr::Num(0));
                match psudo.length() {
                    Length::Words(n) => Expr::num(n as i32),
                    Length::Arg(i) => arg(i),
                    Length::IfEqual {
                        lhs,
                        rhs,
                        equal,
                        otherwise,
                    } => Expr::cond(
                        Expr::sub(arg(lhs), arg(rhs)),
                        Expr::num(equal as i32),
                        Expr::num(otherwise as i32),
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(src: &str) -> Result<Option<Stmt>, Error> {
        Stmt::parse(&Line::parse(0, src)?)
    }

    macro_rules! test_length {
        ($($name:ident: $src:expr => $len:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let stmt = stmt($src).unwrap().unwrap();
                    assert_eq!(stmt.length().value(), $len);
                }
            )*
        }
    }

    test_length! {
        len_add: "ADD R0, R1, R2" => Some(1),
        len_neg: "NEG R0, R1" => Some(2),
        len_sub_same: "SUB R0, R1, R1" => Some(1),
        len_sub: "SUB R0, R1, R2" => Some(3),
        len_lsh: "LSH R0, 4" => Some(4),
        len_lsh_symbol: "LSH R0, n" => None,
        len_strz: ".STRZ \"abc\"" => Some(4),
        len_fill: ".FILL 7" => Some(1),
        len_blkw: ".BLKW 3*4" => Some(12),
        len_equ: "x .EQU 3" => Some(0),
    }

    #[test]
    fn kinds() {
        let Some(stmt) = stmt("ADD R0, n, 3").unwrap() else {
            panic!("no statement");
        };
        let kinds: Vec<Kind> = stmt.args().iter().map(Arg::kind).collect();
        assert_eq!(kinds, vec![Kind::Register, Kind::Ambiguous, Kind::Immediate]);
    }

    #[test]
    fn directive_checks() {
        assert!(matches!(stmt(".WORD 1"), Err(Error::UnknownDirective(_))));
        assert!(matches!(stmt(".FILL"), Err(Error::ArgumentCount(..))));
        assert!(matches!(stmt(".ORIG 1, 2"), Err(Error::ArgumentCount(..))));
        assert!(matches!(stmt(".STRZ 5"), Err(Error::ArgumentKind(..))));
        assert!(matches!(stmt(".FILL \"a\""), Err(Error::ArgumentKind(..))));
        assert!(stmt(".orig").unwrap().is_some());
        assert!(stmt("label").unwrap().is_none());
    }

    #[test]
    fn encoder_errors() {
        assert!(matches!(stmt("here FOO R1"), Err(Error::Encode(_))));
        assert!(matches!(stmt("ADD R1, R2"), Err(Error::Encode(_))));
        assert!(matches!(stmt("LDR R1, R2, =4"), Err(Error::Encode(_))));
    }
}
