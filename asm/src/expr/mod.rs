//! Arithmetic over symbols: parse, evaluate, simplify.

mod eval;
mod operator;
mod parse;
mod simplify;

use std::{fmt, rc::Rc};

pub use eval::Scope;
pub use operator::{Assoc, Operator};
pub use parse::parse;
pub use simplify::Linear;

/// Immutable expression tree. Subtrees are shared between copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Num(i16),
    Sym(String),
    Unary(Operator, Rc<Expr>),
    Binary(Operator, Rc<Expr>, Rc<Expr>),
    /// `zero` when `test` is 0, `other` otherwise.
    Cond {
        test: Rc<Expr>,
        zero: Rc<Expr>,
        other: Rc<Expr>,
    },
}

impl Expr {
    pub fn num(value: i32) -> Expr {
        Expr::Num(value as i16)
    }

    pub fn sym(name: &str) -> Expr {
        Expr::Sym(name.to_string())
    }

    pub fn unary(op: Operator, operand: Expr) -> Expr {
        Expr::Unary(op, Rc::new(operand))
    }

    pub fn binary(op: Operator, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Rc::new(lhs), Rc::new(rhs))
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(Operator::Add, lhs, rhs)
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(Operator::Sub, lhs, rhs)
    }

    pub fn cond(test: Expr, zero: Expr, other: Expr) -> Expr {
        Expr::Cond {
            test: Rc::new(test),
            zero: Rc::new(zero),
            other: Rc::new(other),
        }
    }

    /// `base + offset`, or just `base` at offset 0.
    pub fn offset(base: Expr, offset: u16) -> Expr {
        match offset {
            0 => base,
            n => Expr::add(base, Expr::num(n as i32)),
        }
    }

    /// Symbol names in order of first appearance.
    pub fn symbols(&self) -> Vec<String> {
        let mut list = vec![];
        self.collect_symbols(&mut list);
        list
    }

    fn collect_symbols(&self, list: &mut Vec<String>) {
        match self {
            Expr::Num(_) => {}
            Expr::Sym(name) => {
                if !list.contains(name) {
                    list.push(name.clone());
                }
            }
            Expr::Unary(_, operand) => operand.collect_symbols(list),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_symbols(list);
                rhs.collect_symbols(list);
            }
            Expr::Cond { test, zero, other } => {
                test.collect_symbols(list);
                zero.collect_symbols(list);
                other.collect_symbols(list);
            }
        }
    }

    pub fn has_symbols(&self) -> bool {
        match self {
            Expr::Num(_) => false,
            Expr::Sym(_) => true,
            Expr::Unary(_, operand) => operand.has_symbols(),
            Expr::Binary(_, lhs, rhs) => lhs.has_symbols() || rhs.has_symbols(),
            Expr::Cond { test, zero, other } => {
                test.has_symbols() || zero.has_symbols() || other.has_symbols()
            }
        }
    }

    /// Binding strength when printed, to decide on parentheses.
    fn prec(&self) -> u8 {
        match self {
            Expr::Num(n) if *n < 0 => Operator::Sub.prec(),
            Expr::Unary(op, _) => op.prec(),
            Expr::Binary(op, _, _) => op.prec(),
            _ => u8::MAX,
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, paren: bool) -> fmt::Result {
    if paren {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{}", n),
            Expr::Sym(name) => write!(f, "{}", name),
            Expr::Unary(op, operand) => {
                write!(f, "{}", op.token())?;
                write_operand(f, operand, operand.prec() <= op.prec())
            }
            Expr::Binary(op, lhs, rhs) => {
                let p = op.prec();
                let left = lhs.prec() < p || (lhs.prec() == p && op.assoc() == Assoc::Right);
                let right = rhs.prec() < p || (rhs.prec() == p && op.assoc() == Assoc::Left);
                write_operand(f, lhs, left)?;
                write!(f, " {} ", op.token())?;
                write_operand(f, rhs, right)
            }
            Expr::Cond { test, zero, other } => {
                write!(f, "[{} == 0 ? {} : {}]", test, zero, other)
            }
        }
    }
}
