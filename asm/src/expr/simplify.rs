use super::{Expr, Operator, Scope};
use crate::error::Error;

/// `sum(coef * term) + constant`, terms kept in order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Linear {
    pub terms: Vec<(Expr, i16)>,
    pub constant: i16,
}

impl Linear {
    fn add_term(&mut self, term: Expr, coef: i16) {
        match self.terms.iter_mut().find(|(t, _)| *t == term) {
            Some((_, c)) => *c = c.wrapping_add(coef),
            None => self.terms.push((term, coef)),
        }
    }

    fn add_constant(&mut self, value: i16) {
        self.constant = self.constant.wrapping_add(value);
    }

    fn merge(&mut self, other: Linear, scale: i16) {
        self.add_constant(other.constant.wrapping_mul(scale));
        for (term, coef) in other.terms {
            self.add_term(term, coef.wrapping_mul(scale));
        }
    }

    /// Terms whose coefficients did not cancel out.
    pub fn live_terms(&self) -> Vec<(&Expr, i16)> {
        self.terms
            .iter()
            .filter(|(_, coef)| *coef != 0)
            .map(|(term, coef)| (term, *coef))
            .collect()
    }

    pub fn as_constant(&self) -> Option<i16> {
        match self.live_terms().is_empty() {
            true => Some(self.constant),
            false => None,
        }
    }

    /// Normal form: first term negated when its coefficient is negative,
    /// later terms joined with `+`/`-`, constant last.
    pub fn to_expr(&self) -> Expr {
        let mut acc: Option<Expr> = None;
        for (term, coef) in self.live_terms() {
            let magnitude = coef.unsigned_abs();
            let body = match magnitude {
                1 => term.clone(),
                m => Expr::binary(Operator::Mul, Expr::Num(m as i16), term.clone()),
            };
            acc = Some(match acc {
                None if coef < 0 => Expr::unary(Operator::Sub, body),
                None => body,
                Some(lhs) if coef < 0 => Expr::sub(lhs, body),
                Some(lhs) => Expr::add(lhs, body),
            });
        }
        let c = self.constant;
        match acc {
            None => Expr::Num(c),
            Some(expr) if c == 0 => expr,
            Some(expr) if c < 0 && c != i16::MIN => Expr::sub(expr, Expr::Num(-c)),
            Some(expr) => Expr::add(expr, Expr::Num(c)),
        }
    }
}

impl Expr {
    /// Collects like terms of the sum this expression spells.
    ///
    /// With `evaluate_symbols`, bound symbols are replaced by their
    /// definitions, so only unbound ones remain as terms. Subtrees that are
    /// not sums or scalings stay opaque terms, simplified on their own.
    pub fn linearize(&self, scope: &dyn Scope, evaluate_symbols: bool) -> Result<Linear, Error> {
        let scope: &dyn Scope = if evaluate_symbols { scope } else { &() };
        let mut linear = Linear::default();
        collect(self, 1, &mut linear, scope, &mut vec![])?;
        Ok(linear)
    }

    pub fn simplify(&self, scope: &dyn Scope, evaluate_symbols: bool) -> Result<Expr, Error> {
        Ok(self.linearize(scope, evaluate_symbols)?.to_expr())
    }
}

fn collect(
    expr: &Expr,
    coef: i16,
    linear: &mut Linear,
    scope: &dyn Scope,
    chain: &mut Vec<String>,
) -> Result<(), Error> {
    match expr {
        Expr::Num(n) => linear.add_constant(coef.wrapping_mul(*n)),
        Expr::Sym(name) => match scope.lookup(name) {
            Some(def) => {
                if chain.contains(name) {
                    chain.push(name.clone());
                    return Err(Error::Recursion(chain.join(" -> ")));
                }
                chain.push(name.clone());
                collect(def, coef, linear, scope, chain)?;
                chain.pop();
            }
            None => linear.add_term(expr.clone(), coef),
        },
        Expr::Unary(Operator::Sub, operand) => {
            collect(operand, coef.wrapping_neg(), linear, scope, chain)?
        }
        Expr::Binary(Operator::Add, lhs, rhs) => {
            collect(lhs, coef, linear, scope, chain)?;
            collect(rhs, coef, linear, scope, chain)?;
        }
        Expr::Binary(Operator::Sub, lhs, rhs) => {
            collect(lhs, coef, linear, scope, chain)?;
            collect(rhs, coef.wrapping_neg(), linear, scope, chain)?;
        }
        Expr::Binary(Operator::Mul, lhs, rhs) => {
            let left = sub_linear(lhs, scope, chain)?;
            let right = sub_linear(rhs, scope, chain)?;
            if let Some(k) = left.as_constant() {
                linear.merge(right, coef.wrapping_mul(k));
            } else if let Some(k) = right.as_constant() {
                linear.merge(left, coef.wrapping_mul(k));
            } else {
                let term = Expr::binary(Operator::Mul, left.to_expr(), right.to_expr());
                linear.add_term(term, coef);
            }
        }
        _ => {
            let term = opaque(expr, scope, chain)?;
            match term.value() {
                Some(value) => linear.add_constant(coef.wrapping_mul(value)),
                None => linear.add_term(term, coef),
            }
        }
    }
    Ok(())
}

fn sub_linear(expr: &Expr, scope: &dyn Scope, chain: &mut Vec<String>) -> Result<Linear, Error> {
    let mut linear = Linear::default();
    collect(expr, 1, &mut linear, scope, chain)?;
    Ok(linear)
}

/// Rebuilds a non-linear node over simplified children.
fn opaque(expr: &Expr, scope: &dyn Scope, chain: &mut Vec<String>) -> Result<Expr, Error> {
    let mut simplify = |e: &Expr| sub_linear(e, scope, chain).map(|linear| linear.to_expr());
    Ok(match expr {
        Expr::Unary(op, operand) => Expr::unary(*op, simplify(operand.as_ref())?),
        Expr::Binary(op, lhs, rhs) => {
            let lhs = simplify(lhs.as_ref())?;
            Expr::binary(*op, lhs, simplify(rhs.as_ref())?)
        }
        Expr::Cond { test, zero, other } => {
            let test = simplify(test.as_ref())?;
            let zero = simplify(zero.as_ref())?;
            Expr::cond(test, zero, simplify(other.as_ref())?)
        }
        _ => expr.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse;

    macro_rules! case {
        ($($name:ident: $src:expr => $expect:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let expr = parse($src).unwrap().simplify(&(), false).unwrap();
                    assert_eq!(expr.to_string(), $expect);
                }
            )*
        }
    }

    case! {
        like_terms: "x+1-(y+2-3)-z-z" => "x - y - 2 * z + 2",
        cancel: "x+5-(x+5)" => "0",
        constant: "2 * 3 + 1" => "7",
        negative_first: "1 - a" => "-a + 1",
        scaled: "2 * (a + 1) - a" => "a + 2",
        scaled_right: "(a - b) * 3" => "3 * a - 3 * b",
        opaque_kept: "(a & 3) + (a & 3)" => "2 * (a & 3)",
        opaque_folded: "(4 & 6) + a" => "a + 4",
        product_of_symbols: "a * b - b * a" => "a * b - b * a",
        negative_constant: "a - 3" => "a - 3",
    }

    #[test]
    fn evaluating_symbols() {
        use std::collections::HashMap;
        struct Defs(HashMap<String, Expr>);
        impl Scope for Defs {
            fn lookup(&self, name: &str) -> Option<&Expr> {
                self.0.get(name)
            }
        }
        let mut map = HashMap::new();
        map.insert("n".to_string(), Expr::Num(4));
        let defs = Defs(map);
        let expr = parse("base + n * 2 + 1").unwrap();
        assert_eq!(expr.simplify(&defs, true).unwrap().to_string(), "base + 9");
        assert_eq!(expr.simplify(&defs, false).unwrap().to_string(), "base + 2 * n + 1");
    }

    #[test]
    fn linear_parts() {
        let linear = parse("a - a + 3").unwrap().linearize(&(), false).unwrap();
        assert_eq!(linear.as_constant(), Some(3));
        assert!(linear.live_terms().is_empty());
    }
}
