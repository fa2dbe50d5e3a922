use super::Expr;
use crate::error::Error;

/// Where symbol values come from during evaluation.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<&Expr>;
}

/// No symbols at all.
impl Scope for () {
    fn lookup(&self, _name: &str) -> Option<&Expr> {
        None
    }
}

impl Expr {
    /// Value of the expression, or `None` while a symbol it needs is unbound.
    ///
    /// A symbol reached again through its own definition is a recursion
    /// error naming the chain.
    pub fn evaluate(&self, scope: &dyn Scope) -> Result<Option<i16>, Error> {
        self.eval(scope, &mut vec![])
    }

    /// Value without any symbols.
    pub fn value(&self) -> Option<i16> {
        self.evaluate(&()).ok().flatten()
    }

    fn eval(&self, scope: &dyn Scope, chain: &mut Vec<String>) -> Result<Option<i16>, Error> {
        let value = match self {
            Expr::Num(n) => Some(*n),
            Expr::Sym(name) => {
                if chain.contains(name) {
                    chain.push(name.clone());
                    return Err(Error::Recursion(chain.join(" -> ")));
                }
                match scope.lookup(name) {
                    Some(expr) => {
                        chain.push(name.clone());
                        let value = expr.eval(scope, chain)?;
                        chain.pop();
                        value
                    }
                    None => None,
                }
            }
            Expr::Unary(op, operand) => operand.eval(scope, chain)?.map(|a| op.apply_unary(a)),
            Expr::Binary(op, lhs, rhs) => {
                let Some(a) = lhs.eval(scope, chain)? else {
                    return Ok(None);
                };
                rhs.eval(scope, chain)?.map(|b| op.apply(a, b))
            }
            Expr::Cond { test, zero, other } => match test.eval(scope, chain)? {
                Some(0) => zero.eval(scope, chain)?,
                Some(_) => other.eval(scope, chain)?,
                None => None,
            },
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::expr::parse;

    impl Scope for HashMap<String, Expr> {
        fn lookup(&self, name: &str) -> Option<&Expr> {
            self.get(name)
        }
    }

    fn scope(defs: &[(&str, &str)]) -> HashMap<String, Expr> {
        defs.iter()
            .map(|(name, src)| (name.to_string(), parse(src).unwrap()))
            .collect()
    }

    macro_rules! test_eval {
        ($($name:ident: $src:expr => $expect:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(parse($src).unwrap().value(), $expect);
                }
            )*
        }
    }

    test_eval! {
        precedence: "1+2*4-12%5/3&6^0xA**2**2" => Some(10000),
        grouped: "(1+((2*4)-(12))%(5/(((3))&6))^(0xA**2)**2)" => Some(10001),
        negate: "-3 + 1" => Some(-2),
        complement: "~0" => Some(-1),
        double_negate: "- -5" => Some(5),
        shift_then_or: "1 << 4 | 1" => Some(17),
        logical_shift: "-1 >>> 12" => Some(15),
        arith_shift: "-32 >> 2" => Some(-8),
        wrap: "0x7FFF + 1" => Some(i16::MIN),
        div_zero: "5 / 0" => Some(-1),
        rem_zero: "5 % 0" => Some(5),
        unbound: "x + 1" => None,
    }

    #[test]
    fn through_symbols() {
        let defs = scope(&[("a", "b + 1"), ("b", "2 * c"), ("c", "3")]);
        assert_eq!(parse("a * 2").unwrap().evaluate(&defs).ok(), Some(Some(14)));
        assert_eq!(parse("a + d").unwrap().evaluate(&defs).ok(), Some(None));
    }

    #[test]
    fn recursion() {
        let defs = scope(&[("a", "b"), ("b", "a")]);
        match parse("a").unwrap().evaluate(&defs) {
            Err(Error::Recursion(chain)) => assert_eq!(chain, "a -> b -> a"),
            other => panic!("{:?}", other),
        }
        let defs = scope(&[("a", "a + 1")]);
        assert!(matches!(
            parse("a").unwrap().evaluate(&defs),
            Err(Error::Recursion(_))
        ));
    }

    #[test]
    fn shared_symbol_is_not_recursion() {
        let defs = scope(&[("a", "b + b"), ("b", "1")]);
        assert_eq!(parse("a").unwrap().evaluate(&defs).ok(), Some(Some(2)));
    }

    #[test]
    fn cond() {
        let defs = scope(&[("r", "3")]);
        let expr = Expr::cond(parse("r - 3").unwrap(), Expr::Num(1), Expr::Num(3));
        assert_eq!(expr.evaluate(&defs).ok(), Some(Some(1)));
        let expr = Expr::cond(parse("r - 2").unwrap(), Expr::Num(1), Expr::Num(3));
        assert_eq!(expr.evaluate(&defs).ok(), Some(Some(3)));
        let expr = Expr::cond(parse("q").unwrap(), Expr::Num(1), Expr::Num(3));
        assert_eq!(expr.evaluate(&defs).ok(), Some(None));
    }
}
