use arch::reg::Reg;

use super::{Assoc, Expr, Operator};
use crate::{error::Error, symbol};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Num(i16),
    Ident(String),
    Op(Operator),
    Open,
    Close,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Num(n) => n.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Op(op) => op.token().to_string(),
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn lex(text: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = vec![];
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
        } else if c == '(' {
            tokens.push(Token::Open);
            rest = &rest[1..];
        } else if c == ')' {
            tokens.push(Token::Close);
            rest = &rest[1..];
        } else if let Some((op, len)) = Operator::scan(rest) {
            tokens.push(Token::Op(op));
            rest = &rest[len..];
        } else if is_word_char(c) {
            let len = rest.find(|c| !is_word_char(c)).unwrap_or(rest.len());
            tokens.push(word(&rest[..len])?);
            rest = &rest[len..];
        } else {
            return Err(Error::UnexpectedChar(c));
        }
    }
    Ok(tokens)
}

fn radix_value(word: &str, digits: &str, radix: u32) -> Result<i16, Error> {
    if digits.is_empty() {
        return Err(Error::InvalidNumber(word.to_string()));
    }
    let value = u32::from_str_radix(digits, radix).map_err(|err| match err.kind() {
        std::num::IntErrorKind::PosOverflow => Error::NumberOverflow(word.to_string()),
        _ => Error::InvalidNumber(word.to_string()),
    })?;
    if value > 0xFFFF {
        return Err(Error::NumberOverflow(word.to_string()));
    }
    Ok(value as u16 as i16)
}

/// Number literal, or `None` when the word is a name.
///
/// `0x1F`, `x1F`, `0b101`, `017` (octal) and plain decimal. Values up to
/// 0xFFFF are accepted and stored as the word they spell.
pub fn number(word: &str) -> Result<Option<i16>, Error> {
    let Some(first) = word.chars().next() else {
        return Ok(None);
    };
    if first.is_ascii_digit() {
        let lower = word.to_ascii_lowercase();
        let value = if let Some(hex) = lower.strip_prefix("0x") {
            radix_value(word, hex, 16)?
        } else if let Some(bin) = lower.strip_prefix("0b") {
            radix_value(word, bin, 2)?
        } else if lower.len() > 1 && lower.starts_with('0') {
            radix_value(word, &lower[1..], 8)?
        } else {
            radix_value(word, &lower, 10)?
        };
        return Ok(Some(value));
    }
    if first == 'x' || first == 'X' {
        let digits = &word[1..];
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return radix_value(word, digits, 16).map(Some);
        }
    }
    Ok(None)
}

fn word(text: &str) -> Result<Token, Error> {
    if let Some(value) = number(text)? {
        return Ok(Token::Num(value));
    }
    if text.parse::<Reg>().is_ok() {
        return Err(Error::RegisterInExpression(text.to_string()));
    }
    Ok(Token::Ident(symbol::truncate(text)))
}

fn reduce(operands: &mut Vec<Expr>, ops: &mut Vec<(Operator, bool)>) -> Result<(), Error> {
    let Some((op, unary)) = ops.pop() else {
        return Ok(());
    };
    let missing = || Error::MissingOperand(format!("`{}`", op.token()));
    if unary {
        let operand = operands.pop().ok_or_else(missing)?;
        operands.push(Expr::unary(op, operand));
    } else {
        let rhs = operands.pop().ok_or_else(missing)?;
        let lhs = operands.pop().ok_or_else(missing)?;
        operands.push(Expr::binary(op, lhs, rhs));
    }
    Ok(())
}

/// Parses infix text with an explicit operator stack.
///
/// `-` and `~` are unary where an operand is expected. Names are cut to
/// the significant label length.
pub fn parse(text: &str) -> Result<Expr, Error> {
    let tokens = lex(text)?;
    if tokens.is_empty() {
        return Err(Error::MissingOperand("end of expression".to_string()));
    }

    let mut operands: Vec<Expr> = vec![];
    // Operator with its unary flag
    let mut ops: Vec<(Operator, bool)> = vec![];
    let mut expect_operand = true;

    for token in tokens {
        match token {
            Token::Num(_) | Token::Ident(_) | Token::Open if !expect_operand => {
                return Err(Error::ConsecutiveOperands(token.text()));
            }
            Token::Num(value) => {
                operands.push(Expr::Num(value));
                expect_operand = false;
            }
            Token::Ident(name) => {
                operands.push(Expr::Sym(name));
                expect_operand = false;
            }
            Token::Open => ops.push((Operator::Group, false)),
            Token::Close => {
                if expect_operand {
                    return Err(Error::MissingOperand("`)`".to_string()));
                }
                loop {
                    match ops.last() {
                        None => return Err(Error::UnopenedGroup),
                        Some((Operator::Group, _)) => {
                            ops.pop();
                            break;
                        }
                        Some(_) => reduce(&mut operands, &mut ops)?,
                    }
                }
            }
            Token::Op(op) if expect_operand => {
                if !op.is_unary() {
                    return Err(Error::ConsecutiveOperators(op.token().to_string()));
                }
                ops.push((op, true));
            }
            Token::Op(op) => {
                if !op.is_binary() {
                    return Err(Error::ConsecutiveOperands(op.token().to_string()));
                }
                while let Some(&(top, _)) = ops.last() {
                    if top == Operator::Group {
                        break;
                    }
                    let tighter = top.prec() > op.prec()
                        || (top.prec() == op.prec() && op.assoc() == Assoc::Left);
                    if !tighter {
                        break;
                    }
                    reduce(&mut operands, &mut ops)?;
                }
                ops.push((op, false));
                expect_operand = true;
            }
        }
    }

    if expect_operand {
        return Err(Error::MissingOperand("end of expression".to_string()));
    }
    while let Some(&(top, _)) = ops.last() {
        if top == Operator::Group {
            return Err(Error::UnclosedGroup);
        }
        reduce(&mut operands, &mut ops)?;
    }
    match (operands.pop(), operands.is_empty()) {
        (Some(expr), true) => Ok(expr),
        _ => Err(Error::MissingOperand("end of expression".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_number {
        ($($name:ident: $word:expr => $expect:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(number($word).ok(), Some($expect));
                }
            )*
        }
    }

    test_number! {
        num_decimal: "42" => Some(42),
        num_zero: "0" => Some(0),
        num_hex: "0x3000" => Some(0x3000),
        num_hex_upper: "0XFF" => Some(0xFF),
        num_hex_x: "x3000" => Some(0x3000),
        num_hex_big_x: "XFFFF" => Some(-1),
        num_binary: "0b1010" => Some(10),
        num_octal: "017" => Some(15),
        num_max: "65535" => Some(-1),
        name_x: "x" => None,
        name_xy: "xyz" => None,
        name_label: "LOOP" => None,
    }

    #[test]
    fn bad_numbers() {
        assert!(matches!(number("65536"), Err(Error::NumberOverflow(_))));
        assert!(matches!(number("x10000"), Err(Error::NumberOverflow(_))));
        assert!(matches!(number("0x"), Err(Error::InvalidNumber(_))));
        assert!(matches!(number("09"), Err(Error::InvalidNumber(_))));
        assert!(matches!(number("12ab"), Err(Error::InvalidNumber(_))));
    }

    #[test]
    fn shape() {
        let expr = parse("a + b * c").unwrap();
        assert_eq!(
            expr,
            Expr::add(
                Expr::sym("a"),
                Expr::binary(Operator::Mul, Expr::sym("b"), Expr::sym("c"))
            )
        );
        let expr = parse("-x").unwrap();
        assert_eq!(expr, Expr::unary(Operator::Sub, Expr::sym("x")));
    }

    #[test]
    fn names_are_truncated() {
        assert_eq!(parse("counter1").unwrap(), Expr::sym("counte"));
        assert_eq!(parse("abc_1").unwrap(), Expr::sym("abc_1"));
    }

    macro_rules! test_error {
        ($($name:ident: $src:expr => $pat:pat,)*) => {
            $(
                #[test]
                fn $name() {
                    let result = parse($src);
                    assert!(matches!(result, Err($pat)), "{:?}", result);
                }
            )*
        }
    }

    test_error! {
        err_two_operands: "1 2" => Error::ConsecutiveOperands(_),
        err_operand_group: "a (b)" => Error::ConsecutiveOperands(_),
        err_two_operators: "1 * / 2" => Error::ConsecutiveOperators(_),
        err_trailing: "1 +" => Error::MissingOperand(_),
        err_empty: "" => Error::MissingOperand(_),
        err_empty_group: "()" => Error::MissingOperand(_),
        err_unclosed: "(1 + 2" => Error::UnclosedGroup,
        err_unopened: "1 + 2)" => Error::UnopenedGroup,
        err_complement_binary: "1 ~ 2" => Error::ConsecutiveOperands(_),
        err_register: "R1 + 1" => Error::RegisterInExpression(_),
        err_char: "a @ b" => Error::UnexpectedChar('@'),
    }
}
