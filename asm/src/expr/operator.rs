use bimap::BiMap;
use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Or,
    Xor,
    And,
    Shl,
    Shr,
    /// Logical right shift.
    Ushr,
    Add,
    /// Binary minus, or negation when unary.
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    /// Bitwise complement, unary only.
    Not,
    /// Open parenthesis while it waits on the parser stack.
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

static TOKENS: Lazy<BiMap<Operator, &'static str>> = Lazy::new(|| {
    use Operator::*;
    let mut map = BiMap::new();
    map.insert(Or, "|");
    map.insert(Xor, "^");
    map.insert(And, "&");
    map.insert(Shl, "<<");
    map.insert(Shr, ">>");
    map.insert(Ushr, ">>>");
    map.insert(Add, "+");
    map.insert(Sub, "-");
    map.insert(Mul, "*");
    map.insert(Div, "/");
    map.insert(Rem, "%");
    map.insert(Pow, "**");
    map.insert(Not, "~");
    map.insert(Group, "(");
    map
});

impl Operator {
    pub fn token(self) -> &'static str {
        TOKENS.get_by_left(&self).copied().unwrap_or("?")
    }

    pub fn from_token(token: &str) -> Option<Operator> {
        TOKENS.get_by_right(token).copied()
    }

    /// Longest operator token at the start of `text`.
    pub fn scan(text: &str) -> Option<(Operator, usize)> {
        (1..=3).rev().find_map(|n| {
            let token = text.get(..n)?;
            match Operator::from_token(token)? {
                Operator::Group => None,
                op => Some((op, n)),
            }
        })
    }

    /// Higher binds tighter.
    pub fn prec(self) -> u8 {
        use Operator::*;
        match self {
            Group => 0,
            Or => 1,
            Xor => 2,
            And => 3,
            Shl | Shr | Ushr => 4,
            Add | Sub => 5,
            Mul | Div | Rem => 6,
            Pow => 7,
            Not => 8,
        }
    }

    pub fn assoc(self) -> Assoc {
        match self {
            Operator::Pow => Assoc::Right,
            _ => Assoc::Left,
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Operator::Sub | Operator::Not)
    }

    pub fn is_binary(self) -> bool {
        !matches!(self, Operator::Not | Operator::Group)
    }

    /// Word arithmetic. Results wrap to 16 bits.
    pub fn apply(self, a: i16, b: i16) -> i16 {
        use Operator::*;
        let (x, y) = (a as i32, b as i32);
        let result = match self {
            Or => x | y,
            Xor => x ^ y,
            And => x & y,
            Shl => x.wrapping_shl(y as u32),
            Shr => x.wrapping_shr(y as u32),
            Ushr => (a as u16 as i32).wrapping_shr(y as u32),
            Add => x.wrapping_add(y),
            Sub => x.wrapping_sub(y),
            Mul => x.wrapping_mul(y),
            // x / 0 = -1, x % 0 = x
            Div if y == 0 => -1,
            Div => x.wrapping_div(y),
            Rem if y == 0 => x,
            Rem => x.wrapping_rem(y),
            Pow => ((x as f64).powf(y as f64) as i64 & 0xFFFF) as i32,
            Not | Group => x,
        };
        result as i16
    }

    pub fn apply_unary(self, a: i16) -> i16 {
        match self {
            Operator::Sub => a.wrapping_neg(),
            Operator::Not => !a,
            _ => a,
        }
    }
}
