use arch::{format::is_mnemonic, reg::Reg};

use crate::error::Error;

// ----------------------------------------------------------------------------
// Operand

/// One comma-separated argument, classified by its spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg),
    Str(String),
    /// Text after `=`.
    Literal(String),
    /// Text with any leading `#` removed.
    Expr(String),
}

impl Operand {
    pub fn parse(text: &str) -> Result<Operand, Error> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyArgument);
        }
        if let Ok(reg) = text.parse::<Reg>() {
            return Ok(Operand::Reg(reg));
        }
        if text.starts_with('"') {
            return unquote(text).map(Operand::Str);
        }
        if let Some(rest) = text.strip_prefix('=') {
            return Ok(Operand::Literal(rest.trim().to_string()));
        }
        let text = text.strip_prefix('#').unwrap_or(text);
        Ok(Operand::Expr(text.trim().to_string()))
    }
}

fn unquote(text: &str) -> Result<String, Error> {
    let unterminated = || Error::UnterminatedString(text.to_string());
    let body = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .filter(|_| text.len() >= 2)
        .ok_or_else(unterminated)?;
    let mut out = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                Some(c) => out.push(c),
                None => return Err(unterminated()),
            },
            '"' => return Err(unterminated()),
            c => out.push(c),
        }
    }
    Ok(out)
}

// ----------------------------------------------------------------------------
// Line

#[derive(Debug, Clone, Default)]
pub struct Line {
    /// 0-based line index
    pub idx: usize,
    pub raw: String,
    pub label: Option<String>,
    /// Directive or mnemonic, uppercased.
    pub opcode: Option<String>,
    pub args: Vec<Operand>,
    pub comment: Option<String>,
}

/// Splits at the first `;` outside a string.
fn split_comment(text: &str) -> (&str, Option<&str>) {
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => return (&text[..i], Some(&text[i + 1..])),
            _ => {}
        }
    }
    (text, None)
}

/// Splits at commas outside strings.
fn split_args(text: &str) -> Vec<&str> {
    let mut list = vec![];
    let mut quoted = false;
    let mut escaped = false;
    let mut begin = 0;
    for (i, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                list.push(&text[begin..i]);
                begin = i + 1;
            }
            _ => {}
        }
    }
    list.push(&text[begin..]);
    list
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim_start()),
        None => (text, ""),
    }
}

fn is_opcode(word: &str) -> bool {
    word.starts_with('.') || is_mnemonic(word)
}

fn check_label(label: &str) -> Result<(), Error> {
    let valid = label
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && label.parse::<Reg>().is_err();
    match valid {
        true => Ok(()),
        false => Err(Error::InvalidLabel(label.to_string())),
    }
}

impl Line {
    /// `[label[:]] [opcode [arg {, arg}]] [; comment]`
    ///
    /// The first word is the opcode when it is a directive or mnemonic,
    /// otherwise it is a label.
    pub fn parse(idx: usize, raw: &str) -> Result<Line, Error> {
        let (code, comment) = split_comment(raw);
        let mut line = Line {
            idx,
            raw: raw.to_string(),
            comment: comment.map(|c| c.to_string()),
            ..Default::default()
        };

        let (first, rest) = split_word(code);
        if first.is_empty() {
            return Ok(line);
        }
        let (opcode, rest) = if is_opcode(first) {
            (first, rest)
        } else {
            let label = first.strip_suffix(':').unwrap_or(first);
            check_label(label)?;
            line.label = Some(label.to_string());
            split_word(rest)
        };
        if opcode.is_empty() {
            return Ok(line);
        }
        line.opcode = Some(opcode.to_ascii_uppercase());

        let rest = rest.trim();
        if !rest.is_empty() {
            line.args = split_args(rest)
                .into_iter()
                .map(Operand::parse)
                .collect::<Result<Vec<_>, _>>()?;
        }
        Ok(line)
    }

    /// 1-based line number
    pub fn no(&self) -> usize {
        self.idx + 1
    }

    pub fn is_blank(&self) -> bool {
        self.label.is_none() && self.opcode.is_none()
    }
}
