use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{
    error::Error,
    expr::{Expr, Scope},
};

/// Significant characters of a label.
pub const MAX_LABEL_LEN: usize = 6;

/// Load address of the segment. Unbound for relocatable programs.
pub const START: &str = "%start";
/// First address after the segment's code.
pub const END: &str = "%end";

pub fn truncate(name: &str) -> String {
    name.chars().take(MAX_LABEL_LEN).collect()
}

/// Names the assembler binds itself. Users cannot spell them.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with('%')
}

pub fn rebase(n: usize) -> String {
    format!("%rb{}", n)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Symbol {
    pub value: Option<Expr>,
    pub defined_at: Option<usize>,
    pub referenced_at: Option<usize>,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, name: &str) -> &mut Symbol {
        self.symbols.entry(name.to_string()).or_default()
    }

    /// Records a use, keeping the first line it appeared on.
    pub fn reference(&mut self, name: &str, line: usize) {
        let symbol = self.get_or_create(name);
        if symbol.referenced_at.is_none() {
            symbol.referenced_at = Some(line);
        }
    }

    /// Binds a value once. Rebinding is an error, even to the same value.
    pub fn bind(&mut self, name: &str, value: Expr, line: Option<usize>) -> Result<(), Error> {
        let symbol = self.get_or_create(name);
        if symbol.value.is_some() {
            return Err(Error::AlreadyDefined(name.to_string()));
        }
        symbol.value = Some(value);
        symbol.defined_at = line;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Symbol> {
        self.symbols.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    pub fn value(&self, name: &str) -> Option<&Expr> {
        self.symbols.get(name)?.value.as_ref()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Entries ordered by name.
    pub fn sorted(&self) -> Vec<(&str, &Symbol)> {
        let mut list: Vec<(&str, &Symbol)> = self
            .symbols
            .iter()
            .map(|(name, symbol)| (name.as_str(), symbol))
            .collect();
        list.sort_by(|a, b| a.0.cmp(b.0));
        list
    }

    /// User symbols that never got a value.
    pub fn undefined(&self) -> Vec<(&str, &Symbol)> {
        self.sorted()
            .into_iter()
            .filter(|(name, symbol)| symbol.value.is_none() && !is_reserved(name))
            .collect()
    }

    /// Replaces every bound value with its closed form: bound symbols
    /// substituted, like terms collected. Unbound symbols such as the
    /// relocatable start stay as references.
    ///
    /// Symbols caught in a definition cycle keep their value and are
    /// returned with the recursion error.
    pub fn expand_all(&mut self) -> Vec<(String, Error)> {
        let mut done: HashMap<String, Expr> = HashMap::new();
        let mut errors = vec![];
        let names: Vec<String> = self
            .sorted()
            .into_iter()
            .filter(|(_, symbol)| symbol.value.is_some())
            .map(|(name, _)| name.to_string())
            .collect();
        for name in names {
            if let Err(err) = self.expand(&name, &mut done, &mut vec![]) {
                errors.push((name, err));
            }
        }
        for (name, expr) in done {
            if let Some(symbol) = self.symbols.get_mut(&name) {
                symbol.value = Some(expr);
            }
        }
        errors
    }

    fn expand(
        &self,
        name: &str,
        done: &mut HashMap<String, Expr>,
        chain: &mut Vec<String>,
    ) -> Result<Expr, Error> {
        if let Some(expr) = done.get(name) {
            return Ok(expr.clone());
        }
        if chain.iter().any(|n| n == name) {
            chain.push(name.to_string());
            return Err(Error::Recursion(chain.join(" -> ")));
        }
        let Some(value) = self.value(name) else {
            return Ok(Expr::sym(name));
        };
        chain.push(name.to_string());
        let substituted = self.substitute(value, done, chain)?;
        chain.pop();
        let closed = substituted.simplify(&(), false)?;
        done.insert(name.to_string(), closed.clone());
        Ok(closed)
    }

    fn substitute(
        &self,
        expr: &Expr,
        done: &mut HashMap<String, Expr>,
        chain: &mut Vec<String>,
    ) -> Result<Expr, Error> {
        Ok(match expr {
            Expr::Num(_) => expr.clone(),
            Expr::Sym(name) => self.expand(name, done, chain)?,
            Expr::Unary(op, operand) => Expr::unary(*op, self.substitute(operand, done, chain)?),
            Expr::Binary(op, lhs, rhs) => Expr::binary(
                *op,
                self.substitute(lhs, done, chain)?,
                self.substitute(rhs, done, chain)?,
            ),
            Expr::Cond { test, zero, other } => Expr::cond(
                self.substitute(test, done, chain)?,
                self.substitute(zero, done, chain)?,
                self.substitute(other, done, chain)?,
            ),
        })
    }
}

impl Scope for SymbolTable {
    fn lookup(&self, name: &str) -> Option<&Expr> {
        self.value(name)
    }
}
