use std::fmt;

use serde::Serialize;

use crate::{
    error::Error,
    expr::{Expr, Scope},
    symbol::START,
};

/// An address, either fixed or an offset from the load address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub relative: bool,
    pub address: u16,
}

impl Location {
    pub fn absolute(address: u16) -> Self {
        Location {
            relative: false,
            address,
        }
    }

    pub fn relative(address: u16) -> Self {
        Location {
            relative: true,
            address,
        }
    }

    /// Reads an address expression: a constant, or the start plus a
    /// constant. Anything else cannot be placed by a loader.
    pub fn of(expr: &Expr, scope: &dyn Scope) -> Result<Location, Error> {
        let linear = expr.linearize(scope, true)?;
        let address = linear.constant as u16;
        match linear.live_terms().as_slice() {
            [] => Ok(Location::absolute(address)),
            [(Expr::Sym(name), 1)] if name == START => Ok(Location::relative(address)),
            _ => Err(Error::TooComplex(linear.to_expr().to_string())),
        }
    }

    pub fn offset(self, n: u16) -> Location {
        Location {
            address: self.address.wrapping_add(n),
            ..self
        }
    }

    pub fn page(self) -> u16 {
        self.address & 0xFE00
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.relative {
            true => write!(f, "{:04X}'", self.address),
            false => write!(f, "{:04X}", self.address),
        }
    }
}
