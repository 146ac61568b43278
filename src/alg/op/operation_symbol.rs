//! Operation symbols and similarity types.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{UACalcError, UACalcResult};

/// The symbol of an operation: a name with an arity.
///
/// Two symbols are equal iff their names and arities match; the
/// associativity hint takes no part in equality. Symbols order
/// higher-arity first, ties broken by name, which keeps similarity
/// types and operation lists in a canonical order.
#[derive(Debug, Clone, Serialize)]
pub struct OperationSymbol {
    name: String,
    arity: usize,
    associative: bool,
}

impl OperationSymbol {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        OperationSymbol { name: name.into(), arity, associative: false }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn is_associative(&self) -> bool {
        self.associative
    }

    /// Mark a binary symbol as associative. Rejected for other arities.
    pub fn set_associative(&mut self, associative: bool) -> UACalcResult<()> {
        if associative && self.arity != 2 {
            return Err(UACalcError::invariant(format!(
                "symbol {}: associativity can only be set on binary symbols, arity is {}",
                self.name, self.arity
            )));
        }
        self.associative = associative;
        Ok(())
    }
}

impl PartialEq for OperationSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

impl Eq for OperationSymbol {}

impl Hash for OperationSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.arity.hash(state);
    }
}

impl PartialOrd for OperationSymbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OperationSymbol {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .arity
            .cmp(&self.arity)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for OperationSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The ordered signature shared by similar algebras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarityType {
    symbols: Vec<OperationSymbol>,
}

impl SimilarityType {
    pub fn new(symbols: Vec<OperationSymbol>) -> UACalcResult<Self> {
        for (i, a) in symbols.iter().enumerate() {
            for b in &symbols[i + 1..] {
                if a == b {
                    return Err(UACalcError::invariant(format!(
                        "similarity type: duplicate symbol {} of arity {}",
                        a.name(),
                        a.arity()
                    )));
                }
            }
        }
        Ok(SimilarityType { symbols })
    }

    /// For callers whose invariants already guarantee uniqueness
    /// (algebra constructors validate their symbol lists up front).
    pub(crate) fn new_unchecked(symbols: Vec<OperationSymbol>) -> Self {
        SimilarityType { symbols }
    }

    pub fn symbols(&self) -> &[OperationSymbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, sym: &OperationSymbol) -> bool {
        self.symbols.iter().any(|s| s == sym)
    }
}

impl fmt::Display for SimilarityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for (i, s) in self.symbols.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}/{}", s.name(), s.arity())?;
        }
        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_associativity() {
        let a = OperationSymbol::new("f", 2);
        let mut b = OperationSymbol::new("f", 2);
        b.set_associative(true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn order_is_arity_first() {
        let f1 = OperationSymbol::new("f", 1);
        let g2 = OperationSymbol::new("g", 2);
        let f2 = OperationSymbol::new("f", 2);
        assert!(g2 < f1);
        assert!(f2 < g2);
    }

    #[test]
    fn associativity_rejected_off_binary() {
        let mut c = OperationSymbol::new("c", 0);
        assert!(c.set_associative(true).is_err());
    }

    #[test]
    fn similarity_type_rejects_duplicates() {
        let syms = vec![OperationSymbol::new("f", 2), OperationSymbol::new("f", 2)];
        assert!(SimilarityType::new(syms).is_err());
        let syms = vec![OperationSymbol::new("f", 2), OperationSymbol::new("f", 1)];
        assert!(SimilarityType::new(syms).is_ok());
    }
}
