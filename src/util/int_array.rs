//! Hashable integer vectors.
//!
//! `IntArray` is the element type of big products (an element of
//! `A0 x A1 x ...` is its coordinate vector) and the pair/quadruple key
//! used throughout the type finder.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntArray {
    data: Vec<usize>,
}

impl IntArray {
    pub fn new(data: Vec<usize>) -> Self {
        IntArray { data }
    }

    pub fn from_slice(data: &[usize]) -> Self {
        IntArray { data: data.to_vec() }
    }

    /// The ordered pair `[a, b]`.
    pub fn pair(a: usize, b: usize) -> Self {
        IntArray { data: vec![a, b] }
    }

    /// The constant vector `[v; len]`.
    pub fn constant(v: usize, len: usize) -> Self {
        IntArray { data: vec![v; len] }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<usize> {
        self.data.get(i).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.data
    }

    /// Concatenation, used to stack identity instances side by side when
    /// searching for witness terms.
    pub fn concat(parts: &[&IntArray]) -> Self {
        let mut data = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
        for p in parts {
            data.extend_from_slice(&p.data);
        }
        IntArray { data }
    }
}

impl fmt::Display for IntArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for IntArray {
    fn from(data: Vec<usize>) -> Self {
        IntArray { data }
    }
}
