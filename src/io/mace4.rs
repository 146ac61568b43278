//! Reader for Mace4 model files.
//!
//! Accepts the `interpretation(N, [attrs], [entries])` shape produced
//! by Mace4: `N` is the cardinality, each function entry is
//! `function(name(_,..,_), [v0,v1,..])` with the blank tuple giving the
//! arity and the value list of length `N^arity` in row-major order.
//! Constants appear as `function(name, [v])`.

use std::path::Path;
use std::sync::Arc;

use crate::alg::algebra::BasicAlgebra;
use crate::alg::op::operation::{IntOperation, Operation};
use crate::alg::op::operation_symbol::OperationSymbol;
use crate::error::{UACalcError, UACalcResult};
use crate::util::horner::horner_table_size;

/// Read every interpretation in the file.
pub fn read_mace4(path: impl AsRef<Path>) -> UACalcResult<Vec<BasicAlgebra>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let stem = path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "mace4".to_string());
    read_mace4_from_str(&text, &stem)
}

pub fn read_mace4_from_str(text: &str, name_hint: &str) -> UACalcResult<Vec<BasicAlgebra>> {
    let mut parser = Mace4Parser::new(text);
    let mut algebras = Vec::new();
    while parser.skip_to_keyword("interpretation") {
        let alg = parser.parse_interpretation()?;
        let name = if algebras.is_empty() {
            name_hint.to_string()
        } else {
            format!("{}_{}", name_hint, algebras.len())
        };
        algebras.push(BasicAlgebra::new(name, alg.0, alg.1)?);
    }
    if algebras.is_empty() {
        return Err(UACalcError::parse("mace4 file holds no interpretation"));
    }
    Ok(algebras)
}

struct Mace4Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Mace4Parser {
    fn new(text: &str) -> Self {
        Mace4Parser { chars: text.chars().collect(), pos: 0 }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expect(&mut self, c: char) -> UACalcResult<()> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(UACalcError::parse(format!(
                "mace4: expected '{}' at position {}",
                c, self.pos
            )))
        }
    }

    /// Advance to just past the next occurrence of the keyword; false
    /// when it never occurs again.
    fn skip_to_keyword(&mut self, keyword: &str) -> bool {
        let kw: Vec<char> = keyword.chars().collect();
        while self.pos + kw.len() <= self.chars.len() {
            if self.chars[self.pos..self.pos + kw.len()] == kw[..] {
                self.pos += kw.len();
                return true;
            }
            self.pos += 1;
        }
        false
    }

    fn parse_usize(&mut self) -> UACalcResult<usize> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.chars.len() && self.chars[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(UACalcError::parse(format!(
                "mace4: expected an integer at position {}",
                start
            )));
        }
        let s: String = self.chars[start..self.pos].iter().collect();
        s.parse::<usize>()
            .map_err(|_| UACalcError::parse(format!("mace4: integer '{}' out of range", s)))
    }

    fn parse_name(&mut self) -> UACalcResult<String> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            if c.is_whitespace() || c == '(' || c == ')' || c == ',' || c == '[' || c == ']' {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(UACalcError::parse(format!(
                "mace4: expected a name at position {}",
                start
            )));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    /// Skip a balanced `[..]` block (the attribute list).
    fn skip_bracketed(&mut self) -> UACalcResult<()> {
        self.expect('[')?;
        let mut depth = 1;
        while self.pos < self.chars.len() && depth > 0 {
            match self.chars[self.pos] {
                '[' => depth += 1,
                ']' => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }
        if depth != 0 {
            return Err(UACalcError::parse("mace4: unbalanced attribute list"));
        }
        Ok(())
    }

    fn parse_interpretation(&mut self) -> UACalcResult<(usize, Vec<Arc<dyn Operation>>)> {
        self.expect('(')?;
        let cardinality = self.parse_usize()?;
        self.expect(',')?;
        self.skip_ws();
        self.skip_bracketed()?;
        self.expect(',')?;
        self.expect('[')?;
        let mut ops: Vec<Arc<dyn Operation>> = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.pos += 1;
                break;
            }
            let kind = self.parse_name()?;
            if kind != "function" {
                return Err(UACalcError::parse(format!(
                    "mace4: unsupported entry kind '{}'",
                    kind
                )));
            }
            self.expect('(')?;
            let op_name = self.parse_name()?;
            let mut arity = 0;
            self.skip_ws();
            if self.peek() == Some('(') {
                self.pos += 1;
                loop {
                    self.skip_ws();
                    match self.peek() {
                        Some('_') => {
                            arity += 1;
                            self.pos += 1;
                        }
                        Some(',') => {
                            self.pos += 1;
                        }
                        Some(')') => {
                            self.pos += 1;
                            break;
                        }
                        _ => {
                            return Err(UACalcError::parse(format!(
                                "mace4: bad placeholder tuple for {}",
                                op_name
                            )));
                        }
                    }
                }
            }
            self.expect(',')?;
            self.expect('[')?;
            let mut table = Vec::new();
            loop {
                self.skip_ws();
                if self.peek() == Some(']') {
                    self.pos += 1;
                    break;
                }
                table.push(self.parse_usize()?);
                self.skip_ws();
                if self.peek() == Some(',') {
                    self.pos += 1;
                }
            }
            self.expect(')')?;
            let expected = horner_table_size(arity, cardinality).ok_or_else(|| {
                UACalcError::parse(format!("mace4: table of {} overflows", op_name))
            })?;
            if table.len() != expected {
                return Err(UACalcError::parse(format!(
                    "mace4: function {} lists {} values, expected {}^{} = {}",
                    op_name,
                    table.len(),
                    cardinality,
                    arity,
                    expected
                )));
            }
            let op = IntOperation::new(
                OperationSymbol::new(op_name, arity),
                cardinality,
                table,
            )
            .map_err(|e| UACalcError::parse(e.to_string()))?;
            ops.push(Arc::new(op));
            self.skip_ws();
            if self.peek() == Some(',') {
                self.pos += 1;
            }
        }
        self.expect(')')?;
        Ok((cardinality, ops))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alg::algebra::SmallAlgebra;

    const Z3_MODEL: &str = r#"
interpretation( 3, [number=1, seconds=0], [
  function(*(_,_), [
    0,1,2,
    1,2,0,
    2,0,1 ]),
  function(e, [0]) ]).
"#;

    #[test]
    fn reads_an_interpretation() {
        let algs = read_mace4_from_str(Z3_MODEL, "z3").unwrap();
        assert_eq!(algs.len(), 1);
        let alg = &algs[0];
        assert_eq!(alg.name(), "z3");
        assert_eq!(alg.cardinality(), 3);
        assert_eq!(alg.operations().len(), 2);
        let star = &alg.operations()[0];
        assert_eq!(star.symbol().name(), "*");
        assert_eq!(star.int_value_at(&[2, 2]).unwrap(), 1);
        let e = &alg.operations()[1];
        assert_eq!(e.arity(), 0);
        assert_eq!(e.int_value_at(&[]).unwrap(), 0);
    }

    #[test]
    fn rejects_wrong_table_length() {
        let bad = Z3_MODEL.replace("2,0,1 ]),", "2,0 ]),");
        assert!(read_mace4_from_str(&bad, "z3").is_err());
    }

    #[test]
    fn rejects_relations() {
        let bad = Z3_MODEL.replace("function(e, [0])", "relation(r(_), [0,0,0])");
        assert!(read_mace4_from_str(&bad, "z3").is_err());
    }

    #[test]
    fn reads_multiple_interpretations() {
        let two = format!("{}\n{}", Z3_MODEL, Z3_MODEL);
        let algs = read_mace4_from_str(&two, "m").unwrap();
        assert_eq!(algs.len(), 2);
        assert_eq!(algs[1].name(), "m_1");
    }
}
