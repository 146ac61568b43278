//! Reader for the native `.ua`/`.alg` algebra files.
//!
//! The format is an XML-like tree: an `<algebra>` wraps a
//! `<basicAlgebra>` with `<algName>`, `<cardinality>` and an
//! `<operations>` list of `<op>` entries, each carrying an
//! `<opSymbol>` (name and arity) and an `<opTable>` of comma-separated
//! rows in row-major order. Lines whose first non-blank character is
//! `%` are comments. An `<algebraList>` wraps several algebras.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

use crate::alg::algebra::BasicAlgebra;
use crate::alg::op::operation::{IntOperation, Operation};
use crate::alg::op::operation_symbol::OperationSymbol;
use crate::error::{UACalcError, UACalcResult};
use crate::util::horner::horner_table_size;
use std::sync::Arc;

/// Read one algebra from a file.
pub fn read(path: impl AsRef<Path>) -> UACalcResult<BasicAlgebra> {
    let text = std::fs::read_to_string(path.as_ref())?;
    read_from_str(&text)
}

/// Read a list of algebras from a file.
pub fn read_list(path: impl AsRef<Path>) -> UACalcResult<Vec<BasicAlgebra>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    read_list_from_str(&text)
}

pub fn read_from_str(text: &str) -> UACalcResult<BasicAlgebra> {
    let mut algebras = read_list_from_str(text)?;
    if algebras.is_empty() {
        return Err(UACalcError::parse("algebra file holds no algebra"));
    }
    Ok(algebras.swap_remove(0))
}

pub fn read_list_from_str(text: &str) -> UACalcResult<Vec<BasicAlgebra>> {
    AlgebraReader::new(text).parse_all()
}

/// Streaming parser over the XML events of one file.
pub struct AlgebraReader {
    source: String,
}

#[derive(Default)]
struct ParseState {
    tag_stack: Vec<String>,
    text: String,
    alg_name: Option<String>,
    cardinality: Option<usize>,
    op_name: Option<String>,
    arity: Option<usize>,
    table: Vec<usize>,
    ops: Vec<Arc<dyn Operation>>,
    algebras: Vec<BasicAlgebra>,
}

impl AlgebraReader {
    pub fn new(text: &str) -> Self {
        // Strip %-comment lines before handing the rest to the XML
        // parser.
        let source: String = text
            .lines()
            .filter(|line| !line.trim_start().starts_with('%'))
            .collect::<Vec<&str>>()
            .join("\n");
        AlgebraReader { source }
    }

    pub fn parse_all(&self) -> UACalcResult<Vec<BasicAlgebra>> {
        let mut reader = Reader::from_str(&self.source);
        reader.trim_text(true);
        let mut state = ParseState::default();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    state.start_element(&name);
                }
                Ok(Event::Text(t)) => {
                    let txt = t
                        .unescape()
                        .map_err(|e| UACalcError::parse(format!("bad text content: {}", e)))?;
                    state.text.push_str(&txt);
                }
                Ok(Event::End(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    state.end_element(&name)?;
                }
                Ok(Event::Empty(_)) => {}
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(UACalcError::parse(format!("malformed algebra file: {}", e)));
                }
            }
        }
        Ok(state.algebras)
    }
}

impl ParseState {
    fn start_element(&mut self, name: &str) {
        self.tag_stack.push(name.to_string());
        self.text.clear();
        if name == "opTable" || name == "op" {
            self.table.clear();
        }
        if name == "basicAlgebra" || name == "algebra" {
            self.ops.clear();
            self.alg_name = None;
            self.cardinality = None;
        }
    }

    fn parent(&self) -> Option<&str> {
        if self.tag_stack.len() < 2 {
            None
        } else {
            self.tag_stack
                .get(self.tag_stack.len() - 2)
                .map(|s| s.as_str())
        }
    }

    fn end_element(&mut self, name: &str) -> UACalcResult<()> {
        let parent = self.parent().map(|s| s.to_string());
        match name {
            "algName" => {
                self.alg_name = Some(self.text.trim().to_string());
            }
            "opName" => {
                self.op_name = Some(self.text.trim().to_string());
            }
            "cardinality" => {
                self.cardinality = Some(parse_usize(self.text.trim(), "cardinality")?);
            }
            "arity" => {
                self.arity = Some(parse_usize(self.text.trim(), "arity")?);
            }
            "row" | "intArray" if parent.as_deref() == Some("opTable")
                || self.tag_stack.iter().any(|t| t == "opTable") =>
            {
                for piece in self.text.split(',') {
                    let piece = piece.trim();
                    if piece.is_empty() {
                        continue;
                    }
                    self.table.push(parse_usize(piece, "operation table entry")?);
                }
            }
            "op" => {
                let op_name = self.op_name.take().ok_or_else(|| {
                    UACalcError::parse("operation without an <opName>")
                })?;
                let arity = self.arity.take().ok_or_else(|| {
                    UACalcError::parse(format!("operation {} without an <arity>", op_name))
                })?;
                let cardinality = self.cardinality.ok_or_else(|| {
                    UACalcError::parse(format!(
                        "operation {} before the algebra's <cardinality>",
                        op_name
                    ))
                })?;
                let expected =
                    horner_table_size(arity, cardinality).ok_or_else(|| {
                        UACalcError::parse(format!(
                            "operation {}: table size overflows",
                            op_name
                        ))
                    })?;
                if self.table.len() != expected {
                    return Err(UACalcError::parse(format!(
                        "operation {}: table has {} entries, expected {}^{} = {}",
                        op_name,
                        self.table.len(),
                        cardinality,
                        arity,
                        expected
                    )));
                }
                let table = std::mem::take(&mut self.table);
                let op = IntOperation::new(
                    OperationSymbol::new(op_name, arity),
                    cardinality,
                    table,
                )
                .map_err(|e| UACalcError::parse(e.to_string()))?;
                self.ops.push(Arc::new(op));
            }
            "basicAlgebra" => {
                let alg_name = self
                    .alg_name
                    .take()
                    .unwrap_or_else(|| "unnamed".to_string());
                let cardinality = self.cardinality.take().ok_or_else(|| {
                    UACalcError::parse(format!("algebra {} without a <cardinality>", alg_name))
                })?;
                let ops = std::mem::take(&mut self.ops);
                self.algebras.push(BasicAlgebra::new(alg_name, cardinality, ops)?);
            }
            _ => {}
        }
        self.tag_stack.pop();
        self.text.clear();
        Ok(())
    }
}

fn parse_usize(s: &str, what: &str) -> UACalcResult<usize> {
    s.parse::<usize>().map_err(|_| {
        UACalcError::parse(format!("{}: '{}' is not a nonnegative integer", what, s))
    })
}
