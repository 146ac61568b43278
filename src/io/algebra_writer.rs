//! Writer for the native `.ua` algebra files, inverse to the reader.

use std::fmt::Write as _;
use std::path::Path;

use crate::alg::algebra::SmallAlgebra;
use crate::error::{UACalcError, UACalcResult};
use crate::util::horner::horner_table_size;

/// Basic emits the carrier and operations; Extended additionally emits
/// any congruence data already cached on the algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStyle {
    Basic,
    Extended,
}

/// Write an algebra to a file.
pub fn write(
    alg: &dyn SmallAlgebra,
    path: impl AsRef<Path>,
    style: WriteStyle,
) -> UACalcResult<()> {
    let text = write_to_string(alg, style)?;
    std::fs::write(path.as_ref(), text)?;
    Ok(())
}

pub fn write_to_string(alg: &dyn SmallAlgebra, style: WriteStyle) -> UACalcResult<String> {
    let mut out = String::new();
    let n = alg.cardinality();
    out.push_str("<?xml version=\"1.0\"?>\n");
    out.push_str("<algebra>\n");
    out.push_str("  <basicAlgebra>\n");
    let _ = writeln!(out, "    <algName>{}</algName>", alg.name());
    let _ = writeln!(out, "    <cardinality>{}</cardinality>", n);
    out.push_str("    <operations>\n");
    for op in alg.operations() {
        let arity = op.arity();
        out.push_str("      <op>\n");
        out.push_str("        <opSymbol>\n");
        let _ = writeln!(out, "          <opName>{}</opName>", op.symbol().name());
        let _ = writeln!(out, "          <arity>{}</arity>", arity);
        out.push_str("        </opSymbol>\n");
        out.push_str("        <opTable>\n");
        out.push_str("          <intArray>\n");
        let table_size = horner_table_size(arity, n).ok_or_else(|| {
            UACalcError::out_of_range(format!(
                "writing {}: table size overflows for {}",
                alg.name(),
                op.symbol()
            ))
        })?;
        let row_len = if arity == 0 { 1 } else { n };
        let mut row: Vec<String> = Vec::with_capacity(row_len);
        for k in 0..table_size {
            row.push(op.int_value_at_index(k)?.to_string());
            if row.len() == row_len {
                let _ = writeln!(out, "            <row>{}</row>", row.join(","));
                row.clear();
            }
        }
        if !row.is_empty() {
            let _ = writeln!(out, "            <row>{}</row>", row.join(","));
        }
        out.push_str("          </intArray>\n");
        out.push_str("        </opTable>\n");
        out.push_str("      </op>\n");
    }
    out.push_str("    </operations>\n");
    if style == WriteStyle::Extended {
        if let Ok(principals) = alg.con().principals() {
            out.push_str("    <congruences>\n");
            for p in principals {
                let reps: Vec<String> = (0..p.universe_size())
                    .map(|i| p.representative(i).to_string())
                    .collect();
                let _ = writeln!(
                    out,
                    "      <congruence><intArray>{}</intArray></congruence>",
                    reps.join(",")
                );
            }
            out.push_str("    </congruences>\n");
        }
    }
    out.push_str("  </basicAlgebra>\n");
    out.push_str("</algebra>\n");
    Ok(out)
}
