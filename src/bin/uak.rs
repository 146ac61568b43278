//! Minimal command wrapper over the kernel.
//!
//! `uak <command> [--key value ...]`. Success prints one JSON object on
//! stdout and exits 0; domain failures exit 1 with
//! `{"error": kind, "message": ...}`; unknown commands or bad flags
//! exit 2.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::process::ExitCode;

use uacalc_kernel::alg::malcev;
use uacalc_kernel::io::{self, WriteStyle};
use uacalc_kernel::prelude::*;

enum CliError {
    Usage(String),
    Domain(UACalcError),
}

impl From<UACalcError> for CliError {
    fn from(e: UACalcError) -> Self {
        CliError::Domain(e)
    }
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let command = match args.next() {
        Some(c) => c,
        None => {
            eprintln!("usage: uak <command> [--key value ...]");
            return ExitCode::from(2);
        }
    };
    let opts = match parse_opts(args.collect()) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::from(2);
        }
    };
    match run(&command, &opts) {
        Ok(mut body) => {
            if let Some(obj) = body.as_object_mut() {
                obj.insert("command".to_string(), json!(command));
                obj.insert("status".to_string(), json!("ok"));
            }
            println!("{}", body);
            ExitCode::SUCCESS
        }
        Err(CliError::Usage(msg)) => {
            eprintln!("{}", msg);
            ExitCode::from(2)
        }
        Err(CliError::Domain(e)) => {
            println!(
                "{}",
                json!({ "error": e.kind(), "message": e.to_string() })
            );
            ExitCode::from(1)
        }
    }
}

fn parse_opts(args: Vec<String>) -> Result<BTreeMap<String, String>, String> {
    let mut opts = BTreeMap::new();
    let mut iter = args.into_iter();
    while let Some(key) = iter.next() {
        let stripped = key
            .strip_prefix("--")
            .ok_or_else(|| format!("unexpected argument '{}'", key))?;
        let value = iter
            .next()
            .ok_or_else(|| format!("flag --{} needs a value", stripped))?;
        opts.insert(stripped.to_string(), value);
    }
    Ok(opts)
}

fn required<'a>(opts: &'a BTreeMap<String, String>, key: &str) -> Result<&'a str, CliError> {
    opts.get(key)
        .map(|s| s.as_str())
        .ok_or_else(|| CliError::Usage(format!("missing required flag --{}", key)))
}

fn load_algebra(opts: &BTreeMap<String, String>) -> Result<BasicAlgebra, CliError> {
    let file = required(opts, "file")?;
    let format = opts.get("format").map(|s| s.as_str()).unwrap_or_else(|| {
        if file.ends_with(".model") || file.ends_with(".m4") {
            "mace4"
        } else {
            "ua"
        }
    });
    match format {
        "ua" | "alg" | "xml" => Ok(io::read(file)?),
        "mace4" => {
            let mut algs = io::read_mace4(file)?;
            Ok(algs.swap_remove(0))
        }
        other => Err(CliError::Usage(format!("unknown format '{}'", other))),
    }
}

fn parse_index(opts: &BTreeMap<String, String>, key: &str) -> Result<usize, CliError> {
    required(opts, key)?
        .parse::<usize>()
        .map_err(|_| CliError::Usage(format!("flag --{} needs a nonnegative integer", key)))
}

fn parse_index_list(value: &str) -> Result<Vec<usize>, CliError> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<usize>()
                .map_err(|_| CliError::Usage(format!("bad element '{}' in list", p)))
        })
        .collect()
}

fn effort_from(opts: &BTreeMap<String, String>) -> Result<Effort, CliError> {
    match opts.get("max-steps") {
        Some(v) => {
            let budget = v.parse::<u64>().map_err(|_| {
                CliError::Usage("flag --max-steps needs a nonnegative integer".to_string())
            })?;
            Ok(Effort::with_budget(budget))
        }
        None => Ok(Effort::unbounded()),
    }
}

fn blocks_json(p: &Partition) -> Value {
    json!(p.blocks())
}

fn run(command: &str, opts: &BTreeMap<String, String>) -> Result<Value, CliError> {
    match command {
        "read" => {
            let alg = load_algebra(opts)?;
            let ops: Vec<Value> = alg
                .operations()
                .iter()
                .map(|op| json!({ "name": op.symbol().name(), "arity": op.arity() }))
                .collect();
            Ok(json!({
                "name": alg.name(),
                "cardinality": alg.cardinality(),
                "operations": ops,
            }))
        }
        "write" => {
            let alg = load_algebra(opts)?;
            let out = required(opts, "out")?;
            let style = match opts.get("style").map(|s| s.as_str()).unwrap_or("basic") {
                "basic" => WriteStyle::Basic,
                "extended" => WriteStyle::Extended,
                other => {
                    return Err(CliError::Usage(format!("unknown style '{}'", other)));
                }
            };
            io::write(&alg, out, style)?;
            Ok(json!({ "written": out }))
        }
        "cg" => {
            let alg = load_algebra(opts)?;
            let a = parse_index(opts, "a")?;
            let b = parse_index(opts, "b")?;
            let cg = alg.con().cg(a, b)?;
            Ok(json!({ "a": a, "b": b, "blocks": blocks_json(&cg) }))
        }
        "con-size" => {
            let alg = load_algebra(opts)?;
            let effort = effort_from(opts)?;
            let size = alg.con().universe_with_effort(&effort)?.len();
            Ok(json!({ "cardinality": size }))
        }
        "con-distributive" => {
            let alg = load_algebra(opts)?;
            Ok(json!({
                "distributive": alg.con().is_distributive()?,
                "modular": alg.con().is_modular()?,
            }))
        }
        "sub-size" => {
            let alg = load_algebra(opts)?;
            let effort = effort_from(opts)?;
            let size = alg.sub().universe_with_effort(&effort)?.len();
            Ok(json!({ "cardinality": size }))
        }
        "sg" => {
            let alg = load_algebra(opts)?;
            let gens = parse_index_list(required(opts, "gens")?)?;
            let sub = alg.sub().sg(&gens)?;
            Ok(json!({ "generators": gens, "subuniverse": sub.elements() }))
        }
        "type-set" => {
            let alg = load_algebra(opts)?;
            let types: Vec<u8> = alg.con().type_set()?.iter().copied().collect();
            Ok(json!({ "types": types }))
        }
        "free" => {
            let alg = load_algebra(opts)?;
            let k = parse_index(opts, "gens")?;
            let effort = effort_from(opts)?;
            let free = FreeAlgebra::with_effort(&alg, k, &effort)?;
            Ok(json!({
                "generators": k,
                "cardinality": free.cardinality(),
                "envelope": free.envelope_cardinality().to_string(),
            }))
        }
        "malcev" => {
            let alg = load_algebra(opts)?;
            let effort = effort_from(opts)?;
            let term = malcev::malcev_term_with_effort(&alg, &effort)?;
            Ok(json!({ "term": term.map(|t| t.to_string()) }))
        }
        "term-eval" => {
            let alg = load_algebra(opts)?;
            let term = Term::parse(required(opts, "term")?)?;
            let args = parse_index_list(required(opts, "args")?)?;
            let vars = term.variables();
            let value = term.int_value_at(&alg, &vars, &args)?;
            Ok(json!({
                "term": term.to_string(),
                "variables": vars.iter().map(|v| v.name().to_string()).collect::<Vec<_>>(),
                "args": args,
                "value": value,
            }))
        }
        "equation-check" => {
            let alg = load_algebra(opts)?;
            let eq = Equation::parse(required(opts, "left")?, required(opts, "right")?)?;
            let failure = eq.find_failure(&alg)?;
            Ok(json!({
                "equation": eq.to_string(),
                "failure": failure,
            }))
        }
        other => Err(CliError::Usage(format!("unknown command '{}'", other))),
    }
}
