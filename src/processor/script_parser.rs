//! Parser that walks a compact JSON document and builds a `Program`.
//!
//! Only shape is checked here. Expressions stay as text until the VM
//! evaluates them against a live scope, and call targets are resolved at run
//! time as well.

use serde_json::{Map, Value};
use tracing::debug;

use super::ast::{Def, Defs, Expr, Placement, Program, Step};
use crate::error::BlueprintError;

type Object = Map<String, Value>;

/// Collect `defs` and the top-level `steps` of a compact document.
pub fn parse_program(doc: &Object) -> Result<Program, BlueprintError> {
    let mut defs = Defs::new();

    if let Some(raw_defs) = doc.get("defs").and_then(Value::as_array) {
        for (i, raw) in raw_defs.iter().enumerate() {
            let def = parse_def(raw, &format!("defs[{i}]"))?;
            if defs.contains_key(&def.name) {
                debug!(name = %def.name, "duplicate def, keeping the later one");
            }
            defs.insert(def.name.clone(), def);
        }
    }

    let steps = doc
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| BlueprintError::structure("steps", "compact program needs a `steps` array"))?;
    let steps = parse_steps(steps, "steps")?;

    Ok(Program { defs, steps })
}

fn parse_def(raw: &Value, path: &str) -> Result<Def, BlueprintError> {
    let obj = as_object(raw, path)?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| BlueprintError::structure(path, "def needs a non-empty `name`"))?
        .to_string();

    let params = match obj.get("params") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, p)| {
                p.as_str()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        BlueprintError::structure(
                            format!("{path}.params[{i}]"),
                            "parameter names must be non-empty strings",
                        )
                    })
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(BlueprintError::structure(
                format!("{path}.params"),
                "`params` must be an array",
            ));
        }
    };

    let steps = obj
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| BlueprintError::structure(path, format!("def `{name}` needs a `steps` array")))?;
    let steps = parse_steps(steps, &format!("{path}.steps"))?;

    Ok(Def { name, params, steps })
}

pub fn parse_steps(raw: &[Value], path: &str) -> Result<Vec<Step>, BlueprintError> {
    raw.iter()
        .enumerate()
        .map(|(i, step)| parse_step(step, &format!("{path}[{i}]")))
        .collect()
}

fn parse_step(raw: &Value, path: &str) -> Result<Step, BlueprintError> {
    let obj = as_object(raw, path)?;

    let op = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| BlueprintError::structure(path, "step has no `op`"))?;

    match op.trim().to_ascii_lowercase().as_str() {
        "place" | "block" => parse_placement(obj, path).map(Step::Place),
        "for" => parse_for(obj, path),
        "call" => parse_call(obj, path),
        _ => Err(BlueprintError::UnknownOp {
            path: path.to_string(),
            op: op.to_string(),
        }),
    }
}

/// Shared by the compact `place` step and legacy block entries.
pub fn parse_placement(obj: &Object, path: &str) -> Result<Placement, BlueprintError> {
    Ok(Placement {
        x: required_expr(obj, "x", path)?,
        y: required_expr(obj, "y", path)?,
        z: required_expr(obj, "z", path)?,
        // a missing type is not fatal, the normalizer substitutes one
        block_type: optional_expr(obj, "blockType", path)?.unwrap_or(Expr::Text(String::new())),
    })
}

fn parse_for(obj: &Object, path: &str) -> Result<Step, BlueprintError> {
    let var = obj
        .get("var")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BlueprintError::structure(path, "`for` needs a non-empty `var`"))?
        .to_string();

    let body = obj
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| BlueprintError::structure(path, "`for` needs a `steps` array"))?;

    Ok(Step::For {
        var,
        from: required_expr(obj, "from", path)?,
        to: required_expr(obj, "to", path)?,
        stride: optional_expr(obj, "step", path)?.unwrap_or(Expr::Int(1)),
        body: parse_steps(body, &format!("{path}.steps"))?,
    })
}

fn parse_call(obj: &Object, path: &str) -> Result<Step, BlueprintError> {
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| BlueprintError::structure(path, "`call` needs a non-empty `name`"))?
        .to_string();

    let args = match obj.get("args") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| {
                let arg_path = format!("{path}.args.{key}");
                expr_from_json(value)
                    .map(|e| (key.clone(), e))
                    .ok_or_else(|| {
                        BlueprintError::structure(arg_path, "argument must be a number or a string")
                    })
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(BlueprintError::structure(
                format!("{path}.args"),
                "`args` must be an object",
            ));
        }
    };

    Ok(Step::Call { name, args })
}

fn required_expr(obj: &Object, key: &str, path: &str) -> Result<Expr, BlueprintError> {
    optional_expr(obj, key, path)?
        .ok_or_else(|| BlueprintError::structure(format!("{path}.{key}"), "missing value"))
}

fn optional_expr(obj: &Object, key: &str, path: &str) -> Result<Option<Expr>, BlueprintError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => expr_from_json(v).map(Some).ok_or_else(|| {
            BlueprintError::structure(format!("{path}.{key}"), "expected a number or a string")
        }),
    }
}

/// JSON numbers are truncated toward zero; strings are kept verbatim.
pub fn expr_from_json(v: &Value) -> Option<Expr> {
    match v {
        Value::Number(n) => {
            let int = match n.as_i64() {
                Some(i) => i,
                // saturating float-to-int cast
                None => n.as_f64()?.trunc() as i64,
            };
            Some(Expr::Int(int))
        }
        Value::String(s) => Some(Expr::Text(s.clone())),
        _ => None,
    }
}

pub fn as_object<'v>(raw: &'v Value, path: &str) -> Result<&'v Object, BlueprintError> {
    raw.as_object()
        .ok_or_else(|| BlueprintError::structure(path, "expected an object"))
}
