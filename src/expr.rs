//! Arithmetic expressions for declarative layout templates.
//!
//! Template cells position themselves with small whitespace-separated
//! expressions over named layout parameters, e.g. `"1 - params.h_split1"`.
//! The grammar is deliberately tiny:
//!
//! ```text
//! expression := constant | params.<key> | operand op operand
//! operand    := constant | params.<key>
//! op         := + | - | * | /
//! ```
//!
//! Evaluation is total. Malformed expressions and unknown parameters come
//! from best-effort template authoring, so they evaluate to `0.0` with a
//! logged warning instead of failing the whole layout. Division by zero
//! also yields `0.0`.

use std::collections::BTreeMap;

/// Parameter values visible to template expressions, keyed by name.
pub type ParamValues = BTreeMap<String, f64>;

const PARAM_PREFIX: &str = "params.";

/// Evaluate a template expression against the given parameter values.
///
/// Never fails; see the module docs for the fallback rules.
#[must_use]
pub fn evaluate(expression: &str, params: &ParamValues) -> f64 {
    let trimmed = expression.trim();

    if let Ok(number) = trimmed.parse::<f64>() {
        return number;
    }

    if let Some(key) = trimmed.strip_prefix(PARAM_PREFIX) {
        if let Some(value) = params.get(key) {
            return *value;
        }
        log::warn!("unknown parameter `{key}` in expression `{expression}`");
        return 0.0;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() == 3 {
        let lhs = evaluate(tokens[0], params);
        let rhs = evaluate(tokens[2], params);
        match tokens[1] {
            "+" => return lhs + rhs,
            "-" => return lhs - rhs,
            "*" => return lhs * rhs,
            "/" => return if rhs == 0.0 { 0.0 } else { lhs / rhs },
            _ => {}
        }
    }

    log::warn!("could not evaluate expression `{expression}`");
    0.0
}
