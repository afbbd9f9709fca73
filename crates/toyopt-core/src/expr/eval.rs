use super::parse;
use crate::environment::Environment;
use tracing::trace;

/// Try to reduce `expr` to a single integer.
///
/// Every variable bound in `env` is replaced by its right-hand side (one
/// level, whole identifiers only, spliced as a parenthesized subtree). The
/// result is a constant only if nothing but literals and operators remain.
/// Malformed text, unresolved names, overflow and division by zero all
/// yield `None`; this function never fails.
pub fn evaluate(expr: &str, env: &Environment) -> Option<i64> {
    let parsed = match parse(expr) {
        Ok(parsed) => parsed,
        Err(err) => {
            trace!("not evaluable: {:?} ({})", expr, err);
            return None;
        }
    };
    parsed.substitute(&|name| env.resolve(name)).eval()
}
