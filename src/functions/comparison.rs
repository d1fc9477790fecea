//! Comparison functions

use std::cmp::Ordering;

use crate::context::TemplateContext;
use crate::errors::{EvalResult, ExpressionError};
use crate::value::Value;

use super::{check_exact, check_min};

/// coalesce(arg1, arg2, ...) — first non-null argument; if every argument
/// is null, the first argument is returned as-is
pub fn coalesce(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("coalesce", &args, 1)?;
    for arg in &args {
        if !arg.is_null() {
            return Ok(arg.clone());
        }
    }
    Ok(args[0].clone())
}

/// equals(arg1, arg2)
pub fn equals(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("equals", &args, 2)?;
    Ok(Value::Bool(value_equals(&args[0], &args[1])))
}

fn value_equals(left: &Value, right: &Value) -> bool {
    // One null
    if left.is_null() || right.is_null() {
        return left.is_null() && right.is_null();
    }

    // Arrays compare elementwise by length and value
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => return a == b,
        (Value::Array(_), _) | (_, Value::Array(_)) => return false,
        _ => {}
    }

    // String vs anything else is never equal
    match (left.try_string(), right.try_string()) {
        (Some(a), Some(b)) => return a == b,
        (Some(_), None) | (None, Some(_)) => return false,
        _ => {}
    }
    match (left.try_long(), right.try_long()) {
        (Some(a), Some(b)) => return a == b,
        (Some(_), None) | (None, Some(_)) => return false,
        _ => {}
    }

    // Objects and remaining scalars compare structurally
    left == right
}

/// greater(arg1, arg2)
pub fn greater(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("greater", &args, 2)?;
    Ok(Value::Bool(compare("greater", &args[0], &args[1])?.is_gt()))
}

/// greaterOrEquals(arg1, arg2)
pub fn greater_or_equals(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("greaterOrEquals", &args, 2)?;
    Ok(Value::Bool(
        compare("greaterOrEquals", &args[0], &args[1])?.is_ge(),
    ))
}

/// less(arg1, arg2)
pub fn less(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("less", &args, 2)?;
    Ok(Value::Bool(compare("less", &args[0], &args[1])?.is_lt()))
}

/// lessOrEquals(arg1, arg2)
pub fn less_or_equals(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("lessOrEquals", &args, 2)?;
    Ok(Value::Bool(
        compare("lessOrEquals", &args[0], &args[1])?.is_le(),
    ))
}

/// Integer comparison when both sides coerce to integers, otherwise
/// ordinal string comparison, otherwise a scalar fallback.
fn compare(function: &str, left: &Value, right: &Value) -> EvalResult<Ordering> {
    if let (Some(a), Some(b)) = (left.try_long(), right.try_long()) {
        return Ok(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (left.try_string(), right.try_string()) {
        return Ok(a.cmp(b));
    }
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a
            .partial_cmp(b)
            .ok_or_else(|| ExpressionError::argument_format(function)),
        (Value::Int(a), Value::Float(b)) => (*a as f64)
            .partial_cmp(b)
            .ok_or_else(|| ExpressionError::argument_format(function)),
        (Value::Float(a), Value::Int(b)) => a
            .partial_cmp(&(*b as f64))
            .ok_or_else(|| ExpressionError::argument_format(function)),
        _ => Err(ExpressionError::argument_format(function)),
    }
}
