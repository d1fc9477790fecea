//! Array and object functions

use indexmap::IndexMap;

use crate::context::TemplateContext;
use crate::errors::{EvalResult, ExpressionError};
use crate::value::Value;

use super::{check_exact, check_min};

/// array(valueToConvert)
pub fn array(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("array", &args, 1)?;
    let mut args = args;
    let value = args.remove(0);
    match value {
        Value::Array(_) => Ok(value),
        other => Ok(Value::Array(vec![other])),
    }
}

/// concat(arg1, arg2, ...) — string mode when every argument is a scalar
/// (numbers and booleans render to text), array mode when the first
/// argument is an array
pub fn concat(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("concat", &args, 1)?;

    if args.iter().all(|a| a.try_scalar_string().is_some()) {
        let mut result = String::new();
        for arg in &args {
            if let Some(s) = arg.try_scalar_string() {
                result.push_str(&s);
            }
        }
        return Ok(Value::String(result));
    }
    if args.iter().all(|a| matches!(a, Value::Array(_))) {
        let mut result = Vec::new();
        for arg in args {
            if let Value::Array(items) = arg {
                result.extend(items);
            }
        }
        return Ok(Value::Array(result));
    }
    Err(ExpressionError::argument_format("concat"))
}

/// contains(container, itemToFind)
pub fn contains(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("contains", &args, 2)?;
    let item = &args[1];
    match &args[0] {
        Value::Array(items) => Ok(Value::Bool(items.iter().any(|v| v == item))),
        Value::String(s) => {
            // Scalars are rendered to their literal text before searching.
            let needle = item
                .try_scalar_string()
                .ok_or_else(|| ExpressionError::argument_format("contains"))?;
            Ok(Value::Bool(s.contains(&needle)))
        }
        Value::Object(obj) => {
            let key = item
                .try_scalar_string()
                .ok_or_else(|| ExpressionError::argument_format("contains"))?;
            Ok(Value::Bool(obj.contains_key(&key)))
        }
        _ => Ok(Value::Bool(false)),
    }
}

/// createArray(arg1, arg2, ...)
pub fn create_array(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    Ok(Value::Array(args))
}

/// createObject(key1, value1, key2, value2, ...)
pub fn create_object(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    if args.len() % 2 != 0 {
        return Err(ExpressionError::arguments_out_of_range(
            "createObject",
            args.len(),
        ));
    }
    let mut result = IndexMap::with_capacity(args.len() / 2);
    for (i, pair) in args.chunks_exact(2).enumerate() {
        let key = pair[0].try_string().ok_or_else(|| {
            ExpressionError::argument_invalid_string("createObject", format!("key{}", i + 1))
        })?;
        result.insert(key.to_string(), pair[1].clone());
    }
    Ok(Value::Object(result))
}

/// empty(itemToTest)
pub fn empty(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("empty", &args, 1)?;
    let result = match &args[0] {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    };
    Ok(Value::Bool(result))
}

/// first(arg1) — empty input yields null
pub fn first(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("first", &args, 1)?;
    let result = match &args[0] {
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        Value::String(s) => s
            .chars()
            .next()
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    };
    Ok(result)
}

/// last(arg1) — empty input yields null
pub fn last(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("last", &args, 1)?;
    let result = match &args[0] {
        Value::Array(items) => items.last().cloned().unwrap_or(Value::Null),
        Value::String(s) => s
            .chars()
            .last()
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    };
    Ok(result)
}

/// length(arg1)
pub fn length(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("length", &args, 1)?;
    let result = match &args[0] {
        Value::String(s) => s.chars().count() as i64,
        Value::Array(items) => items.len() as i64,
        Value::Object(obj) => obj.len() as i64,
        _ => return Err(ExpressionError::argument_format("length")),
    };
    Ok(Value::Int(result))
}

/// min(arg1, arg2, ...) over integers and arrays of integers
pub fn min(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    reduce_long("min", args, |a, b| a.min(b))
}

/// max(arg1, arg2, ...) over integers and arrays of integers
pub fn max(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    reduce_long("max", args, |a, b| a.max(b))
}

fn reduce_long(function: &str, args: Vec<Value>, pick: fn(i64, i64) -> i64) -> EvalResult<Value> {
    check_min(function, &args, 1)?;
    let mut result: Option<i64> = None;
    for arg in &args {
        if let Some(value) = arg.try_long() {
            result = Some(result.map_or(value, |r| pick(r, value)));
        } else if let Value::Array(items) = arg {
            for item in items {
                let value = item
                    .try_long()
                    .ok_or_else(|| ExpressionError::argument_format(function))?;
                result = Some(result.map_or(value, |r| pick(r, value)));
            }
        } else {
            return Err(ExpressionError::argument_format(function));
        }
    }
    Ok(result.map(Value::Int).unwrap_or(Value::Null))
}

/// range(startIndex, count)
pub fn range(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("range", &args, 2)?;
    let start = args[0]
        .try_long()
        .ok_or_else(|| ExpressionError::argument_invalid_integer("range", "startIndex"))?;
    let count = args[1]
        .try_convert_long()
        .filter(|n| *n >= 0)
        .ok_or_else(|| ExpressionError::argument_invalid_integer("range", "count"))?;
    let result = (0..count).map(|i| Value::Int(start + i)).collect();
    Ok(Value::Array(result))
}

/// skip(originalValue, numberToSkip)
pub fn skip(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("skip", &args, 2)?;
    let count = args[1]
        .try_int()
        .ok_or_else(|| ExpressionError::argument_invalid_integer("skip", "numberToSkip"))?
        .max(0) as usize;
    match &args[0] {
        Value::String(s) => Ok(Value::String(s.chars().skip(count).collect())),
        Value::Array(items) => Ok(Value::Array(items.iter().skip(count).cloned().collect())),
        _ => Err(ExpressionError::argument_format("skip")),
    }
}

/// take(originalValue, numberToTake)
pub fn take(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("take", &args, 2)?;
    let count = args[1]
        .try_int()
        .ok_or_else(|| ExpressionError::argument_invalid_integer("take", "numberToTake"))?
        .max(0) as usize;
    match &args[0] {
        Value::String(s) => Ok(Value::String(s.chars().take(count).collect())),
        Value::Array(items) => Ok(Value::Array(items.iter().take(count).cloned().collect())),
        _ => Err(ExpressionError::argument_format("take")),
    }
}

/// union(arg1, arg2, ...) — arrays dedup first-seen; object keys merge
/// left to right with the first occurrence winning
pub fn union(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("union", &args, 2)?;
    match &args[0] {
        Value::Array(_) => {
            let mut result: Vec<Value> = Vec::new();
            for arg in &args {
                let items = arg
                    .as_array()
                    .ok_or_else(|| ExpressionError::argument_format("union"))?;
                for item in items {
                    if !result.contains(item) {
                        result.push(item.clone());
                    }
                }
            }
            Ok(Value::Array(result))
        }
        Value::Object(_) => {
            let mut result: IndexMap<String, Value> = IndexMap::new();
            for arg in &args {
                let obj = arg
                    .as_object()
                    .ok_or_else(|| ExpressionError::argument_format("union"))?;
                for (key, value) in obj {
                    if !result.contains_key(key) {
                        result.insert(key.clone(), value.clone());
                    }
                }
            }
            Ok(Value::Object(result))
        }
        _ => Err(ExpressionError::argument_format("union")),
    }
}

/// intersection(arg1, arg2, ...) — arrays keep the first argument's order;
/// objects keep keys whose values are deep-equal in every argument
pub fn intersection(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("intersection", &args, 2)?;
    match &args[0] {
        Value::Array(items) => {
            let mut result: Vec<Value> = Vec::new();
            for item in items {
                if !result.contains(item) {
                    result.push(item.clone());
                }
            }
            for arg in &args[1..] {
                let other = arg
                    .as_array()
                    .ok_or_else(|| ExpressionError::argument_format("intersection"))?;
                result.retain(|v| other.contains(v));
            }
            Ok(Value::Array(result))
        }
        Value::Object(obj) => {
            let mut result = obj.clone();
            for arg in &args[1..] {
                let other = arg
                    .as_object()
                    .ok_or_else(|| ExpressionError::argument_format("intersection"))?;
                result.retain(|key, value| other.get(key) == Some(value));
            }
            Ok(Value::Object(result))
        }
        _ => Err(ExpressionError::argument_format("intersection")),
    }
}
