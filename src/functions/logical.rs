//! Logical functions
//!
//! and() and if() receive deferred arguments and force only the branches
//! they need. or() forces everything eagerly, matching the template
//! language's documented asymmetry.

use crate::context::TemplateContext;
use crate::errors::{EvalResult, ExpressionError};
use crate::value::Value;

use super::{check_exact, check_min};

/// and(arg1, arg2, ...) — short-circuits on the first non-true argument
pub fn and(context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("and", &args, 2)?;
    for arg in &args {
        let value = arg.force(context)?;
        if value.try_bool() != Some(true) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// or(arg1, arg2, ...) — all arguments are already evaluated
pub fn or(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("or", &args, 2)?;
    let result = args.iter().any(|arg| arg.try_bool() == Some(true));
    Ok(Value::Bool(result))
}

/// if(condition, trueValue, falseValue) — the untaken branch is never
/// forced
pub fn if_(context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("if", &args, 3)?;
    let condition = args[0]
        .force(context)?
        .try_bool()
        .ok_or_else(|| ExpressionError::argument_format("if"))?;
    if condition {
        args[1].force(context)
    } else {
        args[2].force(context)
    }
}

/// not(arg1)
pub fn not(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("not", &args, 1)?;
    let value = args[0]
        .try_bool()
        .ok_or_else(|| ExpressionError::argument_invalid_boolean("not", "arg1"))?;
    Ok(Value::Bool(!value))
}

/// bool(arg1) — accepts native booleans and "true"/"false" strings
pub fn bool_(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("bool", &args, 1)?;
    args[0]
        .try_convert_bool()
        .map(Value::Bool)
        .ok_or_else(|| ExpressionError::argument_format("bool"))
}

/// true()
pub fn true_(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("true", &args, 0)?;
    Ok(Value::Bool(true))
}

/// false()
pub fn false_(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("false", &args, 0)?;
    Ok(Value::Bool(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DeploymentContext;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn ctx() -> DeploymentContext {
        DeploymentContext::new()
    }

    /// A thunk recording whether it was ever forced.
    fn tracked(value: Value, forced: &Rc<Cell<bool>>) -> Value {
        let forced = Rc::clone(forced);
        Value::Deferred(Rc::new(move |_| {
            forced.set(true);
            Ok(value.clone())
        }))
    }

    #[test]
    fn test_and_short_circuits() {
        let forced = Rc::new(Cell::new(false));
        let result = and(
            &ctx(),
            vec![
                Value::Deferred(Rc::new(|_| Ok(Value::Bool(false)))),
                tracked(Value::Bool(true), &forced),
            ],
        )
        .unwrap();
        assert_eq!(result, Value::Bool(false));
        assert!(!forced.get());
    }

    #[test]
    fn test_and_all_true() {
        let result = and(&ctx(), vec![Value::Bool(true), Value::Bool(true)]).unwrap();
        assert_eq!(result, Value::Bool(true));
    }

    #[test]
    fn test_if_untaken_branch_never_forced() {
        let forced = Rc::new(Cell::new(false));
        let result = if_(
            &ctx(),
            vec![
                Value::Bool(true),
                Value::String("x".into()),
                tracked(Value::Null, &forced),
            ],
        )
        .unwrap();
        assert_eq!(result, Value::String("x".into()));
        assert!(!forced.get());
    }

    #[test]
    fn test_if_error_in_untaken_branch_is_invisible() {
        let result = if_(
            &ctx(),
            vec![
                Value::Bool(false),
                Value::Deferred(Rc::new(|_| {
                    Err(ExpressionError::divide_by_zero("div"))
                })),
                Value::Int(1),
            ],
        )
        .unwrap();
        assert_eq!(result, Value::Int(1));
    }

    #[test]
    fn test_if_non_bool_condition() {
        let err = if_(
            &ctx(),
            vec![Value::Int(1), Value::Int(2), Value::Int(3)],
        )
        .unwrap_err();
        assert!(matches!(err, ExpressionError::ArgumentFormat { .. }));
    }

    #[test]
    fn test_or_is_eager() {
        assert_eq!(
            or(&ctx(), vec![Value::Bool(false), Value::Bool(true)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            or(&ctx(), vec![Value::Bool(false), Value::Bool(false)]).unwrap(),
            Value::Bool(false)
        );
        // Non-bool arguments simply do not count as true.
        assert_eq!(
            or(&ctx(), vec![Value::Int(1), Value::Bool(false)]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_not_and_bool() {
        assert_eq!(
            not(&ctx(), vec![Value::Bool(false)]).unwrap(),
            Value::Bool(true)
        );
        let err = not(&ctx(), vec![Value::Int(1)]).unwrap_err();
        assert!(matches!(err, ExpressionError::ArgumentInvalidBoolean { .. }));

        assert_eq!(
            bool_(&ctx(), vec!["TRUE".into()]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            bool_(&ctx(), vec![Value::Bool(false)]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_true_false_literals() {
        assert_eq!(true_(&ctx(), vec![]).unwrap(), Value::Bool(true));
        assert_eq!(false_(&ctx(), vec![]).unwrap(), Value::Bool(false));
        assert!(true_(&ctx(), vec![Value::Int(1)]).is_err());
    }
}
