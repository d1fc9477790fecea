//! Numeric functions
//!
//! Arithmetic is 64-bit signed with wrapping overflow, matching the
//! source template engine's unchecked semantics.

use crate::context::TemplateContext;
use crate::errors::{EvalResult, ExpressionError};
use crate::value::Value;

use super::{check_exact, check_range};

fn operands(function: &str, args: &[Value]) -> EvalResult<(i64, i64)> {
    check_exact(function, args, 2)?;
    let operand1 = args[0]
        .try_convert_long()
        .ok_or_else(|| ExpressionError::argument_invalid_integer(function, "operand1"))?;
    let operand2 = args[1]
        .try_convert_long()
        .ok_or_else(|| ExpressionError::argument_invalid_integer(function, "operand2"))?;
    Ok((operand1, operand2))
}

/// add(operand1, operand2)
pub fn add(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    let (a, b) = operands("add", &args)?;
    Ok(Value::Int(a.wrapping_add(b)))
}

/// sub(operand1, operand2)
pub fn sub(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    let (a, b) = operands("sub", &args)?;
    Ok(Value::Int(a.wrapping_sub(b)))
}

/// mul(operand1, operand2)
pub fn mul(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    let (a, b) = operands("mul", &args)?;
    Ok(Value::Int(a.wrapping_mul(b)))
}

/// div(operand1, operand2) — divisor 0 is a hard error
pub fn div(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    let (a, b) = operands("div", &args)?;
    if b == 0 {
        return Err(ExpressionError::divide_by_zero("div"));
    }
    Ok(Value::Int(a.wrapping_div(b)))
}

/// mod(operand1, operand2) — divisor 0 is a hard error
pub fn mod_(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    let (a, b) = operands("mod", &args)?;
    if b == 0 {
        return Err(ExpressionError::divide_by_zero("mod"));
    }
    Ok(Value::Int(a.wrapping_rem(b)))
}

/// int(valueToConvert)
pub fn int(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("int", &args, 1)?;
    args[0]
        .try_convert_long()
        .map(Value::Int)
        .ok_or_else(|| ExpressionError::argument_invalid_integer("int", "valueToConvert"))
}

/// float(valueToConvert) — string parsing uses the invariant culture
pub fn float(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("float", &args, 1)?;
    if let Some(n) = args[0].try_convert_long() {
        return Ok(Value::Float(n as f64));
    }
    if let Some(s) = args[0].try_string() {
        if let Ok(n) = s.trim().parse::<f64>() {
            return Ok(Value::Float(n));
        }
    }
    if let Value::Float(n) = args[0] {
        return Ok(Value::Float(n));
    }
    Err(ExpressionError::argument_invalid_integer(
        "float",
        "valueToConvert",
    ))
}

/// copyIndex([loopName], [offset])
pub fn copy_index(context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_range("copyIndex", &args, 0, 2)?;

    // A single argument may be either the loop name or the offset.
    let loop_name = args.first().and_then(|v| v.try_string()).unwrap_or("");
    let mut offset = match args.len() {
        1 => args[0].try_convert_int().unwrap_or(0),
        _ => 0,
    };
    if args.len() == 2 && offset == 0 {
        if let Some(value) = args[1].try_convert_int() {
            offset = value;
        }
    }

    let state =
        context
            .copy_index(loop_name)
            .ok_or_else(|| ExpressionError::CopyIndexNotFound {
                name: loop_name.to_string(),
            })?;
    Ok(Value::Int(offset + state.index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CopyIndexState, DeploymentContext};
    use pretty_assertions::assert_eq;

    fn ctx() -> DeploymentContext {
        DeploymentContext::new()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(
            add(&ctx(), vec![Value::Int(2), Value::Int(3)]).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            sub(&ctx(), vec![Value::Int(2), Value::Int(3)]).unwrap(),
            Value::Int(-1)
        );
        assert_eq!(
            mul(&ctx(), vec![Value::Int(4), Value::Int(3)]).unwrap(),
            Value::Int(12)
        );
        assert_eq!(
            div(&ctx(), vec![Value::Int(7), Value::Int(2)]).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            mod_(&ctx(), vec![Value::Int(7), Value::Int(2)]).unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn test_string_operands_convert() {
        assert_eq!(
            add(&ctx(), vec!["2".into(), Value::Int(3)]).unwrap(),
            Value::Int(5)
        );
        let err = add(&ctx(), vec!["x".into(), Value::Int(3)]).unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::ArgumentInvalidInteger { ref operand, .. } if operand == "operand1"
        ));
    }

    #[test]
    fn test_divide_by_zero() {
        let err = div(&ctx(), vec![Value::Int(5), Value::Int(0)]).unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::DivideByZero { ref function } if function == "div"
        ));
        let err = mod_(&ctx(), vec![Value::Int(5), Value::Int(0)]).unwrap_err();
        assert!(matches!(err, ExpressionError::DivideByZero { .. }));
    }

    #[test]
    fn test_int_and_float() {
        assert_eq!(int(&ctx(), vec!["42".into()]).unwrap(), Value::Int(42));
        assert!(int(&ctx(), vec!["4.5".into()]).is_err());
        assert_eq!(
            float(&ctx(), vec!["3.5".into()]).unwrap(),
            Value::Float(3.5)
        );
        assert_eq!(
            float(&ctx(), vec![Value::Int(2)]).unwrap(),
            Value::Float(2.0)
        );
    }

    #[test]
    fn test_copy_index_default_loop() {
        let mut context = DeploymentContext::new();
        context.set_copy_index(CopyIndexState {
            name: "".to_string(),
            index: 2,
            count: 4,
        });
        assert_eq!(copy_index(&context, vec![]).unwrap(), Value::Int(2));
        // Single integer argument is an offset.
        assert_eq!(
            copy_index(&context, vec![Value::Int(10)]).unwrap(),
            Value::Int(12)
        );
    }

    #[test]
    fn test_copy_index_named_loop() {
        let mut context = DeploymentContext::new();
        context.set_copy_index(CopyIndexState {
            name: "storage".to_string(),
            index: 1,
            count: 3,
        });
        assert_eq!(
            copy_index(&context, vec!["storage".into()]).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            copy_index(&context, vec!["storage".into(), Value::Int(5)]).unwrap(),
            Value::Int(6)
        );
        let err = copy_index(&context, vec!["missing".into()]).unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::CopyIndexNotFound { ref name } if name == "missing"
        ));
    }
}
