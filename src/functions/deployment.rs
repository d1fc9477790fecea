//! Deployment scoped functions

use crate::context::TemplateContext;
use crate::errors::{EvalResult, ExpressionError};
use crate::value::Value;

use super::check_exact;

/// deployment()
pub fn deployment(context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("deployment", &args, 0)?;
    Ok(context.deployment())
}

/// environment()
pub fn environment(context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("environment", &args, 0)?;
    Ok(context.environment().to_value())
}

/// parameters(parameterName)
pub fn parameters(context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("parameters", &args, 1)?;
    let name = args[0]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_format("parameters"))?;
    context
        .try_parameter(name)
        .ok_or_else(|| ExpressionError::ParameterNotFound {
            name: name.to_string(),
        })
}

/// variables(variableName)
pub fn variables(context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("variables", &args, 1)?;
    let name = args[0]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_format("variables"))?;
    context
        .try_variable(name)
        .ok_or_else(|| ExpressionError::VariableNotFound {
            name: name.to_string(),
        })
}

/// json(arg1) — parse a JSON text into a value
pub fn json(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("json", &args, 1)?;
    let text = args[0]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_invalid_string("json", "json"))?;
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from_serde_json)
        .map_err(|_| ExpressionError::argument_format("json"))
}

/// null()
pub fn null(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("null", &args, 0)?;
    Ok(Value::Null)
}
