//! Resource functions
//!
//! Identifier builders delegate to the resource_id grammar. reference()
//! and list*() return deterministic placeholder values; this evaluator
//! never resolves state against a live control plane.

use indexmap::IndexMap;

use crate::context::TemplateContext;
use crate::errors::{EvalResult, ExpressionError};
use crate::resource_id;
use crate::value::Value;

use super::{check_exact, check_min, check_range};

/// Coerce every argument to a string segment; non-strings are a hard error.
fn string_segments(function: &str, args: &[Value]) -> EvalResult<Vec<String>> {
    let mut segments = Vec::with_capacity(args.len());
    for arg in args {
        let s = arg
            .try_string()
            .ok_or_else(|| ExpressionError::argument_format(function))?;
        segments.push(s.to_string());
    }
    Ok(segments)
}

/// resourceId([subscriptionId], [resourceGroupName], resourceType, resourceName1, ...)
pub fn resource_id(context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("resourceId", &args, 2)?;
    let segments = string_segments("resourceId", &args)?;
    let id = resource_id::resource_id(
        "resourceId",
        &context.subscription().subscription_id,
        &context.resource_group().name,
        &segments,
    )?;
    Ok(Value::String(id))
}

/// subscriptionResourceId([subscriptionId], resourceType, resourceName1, ...)
pub fn subscription_resource_id(
    context: &dyn TemplateContext,
    args: Vec<Value>,
) -> EvalResult<Value> {
    check_min("subscriptionResourceId", &args, 2)?;
    let segments = string_segments("subscriptionResourceId", &args)?;
    let id = resource_id::subscription_resource_id(
        "subscriptionResourceId",
        &context.subscription().subscription_id,
        &segments,
    )?;
    Ok(Value::String(id))
}

/// tenantResourceId(resourceType, resourceName1, ...)
pub fn tenant_resource_id(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("tenantResourceId", &args, 2)?;
    let segments = string_segments("tenantResourceId", &args)?;
    let id = resource_id::tenant_resource_id("tenantResourceId", &segments)?;
    Ok(Value::String(id))
}

/// extensionResourceId(scope, resourceType, resourceName1, ...)
pub fn extension_resource_id(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("extensionResourceId", &args, 3)?;
    let segments = string_segments("extensionResourceId", &args)?;
    let id = resource_id::extension_resource_id("extensionResourceId", &segments)?;
    Ok(Value::String(id))
}

/// list{Value}(resourceIdentifier, apiVersion, [functionValues]) — returns a
/// placeholder carrying only the requested identifier
pub fn list(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_range("list", &args, 2, 3)?;
    let resource_id = args[0]
        .try_string()
        .map(|s| Value::String(s.to_string()))
        .unwrap_or(Value::Null);
    let mut mock = IndexMap::new();
    mock.insert("resourceId".to_string(), resource_id);
    Ok(Value::Object(mock))
}

/// reference(resourceIdentifier, [apiVersion], ['Full']) — placeholder only
pub fn reference(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_range("reference", &args, 1, 3)?;
    let resource_type = args[0]
        .try_string()
        .map(|s| Value::String(s.to_string()))
        .unwrap_or(Value::Null);
    let mut mock = IndexMap::new();
    mock.insert("type".to_string(), resource_type);
    Ok(Value::Object(mock))
}

/// providers(providerNamespace, [resourceType])
pub fn providers(context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_range("providers", &args, 1, 2)?;
    let namespace = args[0]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_format("providers"))?;
    let resource_type = match args.get(1) {
        Some(v) => Some(
            v.try_string()
                .ok_or_else(|| ExpressionError::argument_format("providers"))?,
        ),
        None => None,
    };

    let matches = context.resource_types(namespace, resource_type);
    match resource_type {
        None => Ok(Value::Array(
            matches.iter().map(|rt| rt.to_value()).collect(),
        )),
        Some(resource_type) => matches
            .first()
            .map(|rt| rt.to_value())
            .ok_or_else(|| ExpressionError::ArgumentInvalidResourceType {
                function: "providers".to_string(),
                namespace: namespace.to_string(),
                resource_type: resource_type.to_string(),
            }),
    }
}

/// resourceGroup()
pub fn resource_group(context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("resourceGroup", &args, 0)?;
    Ok(context.resource_group().to_value())
}

/// subscription()
pub fn subscription(context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("subscription", &args, 0)?;
    Ok(context.subscription().to_value())
}
