//! Built-in template functions
//!
//! The registry maps each function name to its implementation exactly
//! once, at construction. Dispatch is a direct lookup; unknown names are
//! the caller's concern. Functions flagged with `delay_binding` receive
//! unevaluated argument thunks ([`Value::Deferred`]) so short-circuit
//! semantics hold.

pub mod array;
pub mod comparison;
pub mod date;
pub mod deployment;
pub mod logical;
pub mod numeric;
pub mod resource;
pub mod string;

use std::collections::HashMap;

use crate::context::TemplateContext;
use crate::errors::{EvalResult, ExpressionError};
use crate::value::Value;

/// Signature shared by every built-in function implementation.
pub type ExpressionFn = fn(&dyn TemplateContext, Vec<Value>) -> EvalResult<Value>;

/// An immutable registry entry.
#[derive(Clone, Copy)]
pub struct FunctionDescriptor {
    pub name: &'static str,
    /// Pass argument expressions unevaluated to this function.
    pub delay_binding: bool,
    func: ExpressionFn,
}

impl FunctionDescriptor {
    const fn new(name: &'static str, func: ExpressionFn) -> Self {
        Self {
            name,
            func,
            delay_binding: false,
        }
    }

    const fn delayed(name: &'static str, func: ExpressionFn) -> Self {
        Self {
            name,
            func,
            delay_binding: true,
        }
    }

    pub fn invoke(&self, context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
        (self.func)(context, args)
    }
}

impl std::fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("delay_binding", &self.delay_binding)
            .finish()
    }
}

/// All built-in functions. Constructed once; never mutated.
static BUILTIN: &[FunctionDescriptor] = &[
    // Array and object
    FunctionDescriptor::new("array", array::array),
    FunctionDescriptor::new("concat", array::concat),
    FunctionDescriptor::new("contains", array::contains),
    FunctionDescriptor::new("createArray", array::create_array),
    FunctionDescriptor::new("createObject", array::create_object),
    FunctionDescriptor::new("empty", array::empty),
    FunctionDescriptor::new("first", array::first),
    FunctionDescriptor::new("intersection", array::intersection),
    FunctionDescriptor::new("last", array::last),
    FunctionDescriptor::new("length", array::length),
    FunctionDescriptor::new("min", array::min),
    FunctionDescriptor::new("max", array::max),
    FunctionDescriptor::new("range", array::range),
    FunctionDescriptor::new("skip", array::skip),
    FunctionDescriptor::new("take", array::take),
    FunctionDescriptor::new("union", array::union),
    // Comparison
    FunctionDescriptor::new("coalesce", comparison::coalesce),
    FunctionDescriptor::new("equals", comparison::equals),
    FunctionDescriptor::new("greater", comparison::greater),
    FunctionDescriptor::new("greaterOrEquals", comparison::greater_or_equals),
    FunctionDescriptor::new("less", comparison::less),
    FunctionDescriptor::new("lessOrEquals", comparison::less_or_equals),
    // Date
    FunctionDescriptor::new("dateTimeAdd", date::date_time_add),
    FunctionDescriptor::new("utcNow", date::utc_now),
    // Deployment
    FunctionDescriptor::new("deployment", deployment::deployment),
    FunctionDescriptor::new("environment", deployment::environment),
    FunctionDescriptor::new("parameters", deployment::parameters),
    FunctionDescriptor::new("variables", deployment::variables),
    // Logical
    FunctionDescriptor::delayed("and", logical::and),
    FunctionDescriptor::new("bool", logical::bool_),
    FunctionDescriptor::new("false", logical::false_),
    FunctionDescriptor::delayed("if", logical::if_),
    FunctionDescriptor::new("not", logical::not),
    // or evaluates all arguments eagerly, matching the template language.
    FunctionDescriptor::new("or", logical::or),
    FunctionDescriptor::new("true", logical::true_),
    // Numeric
    FunctionDescriptor::new("add", numeric::add),
    FunctionDescriptor::new("copyIndex", numeric::copy_index),
    FunctionDescriptor::new("div", numeric::div),
    FunctionDescriptor::new("float", numeric::float),
    FunctionDescriptor::new("int", numeric::int),
    FunctionDescriptor::new("mod", numeric::mod_),
    FunctionDescriptor::new("mul", numeric::mul),
    FunctionDescriptor::new("sub", numeric::sub),
    // Object
    FunctionDescriptor::new("json", deployment::json),
    FunctionDescriptor::new("null", deployment::null),
    // Resource
    FunctionDescriptor::new("extensionResourceId", resource::extension_resource_id),
    // Includes listAccountSas, listKeys, listSecrets, list*
    FunctionDescriptor::new("list", resource::list),
    FunctionDescriptor::new("providers", resource::providers),
    FunctionDescriptor::new("reference", resource::reference),
    FunctionDescriptor::new("resourceGroup", resource::resource_group),
    FunctionDescriptor::new("resourceId", resource::resource_id),
    FunctionDescriptor::new("subscription", resource::subscription),
    FunctionDescriptor::new("subscriptionResourceId", resource::subscription_resource_id),
    FunctionDescriptor::new("tenantResourceId", resource::tenant_resource_id),
    // String
    FunctionDescriptor::new("base64", string::base64),
    FunctionDescriptor::new("base64ToJson", string::base64_to_json),
    FunctionDescriptor::new("base64ToString", string::base64_to_string),
    FunctionDescriptor::new("dataUri", string::data_uri),
    FunctionDescriptor::new("dataUriToString", string::data_uri_to_string),
    FunctionDescriptor::new("endsWith", string::ends_with),
    FunctionDescriptor::new("format", string::format),
    FunctionDescriptor::new("guid", string::guid),
    FunctionDescriptor::new("indexOf", string::index_of),
    FunctionDescriptor::new("lastIndexOf", string::last_index_of),
    FunctionDescriptor::new("newGuid", string::new_guid),
    FunctionDescriptor::new("padLeft", string::pad_left),
    FunctionDescriptor::new("replace", string::replace),
    FunctionDescriptor::new("split", string::split),
    FunctionDescriptor::new("startsWith", string::starts_with),
    FunctionDescriptor::new("string", string::string),
    FunctionDescriptor::new("substring", string::substring),
    FunctionDescriptor::new("toLower", string::to_lower),
    FunctionDescriptor::new("toUpper", string::to_upper),
    FunctionDescriptor::new("trim", string::trim),
    FunctionDescriptor::new("uniqueString", string::unique_string),
    FunctionDescriptor::new("uri", string::uri),
    FunctionDescriptor::new("uriComponent", string::uri_component),
    FunctionDescriptor::new("uriComponentToString", string::uri_component_to_string),
];

/// Name-indexed table of built-in functions.
pub struct Registry {
    table: HashMap<&'static str, &'static FunctionDescriptor>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// Build the registry over the built-in function set.
    pub fn builtin() -> Self {
        let mut table = HashMap::with_capacity(BUILTIN.len());
        for descriptor in BUILTIN {
            table.insert(descriptor.name, descriptor);
        }
        Self { table }
    }

    /// Resolve a function name. Names are case-sensitive; any unregistered
    /// name with a `list` prefix (listKeys, listSecrets, ...) routes to the
    /// generic list handler.
    pub fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        if let Some(descriptor) = self.table.get(name) {
            return Some(*descriptor);
        }
        if name.len() > 4 && name.starts_with("list") {
            return self.table.get("list").copied();
        }
        None
    }

    /// Names of all registered functions, for caller-side diagnostics.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }

    /// Resolve and invoke in one step. The caller remains responsible for
    /// passing deferred arguments when the descriptor requests them.
    pub fn call(
        &self,
        name: &str,
        context: &dyn TemplateContext,
        args: Vec<Value>,
    ) -> Option<EvalResult<Value>> {
        self.get(name).map(|d| d.invoke(context, args))
    }
}

/// Argument count must equal `expected`.
pub(crate) fn check_exact(function: &str, args: &[Value], expected: usize) -> EvalResult<()> {
    if args.len() != expected {
        return Err(ExpressionError::arguments_out_of_range(function, args.len()));
    }
    Ok(())
}

/// Argument count must be at least `min`.
pub(crate) fn check_min(function: &str, args: &[Value], min: usize) -> EvalResult<()> {
    if args.len() < min {
        return Err(ExpressionError::arguments_out_of_range(function, args.len()));
    }
    Ok(())
}

/// Argument count must fall in `min..=max`.
pub(crate) fn check_range(
    function: &str,
    args: &[Value],
    min: usize,
    max: usize,
) -> EvalResult<()> {
    if args.len() < min || args.len() > max {
        return Err(ExpressionError::arguments_out_of_range(function, args.len()));
    }
    Ok(())
}
