//! Error types and result aliases for the armeval evaluator.
//!
//! Expression evaluation fails with one of a closed set of typed conditions
//! so callers can distinguish a bad template from an internal fault. Errors
//! carry no source spans; the visitor driving evaluation attaches template
//! file and expression context before presenting them to the user.

use miette::Diagnostic;
use thiserror::Error;

/// A failure raised while evaluating a template expression.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ExpressionError {
    /// Wrong number of arguments for a function.
    #[error("the number of arguments ({count}) for '{function}' is not within the supported range")]
    #[diagnostic(code(armeval::arguments_out_of_range))]
    ArgumentsOutOfRange { function: String, count: usize },

    /// An argument has the wrong kind entirely.
    #[error("the format of an argument for '{function}' is invalid")]
    #[diagnostic(code(armeval::argument_format))]
    ArgumentFormat { function: String },

    /// An argument could not be coerced to an integer.
    #[error("the value for '{operand}' passed to '{function}' is not a valid integer")]
    #[diagnostic(code(armeval::argument_invalid_integer))]
    ArgumentInvalidInteger { function: String, operand: String },

    /// An argument could not be coerced to a boolean.
    #[error("the value for '{operand}' passed to '{function}' is not a valid boolean")]
    #[diagnostic(code(armeval::argument_invalid_boolean))]
    ArgumentInvalidBoolean { function: String, operand: String },

    /// An argument could not be coerced to a string.
    #[error("the value for '{operand}' passed to '{function}' is not a valid string")]
    #[diagnostic(code(armeval::argument_invalid_string))]
    ArgumentInvalidString { function: String, operand: String },

    /// A provider namespace/type pair did not resolve to a known resource type.
    #[error("'{function}' does not recognize the resource type '{resource_type}' in namespace '{namespace}'")]
    #[diagnostic(code(armeval::argument_invalid_resource_type))]
    ArgumentInvalidResourceType {
        function: String,
        namespace: String,
        resource_type: String,
    },

    /// Name-part count does not match the provider type's declared depth.
    #[error("'{function}' was called with a resource type and name segments that do not match")]
    #[diagnostic(
        code(armeval::mismatching_resource_segments),
        help("the number of name segments must equal the resource type depth")
    )]
    MismatchingResourceSegments { function: String },

    /// A referenced parameter does not exist in the deployment context.
    #[error("the parameter '{name}' was not found")]
    #[diagnostic(code(armeval::parameter_not_found))]
    ParameterNotFound { name: String },

    /// A referenced variable does not exist in the deployment context.
    #[error("the variable '{name}' was not found")]
    #[diagnostic(code(armeval::variable_not_found))]
    VariableNotFound { name: String },

    /// A named copy loop is not in progress.
    #[error("the copy loop '{name}' was not found")]
    #[diagnostic(code(armeval::copy_index_not_found))]
    CopyIndexNotFound { name: String },

    /// Division or modulo by zero.
    #[error("'{function}' attempted to divide by zero")]
    #[diagnostic(code(armeval::divide_by_zero), help("divisor must be non-zero"))]
    DivideByZero { function: String },

    /// A date/time argument could not be parsed.
    #[error("the value '{value}' passed to '{function}' is not a valid date/time")]
    #[diagnostic(code(armeval::invalid_date_time))]
    InvalidDateTime { function: String, value: String },

    /// An ISO 8601 duration argument could not be parsed.
    #[error("the value '{value}' passed to '{function}' is not a valid ISO 8601 duration")]
    #[diagnostic(code(armeval::invalid_duration))]
    InvalidDuration { function: String, value: String },
}

impl ExpressionError {
    pub fn arguments_out_of_range(function: impl Into<String>, count: usize) -> Self {
        ExpressionError::ArgumentsOutOfRange {
            function: function.into(),
            count,
        }
    }

    pub fn argument_format(function: impl Into<String>) -> Self {
        ExpressionError::ArgumentFormat {
            function: function.into(),
        }
    }

    pub fn argument_invalid_integer(
        function: impl Into<String>,
        operand: impl Into<String>,
    ) -> Self {
        ExpressionError::ArgumentInvalidInteger {
            function: function.into(),
            operand: operand.into(),
        }
    }

    pub fn argument_invalid_boolean(
        function: impl Into<String>,
        operand: impl Into<String>,
    ) -> Self {
        ExpressionError::ArgumentInvalidBoolean {
            function: function.into(),
            operand: operand.into(),
        }
    }

    pub fn argument_invalid_string(
        function: impl Into<String>,
        operand: impl Into<String>,
    ) -> Self {
        ExpressionError::ArgumentInvalidString {
            function: function.into(),
            operand: operand.into(),
        }
    }

    pub fn mismatching_resource_segments(function: impl Into<String>) -> Self {
        ExpressionError::MismatchingResourceSegments {
            function: function.into(),
        }
    }

    pub fn divide_by_zero(function: impl Into<String>) -> Self {
        ExpressionError::DivideByZero {
            function: function.into(),
        }
    }
}

/// A failure from the external Bicep compiler invocation.
#[derive(Error, Debug, Diagnostic)]
pub enum BicepError {
    /// No usable Bicep binary could be discovered.
    #[error("a Bicep binary was not found on this machine")]
    #[diagnostic(
        code(armeval::bicep_not_found),
        help("install Bicep or set ARMEVAL_BICEP_PATH to the binary location")
    )]
    NotFound,

    /// The compiler ran but failed, timed out, or produced unusable output.
    #[error("Bicep ({version}) failed to compile '{path}': {message}")]
    #[diagnostic(code(armeval::bicep_compile))]
    Compile {
        version: String,
        path: String,
        message: String,
    },

    /// Spawning or communicating with the compiler process failed.
    #[error("failed to run Bicep: {0}")]
    #[diagnostic(code(armeval::bicep_io))]
    Io(#[from] std::io::Error),
}

/// Result type for expression evaluation.
pub type EvalResult<T> = Result<T, ExpressionError>;
