// Rust 1.93+ triggers false positives on thiserror/miette derive macro fields
#![allow(unused_assignments)]

//! ARM template expression evaluation
//!
//! A static evaluator for the built-in function library of Azure Resource
//! Manager template expressions. Evaluation runs entirely offline against a
//! caller-supplied deployment context, with deterministic stand-ins for
//! anything that would otherwise touch a live control plane.
//!
//! # Example
//!
//! ```
//! use armeval::{DeploymentContext, Registry, Value};
//!
//! let registry = Registry::builtin();
//! let context = DeploymentContext::new();
//! let result = registry
//!     .call("concat", &context, vec!["a".into(), "b".into()])
//!     .expect("registered")
//!     .unwrap();
//! assert_eq!(result, Value::String("ab".into()));
//! ```

pub mod bicep;
pub mod context;
pub mod errors;
pub mod functions;
pub mod resource_id;
pub mod value;

pub use bicep::BicepTool;
pub use context::{
    CloudEnvironment, CopyIndexState, DeploymentContext, ResourceGroup, ResourceType,
    Subscription, TemplateContext,
};
pub use errors::{BicepError, EvalResult, ExpressionError};
pub use functions::{ExpressionFn, FunctionDescriptor, Registry};
pub use value::{DeferredFn, Value};
