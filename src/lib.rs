//! Flatten closed sum types into one wide, nullable row shape and generate the
//! adapter that maps between the two without a discriminator column.
//!
//! Pipeline: [`description`] → [`definition::build`] → [`unify::unify`] →
//! [`plan::Planner`] → [`codegen::emit`]; [`pipeline`] runs it end to end.

pub mod cli;
pub mod codegen;
pub mod definition;
pub mod description;
pub mod error;
pub mod jq_exec;
pub mod naming;
pub mod pipeline;
pub mod plan;
pub mod template;
pub mod unify;

pub use definition::{build, Alternative, Field, SumTypeDefinition, TypeRef};
pub use error::{GenerateError, PlanError, StructuralError, TemplateError};
pub use pipeline::{analyze, generate, generate_all, GenerateOptions, GeneratedAdapter};
pub use plan::{Instance, Planner, Row};
pub use unify::{unify, CommonFields, FlattenedSchema, Unified};
