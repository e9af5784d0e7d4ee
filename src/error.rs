//! Failure classes of the generation pipeline.
//!
//! - [`StructuralError`]: the description is not a closed sum of pure products.
//!   Raised while building the definition; no output is produced for that type.
//! - [`PlanError`]: a row or instance matches no declared alternative. This is a
//!   defect in whoever produced the data, never something to default around.
//! - [`TemplateError`]: the skeleton is missing a slot or repeats a unique one.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("`{sum_type}` must be a closed sum with at least one alternative")]
    NoAlternatives { sum_type: String },

    #[error("`{sum_type}` is not closed; its alternative set must be fixed")]
    NotClosed { sum_type: String },

    #[error("`{name}` is not a qualified type name")]
    InvalidTypeName { name: String },

    #[error("alternative `{alternative}` is declared more than once in `{sum_type}`")]
    DuplicateAlternative { sum_type: String, alternative: String },

    #[error("alternative `{alternative}` is itself a sum type; nested sums are not supported")]
    NestedSum { alternative: String },

    #[error("alternative `{alternative}` is not a product type: {reason}")]
    NotAProduct { alternative: String, reason: String },

    /// No override, no declared package and nothing to infer from the name.
    #[error("`{sum_type}` has no package to generate its adapter into")]
    NoPackage { sum_type: String },

    #[error("field `{field}` of `{alternative}` is a Java keyword")]
    ReservedFieldName { alternative: String, field: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Nothing in the declared alternative set fits the given row or instance.
    #[error("unknown alternative: {detail}")]
    UnknownAlternative { detail: String },

    /// Several alternatives fit the row and none of them subsumes the others.
    #[error("row matches incomparable alternatives: {}", matched.join(", "))]
    Ambiguous { matched: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template is missing slot {slot}")]
    MissingSlot { slot: &'static str },

    #[error("template slot {slot} must appear exactly once, found {count}")]
    RepeatedSlot { slot: &'static str, count: usize },
}

/// Everything that can stop one sum type from being generated.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("`{sum_type}` has alternatives with identical field sets: {}", pairs.join("; "))]
    AmbiguousAlternatives { sum_type: String, pairs: Vec<String> },
}
