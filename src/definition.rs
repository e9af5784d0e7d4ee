// Strongly-typed definition of a closed sum type. No serde_json::Value here.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::description::{AlternativeDescription, Shape, SumTypeDescription};
use crate::error::StructuralError;

static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier regex"));

static QUALIFIED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").expect("qualified name regex")
});

/// A type as written by the source language (`java.time.LocalDate`,
/// `java.util.List<java.lang.String>`, `int[]`). Opaque to the core apart from
/// erasure for class literals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The reference with type arguments removed (`List<String>` → `List`).
    pub fn erasure(&self) -> &str {
        match self.0.find('<') {
            Some(i) => self.0[..i].trim_end(),
            None => &self.0,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity is the `(name, type)` pair; the derived order sorts by name first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self { name: name.into(), ty: TypeRef::new(ty) }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub name: String,
    /// Declaration order; this is also the constructor argument order.
    pub fields: Vec<Field>,
}

impl Alternative {
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    pub fn simple_name(&self) -> &str {
        crate::naming::simple_name(&self.name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_set(&self) -> BTreeSet<Field> {
        self.fields.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumTypeDefinition {
    pub name: String,
    pub package: Option<String>,
    pub alternatives: Vec<Alternative>,
}

impl SumTypeDefinition {
    pub fn simple_name(&self) -> &str {
        crate::naming::simple_name(&self.name)
    }

    pub fn alternative(&self, name: &str) -> Option<&Alternative> {
        self.alternatives.iter().find(|a| a.name == name)
    }
}

/// Validate a description and turn it into a definition.
pub fn build(desc: &SumTypeDescription) -> Result<SumTypeDefinition, StructuralError> {
    if !QUALIFIED.is_match(&desc.name) {
        return Err(StructuralError::InvalidTypeName { name: desc.name.clone() });
    }
    if !desc.closed {
        return Err(StructuralError::NotClosed { sum_type: desc.name.clone() });
    }
    if desc.alternatives.is_empty() {
        return Err(StructuralError::NoAlternatives { sum_type: desc.name.clone() });
    }

    let mut seen = HashSet::new();
    let mut alternatives = Vec::with_capacity(desc.alternatives.len());
    for alt in &desc.alternatives {
        if !seen.insert(alt.name.as_str()) {
            return Err(StructuralError::DuplicateAlternative {
                sum_type: desc.name.clone(),
                alternative: alt.name.clone(),
            });
        }
        alternatives.push(build_alternative(alt)?);
    }

    Ok(SumTypeDefinition {
        name: desc.name.clone(),
        package: desc.package.clone(),
        alternatives,
    })
}

fn build_alternative(alt: &AlternativeDescription) -> Result<Alternative, StructuralError> {
    if !QUALIFIED.is_match(&alt.name) {
        return Err(StructuralError::InvalidTypeName { name: alt.name.clone() });
    }
    let not_a_product = |reason: String| StructuralError::NotAProduct {
        alternative: alt.name.clone(),
        reason,
    };

    let described = match &alt.shape {
        Shape::Record { fields } => fields,
        Shape::Sum { .. } => {
            return Err(StructuralError::NestedSum { alternative: alt.name.clone() });
        }
        Shape::Opaque => {
            return Err(not_a_product("it has no named, typed fields".into()));
        }
    };

    let mut names = HashSet::new();
    let mut fields = Vec::with_capacity(described.len());
    for f in described {
        if !IDENT.is_match(&f.name) {
            return Err(not_a_product(format!("`{}` is not a field name", f.name)));
        }
        if crate::naming::is_java_keyword(&f.name) {
            return Err(StructuralError::ReservedFieldName {
                alternative: alt.name.clone(),
                field: f.name.clone(),
            });
        }
        if f.ty.trim().is_empty() {
            return Err(not_a_product(format!("field `{}` has no type", f.name)));
        }
        if !names.insert(f.name.as_str()) {
            return Err(not_a_product(format!("field `{}` is declared twice", f.name)));
        }
        fields.push(Field::new(f.name.clone(), f.ty.clone()));
    }

    Ok(Alternative { name: alt.name.clone(), fields })
}
