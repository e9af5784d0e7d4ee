//! Identifiers the emitter needs besides the schema itself.

use std::path::PathBuf;

use crate::definition::SumTypeDefinition;
use crate::error::StructuralError;

pub const ADAPTER_SUFFIX: &str = "CompositeUserType";
pub const EMBEDDABLE_SUFFIX: &str = "Embeddable";

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "null", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "void", "volatile", "while", "_",
];

/// Reserved words and literals; none of them can name a field.
pub fn is_java_keyword(ident: &str) -> bool {
    JAVA_KEYWORDS.contains(&ident)
}

/// Last dotted segment of a qualified name.
pub fn simple_name(qualified: &str) -> &str {
    match qualified.rfind('.') {
        Some(i) => &qualified[i + 1..],
        None => qualified,
    }
}

pub fn adapter_type_name(sum_type: &str) -> String {
    format!("{}{ADAPTER_SUFFIX}", simple_name(sum_type))
}

pub fn embeddable_type_name(sum_type: &str) -> String {
    simple_name(&format!("{sum_type}{EMBEDDABLE_SUFFIX}")).to_string()
}

/// Leading segments up to the first one that starts with an upper-case
/// letter (`com.acme.Outer.Range` → `com.acme`).
pub fn infer_package(qualified: &str) -> String {
    qualified
        .split('.')
        .take_while(|seg| !seg.starts_with(|c: char| c.is_uppercase()))
        .collect::<Vec<_>>()
        .join(".")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingContext {
    pub adapter_name: String,
    pub package: String,
    pub sum_type: String,
    pub embeddable_name: String,
}

impl NamingContext {
    /// Package precedence: explicit override, then the description, then
    /// inference from the qualified name. The skeleton needs a package
    /// declaration, so an empty result is rejected.
    pub fn for_definition(
        def: &SumTypeDefinition,
        package_override: Option<&str>,
    ) -> Result<Self, StructuralError> {
        let package = package_override
            .map(str::to_string)
            .or_else(|| def.package.clone())
            .unwrap_or_else(|| infer_package(&def.name));
        if package.trim().is_empty() {
            return Err(StructuralError::NoPackage { sum_type: def.name.clone() });
        }
        Ok(Self {
            adapter_name: adapter_type_name(&def.name),
            package,
            sum_type: def.name.clone(),
            embeddable_name: embeddable_type_name(&def.name),
        })
    }

    /// `com/acme/RangeCompositeUserType.java`
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for seg in self.package.split('.').filter(|s| !s.is_empty()) {
            path.push(seg);
        }
        path.push(format!("{}.java", self.adapter_name));
        path
    }
}
