//! description → definition → unified schema (+ planner) → adapter text.

use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codegen::{self, EmitOptions};
use crate::definition::{self, Field, SumTypeDefinition};
use crate::description::SumTypeDescription;
use crate::error::GenerateError;
use crate::naming::NamingContext;
use crate::plan::Planner;
use crate::template::Template;
use crate::unify::{self, Unified};

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub emit: EmitOptions,
    /// Overrides the package of every generated adapter.
    pub package: Option<String>,
    /// Fail instead of warn when two alternatives have identical field sets.
    pub deny_ambiguous: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAdapter {
    pub sum_type: String,
    pub package: String,
    pub type_name: String,
    pub relative_path: PathBuf,
    pub source: String,
}

/// Machine-readable view of what the generator derived for one sum type.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub sum_type: String,
    pub adapter: String,
    pub embeddable: String,
    #[serde(flatten)]
    pub unified: Unified,
    /// Reconstruction order, most specific first.
    pub order: Vec<CandidateReport>,
    pub ambiguous: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub alternative: String,
    pub arity: usize,
    pub fields: Vec<Field>,
}

fn check_ambiguity(
    def: &SumTypeDefinition,
    planner: &Planner<'_>,
    deny: bool,
) -> Result<Vec<[String; 2]>, GenerateError> {
    let pairs: Vec<[String; 2]> = planner
        .ambiguous_pairs()
        .into_iter()
        .map(|(a, b)| [a.to_string(), b.to_string()])
        .collect();
    if pairs.is_empty() {
        return Ok(pairs);
    }
    if deny {
        return Err(GenerateError::AmbiguousAlternatives {
            sum_type: def.name.clone(),
            pairs: pairs.iter().map(|[a, b]| format!("{a} = {b}")).collect(),
        });
    }
    for [a, b] in &pairs {
        warn!(
            sum_type = %def.name,
            first = %a,
            second = %b,
            "alternatives have identical field sets; their rows cannot be read back"
        );
    }
    Ok(pairs)
}

fn warn_name_collisions(def: &SumTypeDefinition, unified: &Unified) {
    for (name, types) in unified.schema.name_collisions() {
        warn!(
            sum_type = %def.name,
            field = name,
            types = ?types,
            "field name declared with several types; each type gets its own column"
        );
    }
}

/// Everything short of text emission.
pub fn analyze(
    desc: &SumTypeDescription,
    opts: &GenerateOptions,
) -> Result<SchemaReport, GenerateError> {
    let def = definition::build(desc)?;
    let unified = unify::unify(&def);
    debug!(sum_type = %def.name, width = unified.schema.len(), common = unified.common.len(), "unified");
    warn_name_collisions(&def, &unified);

    let planner = Planner::new(&def, &unified.schema);
    let ambiguous = check_ambiguity(&def, &planner, opts.deny_ambiguous)?;
    let order = planner
        .order()
        .iter()
        .map(|c| CandidateReport {
            alternative: c.name().to_string(),
            arity: c.arity(),
            fields: c.alternative.fields.clone(),
        })
        .collect();
    let naming = NamingContext::for_definition(&def, opts.package.as_deref())?;

    Ok(SchemaReport {
        sum_type: def.name.clone(),
        adapter: naming.adapter_name,
        embeddable: naming.embeddable_name,
        unified,
        order,
        ambiguous,
    })
}

/// Generate one adapter. A structural problem aborts this sum type only.
pub fn generate(
    desc: &SumTypeDescription,
    template: &Template,
    opts: &GenerateOptions,
) -> Result<GeneratedAdapter, GenerateError> {
    let def = definition::build(desc)?;
    debug!(sum_type = %def.name, alternatives = def.alternatives.len(), "built definition");

    let unified = unify::unify(&def);
    warn_name_collisions(&def, &unified);
    {
        let planner = Planner::new(&def, &unified.schema);
        check_ambiguity(&def, &planner, opts.deny_ambiguous)?;
    }

    let naming = NamingContext::for_definition(&def, opts.package.as_deref())?;
    let source = codegen::emit(&def, &unified, &naming, template, &opts.emit);
    debug!(sum_type = %def.name, adapter = %naming.adapter_name, bytes = source.len(), "emitted");

    Ok(GeneratedAdapter {
        sum_type: def.name.clone(),
        relative_path: naming.relative_path(),
        package: naming.package,
        type_name: naming.adapter_name,
        source,
    })
}

/// Generate every description in parallel; results keep input order.
pub fn generate_all(
    descs: &[SumTypeDescription],
    template: &Template,
    opts: &GenerateOptions,
) -> Vec<Result<GeneratedAdapter, GenerateError>> {
    descs.par_iter().map(|d| generate(d, template, opts)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::parse_descriptions;
    use crate::error::StructuralError;
    use crate::template::DEFAULT_TEMPLATE;

    const SAMPLES: &str = include_str!("../samples/sum_types.json");

    fn template() -> Template {
        Template::parse(DEFAULT_TEMPLATE).unwrap()
    }

    #[test]
    fn generates_every_sample() {
        let descs = parse_descriptions(SAMPLES).unwrap();
        let results = generate_all(&descs, &template(), &GenerateOptions::default());
        assert_eq!(results.len(), descs.len());
        for (desc, result) in descs.iter().zip(&results) {
            let adapter = result.as_ref().unwrap();
            assert_eq!(adapter.sum_type, desc.name, "input order is kept");
            assert!(adapter.source.contains(&format!("class {} ", adapter.type_name)));
        }
        let range = results[0].as_ref().unwrap();
        assert_eq!(range.type_name, "RangeCompositeUserType");
        assert_eq!(range.relative_path, PathBuf::from("com/acme/RangeCompositeUserType.java"));
    }

    #[test]
    fn deterministic_output() {
        let descs = parse_descriptions(SAMPLES).unwrap();
        let a = generate(&descs[0], &template(), &GenerateOptions::default()).unwrap();
        let mut shuffled = descs[0].clone();
        shuffled.alternatives.reverse();
        let b = generate(&shuffled, &template(), &GenerateOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn structural_error_yields_no_output() {
        let desc = SumTypeDescription {
            name: "a.Empty".into(),
            package: None,
            closed: true,
            alternatives: vec![],
        };
        let err = generate(&desc, &template(), &GenerateOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Structural(StructuralError::NoAlternatives { .. })
        ));
    }

    #[test]
    fn deny_ambiguous_turns_the_warning_into_an_error() {
        let src = r#"{ "name": "a.Length", "alternatives": [
            { "name": "a.Length.Meters", "kind": "record", "fields": [ { "name": "v", "type": "double" } ] },
            { "name": "a.Length.Feet",   "kind": "record", "fields": [ { "name": "v", "type": "double" } ] }
        ] }"#;
        let desc = &parse_descriptions(src).unwrap()[0];
        let lenient = generate(desc, &template(), &GenerateOptions::default()).unwrap();
        assert!(
            lenient.source.contains(r#"throw new AssertionError("Ambiguous alternatives: a.Length.Feet, a.Length.Meters");"#),
            "{}",
            lenient.source
        );
        assert!(!lenient.source.contains("return new a.Length."));

        let opts = GenerateOptions { deny_ambiguous: true, ..GenerateOptions::default() };
        let err = generate(desc, &template(), &opts).unwrap_err();
        assert!(matches!(err, GenerateError::AmbiguousAlternatives { .. }));
        assert!(err.to_string().contains("a.Length.Feet = a.Length.Meters"), "{err}");
    }

    #[test]
    fn analyze_reports_order_and_schema() {
        let descs = parse_descriptions(SAMPLES).unwrap();
        let report = analyze(&descs[0], &GenerateOptions::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["adapter"], "RangeCompositeUserType");
        assert_eq!(json["schema"][0]["name"], "end");
        assert_eq!(json["order"][0]["alternative"], "com.acme.Range.Closed");
        assert_eq!(json["order"][1]["arity"], 1);
        assert_eq!(json["ambiguous"], serde_json::json!([]));
    }

    #[test]
    fn unpackaged_sum_type_yields_no_output() {
        let src = r#"{ "name": "Range", "alternatives": [
            { "name": "Range.Open", "kind": "record", "fields": [ { "name": "start", "type": "int" } ] }
        ] }"#;
        let desc = &parse_descriptions(src).unwrap()[0];
        let err = generate(desc, &template(), &GenerateOptions::default()).unwrap_err();
        assert!(matches!(err, GenerateError::Structural(StructuralError::NoPackage { .. })));
    }

    #[test]
    fn package_override_moves_the_output() {
        let descs = parse_descriptions(SAMPLES).unwrap();
        let opts = GenerateOptions { package: Some("org.gen".into()), ..GenerateOptions::default() };
        let adapter = generate(&descs[0], &template(), &opts).unwrap();
        assert!(adapter.source.starts_with("package org.gen;"));
        assert_eq!(adapter.relative_path, PathBuf::from("org/gen/RangeCompositeUserType.java"));
    }
}
