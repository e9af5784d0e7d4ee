//! Java text for the adapter slots.
//!
//! Three pieces are generated and dropped into the skeleton:
//! - the embeddable row type's field declarations;
//! - `getPropertyValue`: instanceof cascade, one `switch (index)` per alternative;
//! - `instantiate`: "all fields populated" cascade, one constructor call per
//!   alternative.
//!
//! Both cascades walk alternatives in planner order, so the generated adapter
//! makes the same choice `Planner::reconstruct` does, rejecting the same
//! ambiguous rows with an `AssertionError`.

use crate::definition::{Field, SumTypeDefinition};
use crate::naming::{is_java_keyword, NamingContext};
use crate::plan::{Candidate, Planner};
use crate::template::{Slot, SlotValues, Template};
use crate::unify::{CommonFields, FlattenedSchema, Unified};

const INDENT: &str = "    ";

/// Contextual keywords plus the adapter method parameters, which a pattern
/// variable must not shadow.
const LOCAL_AVOID: &[&str] = &["var", "yield", "record", "component", "index", "values"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Annotate fields shared by every alternative with `@Column(nullable = false)`.
    pub non_null_hints: bool,
}

// ------------------------------ Line writer ------------------------------- //

/// Indentation-aware line buffer.
#[derive(Debug, Default)]
pub struct Codegen {
    lines: Vec<String>,
    depth: usize,
}

impl Codegen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{text}", INDENT.repeat(self.depth)));
        }
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn into_string(self) -> String {
        self.lines.join("\n")
    }

    /// Lines after the first are shifted right by `column`, for text that is
    /// pasted at a slot already sitting at that column.
    pub fn into_slot(self, column: usize) -> String {
        let pad = " ".repeat(column);
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str(&pad);
                }
            }
            out.push_str(line);
        }
        out
    }
}

// ------------------------------- Pieces ----------------------------------- //

/// `closed` for `com.acme.Range.Closed`, `default_` for `...Default`.
pub fn local_name(alternative: &str) -> String {
    let simple = crate::naming::simple_name(alternative);
    let mut chars = simple.chars();
    let mut name: String = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::from("value"),
    };
    if is_java_keyword(&name) || LOCAL_AVOID.contains(&name.as_str()) {
        name.push('_');
    }
    name
}

fn value_read(field: &Field, position: usize) -> String {
    format!("values.getValue({position}, {}.class)", field.ty.erasure())
}

pub fn embeddable_content(schema: &FlattenedSchema, common: &CommonFields, opts: &EmitOptions) -> Codegen {
    let mut cg = Codegen::new();
    for field in schema.fields() {
        let hint = if opts.non_null_hints && common.contains(field) {
            "@Column(nullable = false) "
        } else {
            ""
        };
        cg.line(format!("{hint}{} {};", field.ty, field.name));
    }
    cg
}

pub fn get_property_body(planner: &Planner<'_>) -> Codegen {
    let mut cg = Codegen::new();
    for (i, candidate) in planner.order().iter().enumerate() {
        let local = local_name(candidate.name());
        let keyword = if i == 0 { "if" } else { "} else if" };
        cg.line(format!("{keyword} (component instanceof {} {local}) {{", candidate.name()));
        cg.indent();
        if candidate.slots.is_empty() {
            cg.line("return null;");
        } else {
            cg.line("return switch (index) {");
            cg.indent();
            for (field, pos) in candidate.slots_by_position() {
                cg.line(format!("case {pos} -> {local}.{}();", field.name));
            }
            cg.line("default -> null;");
            cg.dedent();
            cg.line("};");
        }
        cg.dedent();
    }
    close_cascade(&mut cg, planner, r#"throw new AssertionError("Unknown alternative: " + component.getClass().getName());"#);
    cg
}

pub fn instantiate_body(planner: &Planner<'_>) -> Codegen {
    let mut cg = Codegen::new();
    for (i, candidate) in planner.order().iter().enumerate() {
        let keyword = if i == 0 { "if" } else { "} else if" };
        cg.line(format!("{keyword} ({}) {{", populated_condition(&candidate.slots_by_position())));
        cg.indent();
        let ties = planner.ties(i);
        if ties.len() > 1 {
            let names: Vec<&str> = ties.iter().map(|c| c.name()).collect();
            cg.line(format!(
                r#"throw new AssertionError("Ambiguous alternatives: {}");"#,
                names.join(", ")
            ));
        } else {
            for (rival, extra) in planner.rivals(i) {
                cg.line(format!("if ({}) {{", populated_condition(&extra)));
                cg.indent();
                cg.line(format!(
                    r#"throw new AssertionError("Ambiguous row: {}, {}");"#,
                    candidate.name(),
                    rival.name()
                ));
                cg.dedent();
                cg.line("}");
            }
            construct(&mut cg, candidate);
        }
        cg.dedent();
    }
    close_cascade(&mut cg, planner, r#"throw new AssertionError("Unknown alternative");"#);
    cg
}

fn construct(cg: &mut Codegen, candidate: &Candidate<'_>) {
    if candidate.slots.is_empty() {
        cg.line(format!("return new {}();", candidate.name()));
        return;
    }
    cg.line(format!("return new {}(", candidate.name()));
    cg.indent();
    cg.indent();
    let last = candidate.slots.len() - 1;
    for (j, (field, pos)) in candidate.slots.iter().enumerate() {
        let sep = if j == last { "" } else { "," };
        cg.line(format!("{}{sep}", value_read(field, *pos)));
    }
    cg.dedent();
    cg.dedent();
    cg.line(");");
}

fn populated_condition(slots: &[(&Field, usize)]) -> String {
    if slots.is_empty() {
        return "true".to_string();
    }
    slots
        .iter()
        .map(|(field, pos)| format!("{} != null", value_read(field, *pos)))
        .collect::<Vec<_>>()
        .join(" && ")
}

fn close_cascade(cg: &mut Codegen, planner: &Planner<'_>, unreachable: &str) {
    if planner.order().is_empty() {
        cg.line(unreachable);
        return;
    }
    cg.line("} else {");
    cg.indent();
    cg.line(unreachable);
    cg.dedent();
    cg.line("}");
}

// ------------------------------- Emission --------------------------------- //

/// Fill the skeleton for one sum type.
pub fn emit(
    def: &SumTypeDefinition,
    unified: &Unified,
    naming: &NamingContext,
    template: &Template,
    opts: &EmitOptions,
) -> String {
    let planner = Planner::new(def, &unified.schema);
    let values = SlotValues {
        name: naming.adapter_name.clone(),
        package: naming.package.clone(),
        sum_type: naming.sum_type.clone(),
        embeddable_type: naming.embeddable_name.clone(),
        embeddable_type_content: embeddable_content(&unified.schema, &unified.common, opts)
            .into_slot(template.column_of(Slot::EmbeddableTypeContent)),
        get_property_body: get_property_body(&planner)
            .into_slot(template.column_of(Slot::GetPropertyBody)),
        instantiate_body: instantiate_body(&planner)
            .into_slot(template.column_of(Slot::InstantiateBody)),
    };
    template.render(&values)
}

// ------------------------------- Tests ------------------------------------ //
