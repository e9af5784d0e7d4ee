//! Disambiguation planner: projection (instance → row) and reconstruction
//! (row → instance) over a flattened schema.
//!
//! Candidates are tried by arity descending, then alternative name ascending.
//! A row reconstructs as the first candidate whose every field is populated,
//! provided that candidate's field set covers every other candidate the row
//! also satisfies. Otherwise the row is ambiguous and rejected.
//!
//! Rows are `serde_json::Value` cells; `Value::Null` is the absent sentinel.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::{Alternative, Field, SumTypeDefinition};
use crate::error::PlanError;
use crate::unify::FlattenedSchema;

/// One value of the sum type, tagged with its alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub alternative: String,
    #[serde(default)]
    pub fields: IndexMap<String, Value>,
}

impl Instance {
    pub fn new(alternative: impl Into<String>) -> Self {
        Self { alternative: alternative.into(), fields: IndexMap::new() }
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

/// One cell per flattened-schema position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn absent(width: usize) -> Self {
        Self(vec![Value::Null; width])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Value> {
        self.0.get(position)
    }

    pub fn is_populated(&self, position: usize) -> bool {
        !matches!(self.0.get(position), None | Some(Value::Null))
    }
}

/// An alternative with its fields resolved to row positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub alternative: &'a Alternative,
    /// Declaration order, paired with the flattened position.
    pub slots: Vec<(&'a Field, usize)>,
}

impl<'a> Candidate<'a> {
    pub fn arity(&self) -> usize {
        self.alternative.arity()
    }

    pub fn name(&self) -> &'a str {
        &self.alternative.name
    }

    /// Positions ascending, with the owning field.
    pub fn slots_by_position(&self) -> Vec<(&'a Field, usize)> {
        let mut slots = self.slots.clone();
        slots.sort_by_key(|(_, pos)| *pos);
        slots
    }

    fn positions(&self) -> BTreeSet<usize> {
        self.slots.iter().map(|(_, pos)| *pos).collect()
    }

    fn matches(&self, row: &Row) -> bool {
        self.slots.iter().all(|(_, pos)| row.is_populated(*pos))
    }
}

#[derive(Debug, Clone)]
pub struct Planner<'a> {
    schema: &'a FlattenedSchema,
    order: Vec<Candidate<'a>>,
}

impl<'a> Planner<'a> {
    /// `schema` must be the flattened schema of `def`.
    pub fn new(def: &'a SumTypeDefinition, schema: &'a FlattenedSchema) -> Self {
        let mut order: Vec<Candidate<'a>> = def
            .alternatives
            .iter()
            .map(|alternative| Candidate {
                alternative,
                slots: alternative
                    .fields
                    .iter()
                    .filter_map(|f| schema.position_of(f).map(|pos| (f, pos)))
                    .collect(),
            })
            .collect();
        order.sort_by(|a, b| b.arity().cmp(&a.arity()).then_with(|| a.name().cmp(b.name())));
        Self { schema, order }
    }

    /// Candidate order used by both directions.
    pub fn order(&self) -> &[Candidate<'a>] {
        &self.order
    }

    pub fn width(&self) -> usize {
        self.schema.len()
    }

    fn candidate(&self, alternative: &str) -> Option<&Candidate<'a>> {
        self.order.iter().find(|c| c.name() == alternative)
    }

    /// Pairs of alternatives with identical field sets. A row projected from
    /// either one satisfies both equally well.
    pub fn ambiguous_pairs(&self) -> Vec<(&'a str, &'a str)> {
        let mut out = Vec::new();
        for (i, a) in self.order.iter().enumerate() {
            for b in &self.order[i + 1..] {
                if a.arity() != b.arity() {
                    // sorted by arity, nothing further can tie with `a`
                    break;
                }
                if a.positions() == b.positions() {
                    out.push((a.name(), b.name()));
                }
            }
        }
        out
    }

    /// Every candidate occupying exactly the positions of `order()[index]`,
    /// itself included, in candidate order.
    pub fn ties(&self, index: usize) -> Vec<&Candidate<'a>> {
        let covered = self.order[index].positions();
        self.order.iter().filter(|c| c.positions() == covered).collect()
    }

    /// Later candidates a row matching `order()[index]` may also satisfy
    /// without being covered by it, each with the positions it adds.
    pub fn rivals(&self, index: usize) -> Vec<(&Candidate<'a>, Vec<(&'a Field, usize)>)> {
        let covered = self.order[index].positions();
        self.order[index + 1..]
            .iter()
            .filter_map(|c| {
                let extra: Vec<_> = c
                    .slots_by_position()
                    .into_iter()
                    .filter(|(_, pos)| !covered.contains(pos))
                    .collect();
                (!extra.is_empty()).then_some((c, extra))
            })
            .collect()
    }

    // ---------------------------- Projection ------------------------------- //

    /// Lay an instance out over every schema position.
    pub fn project(&self, instance: &Instance) -> Result<Row, PlanError> {
        let candidate = self.candidate(&instance.alternative).ok_or_else(|| {
            PlanError::UnknownAlternative {
                detail: format!("`{}` is not declared", instance.alternative),
            }
        })?;

        if let Some(stray) = instance
            .fields
            .keys()
            .find(|k| candidate.alternative.field(k).is_none())
        {
            return Err(PlanError::UnknownAlternative {
                detail: format!("`{}` has no field `{stray}`", instance.alternative),
            });
        }

        let mut row = Row::absent(self.width());
        for (field, pos) in &candidate.slots {
            if let Some(value) = instance.fields.get(&field.name) {
                row.0[*pos] = value.clone();
            }
        }
        Ok(row)
    }

    // -------------------------- Reconstruction ----------------------------- //

    /// The candidate a row belongs to.
    pub fn resolve(&self, row: &Row) -> Result<&Candidate<'a>, PlanError> {
        if row.len() != self.width() {
            return Err(PlanError::UnknownAlternative {
                detail: format!(
                    "row has {} cells but the schema has {} positions",
                    row.len(),
                    self.width()
                ),
            });
        }

        let Some(index) = self.order.iter().position(|c| c.matches(row)) else {
            return Err(PlanError::UnknownAlternative {
                detail: "no alternative has all of its fields populated".into(),
            });
        };
        let winner = &self.order[index];

        let rivals: Vec<&Candidate<'a>> = self
            .rivals(index)
            .into_iter()
            .map(|(c, _)| c)
            .filter(|c| c.matches(row))
            .collect();
        if !rivals.is_empty() {
            let mut matched = vec![winner.name().to_string()];
            matched.extend(rivals.iter().map(|c| c.name().to_string()));
            return Err(PlanError::Ambiguous { matched });
        }

        let ties = self.ties(index);
        if ties.len() > 1 {
            return Err(PlanError::Ambiguous {
                matched: ties.iter().map(|c| c.name().to_string()).collect(),
            });
        }

        Ok(winner)
    }

    /// Rebuild the instance a row was projected from.
    pub fn reconstruct(&self, row: &Row) -> Result<Instance, PlanError> {
        let candidate = self.resolve(row)?;
        let mut instance = Instance::new(candidate.name());
        for (field, pos) in &candidate.slots {
            let value = row.get(*pos).cloned().unwrap_or(Value::Null);
            instance.fields.insert(field.name.clone(), value);
        }
        Ok(instance)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unify::flattened_schema;
    use serde_json::json;

    const DATE: &str = "java.time.LocalDate";

    fn alt(name: &str, fields: &[(&str, &str)]) -> Alternative {
        Alternative {
            name: name.into(),
            fields: fields.iter().map(|(n, t)| Field::new(*n, *t)).collect(),
        }
    }

    fn def(alternatives: Vec<Alternative>) -> SumTypeDefinition {
        SumTypeDefinition { name: "com.acme.Sum".into(), package: None, alternatives }
    }

    fn range() -> SumTypeDefinition {
        def(vec![
            alt("com.acme.Range.Open", &[("start", DATE)]),
            alt("com.acme.Range.Closed", &[("start", DATE), ("end", DATE)]),
        ])
    }

    #[test]
    fn order_is_arity_desc_then_name() {
        let d = def(vec![
            alt("a.B", &[("x", "int")]),
            alt("a.A", &[("y", "int")]),
            alt("a.C", &[("x", "int"), ("y", "int")]),
            alt("a.Unit", &[]),
        ]);
        let schema = flattened_schema(&d);
        let planner = Planner::new(&d, &schema);
        let names: Vec<_> = planner.order().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["a.C", "a.A", "a.B", "a.Unit"]);
    }

    #[test]
    fn range_projection() {
        let d = range();
        let schema = flattened_schema(&d);
        let planner = Planner::new(&d, &schema);

        let closed = Instance::new("com.acme.Range.Closed")
            .with("start", json!("2020-01-01"))
            .with("end", json!("2020-12-31"));
        assert_eq!(planner.project(&closed).unwrap(), Row(vec![json!("2020-12-31"), json!("2020-01-01")]));

        let open = Instance::new("com.acme.Range.Open").with("start", json!("2020-01-01"));
        assert_eq!(planner.project(&open).unwrap(), Row(vec![Value::Null, json!("2020-01-01")]));
    }

    #[test]
    fn range_reconstruction() {
        let d = range();
        let schema = flattened_schema(&d);
        let planner = Planner::new(&d, &schema);

        let open = planner.reconstruct(&Row(vec![Value::Null, json!("2020-01-01")])).unwrap();
        assert_eq!(open, Instance::new("com.acme.Range.Open").with("start", json!("2020-01-01")));

        let closed = planner
            .reconstruct(&Row(vec![json!("2020-12-31"), json!("2020-01-01")]))
            .unwrap();
        assert_eq!(
            closed,
            Instance::new("com.acme.Range.Closed")
                .with("start", json!("2020-01-01"))
                .with("end", json!("2020-12-31"))
        );
    }

    #[test]
    fn arity_precedence() {
        let d = def(vec![alt("a.B", &[("x", "int")]), alt("a.A", &[("x", "int"), ("y", "int")])]);
        let schema = flattened_schema(&d);
        let planner = Planner::new(&d, &schema);
        let got = planner.reconstruct(&Row(vec![json!(1), json!(2)])).unwrap();
        assert_eq!(got.alternative, "a.A");
    }

    #[test]
    fn unknown_rows_and_instances() {
        let d = range();
        let schema = flattened_schema(&d);
        let planner = Planner::new(&d, &schema);

        assert!(matches!(
            planner.reconstruct(&Row(vec![json!("2020-12-31"), Value::Null])),
            Err(PlanError::UnknownAlternative { .. })
        ));
        assert!(matches!(
            planner.reconstruct(&Row(vec![json!("2020-12-31")])),
            Err(PlanError::UnknownAlternative { .. })
        ));
        assert!(matches!(
            planner.project(&Instance::new("com.acme.Range.HalfOpen")),
            Err(PlanError::UnknownAlternative { .. })
        ));
        let stray = Instance::new("com.acme.Range.Open").with("end", json!("2020-12-31"));
        assert!(matches!(planner.project(&stray), Err(PlanError::UnknownAlternative { .. })));
    }

    #[test]
    fn missing_instance_field_projects_absent() {
        let d = range();
        let schema = flattened_schema(&d);
        let planner = Planner::new(&d, &schema);
        let partial = Instance::new("com.acme.Range.Closed").with("start", json!("2020-01-01"));
        assert_eq!(planner.project(&partial).unwrap(), Row(vec![Value::Null, json!("2020-01-01")]));
    }

    #[test]
    fn incomparable_overlap_is_ambiguous() {
        let d = def(vec![
            alt("a.Left", &[("x", "int"), ("y", "int")]),
            alt("a.Right", &[("x", "int"), ("z", "int")]),
        ]);
        let schema = flattened_schema(&d);
        let planner = Planner::new(&d, &schema);

        // a projected row stays unambiguous
        let left = Instance::new("a.Left").with("x", json!(1)).with("y", json!(2));
        let row = planner.project(&left).unwrap();
        assert_eq!(planner.reconstruct(&row).unwrap(), left);

        // a row populating both alternatives does not
        let err = planner.reconstruct(&Row(vec![json!(1), json!(2), json!(3)])).unwrap_err();
        assert_eq!(err, PlanError::Ambiguous { matched: vec!["a.Left".into(), "a.Right".into()] });
        assert!(planner.ambiguous_pairs().is_empty());

        let rivals: Vec<_> = planner
            .rivals(0)
            .into_iter()
            .map(|(c, extra)| (c.name(), extra.iter().map(|(_, pos)| *pos).collect::<Vec<_>>()))
            .collect();
        assert_eq!(rivals, vec![("a.Right", vec![2])]);
        assert!(planner.rivals(1).is_empty());
    }

    #[test]
    fn identical_field_sets_are_ambiguous() {
        let d = def(vec![alt("a.Meters", &[("v", "double")]), alt("a.Feet", &[("v", "double")])]);
        let schema = flattened_schema(&d);
        let planner = Planner::new(&d, &schema);
        assert_eq!(planner.ambiguous_pairs(), vec![("a.Feet", "a.Meters")]);
        let ties: Vec<_> = planner.ties(1).iter().map(|c| c.name()).collect();
        assert_eq!(ties, ["a.Feet", "a.Meters"]);
        let err = planner.reconstruct(&Row(vec![json!(1.5)])).unwrap_err();
        assert_eq!(err, PlanError::Ambiguous { matched: vec!["a.Feet".into(), "a.Meters".into()] });
    }

    #[test]
    fn zero_field_alternative_catches_empty_rows() {
        let d = def(vec![alt("a.Some", &[("v", "int")]), alt("a.None", &[])]);
        let schema = flattened_schema(&d);
        let planner = Planner::new(&d, &schema);
        assert_eq!(planner.reconstruct(&Row::absent(1)).unwrap(), Instance::new("a.None"));
        assert_eq!(planner.reconstruct(&Row(vec![json!(7)])).unwrap().alternative, "a.Some");
    }
}
