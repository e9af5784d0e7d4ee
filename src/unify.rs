//! Schema unification.
//!
//! Fold every alternative's field set into one wide, nullable row shape:
//! - union ⊔ collects distinct `(name, type)` pairs; sorted by name, then type;
//! - intersection ⊓ keeps the pairs every alternative declares identically.
//!
//! Both folds are associative/commutative over sets, so alternative order
//! never changes the result.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::definition::{Field, SumTypeDefinition};

// ------------------------------ Schema ----------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub position: usize,
    #[serde(flatten)]
    pub field: Field,
}

/// The merged row shape. Positions are a pure function of the sorted field
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlattenedSchema {
    slots: Vec<Slot>,
}

impl FlattenedSchema {
    pub fn from_fields(fields: BTreeSet<Field>) -> Self {
        let slots = fields
            .into_iter()
            .enumerate()
            .map(|(position, field)| Slot { position, field })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.slots.iter().map(|s| &s.field)
    }

    /// Position by full `(name, type)` identity.
    pub fn position_of(&self, field: &Field) -> Option<usize> {
        // slots are sorted by field, so this is a plain binary search
        self.slots
            .binary_search_by(|s| s.field.cmp(field))
            .ok()
    }

    /// Names declared with more than one type; each such name owns several
    /// slots.
    pub fn name_collisions(&self) -> Vec<(&str, Vec<&str>)> {
        let mut by_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for slot in &self.slots {
            by_name
                .entry(slot.field.name.as_str())
                .or_default()
                .push(slot.field.ty.as_str());
        }
        by_name.into_iter().filter(|(_, tys)| tys.len() > 1).collect()
    }
}

/// Fields present, with the same type, in every alternative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommonFields(BTreeSet<Field>);

impl CommonFields {
    pub fn contains(&self, field: &Field) -> bool {
        self.0.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unified {
    pub schema: FlattenedSchema,
    pub common: CommonFields,
}

// ------------------------------- Folds ----------------------------------- //

pub fn union(a: &BTreeSet<Field>, b: &BTreeSet<Field>) -> BTreeSet<Field> {
    a | b
}

pub fn intersection(a: &BTreeSet<Field>, b: &BTreeSet<Field>) -> BTreeSet<Field> {
    a & b
}

pub fn flattened_schema(def: &SumTypeDefinition) -> FlattenedSchema {
    let all = def
        .alternatives
        .iter()
        .map(|a| a.field_set())
        .fold(BTreeSet::new(), |acc, set| union(&acc, &set));
    FlattenedSchema::from_fields(all)
}

pub fn common_fields(def: &SumTypeDefinition) -> CommonFields {
    let mut sets = def.alternatives.iter().map(|a| a.field_set());
    let Some(first) = sets.next() else {
        return CommonFields::default();
    };
    CommonFields(sets.fold(first, |acc, set| intersection(&acc, &set)))
}

pub fn unify(def: &SumTypeDefinition) -> Unified {
    Unified {
        schema: flattened_schema(def),
        common: common_fields(def),
    }
}

// ------------------------------- Tests ------------------------------------ //
