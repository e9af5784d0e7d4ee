//! Adapter skeleton with `%SLOT%` placeholders.
//!
//! Parsed once into literal/slot segments and rendered in a single pass, so a
//! generated body that happens to contain `%NAME%` is left alone.

use crate::error::TemplateError;

/// Bundled Hibernate `CompositeUserType` skeleton.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/CompositeSumType.java");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Name,
    Package,
    SumType,
    EmbeddableType,
    EmbeddableTypeContent,
    GetPropertyBody,
    InstantiateBody,
}

impl Slot {
    pub const ALL: [Slot; 7] = [
        Slot::Name,
        Slot::Package,
        Slot::SumType,
        Slot::EmbeddableType,
        Slot::EmbeddableTypeContent,
        Slot::GetPropertyBody,
        Slot::InstantiateBody,
    ];

    pub fn placeholder(self) -> &'static str {
        match self {
            Slot::Name => "%NAME%",
            Slot::Package => "%PACKAGE%",
            Slot::SumType => "%SUM_TYPE%",
            Slot::EmbeddableType => "%EMBEDDABLE_TYPE%",
            Slot::EmbeddableTypeContent => "%EMBEDDABLE_TYPE_CONTENT%",
            Slot::GetPropertyBody => "%GET_PROPERTY_BODY%",
            Slot::InstantiateBody => "%INSTANTIATE_BODY%",
        }
    }

    /// Identifier slots recur in method signatures; declaration and body
    /// slots must be unique.
    pub fn repeatable(self) -> bool {
        matches!(self, Slot::Name | Slot::SumType | Slot::EmbeddableType)
    }

    fn from_placeholder(s: &str) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| slot.placeholder() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

/// Text for every slot.
#[derive(Debug, Clone, Default)]
pub struct SlotValues {
    pub name: String,
    pub package: String,
    pub sum_type: String,
    pub embeddable_type: String,
    pub embeddable_type_content: String,
    pub get_property_body: String,
    pub instantiate_body: String,
}

impl SlotValues {
    fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::Name => &self.name,
            Slot::Package => &self.package,
            Slot::SumType => &self.sum_type,
            Slot::EmbeddableType => &self.embeddable_type,
            Slot::EmbeddableTypeContent => &self.embeddable_type_content,
            Slot::GetPropertyBody => &self.get_property_body,
            Slot::InstantiateBody => &self.instantiate_body,
        }
    }
}

impl Template {
    pub fn parse(src: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = src;

        while let Some(start) = rest.find('%') {
            let after = &rest[start + 1..];
            let slot = after
                .find('%')
                .and_then(|end| Slot::from_placeholder(&rest[start..start + end + 2]));
            match slot {
                Some(slot) => {
                    literal.push_str(&rest[..start]);
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(slot));
                    rest = &rest[start + slot.placeholder().len()..];
                }
                None => {
                    // a lone '%' is ordinary text
                    literal.push_str(&rest[..=start]);
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let template = Self { segments };
        template.check_slots()?;
        Ok(template)
    }

    pub fn count(&self, slot: Slot) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Slot(x) if *x == slot))
            .count()
    }

    fn check_slots(&self) -> Result<(), TemplateError> {
        for slot in Slot::ALL {
            let count = self.count(slot);
            if count == 0 {
                return Err(TemplateError::MissingSlot { slot: slot.placeholder() });
            }
            if count > 1 && !slot.repeatable() {
                return Err(TemplateError::RepeatedSlot { slot: slot.placeholder(), count });
            }
        }
        Ok(())
    }

    /// Column at which a slot starts, measured from the start of its line.
    /// Multi-line bodies are re-indented to this column.
    pub fn column_of(&self, slot: Slot) -> usize {
        let mut column = 0;
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => {
                    column = match text.rfind('\n') {
                        Some(i) => text.len() - i - 1,
                        None => column + text.len(),
                    };
                }
                Segment::Slot(s) if *s == slot => return column,
                // identifier widths are unknown until render
                Segment::Slot(_) => {}
            }
        }
        0
    }

    pub fn render(&self, values: &SlotValues) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(slot) => out.push_str(values.get(*slot)),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> String {
        Slot::ALL.iter().map(|s| s.placeholder()).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn bundled_template_is_well_formed() {
        let t = Template::parse(DEFAULT_TEMPLATE).unwrap();
        for slot in Slot::ALL {
            assert!(t.count(slot) >= 1, "{}", slot.placeholder());
            if !slot.repeatable() {
                assert_eq!(t.count(slot), 1, "{}", slot.placeholder());
            }
        }
        assert_eq!(t.column_of(Slot::GetPropertyBody), 8);
        assert_eq!(t.column_of(Slot::EmbeddableTypeContent), 8);
    }

    #[test]
    fn missing_slot_is_rejected() {
        let src = minimal().replace("%INSTANTIATE_BODY%", "");
        assert_eq!(
            Template::parse(&src),
            Err(TemplateError::MissingSlot { slot: "%INSTANTIATE_BODY%" })
        );
    }

    #[test]
    fn repeated_body_slot_is_rejected() {
        let src = format!("{}\n%GET_PROPERTY_BODY%", minimal());
        assert_eq!(
            Template::parse(&src),
            Err(TemplateError::RepeatedSlot { slot: "%GET_PROPERTY_BODY%", count: 2 })
        );
        let repeated_name = format!("{}\n%NAME%", minimal());
        assert!(Template::parse(&repeated_name).is_ok());
    }

    #[test]
    fn render_is_single_pass() {
        let t = Template::parse(&format!("100% {}", minimal())).unwrap();
        let values = SlotValues {
            name: "%SUM_TYPE%".into(),
            sum_type: "S".into(),
            ..SlotValues::default()
        };
        let out = t.render(&values);
        assert!(out.starts_with("100% %SUM_TYPE%\n\nS\n"), "{out}");
    }

    #[test]
    fn column_tracks_indentation() {
        let src = format!("class X {{\n    {}\n}}", minimal().replace('\n', "\n    "));
        let t = Template::parse(&src).unwrap();
        assert_eq!(t.column_of(Slot::Name), 4);
        assert_eq!(t.column_of(Slot::InstantiateBody), 4);
    }
}
