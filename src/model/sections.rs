//! [`Section`] / [`Sections`] — the bucketed view of the `objects`
//! dictionary (`spec.md` §3 "Section / Sections").

use crate::collections::OrderedMap;
use crate::model::literal::{Literal, ObjectRef, Value};

/// All objects of a single `isa`, in insertion order.
pub type Section = OrderedMap<Literal, Value>;

/// The full `objects` dictionary, bucketed by `isa` (section name), in the
/// order sections were first populated.
#[derive(Debug, Clone, Default)]
pub struct Sections {
    sections: OrderedMap<String, Section>,
}

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Section)> {
        self.sections.iter()
    }

    pub fn section(&self, isa: &str) -> Option<&Section> {
        self.sections.get(isa)
    }

    pub fn section_mut(&mut self, isa: &str) -> Option<&mut Section> {
        self.sections.get_mut(isa)
    }

    /// Insert `object` into the section named by its own `isa`, creating the
    /// section if this is its first member.
    pub fn insert(&mut self, object: ObjectRef) {
        let (isa, id) = {
            let obj = object.borrow();
            (obj.isa().to_string(), obj.id().to_string())
        };
        self.sections
            .entry(isa)
            .or_default()
            .insert(Literal::string(id), Value::Object(object));
    }

    /// Look up an object anywhere in the graph by id, optionally narrowing
    /// the search to a single section (`spec.md` §6 `object(by-id, isa?)`).
    pub fn find(&self, id: &str, isa: Option<&str>) -> Option<ObjectRef> {
        if let Some(isa) = isa {
            return self
                .sections
                .get(isa)?
                .get(&Literal::string(id))
                .and_then(value_as_object);
        }
        for section in self.sections.values() {
            if let Some(v) = section.get(&Literal::string(id)) {
                return value_as_object(v);
            }
        }
        None
    }

    /// Remove the entry for `id` from whichever section holds it (`spec.md`
    /// §4.6 step 1). Drops the section itself if it becomes empty.
    /// Returns the removed object, if any.
    pub fn remove(&mut self, id: &str) -> Option<ObjectRef> {
        let mut found_section: Option<String> = None;
        for (isa, section) in self.sections.iter() {
            if section.contains_key(&Literal::string(id)) {
                found_section = Some(isa.clone());
                break;
            }
        }
        let isa = found_section?;
        let section = self.sections.get_mut(&isa)?;
        let removed = section.shift_remove(&Literal::string(id));
        if section.is_empty() {
            self.sections.shift_remove(&isa);
        }
        removed.and_then(|v| value_as_object(&v))
    }

    pub fn len(&self) -> usize {
        self.sections.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate every object in the graph, regardless of section.
    pub fn all_objects(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.sections
            .values()
            .flat_map(|section| section.values())
            .filter_map(value_as_object)
    }
}

fn value_as_object(v: &Value) -> Option<ObjectRef> {
    match v {
        Value::Object(o) => Some(o.clone()),
        _ => None,
    }
}
