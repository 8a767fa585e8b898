//! The linker: rewrites id-shaped string literals into [`Literal::Ref`]s,
//! registers back-references, and buckets the flat `objects` dictionary into
//! [`Sections`] (`spec.md` §4.3).

use crate::error::{ModelError, Result};
use crate::model::literal::{Dictionary, Literal, ObjectRef, Value};
use crate::model::object::Object;
use crate::model::sections::Sections;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const REMOTE_GLOBAL_ID_KEY: &str = "remoteGlobalIDString";

/// Link a freshly-parsed root dictionary, returning the same dictionary
/// with every id-shaped literal resolved into a reference and `objects`
/// replaced by a bucketed [`Sections`].
pub fn link(mut root: Dictionary) -> Result<Dictionary> {
    let objects_key = Literal::string("objects");
    let raw_objects = root
        .shift_remove(&objects_key)
        .ok_or(ModelError::MissingObjects)?;
    let Value::Dictionary(raw_objects) = raw_objects else {
        return Err(ModelError::MissingObjects.into());
    };

    // Pass A: create an Object shell per entry (raw, unlinked content) and
    // substitute the value with Value::Object so the generic Dictionary
    // case below sees an Object node rather than a plain Dictionary when it
    // reaches the objects map (see spec.md §4.3 silent rule (a)).
    let mut shells: Dictionary = Dictionary::new();
    let mut by_id: HashMap<String, ObjectRef> = HashMap::new();
    for (key, value) in raw_objects {
        if !matches!(key, Literal::String(_)) {
            return Err(ModelError::NonStringObjectKey.into());
        }
        let id = key.as_str().to_string();
        let Value::Dictionary(content) = value else {
            return Err(ModelError::NonDictionaryObjectValue(id).into());
        };
        let object = Rc::new(RefCell::new(Object::create(id.clone(), content)?));
        by_id.insert(id.clone(), object.clone());
        shells.insert(Literal::string(id), Value::Object(object));
    }

    // Pass B: generic recursive link over the whole root, now including the
    // objects map (with Object-typed values) as a normal entry.
    root.insert(objects_key.clone(), Value::Dictionary(shells));
    let linked = link_value(Value::Dictionary(root), &by_id, None, false);
    let Value::Dictionary(mut linked_root) = linked else {
        unreachable!("link_value preserves the Dictionary variant for a Dictionary input")
    };

    let linked_objects = linked_root
        .shift_remove(&objects_key)
        .ok_or(ModelError::ObjectsMissingPostLink)?;
    let Value::Dictionary(linked_objects) = linked_objects else {
        return Err(ModelError::ObjectsMissingPostLink.into());
    };

    let mut sections = Sections::new();
    for (key, value) in linked_objects {
        let Value::Object(object) = value else {
            return Err(ModelError::InvalidPostLinkEntry(key.as_str().to_string()).into());
        };
        sections.insert(object);
    }

    linked_root.insert(objects_key, Value::Sections(sections));
    Ok(linked_root)
}

/// Recursively rewrite `value`, threading the "silent" flag explicitly
/// through every call (`spec.md` §9's resolution of the `silentLiterals`
/// open question: always read the parameter, never an outer variable).
fn link_value(
    value: Value,
    objects: &HashMap<String, ObjectRef>,
    containing: Option<&ObjectRef>,
    silent: bool,
) -> Value {
    match value {
        Value::Dictionary(dict) => {
            let mut out = Dictionary::new();
            for (key, val) in dict {
                let key_str = key.as_str().to_string();
                let value_is_plain_dictionary = matches!(val, Value::Dictionary(_));
                let new_key = match objects.get(&key_str) {
                    Some(target) => {
                        if let Some(parent) = containing {
                            target.borrow_mut().add_reference(Rc::downgrade(parent));
                        }
                        // Silent rule (a): a key that resolves to an object
                        // is rendered without a comment when its value is
                        // itself still a plain dictionary (i.e. not the
                        // object's own content, which was pre-substituted
                        // into a Value::Object in `link`).
                        Literal::reference(key_str.clone(), Rc::downgrade(target), value_is_plain_dictionary)
                    }
                    None => key,
                };
                // Silent rule (b): remoteGlobalIDString's value is always
                // rendered without a comment.
                let child_silent = key_str == REMOTE_GLOBAL_ID_KEY || silent;
                let new_val = link_value(val, objects, containing, child_silent);
                out.insert(new_key, new_val);
            }
            Value::Dictionary(out)
        }
        Value::Array(arr) => Value::Array(
            arr.into_iter()
                .map(|v| link_value(v, objects, containing, silent))
                .collect(),
        ),
        Value::Literal(Literal::String(s)) => match objects.get(&s) {
            Some(target) => {
                if let Some(parent) = containing {
                    target.borrow_mut().add_reference(Rc::downgrade(parent));
                }
                Value::Literal(Literal::reference(s, Rc::downgrade(target), silent))
            }
            None => Value::Literal(Literal::String(s)),
        },
        Value::Literal(already_ref) => Value::Literal(already_ref),
        Value::Object(object) => {
            let inner = std::mem::take(&mut object.borrow_mut().content);
            let linked = link_value(Value::Dictionary(inner), objects, Some(&object), false);
            let Value::Dictionary(linked) = linked else {
                unreachable!("link_value preserves the Dictionary variant for a Dictionary input")
            };
            object.borrow_mut().content = linked;
            Value::Object(object)
        }
        Value::Sections(sections) => Value::Sections(sections),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plist::parser::parse;

    #[test]
    fn links_forward_and_back_references() {
        let text = r#"{ objects = { AAAA000000000000000000AA = { isa = X; ref = BBBB000000000000000000BB; }; BBBB000000000000000000BB = { isa = Y; name = "n"; }; }; }"#;
        let root = parse(text).unwrap();
        let linked = link(root).unwrap();
        let sections = linked.get(&Literal::string("objects")).unwrap().as_sections().unwrap();

        let a = sections.find("AAAA000000000000000000AA", Some("X")).unwrap();
        let resolved = a
            .borrow()
            .content
            .get(&Literal::string("ref"))
            .and_then(Value::as_literal)
            .and_then(Literal::resolve)
            .unwrap();
        assert_eq!(resolved.borrow().id(), "BBBB000000000000000000BB");

        let b = sections.find("BBBB000000000000000000BB", Some("Y")).unwrap();
        let referrers = b.borrow().referenced_by();
        assert_eq!(referrers.len(), 1);
        assert_eq!(referrers[0].borrow().id(), "AAAA000000000000000000AA");
    }

    #[test]
    fn remote_global_id_string_value_is_silent() {
        let text = r#"{ objects = {
            AAAA000000000000000000AA = { isa = PBXContainerItemProxy; remoteGlobalIDString = BBBB000000000000000000BB; };
            BBBB000000000000000000BB = { isa = PBXNativeTarget; name = Target; };
        }; }"#;
        let root = parse(text).unwrap();
        let linked = link(root).unwrap();
        let sections = linked.get(&Literal::string("objects")).unwrap().as_sections().unwrap();
        let a = sections
            .find("AAAA000000000000000000AA", Some("PBXContainerItemProxy"))
            .unwrap();
        let value = a
            .borrow()
            .content
            .get(&Literal::string("remoteGlobalIDString"))
            .and_then(Value::as_literal)
            .cloned()
            .unwrap();
        assert!(value.is_silent());
    }
}
