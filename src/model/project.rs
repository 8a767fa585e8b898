//! [`Project`] — the mutation API over a linked object graph: creation,
//! lookup, removal with reference purging, and group/file-reference
//! management (`spec.md` §4.6, §6).

use crate::error::{ModelError, Result};
use crate::model::literal::{Dictionary, Literal, ObjectRef, Value};
use crate::model::object::{generate_id, Object};
use crate::model::sections::Sections;
use crate::path_resolution;
use camino::Utf8Path;
use std::rc::Rc;

/// Bit-flag options for [`Project::enumerate_child_projects`]. Distinct bit
/// positions resolve `spec.md` §9's open question about `deep`/`once`
/// colliding on the same flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerateOptions(u8);

impl EnumerateOptions {
    pub const NONE: EnumerateOptions = EnumerateOptions(0);
    pub const DEEP: EnumerateOptions = EnumerateOptions(1 << 0);
    pub const ONCE: EnumerateOptions = EnumerateOptions(1 << 1);

    pub fn contains(self, flag: EnumerateOptions) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl std::ops::BitOr for EnumerateOptions {
    type Output = EnumerateOptions;
    fn bitor(self, rhs: EnumerateOptions) -> EnumerateOptions {
        EnumerateOptions(self.0 | rhs.0)
    }
}

/// Marker trait identifying a dictionary shape [`Project::create`] can stamp
/// out: `kind()` supplies the `isa` and `defaults()` any fields the caller
/// doesn't override.
pub trait ObjectKind {
    fn isa() -> &'static str;
    fn defaults() -> Dictionary {
        Dictionary::new()
    }
}

pub struct FileReferenceKind;
impl ObjectKind for FileReferenceKind {
    fn isa() -> &'static str {
        "PBXFileReference"
    }
    fn defaults() -> Dictionary {
        let mut d = Dictionary::new();
        d.insert(Literal::string("sourceTree"), Value::string("<group>"));
        d
    }
}

pub struct GroupKind;
impl ObjectKind for GroupKind {
    fn isa() -> &'static str {
        "PBXGroup"
    }
    fn defaults() -> Dictionary {
        let mut d = Dictionary::new();
        d.insert(Literal::string("children"), Value::Array(Vec::new()));
        d.insert(Literal::string("sourceTree"), Value::string("<group>"));
        d
    }
}

/// The root of a parsed, linked `.pbxproj` document plus the directory it
/// lives in (needed to resolve `SOURCE_ROOT`-anchored paths to absolute
/// URLs, `spec.md` §4.8) and whether the source carried the leading
/// `// !$*UTF8*$!` prologue, so rendering reproduces it only when it was
/// actually there (`spec.md` §8 Scenario S1).
pub struct Project {
    root: Dictionary,
    project_dir: camino::Utf8PathBuf,
    has_prologue: bool,
}

impl Project {
    pub fn new(root: Dictionary, project_dir: impl Into<camino::Utf8PathBuf>, has_prologue: bool) -> Self {
        Project {
            root,
            project_dir: project_dir.into(),
            has_prologue,
        }
    }

    /// Parse `text` (an already-read `project.pbxproj`) and link its
    /// `objects` dictionary into a graph, attributing it to `project_dir`
    /// (`spec.md` §6).
    pub fn parse(text: &str, project_dir: impl Into<camino::Utf8PathBuf>) -> Result<Self> {
        let (has_prologue, root) = crate::plist::parser::parse_with_prologue(text)?;
        let linked = crate::model::linker::link(root)?;
        Ok(Project::new(linked, project_dir, has_prologue))
    }

    /// Read and parse `path` through `loader`, deriving `project_dir` from
    /// its parent directory (`spec.md` §6 "Construct Project from a
    /// directory URL or the `project.pbxproj` file").
    pub fn open(loader: &dyn crate::loader::Loader, path: &camino::Utf8Path) -> Result<Self> {
        let text = loader.read_to_string(path)?;
        let project_dir = path.parent().unwrap_or(Utf8Path::new(".")).to_path_buf();
        Self::parse(&text, project_dir)
    }

    /// Render this project back to its exact on-disk form (`spec.md` §6
    /// `content()`).
    pub fn content(&self) -> Result<String> {
        crate::plist::render::render(&self.root, self.has_prologue)
    }

    /// Write the rendered project to `path` (or the original source path
    /// when no override is given) through `loader` (`spec.md` §6 `write(to?)`).
    pub fn write(&self, loader: &dyn crate::loader::Loader, path: &camino::Utf8Path) -> Result<()> {
        loader.write_string(path, &self.content()?)
    }

    pub fn root(&self) -> &Dictionary {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Dictionary {
        &mut self.root
    }

    pub fn project_dir(&self) -> &Utf8Path {
        &self.project_dir
    }

    fn sections(&self) -> Result<&Sections> {
        self.root
            .get(&Literal::string("objects"))
            .and_then(Value::as_sections)
            .ok_or_else(|| ModelError::ObjectsMissingPostLink.into())
    }

    fn sections_mut(&mut self) -> Result<&mut Sections> {
        self.root
            .get_mut(&Literal::string("objects"))
            .and_then(Value::as_sections_mut)
            .ok_or_else(|| ModelError::ObjectsMissingPostLink.into())
    }

    /// Look up an object by id, optionally narrowing to a single section
    /// (`spec.md` §6 `object(by-id, isa?)`).
    pub fn object(&self, id: &str, isa: Option<&str>) -> Option<ObjectRef> {
        self.sections().ok()?.find(id, isa)
    }

    /// Create a new object of kind `T`, merging `overrides` on top of
    /// `T::defaults()`, assign it a fresh id, insert it into its section, and
    /// return the new [`ObjectRef`] (`spec.md` §4.4, §6 `create<T>()`).
    pub fn create<T: ObjectKind>(&mut self, overrides: Dictionary) -> Result<ObjectRef> {
        let mut content = T::defaults();
        content.insert(Literal::string("isa"), Value::string(T::isa()));
        for (key, value) in overrides {
            content.insert(key, value);
        }
        let id = generate_id();
        let object = Rc::new(std::cell::RefCell::new(Object::create(id, content)?));
        self.sections_mut()?.insert(object.clone());
        Ok(object)
    }

    /// Replace the content of an already-inserted object in place.
    pub fn set_object(&mut self, id: &str, content: Dictionary) -> Result<()> {
        let object = self
            .object(id, None)
            .ok_or_else(|| ModelError::InvalidPostLinkEntry(id.to_string()))?;
        object.borrow_mut().content = content;
        Ok(())
    }

    /// Remove the object `id` from the graph and purge every reference to it
    /// (`spec.md` §4.6):
    ///
    /// 1. Remove it from its section.
    /// 2. For every live referrer, sweep its content removing every
    ///    occurrence (dictionary entries, array elements, nested structures)
    ///    whose literal resolves to the removed object.
    /// 3. Recursively remove dangling children this removal orphans is left
    ///    to the caller — this operation purges references, it does not
    ///    cascade deletes.
    ///
    /// Idempotent: removing an id that isn't present is a no-op.
    pub fn remove_object(&mut self, id: &str) -> Result<()> {
        let sections = self.sections_mut()?;
        let Some(removed) = sections.remove(id) else {
            return Ok(());
        };

        // Snapshot referrers before mutating anything, per spec.md §5's
        // "non-mutate-during-iterate" requirement.
        let referrers = removed.borrow().referenced_by();
        for referrer in referrers {
            let mut content = std::mem::take(&mut referrer.borrow_mut().content);
            purge_references(&mut content, id);
            referrer.borrow_mut().content = content;
        }

        // Sweep the removed object's own content too, so nothing it once
        // referenced is left holding a stale back-reference to it.
        let mut own_content = std::mem::take(&mut removed.borrow_mut().content);
        purge_references(&mut own_content, id);
        removed.borrow_mut().content = own_content;

        Ok(())
    }

    /// Create a `PBXFileReference` for `path` relative to `parent_group`,
    /// append it to the group's `children`, and return the new object
    /// (`spec.md` §6 `createFileReference`).
    pub fn create_file_reference(
        &mut self,
        parent_group: &ObjectRef,
        path: &str,
        source_tree: &str,
    ) -> Result<ObjectRef> {
        let mut overrides = Dictionary::new();
        overrides.insert(Literal::string("path"), Value::string(path));
        overrides.insert(Literal::string("sourceTree"), Value::string(source_tree));
        let file_ref = self.create::<FileReferenceKind>(overrides)?;
        append_child(parent_group, file_ref.clone());
        Ok(file_ref)
    }

    /// Create a `PBXGroup` named/pathed `name` under `parent_group`, append
    /// it to the parent's `children`, and return the new object (`spec.md`
    /// §6 `createGroup`).
    pub fn create_group(&mut self, parent_group: &ObjectRef, name: &str) -> Result<ObjectRef> {
        let mut overrides = Dictionary::new();
        overrides.insert(Literal::string("path"), Value::string(name));
        let group = self.create::<GroupKind>(overrides)?;
        append_child(parent_group, group.clone());
        Ok(group)
    }

    /// Walk `directory`'s path components from the project's main group,
    /// creating intermediate `PBXGroup`s along the way when
    /// `create_intermediates` is set and a matching child doesn't already
    /// exist; otherwise returns the deepest existing match (`spec.md` §6
    /// `groupFor`).
    pub fn group_for(
        &mut self,
        main_group: &ObjectRef,
        directory: &str,
        create_intermediates: bool,
    ) -> Result<Option<ObjectRef>> {
        let mut current = main_group.clone();
        for component in directory.split('/').filter(|c| !c.is_empty()) {
            let existing = children_of(&current)
                .into_iter()
                .find(|child| child_name(child).as_deref() == Some(component));
            current = match existing {
                Some(child) => child,
                None if create_intermediates => self.create_group(&current, component)?,
                None => return Ok(None),
            };
        }
        Ok(Some(current))
    }

    /// Depth-first search under `group` for a `PBXFileReference` whose
    /// resolved location matches `path` (`spec.md` §6 `searchFileReference`).
    pub fn search_file_reference(&self, group: &ObjectRef, path: &str) -> Option<ObjectRef> {
        for child in children_of(group) {
            let isa = child.borrow().isa().to_string();
            if isa == "PBXFileReference" {
                let resolved = path_resolution::resolve_file_reference_path(&child, &self.project_dir);
                if resolved.location == path {
                    return Some(child);
                }
            } else if isa == "PBXGroup" || isa == "PBXVariantGroup" {
                if let Some(found) = self.search_file_reference(&child, path) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Depth-first search under `group` for a `PBXGroup` whose resolved
    /// location matches `path` (`spec.md` §6 `searchGroup`).
    pub fn search_group(&self, group: &ObjectRef, path: &str) -> Option<ObjectRef> {
        let resolved = path_resolution::resolve_group_path(group, &self.project_dir);
        if resolved.location == path {
            return Some(group.clone());
        }
        for child in children_of(group) {
            if child.borrow().isa() == "PBXGroup" {
                if let Some(found) = self.search_group(&child, path) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Visit every `PBXFileReference` whose path ends in a project bundle
    /// extension reachable from `root_group`, calling `visit` with each.
    /// Without `EnumerateOptions::DEEP`, only `root_group`'s direct children
    /// are scanned; with it, every nested group is walked too.
    /// `EnumerateOptions::ONCE` de-duplicates by resolved absolute URL so a
    /// project included from two places is only visited once (`spec.md` §6
    /// `enumerateChildProjects`).
    pub fn enumerate_child_projects(
        &self,
        root_group: &ObjectRef,
        options: EnumerateOptions,
        mut visit: impl FnMut(&ObjectRef) -> bool,
    ) {
        let mut seen = std::collections::HashSet::new();
        self.enumerate_child_projects_inner(root_group, options, &mut seen, &mut visit);
    }

    fn enumerate_child_projects_inner(
        &self,
        group: &ObjectRef,
        options: EnumerateOptions,
        seen: &mut std::collections::HashSet<String>,
        visit: &mut impl FnMut(&ObjectRef) -> bool,
    ) -> bool {
        for child in children_of(group) {
            let isa = child.borrow().isa().to_string();
            if isa == "PBXFileReference" {
                let is_project = child_name(&child)
                    .map(|n| n.ends_with(".xcodeproj"))
                    .unwrap_or(false);
                if is_project {
                    if options.contains(EnumerateOptions::ONCE) {
                        let resolved = path_resolution::resolve_file_reference_path(&child, &self.project_dir);
                        let key = resolved
                            .absolute_url
                            .map(|p| p.to_string())
                            .unwrap_or(resolved.location);
                        if !seen.insert(key) {
                            continue;
                        }
                    }
                    if !visit(&child) {
                        return false;
                    }
                }
            } else if (isa == "PBXGroup" || isa == "PBXVariantGroup")
                && options.contains(EnumerateOptions::DEEP)
            {
                if !self.enumerate_child_projects_inner(&child, options, seen, visit) {
                    return false;
                }
            }
        }
        true
    }
}

fn append_child(group: &ObjectRef, child: ObjectRef) {
    let key = Literal::string(child.borrow().id().to_string());
    let weak = Rc::downgrade(group);
    child.borrow_mut().add_reference(weak);
    let mut content = std::mem::take(&mut group.borrow_mut().content);
    let children = content
        .entry(Literal::string("children"))
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Some(arr) = children.as_array_mut() {
        arr.push(Value::Literal(key));
    }
    group.borrow_mut().content = content;
}

fn children_of(group: &ObjectRef) -> Vec<ObjectRef> {
    group
        .borrow()
        .content
        .get(&Literal::string("children"))
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_literal)
                .filter_map(Literal::resolve)
                .collect()
        })
        .unwrap_or_default()
}

fn child_name(child: &ObjectRef) -> Option<String> {
    let obj = child.borrow();
    obj.content
        .get(&Literal::string("path"))
        .or_else(|| obj.content.get(&Literal::string("name")))
        .and_then(Value::as_literal)
        .map(|l| l.as_str().to_string())
}

/// Remove every dictionary entry or array element in `value` whose literal
/// key or value resolves to `target_id`, recursing into nested
/// dictionaries/arrays. Does not descend into `Value::Object` (an object's
/// own content is swept separately, never through another object's sweep).
fn purge_references(value: &mut Value, target_id: &str) {
    match value {
        Value::Dictionary(dict) => {
            dict.retain(|key, _| !literal_targets(key, target_id));
            for (_, v) in dict.iter_mut() {
                purge_value(v, target_id);
            }
        }
        Value::Array(arr) => {
            arr.retain(|v| !value_targets(v, target_id));
            for v in arr.iter_mut() {
                purge_value(v, target_id);
            }
        }
        _ => {}
    }
}

fn purge_value(value: &mut Value, target_id: &str) {
    match value {
        Value::Dictionary(_) | Value::Array(_) => purge_references(value, target_id),
        _ => {}
    }
}

fn literal_targets(literal: &Literal, target_id: &str) -> bool {
    literal.is_ref() && literal.as_str() == target_id
}

fn value_targets(value: &Value, target_id: &str) -> bool {
    matches!(value, Value::Literal(l) if literal_targets(l, target_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plist::parser::parse;
    use crate::model::linker::link;

    fn make_project(text: &str) -> Project {
        let root = parse(text).unwrap();
        let linked = link(root).unwrap();
        Project::new(linked, "/proj", false)
    }

    #[test]
    fn create_and_find_object() {
        let mut project = make_project(r#"{ objects = { }; }"#);
        let group = project.create::<GroupKind>(Dictionary::new()).unwrap();
        let id = group.borrow().id().to_string();
        assert!(project.object(&id, Some("PBXGroup")).is_some());
    }

    #[test]
    fn remove_object_purges_referrers() {
        let mut project = make_project(
            r#"{ objects = {
                AAAA000000000000000000AA = { isa = PBXGroup; children = ( BBBB000000000000000000BB ); sourceTree = "<group>"; };
                BBBB000000000000000000BB = { isa = PBXFileReference; path = "a.swift"; sourceTree = "<group>"; };
            }; }"#,
        );
        project.remove_object("BBBB000000000000000000BB").unwrap();
        assert!(project.object("BBBB000000000000000000BB", None).is_none());
        let group = project.object("AAAA000000000000000000AA", None).unwrap();
        let children = group
            .borrow()
            .content
            .get(&Literal::string("children"))
            .and_then(Value::as_array)
            .unwrap()
            .clone();
        assert!(children.is_empty());
    }

    #[test]
    fn remove_object_is_idempotent() {
        let mut project = make_project(r#"{ objects = { }; }"#);
        project.remove_object("NONEXISTENT").unwrap();
    }

    #[test]
    fn group_for_creates_intermediates() {
        let mut project = make_project(r#"{ objects = {
            AAAA000000000000000000AA = { isa = PBXGroup; children = ( ); sourceTree = "<group>"; };
        }; }"#);
        let main_group = project.object("AAAA000000000000000000AA", None).unwrap();
        let found = project
            .group_for(&main_group, "Sources/Models", true)
            .unwrap()
            .unwrap();
        assert_eq!(found.borrow().isa(), "PBXGroup");
    }
}
