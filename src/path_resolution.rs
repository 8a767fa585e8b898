//! Path resolution: turns a group/file-reference's `sourceTree`/`path`
//! chain into a location string and (when resolvable) an absolute URL
//! (`spec.md` §4.8).

use crate::model::{Literal, ObjectRef, Value};
use camino::{Utf8Path, Utf8PathBuf};

/// The result of walking a group or file-reference's anchor chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// The symbolic, possibly anchor-relative location (e.g.
    /// `$(BUILT_PRODUCTS_DIR)/App.app`, or a project-relative path).
    pub location: String,
    /// The absolute filesystem URL, when the anchor is resolvable without
    /// external context (`spec.md` §4.8 table: `BUILT_PRODUCTS_DIR`,
    /// `SDKROOT`, and `DEVELOPER_DIR` are left unresolved).
    pub absolute_url: Option<Utf8PathBuf>,
}

/// Walk `group`'s parent chain (via each ancestor's cached parent, set at
/// link time when a containing group references it as a child) to compute
/// its location and absolute URL.
pub fn resolve_group_path(group: &ObjectRef, project_dir: &Utf8Path) -> ResolvedPath {
    resolve_location(group, project_dir, false)
}

/// Same algorithm, seeded with a file reference's own `path` plus
/// `sourceTree`, then continuing into its parent group if one is cached
/// (`spec.md` §4.8). Unlike a plain group step, the file reference's own
/// `path` is folded into the accumulator unconditionally — even when its
/// `sourceTree` is itself a terminal anchor like `SDKROOT` — rather than
/// only in the pass-through case.
pub fn resolve_file_reference_path(file_reference: &ObjectRef, project_dir: &Utf8Path) -> ResolvedPath {
    resolve_location(file_reference, project_dir, true)
}

fn resolve_location(start: &ObjectRef, project_dir: &Utf8Path, seed_own_path: bool) -> ResolvedPath {
    let mut components: Vec<String> = Vec::new();
    let mut current = Some(start.clone());
    let mut is_start = true;

    loop {
        let node = match current.take() {
            Some(n) => n,
            None => break,
        };
        let (source_tree, path, parent) = {
            let obj = node.borrow();
            let source_tree = string_field(&obj.content, "sourceTree");
            let path = string_field(&obj.content, "path");
            let parent = obj.cached_parent().and_then(|w| w.upgrade());
            (source_tree, path, parent)
        };

        // The starting file reference's own `path` is seeded into the
        // accumulator before consulting the anchor table, regardless of
        // which anchor its `sourceTree` names; every later (group) step
        // only contributes its `path` in the pass-through arm below.
        let already_seeded = is_start && seed_own_path;
        is_start = false;
        if already_seeded {
            if let Some(p) = &path {
                components.insert(0, p.clone());
            }
        }

        match source_tree.as_deref() {
            Some("BUILT_PRODUCTS_DIR") => {
                return ResolvedPath {
                    location: join_anchor("$(BUILT_PRODUCTS_DIR)", &components),
                    absolute_url: None,
                };
            }
            Some("SDKROOT") => {
                return ResolvedPath {
                    location: format!("/{}", components.join("/")),
                    absolute_url: None,
                };
            }
            Some("DEVELOPER_DIR") => {
                return ResolvedPath {
                    location: join_anchor("$(DEVELOPER_DIR)", &components),
                    absolute_url: None,
                };
            }
            Some("SOURCE_ROOT") => {
                let location = components.join("/");
                let absolute_url = canonicalize_join(project_dir, &location);
                return ResolvedPath {
                    location,
                    absolute_url: Some(absolute_url),
                };
            }
            Some("<absolute>") => {
                let location = format!("/{}", components.join("/"));
                let absolute_url = Utf8PathBuf::from(&location);
                return ResolvedPath {
                    location,
                    absolute_url: Some(absolute_url),
                };
            }
            // "<group>", unset, or anything else: pass through to the
            // parent, inserting this node's own path component first (unless
            // the starting seed above already did so).
            _ => {
                if !already_seeded {
                    if let Some(p) = path {
                        components.insert(0, p);
                    }
                }
                match parent {
                    Some(p) => current = Some(p),
                    None => {
                        let location = components.join("/");
                        let absolute_url = canonicalize_join(project_dir, &location);
                        return ResolvedPath {
                            location,
                            absolute_url: Some(absolute_url),
                        };
                    }
                }
            }
        }
    }

    ResolvedPath {
        location: components.join("/"),
        absolute_url: None,
    }
}

fn string_field(content: &crate::model::Dictionary, key: &str) -> Option<String> {
    content
        .get(&Literal::string(key))
        .and_then(Value::as_literal)
        .map(|l| l.as_str().to_string())
}

fn join_anchor(anchor: &str, components: &[String]) -> String {
    if components.is_empty() {
        anchor.to_string()
    } else {
        format!("{anchor}/{}", components.join("/"))
    }
}

/// `project-dir ⊕ location`, canonicalized: resolve symlinks, falling back
/// to a textual resolution of `.`/`..` if the path doesn't exist on disk
/// (`spec.md` §4.8 "Canonicalization").
fn canonicalize_join(project_dir: &Utf8Path, location: &str) -> Utf8PathBuf {
    let joined = if location.is_empty() {
        project_dir.to_path_buf()
    } else {
        project_dir.join(location)
    };
    canonicalize(&joined)
}

/// Resolve symlinks; fall back to textual `.`/`..` collapsing when the path
/// doesn't exist (or resolution otherwise fails).
pub fn canonicalize(path: &Utf8Path) -> Utf8PathBuf {
    if let Ok(resolved) = std::fs::canonicalize(path.as_std_path()) {
        if let Ok(utf8) = Utf8PathBuf::from_path_buf(resolved) {
            return utf8;
        }
    }
    textual_collapse(path)
}

fn textual_collapse(path: &Utf8Path) -> Utf8PathBuf {
    let mut out: Vec<&str> = Vec::new();
    for component in path.as_str().split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if out.last().is_some_and(|c| *c != "..") {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    let mut result = String::new();
    if path.is_absolute() {
        result.push('/');
    }
    result.push_str(&out.join("/"));
    Utf8PathBuf::from(result)
}

/// `base.relative_to(target)`: split both paths into components after
/// canonicalization, drop the common prefix, emit `..` for each remaining
/// component of `base`, then the remaining components of `target`
/// (`spec.md` §4.8 "Relative-path derivation").
pub fn relative_path(base: &Utf8Path, target: &Utf8Path) -> Utf8PathBuf {
    let base = canonicalize(base);
    let target = canonicalize(target);
    let base_components: Vec<&str> = base.as_str().split('/').filter(|c| !c.is_empty()).collect();
    let target_components: Vec<&str> = target.as_str().split('/').filter(|c| !c.is_empty()).collect();

    let common = base_components
        .iter()
        .zip(target_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base_components.len() {
        parts.push("..".to_string());
    }
    for component in &target_components[common..] {
        parts.push(component.to_string());
    }
    Utf8PathBuf::from(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dictionary, Object, Sections};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn make_group(id: &str, path: Option<&str>, source_tree: &str) -> ObjectRef {
        let mut content = Dictionary::new();
        content.insert(Literal::string("isa"), Value::string("PBXGroup"));
        if let Some(p) = path {
            content.insert(Literal::string("path"), Value::string(p));
        }
        content.insert(Literal::string("sourceTree"), Value::string(source_tree));
        content.insert(Literal::string("children"), Value::Array(Vec::new()));
        Rc::new(RefCell::new(Object::create(id, content).unwrap()))
    }

    fn link_parent_child(parent: &ObjectRef, child: &ObjectRef) {
        child.borrow_mut().add_reference(Rc::downgrade(parent));
    }

    fn make_file_reference(id: &str, path: &str, source_tree: &str) -> ObjectRef {
        let mut content = Dictionary::new();
        content.insert(Literal::string("isa"), Value::string("PBXFileReference"));
        content.insert(Literal::string("path"), Value::string(path));
        content.insert(Literal::string("sourceTree"), Value::string(source_tree));
        Rc::new(RefCell::new(Object::create(id, content).unwrap()))
    }

    #[test]
    fn resolves_nested_group_relative_to_source_root() {
        let mut sections = Sections::new();
        let root = make_group("ROOT", None, "<group>");
        let mid = make_group("MID", Some("Sources"), "<group>");
        let leaf = make_group("LEAF", Some("Nested"), "SOURCE_ROOT");
        link_parent_child(&root, &mid);
        link_parent_child(&mid, &leaf);
        sections.insert(root);
        sections.insert(mid);
        sections.insert(leaf.clone());

        let resolved = resolve_group_path(&leaf, Utf8Path::new("/proj"));
        assert_eq!(resolved.location, "Nested");
        assert_eq!(resolved.absolute_url.unwrap(), Utf8PathBuf::from("/proj/Nested"));
    }

    #[test]
    fn built_products_dir_is_left_unresolved() {
        let group = make_group("G", None, "BUILT_PRODUCTS_DIR");
        let resolved = resolve_group_path(&group, Utf8Path::new("/proj"));
        assert_eq!(resolved.location, "$(BUILT_PRODUCTS_DIR)");
        assert!(resolved.absolute_url.is_none());
    }

    /// A file reference anchored directly at `SDKROOT` still contributes its
    /// own `path` to the resolved location, even though `SDKROOT` is a
    /// terminal anchor with no parent to pass through to.
    #[test]
    fn sdkroot_file_reference_seeds_its_own_path() {
        let file_reference = make_file_reference("F", "usr/lib/libz.tbd", "SDKROOT");
        let resolved = resolve_file_reference_path(&file_reference, Utf8Path::new("/proj"));
        assert_eq!(resolved.location, "/usr/lib/libz.tbd");
        assert!(resolved.absolute_url.is_none());
    }

    #[test]
    fn relative_path_derivation() {
        let base = Utf8Path::new("/a/b/c");
        let target = Utf8Path::new("/a/b/d/e");
        // These don't exist on disk, so canonicalize falls back to textual collapsing.
        assert_eq!(relative_path(base, target), Utf8PathBuf::from("../d/e"));
    }
}
