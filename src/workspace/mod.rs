//! Parser, renderer, and mutation API for `contents.xcworkspacedata`
//! (`spec.md` §4.7).

use crate::collections::OrderedSequence;
use crate::error::{Result, WorkspaceError};
use crate::loader::Loader;
use crate::path_resolution;
use crate::plist::line_writer::LineWriter;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;

const XML_PROLOGUE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const INDENT_UNIT: &str = "   ";

/// An owned, mutable XML element tree. `roxmltree` is used only to parse;
/// this crate never hands back borrowed `roxmltree` nodes because the
/// mutation API (`append`/`insert`/`remove`) needs a tree it can edit in
/// place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// A project reference discovered while walking the workspace tree: its
/// resolved location string, its absolute URL when resolvable, and the raw
/// `location` attribute text of the backing `<FileRef>` (used to locate the
/// node again for removal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReference {
    pub location: String,
    pub absolute_url: Utf8PathBuf,
    raw_location: String,
}

/// Owns the root XML element and a lazily (re)built cache of
/// [`ProjectReference`]s (`spec.md` §3 "Workspace").
pub struct Workspace {
    root: XmlElement,
    directory: Utf8PathBuf,
    cache: RefCell<Option<Vec<ProjectReference>>>,
}

impl Workspace {
    /// An empty workspace with a bare `<Workspace version = "1.0">` root.
    pub fn empty(directory: impl Into<Utf8PathBuf>) -> Self {
        Workspace {
            root: XmlElement::new("Workspace").with_attribute("version", "1.0"),
            directory: directory.into(),
            cache: RefCell::new(None),
        }
    }

    /// Parse `text` (XML, external-entity loading disabled by `roxmltree`'s
    /// own non-DTD-resolving design) into a [`Workspace`] rooted at
    /// `directory`.
    pub fn parse(text: &str, directory: impl Into<Utf8PathBuf>) -> Result<Self> {
        let doc = roxmltree::Document::parse(text).map_err(|e| WorkspaceError::Xml(e.to_string()))?;
        let root = convert_element(doc.root_element())?;
        Ok(Workspace {
            root,
            directory: directory.into(),
            cache: RefCell::new(None),
        })
    }

    pub fn open(loader: &dyn Loader, path: &Utf8Path) -> Result<Self> {
        let text = loader.read_to_string(path)?;
        let directory = path.parent().unwrap_or(Utf8Path::new(".")).to_path_buf();
        Self::parse(&text, directory)
    }

    pub fn write(&self, loader: &dyn Loader, path: &Utf8Path) -> Result<()> {
        loader.write_string(path, &self.content())
    }

    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Render the workspace to its exact on-disk XML form.
    pub fn content(&self) -> String {
        let mut w = LineWriter::new(INDENT_UNIT);
        w.append_raw(XML_PROLOGUE);
        render_element(&self.root, &mut w);
        w.finish()
    }

    /// The cached list of project references, rebuilding it if it has been
    /// invalidated by a prior mutation.
    pub fn project_references(&self) -> Vec<ProjectReference> {
        if self.cache.borrow().is_none() {
            let mut refs = Vec::new();
            collect_project_references(&self.root, "", &self.directory, &self.directory, &mut refs);
            *self.cache.borrow_mut() = Some(refs);
        }
        self.cache.borrow().as_ref().unwrap().clone()
    }

    fn invalidate_cache(&mut self) {
        self.cache = RefCell::new(None);
    }

    /// Append a new `<FileRef>` for `url` to the end of the root element's
    /// children (`spec.md` §4.7 "append/insert").
    pub fn append(&mut self, url: &Utf8Path, absolute: bool) -> ProjectReference {
        let index = self.root.children.len();
        self.insert(url, absolute, index)
    }

    /// Insert a new `<FileRef>` for `url` at `index` among the root
    /// element's children.
    pub fn insert(&mut self, url: &Utf8Path, absolute: bool, index: usize) -> ProjectReference {
        let raw_location = if absolute {
            format!("absolute:{url}")
        } else {
            let relative = path_resolution::relative_path(&self.directory, url);
            format!("group:{relative}")
        };
        let node = XmlElement::new("FileRef").with_attribute("location", raw_location.clone());
        self.root.children.insert_at(index, node);
        self.invalidate_cache();
        ProjectReference {
            location: if absolute {
                format!("/{}", url.as_str().trim_start_matches('/'))
            } else {
                path_resolution::relative_path(&self.directory, url).to_string()
            },
            absolute_url: url.to_path_buf(),
            raw_location,
        }
    }

    /// Remove the `<FileRef>` whose resolved absolute URL equals `url`.
    /// Returns whether a node was removed.
    pub fn remove_by_url(&mut self, url: &Utf8Path) -> bool {
        let target = self
            .project_references()
            .into_iter()
            .find(|r| r.absolute_url == url);
        match target {
            Some(reference) => self.remove_reference(&reference),
            None => false,
        }
    }

    /// Remove the `<FileRef>` backing `reference`, matched by its raw
    /// `location` attribute text.
    pub fn remove_reference(&mut self, reference: &ProjectReference) -> bool {
        let removed = remove_matching(&mut self.root, &reference.raw_location);
        if removed {
            self.invalidate_cache();
        }
        removed
    }
}

fn remove_matching(element: &mut XmlElement, raw_location: &str) -> bool {
    if let Some(pos) = element
        .children
        .iter()
        .position(|c| c.attribute("location") == Some(raw_location))
    {
        element.children.remove(pos);
        return true;
    }
    for child in &mut element.children {
        if remove_matching(child, raw_location) {
            return true;
        }
    }
    false
}

fn convert_element(node: roxmltree::Node) -> Result<XmlElement> {
    let name = node.tag_name().name();
    if name.is_empty() {
        return Err(WorkspaceError::MissingElementName.into());
    }
    let mut attributes = Vec::new();
    for attr in node.attributes() {
        attributes.push((attr.name().to_string(), attr.value().to_string()));
    }
    let mut children = Vec::new();
    for child in node.children().filter(|n| n.is_element()) {
        children.push(convert_element(child)?);
    }
    Ok(XmlElement {
        name: name.to_string(),
        attributes,
        children,
    })
}

fn split_prefix(location: &str) -> (&str, &str) {
    match location.split_once(':') {
        Some((prefix, rest)) => (prefix, rest),
        None => ("", location),
    }
}

fn join(base: &str, rest: &str) -> String {
    if base.is_empty() {
        rest.to_string()
    } else if rest.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{rest}")
    }
}

fn collect_project_references(
    element: &XmlElement,
    parent_location: &str,
    parent_directory: &Utf8Path,
    workspace_directory: &Utf8Path,
    out: &mut Vec<ProjectReference>,
) {
    for child in &element.children {
        let Some(raw_location) = child.attribute("location") else {
            if child.name == "Group" || child.name == "FileRef" {
                log::warn!("workspace element <{}> has no location attribute", child.name);
            }
            continue;
        };
        let raw_location = raw_location.to_string();
        let (prefix, rest) = split_prefix(&raw_location);
        let (location, directory) = match prefix {
            "group" => (join(parent_location, rest), parent_directory.join(rest)),
            "container" => (rest.to_string(), workspace_directory.join(rest)),
            "absolute" => (format!("/{}", rest.trim_start_matches('/')), Utf8PathBuf::from(rest)),
            other => {
                log::warn!("unrecognized workspace location prefix {other:?}");
                continue;
            }
        };

        match child.name.as_str() {
            "FileRef" => {
                if Utf8Path::new(&location).extension() == Some("xcodeproj") {
                    out.push(ProjectReference {
                        location,
                        absolute_url: path_resolution::canonicalize(&directory),
                        raw_location,
                    });
                }
            }
            "Group" => {
                collect_project_references(child, &location, &directory, workspace_directory, out);
            }
            _ => {}
        }
    }
}

/// Render one element: the tag name on its own line, each attribute on its
/// own indented line with the closing `>` flush against the last one,
/// children indented one level deeper, and an explicit `</name>` closer on
/// its own line — never a self-closing `/>`, even for a childless element
/// (`spec.md` §4.7: "Each element opens on one line as `<name attr =
/// "val" …>`, children indented, closer `</name>` on its own line" — in
/// practice the IDE puts each attribute on its own line, which this
/// matches byte-for-byte).
fn render_element(element: &XmlElement, w: &mut LineWriter) {
    w.append(&format!("<{}", element.name));
    w.increase_indent();
    for (key, value) in &element.attributes {
        w.append(&format!("{key} = \"{}\"", escape_attribute(value)));
    }
    w.same_line_next();
    w.append(">");
    for child in &element.children {
        render_element(child, w);
    }
    w.decrease_indent();
    w.append(&format!("</{}>", element.name));
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            c if c.is_ascii() => out.push(c),
            c => out.push_str(&format!("&#{:04X};", c as u32)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_s4_nested_group_container_prefix() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<Workspace version = "1.0">
   <Group location = "container:sub">
      <FileRef location = "group:a/b.xcodeproj"/>
   </Group>
</Workspace>"#;
        let workspace = Workspace::parse(xml, "/workspace-dir").unwrap();
        let refs = workspace.project_references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].absolute_url, Utf8PathBuf::from("/workspace-dir/sub/a/b.xcodeproj"));
    }

    #[test]
    fn append_and_remove_round_trip() {
        let mut workspace = Workspace::empty("/workspace-dir");
        let reference = workspace.append(Utf8Path::new("/workspace-dir/App.xcodeproj"), false);
        assert_eq!(workspace.project_references().len(), 1);
        assert!(workspace.remove_reference(&reference));
        assert_eq!(workspace.project_references().len(), 0);
    }

    #[test]
    fn render_escapes_attribute_values() {
        let mut workspace = Workspace::empty("/workspace-dir");
        workspace.root.attributes.push(("note".to_string(), "a & b".to_string()));
        assert!(workspace.content().contains("a &amp; b"));
    }
}
