//! `.xcconfig` parsing, rendering, and the layered lookup tree (`spec.md`
//! §3 "Configuration", §4.9, §4.10).

pub mod line;
pub mod parser;
pub mod render;
pub mod tree;

pub use line::{Conditionals, Line};
pub use tree::{Content, ConfigTree};

use crate::error::{ConfigError, Result};
use crate::loader::Loader;
use crate::path_resolution;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

pub type ConfigRef = Rc<RefCell<Configuration>>;
pub type WeakConfigRef = Weak<RefCell<Configuration>>;

/// A source URL, an ordered line list (the round-trip source of truth), a
/// derived [`ConfigTree`], and the set of downstream configurations that
/// included this one (`spec.md` §3 "Configuration").
pub struct Configuration {
    source_url: Utf8PathBuf,
    lines: Vec<Line>,
    tree: ConfigTree,
    downstream: Vec<WeakConfigRef>,
}

impl Configuration {
    pub fn source_url(&self) -> &Utf8Path {
        &self.source_url
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Parse `text` standalone, with no include resolution, attributing it
    /// to `source_url`.
    pub fn parse(text: &str, source_url: impl Into<Utf8PathBuf>) -> Result<ConfigRef> {
        let lines = parser::parse(text)?;
        let config = Rc::new(RefCell::new(Configuration {
            source_url: source_url.into(),
            lines,
            tree: ConfigTree::new(),
            downstream: Vec::new(),
        }));
        update_tree(&config);
        Ok(config)
    }

    /// Load `path` through `loader`. When `resolve_includes` is set,
    /// `#include`/`#include?` lines are recursively loaded, with a
    /// caller-threaded visited-set preventing cycles and diamond re-loads
    /// (`spec.md` §4.10).
    pub fn open(loader: &dyn Loader, path: &Utf8Path, resolve_includes: bool) -> Result<ConfigRef> {
        let mut bucket = HashSet::new();
        load(loader, path, resolve_includes, &mut bucket)
    }

    pub fn write(&self, loader: &dyn Loader, path: &Utf8Path) -> Result<()> {
        loader.write_string(path, &self.content())
    }

    pub fn content(&self) -> String {
        render::render(&self.lines)
    }

    /// The resolved value list at an exact `(key, config, sdk, arch)`
    /// coordinate. `"*"` is a literal coordinate for an unqualified
    /// dimension, not a wildcard (`spec.md` §4.10 "Lookups").
    pub fn value_for_key(&self, key: &str, config: &str, sdk: &str, arch: &str) -> Option<Vec<String>> {
        tree::lookup(&self.tree, key, config, sdk, arch).map(|c| c.values.clone())
    }
}

/// Append a config line and rebuild this configuration's tree (and every
/// downstream tree) to reflect it (`spec.md` §8 Testable Property 11).
pub fn append_line(config: &ConfigRef, line: Line) {
    config.borrow_mut().lines.push(line);
    update_tree(config);
}

/// Rebuild `config`'s tree from its line list from scratch, overlaying each
/// successfully-loaded include's tree in line order so later lines win, then
/// broadcast the rebuild to every live downstream (`spec.md` §4.10
/// "update-configuration-tree").
pub fn update_tree(config: &ConfigRef) {
    let lines = config.borrow().lines.clone();
    let mut new_tree = ConfigTree::new();
    for line in &lines {
        match line {
            Line::Config {
                key,
                conditionals,
                values,
                ..
            } => {
                tree::insert(
                    &mut new_tree,
                    conditionals,
                    key,
                    Content {
                        source: Rc::downgrade(config),
                        values: values.clone(),
                    },
                );
            }
            Line::Include {
                loaded: Some(included),
                ..
            } => {
                let included_tree = included.borrow().tree.clone();
                overlay(&mut new_tree, &included_tree);
            }
            _ => {}
        }
    }
    config.borrow_mut().tree = new_tree;

    let downstream = config.borrow().downstream.clone();
    for weak in downstream {
        if let Some(downstream_config) = weak.upgrade() {
            update_tree(&downstream_config);
        }
    }
}

fn overlay(dest: &mut ConfigTree, src: &ConfigTree) {
    for (config_value, sdk_map) in src.iter() {
        for (sdk_value, arch_map) in sdk_map.iter() {
            for (arch_value, key_map) in arch_map.iter() {
                for (key, content) in key_map.iter() {
                    let conditionals = Conditionals {
                        config: config_value.clone(),
                        sdk: sdk_value.clone(),
                        arch: arch_value.clone(),
                    };
                    tree::insert(dest, &conditionals, key, content.clone());
                }
            }
        }
    }
}

fn load(
    loader: &dyn Loader,
    path: &Utf8Path,
    resolve_includes: bool,
    bucket: &mut HashSet<Utf8PathBuf>,
) -> Result<ConfigRef> {
    let canonical = path_resolution::canonicalize(path);
    bucket.insert(canonical);

    let text = loader.read_to_string(path)?;
    let mut lines = parser::parse(&text)?;
    let directory = path.parent().unwrap_or(Utf8Path::new(".")).to_path_buf();

    let mut resolved_includes: Vec<(usize, ConfigRef)> = Vec::new();
    if resolve_includes {
        for index in 0..lines.len() {
            let (include_path, optional) = match &lines[index] {
                Line::Include { path, optional, .. } => (path.clone(), *optional),
                _ => continue,
            };
            let resolved_path = directory.join(include_path.as_str());
            let resolved_canonical = path_resolution::canonicalize(&resolved_path);
            if let Line::Include { resolved_url, .. } = &mut lines[index] {
                *resolved_url = Some(resolved_canonical.clone());
            }

            if bucket.contains(&resolved_canonical) {
                if optional {
                    log::warn!("optional include {include_path:?} forms a cycle, skipping");
                    continue;
                }
                return Err(ConfigError::IncludeCycle(include_path).into());
            }

            match load(loader, &resolved_path, resolve_includes, bucket) {
                Ok(included) => resolved_includes.push((index, included)),
                Err(e) if optional => {
                    log::warn!("optional include {include_path:?} failed to load: {e}");
                }
                Err(e) => return Err(e),
            }
        }
    }

    for (index, included) in &resolved_includes {
        if let Line::Include { loaded, .. } = &mut lines[*index] {
            *loaded = Some(included.clone());
        }
    }

    let config = Rc::new(RefCell::new(Configuration {
        source_url: path.to_path_buf(),
        lines,
        tree: ConfigTree::new(),
        downstream: Vec::new(),
    }));

    for (_, included) in &resolved_includes {
        included.borrow_mut().downstream.push(Rc::downgrade(&config));
    }

    update_tree(&config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MemoryLoader {
        files: std::collections::HashMap<String, String>,
    }

    impl Loader for MemoryLoader {
        fn read_to_string(&self, path: &Utf8Path) -> Result<String> {
            self.files
                .get(path.as_str())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such file: {path}").into())
        }

        fn write_string(&self, _path: &Utf8Path, _contents: &str) -> Result<()> {
            unreachable!("not used in these tests")
        }
    }

    #[test]
    fn scenario_s6_overlay_ordering_and_append() {
        let mut files = std::collections::HashMap::new();
        files.insert("/A.xcconfig".to_string(), "#include \"B.xcconfig\"\nK = a\n".to_string());
        files.insert("/B.xcconfig".to_string(), "K = b\nL = b\n".to_string());
        let loader = MemoryLoader { files };

        let a = Configuration::open(&loader, Utf8Path::new("/A.xcconfig"), true).unwrap();
        assert_eq!(
            a.borrow().value_for_key("K", "*", "*", "*"),
            Some(vec!["a".to_string()])
        );
        assert_eq!(
            a.borrow().value_for_key("L", "*", "*", "*"),
            Some(vec!["b".to_string()])
        );

        append_line(
            &a,
            Line::Config {
                key: "L".to_string(),
                conditionals: Conditionals::default(),
                values: vec!["a2".to_string()],
                trailing_comment: None,
            },
        );
        assert_eq!(
            a.borrow().value_for_key("L", "*", "*", "*"),
            Some(vec!["a2".to_string()])
        );
    }

    #[test]
    fn include_cycle_does_not_recurse_infinitely() {
        let mut files = std::collections::HashMap::new();
        files.insert("/A.xcconfig".to_string(), "#include? \"B.xcconfig\"\nK = a\n".to_string());
        files.insert("/B.xcconfig".to_string(), "#include? \"A.xcconfig\"\nL = b\n".to_string());
        let loader = MemoryLoader { files };

        let a = Configuration::open(&loader, Utf8Path::new("/A.xcconfig"), true).unwrap();
        assert_eq!(
            a.borrow().value_for_key("K", "*", "*", "*"),
            Some(vec!["a".to_string()])
        );
    }

    #[test]
    fn downstream_propagation_after_append() {
        let mut files = std::collections::HashMap::new();
        files.insert("/A.xcconfig".to_string(), "#include \"B.xcconfig\"\n".to_string());
        files.insert("/B.xcconfig".to_string(), "K = b\n".to_string());
        let loader = MemoryLoader { files };

        let a = Configuration::open(&loader, Utf8Path::new("/A.xcconfig"), true).unwrap();
        let b = a
            .borrow()
            .lines()
            .iter()
            .find_map(|l| match l {
                Line::Include { loaded: Some(b), .. } => Some(b.clone()),
                _ => None,
            })
            .unwrap();

        append_line(
            &b,
            Line::Config {
                key: "M".to_string(),
                conditionals: Conditionals::default(),
                values: vec!["m".to_string()],
                trailing_comment: None,
            },
        );

        assert_eq!(
            a.borrow().value_for_key("M", "*", "*", "*"),
            Some(vec!["m".to_string()])
        );
    }
}
