//! The four-level `(config, sdk, arch, key) → Content` lookup tree and its
//! insert/lookup/remove primitives (`spec.md` §3 "Configuration", §4.10).

use crate::collections::OrderedMap;
use crate::config::line::Conditionals;
use crate::config::WeakConfigRef;

/// The value stored at a tree coordinate: which [`crate::config::Configuration`]
/// contributed it, and the resolved value list.
#[derive(Debug, Clone)]
pub struct Content {
    pub source: WeakConfigRef,
    pub values: Vec<String>,
}

/// `config-value → sdk-value → arch-value → key → Content`. Rebuilt from
/// scratch on every mutation; never updated incrementally (`spec.md` §9
/// "Configuration tree vs line list").
pub type ConfigTree = OrderedMap<String, OrderedMap<String, OrderedMap<String, OrderedMap<String, Content>>>>;

/// Insert `content` at `(conditionals, key)`, overwriting whatever was
/// already there. Later calls at the same coordinate win — callers insert in
/// line order, so an including file's lines (inserted after its includes are
/// overlaid) naturally override them.
pub fn insert(tree: &mut ConfigTree, conditionals: &Conditionals, key: &str, content: Content) {
    tree.entry(conditionals.config.clone())
        .or_default()
        .entry(conditionals.sdk.clone())
        .or_default()
        .entry(conditionals.arch.clone())
        .or_default()
        .insert(key.to_string(), content);
}

/// Look up the content at an exact coordinate. `"*"` is a literal coordinate
/// here, not a wildcard — callers must pass it explicitly for an
/// unqualified key (`spec.md` §4.10 "Lookups").
pub fn lookup<'a>(tree: &'a ConfigTree, key: &str, config: &str, sdk: &str, arch: &str) -> Option<&'a Content> {
    tree.get(config)?.get(sdk)?.get(arch)?.get(key)
}

/// Remove the entry at `(config, sdk, arch, key)`, cascading: drop the arch
/// layer if it becomes empty, then the sdk layer, then the config layer.
pub fn remove(tree: &mut ConfigTree, key: &str, config: &str, sdk: &str, arch: &str) {
    let Some(sdk_map) = tree.get_mut(config) else { return };
    let Some(arch_map) = sdk_map.get_mut(sdk) else { return };
    let Some(key_map) = arch_map.get_mut(arch) else { return };
    key_map.shift_remove(key);
    if key_map.is_empty() {
        arch_map.shift_remove(arch);
    }
    if arch_map.is_empty() {
        sdk_map.shift_remove(sdk);
    }
    if sdk_map.is_empty() {
        tree.shift_remove(config);
    }
}
