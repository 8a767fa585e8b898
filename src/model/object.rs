//! [`Object`] — a single record in the graph, plus the per-`isa` behavior
//! hooks and factory described in `spec.md` §3 "Object" and §4.4 "Object
//! Factory".

use crate::error::{ModelError, Result};
use crate::model::literal::{Dictionary, Literal, ObjectRef, Value, WeakObjectRef};
use rand::RngCore;
use std::fmt;
use std::rc::Weak;

/// Per-`isa` specialization of four behaviors. Unknown `isa` values fall
/// back to [`GenericBehavior`], which no-ops every hook — mirroring the
/// capability-trait design in `spec.md` §9.
pub trait ObjectBehavior: fmt::Debug {
    /// Computed string used for the inline `/* … */` annotation after a
    /// reference to this object (`spec.md` §4.5 "Literal, ref variant").
    fn render_comment(&self, _content: &Dictionary) -> Option<String> {
        None
    }

    /// Whether this object's dictionary should be rendered on a single line.
    fn render_single_line(&self) -> bool {
        false
    }

    /// Called on the *referenced* object when a new incoming reference is
    /// recorded.
    fn on_added_reference(&mut self, _referrer: &WeakObjectRef) {}

    /// Called on the *referenced* object when an incoming reference is torn
    /// down.
    fn on_removed_reference(&mut self, _referrer: &WeakObjectRef) {}

    /// The cached parent (build phase, group) this behavior remembers from
    /// `on_added_reference`, used by path resolution to walk the group
    /// hierarchy without re-scanning every group's `children` array.
    fn cached_parent(&self) -> Option<WeakObjectRef> {
        None
    }
}

/// No-op behavior for any `isa` the factory doesn't specifically know about.
#[derive(Debug, Default)]
pub struct GenericBehavior;

impl ObjectBehavior for GenericBehavior {}

/// `PBXFileReference` / `PBXGroup` / `PBXVariantGroup`: caches the parent
/// group that references this file element as a child, and renders its
/// comment from `name` (preferred) or `path`.
#[derive(Debug, Default)]
pub struct FileElementBehavior {
    pub parent_group: Option<WeakObjectRef>,
}

impl ObjectBehavior for FileElementBehavior {
    fn render_comment(&self, content: &Dictionary) -> Option<String> {
        name_or_path(content)
    }

    fn on_added_reference(&mut self, referrer: &WeakObjectRef) {
        self.parent_group = Some(referrer.clone());
    }

    fn on_removed_reference(&mut self, referrer: &WeakObjectRef) {
        if self
            .parent_group
            .as_ref()
            .and_then(|p| p.upgrade())
            .zip(referrer.upgrade())
            .is_some_and(|(a, b)| std::rc::Rc::ptr_eq(&a, &b))
        {
            self.parent_group = None;
        }
    }

    fn cached_parent(&self) -> Option<WeakObjectRef> {
        self.parent_group.clone()
    }
}

/// `PBXBuildFile`: caches the build phase that references it, renders on a
/// single line, and renders its comment as `"<file> in <phase>"` once both
/// ends are known, matching the convention real `.pbxproj` files use
/// (`examples/other_examples/…src-gen-xcode.rs.rs`: `build_file`).
#[derive(Debug, Default)]
pub struct BuildFileBehavior {
    pub parent_phase: Option<WeakObjectRef>,
}

impl ObjectBehavior for BuildFileBehavior {
    fn render_single_line(&self) -> bool {
        true
    }

    fn render_comment(&self, content: &Dictionary) -> Option<String> {
        let file_ref = content
            .get(&Literal::string("fileRef"))
            .and_then(Value::as_literal)
            .and_then(Literal::resolve)?;
        let file_comment = file_ref
            .borrow()
            .render_comment()
            .unwrap_or_else(|| file_ref.borrow().id().to_string());
        match self.parent_phase.as_ref().and_then(|p| p.upgrade()) {
            Some(phase) => {
                let phase_name = phase
                    .borrow()
                    .content
                    .get(&Literal::string("name"))
                    .and_then(Value::as_literal)
                    .map(|l| l.as_str().to_string())
                    .unwrap_or_else(|| phase.borrow().isa().to_string());
                Some(format!("{file_comment} in {phase_name}"))
            }
            None => Some(file_comment),
        }
    }

    fn on_added_reference(&mut self, referrer: &WeakObjectRef) {
        self.parent_phase = Some(referrer.clone());
    }

    fn on_removed_reference(&mut self, referrer: &WeakObjectRef) {
        if self
            .parent_phase
            .as_ref()
            .and_then(|p| p.upgrade())
            .zip(referrer.upgrade())
            .is_some_and(|(a, b)| std::rc::Rc::ptr_eq(&a, &b))
        {
            self.parent_phase = None;
        }
    }

    fn cached_parent(&self) -> Option<WeakObjectRef> {
        self.parent_phase.clone()
    }
}

/// Objects whose comment is simply their `name` field: targets, native
/// targets, build-configuration lists, build configurations, the project
/// itself.
#[derive(Debug, Default)]
pub struct NamedBehavior;

impl ObjectBehavior for NamedBehavior {
    fn render_comment(&self, content: &Dictionary) -> Option<String> {
        name_or_path(content)
    }
}

fn name_or_path(content: &Dictionary) -> Option<String> {
    content
        .get(&Literal::string("name"))
        .or_else(|| content.get(&Literal::string("path")))
        .and_then(Value::as_literal)
        .map(|l| l.as_str().to_string())
}

/// Look up the behavior constructor registered for `isa`, falling back to
/// [`GenericBehavior`] for anything unrecognized (`spec.md` §4.4).
pub fn behavior_for_isa(isa: &str) -> Box<dyn ObjectBehavior> {
    match isa {
        "PBXBuildFile" => Box::new(BuildFileBehavior::default()),
        "PBXFileReference" | "PBXGroup" | "PBXVariantGroup" => {
            Box::new(FileElementBehavior::default())
        }
        "PBXProject"
        | "PBXNativeTarget"
        | "PBXAggregateTarget"
        | "PBXLegacyTarget"
        | "XCConfigurationList"
        | "XCBuildConfiguration" => Box::new(NamedBehavior),
        _ => Box::new(GenericBehavior),
    }
}

/// A single record in the object graph: an immutable `isa`/`id` pair plus a
/// mutable `content` dictionary, a set of weak back-references for reverse
/// lookup, and a specialized [`ObjectBehavior`] (`spec.md` §3 "Object").
pub struct Object {
    isa: String,
    id: String,
    pub content: Dictionary,
    referenced_by: Vec<WeakObjectRef>,
    behavior: Box<dyn ObjectBehavior>,
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("isa", &self.isa)
            .field("id", &self.id)
            .field("content", &self.content)
            .finish()
    }
}

impl Object {
    /// Build an object from `content`, whose first entry must be `isa`
    /// (`spec.md` §3, §4.4). Fails if `isa` is missing.
    pub fn create(id: impl Into<String>, content: Dictionary) -> Result<Self> {
        let isa = content
            .get(&Literal::string("isa"))
            .and_then(Value::as_literal)
            .map(|l| l.as_str().to_string())
            .ok_or(ModelError::MissingIsa)?;
        let behavior = behavior_for_isa(&isa);
        Ok(Object {
            isa,
            id: id.into(),
            content,
            referenced_by: Vec::new(),
            behavior,
        })
    }

    pub fn isa(&self) -> &str {
        &self.isa
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn render_comment(&self) -> Option<String> {
        self.behavior.render_comment(&self.content)
    }

    pub fn render_single_line(&self) -> bool {
        self.behavior.render_single_line()
    }

    /// The parent (group, build phase) this object's behavior cached the
    /// last time it was added as a reference target. Used by path
    /// resolution to walk the group hierarchy (`spec.md` §4.8).
    pub fn cached_parent(&self) -> Option<WeakObjectRef> {
        self.behavior.cached_parent()
    }

    /// Record a new back-reference from `referrer` and run the target's
    /// `on_added_reference` hook.
    pub fn add_reference(&mut self, referrer: WeakObjectRef) {
        self.behavior.on_added_reference(&referrer);
        self.referenced_by.push(referrer);
    }

    /// Drop every back-reference pointing at `referrer` (by pointer
    /// identity) and run the target's `on_removed_reference` hook once per
    /// removed entry.
    pub fn remove_reference(&mut self, referrer: &WeakObjectRef) {
        let mut i = 0;
        while i < self.referenced_by.len() {
            let is_match = self.referenced_by[i]
                .upgrade()
                .zip(referrer.upgrade())
                .is_some_and(|(a, b)| std::rc::Rc::ptr_eq(&a, &b));
            if is_match {
                self.referenced_by.remove(i);
                self.behavior.on_removed_reference(referrer);
            } else {
                i += 1;
            }
        }
    }

    /// Snapshot of still-live referrers. Stale (deallocated) entries are
    /// silently dropped, per `spec.md` §5's tolerance for observing a stale
    /// back-reference set between a target's deallocation and the next
    /// mutation.
    pub fn referenced_by(&self) -> Vec<ObjectRef> {
        self.referenced_by.iter().filter_map(Weak::upgrade).collect()
    }

    /// Drop any back-reference entries whose target has been deallocated.
    pub fn prune_stale_back_references(&mut self) {
        self.referenced_by.retain(|w| w.upgrade().is_some());
    }
}

/// Generate a new 24-hex-digit object id by sampling 12 random bytes from a
/// cryptographically-adequate source (`spec.md` §4.4).
pub fn generate_id() -> String {
    let mut bytes = [0u8; 12];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let mut s = String::with_capacity(24);
    for b in bytes {
        s.push_str(&format!("{b:02X}"));
    }
    s
}
