//! Round-trips a proprietary IDE's project file formats.
//!
//! Three tightly coupled subsystems, glued together by the object graph in
//! [`model`]:
//!
//! - [`plist`] — the ASCII property-list dialect used by `project.pbxproj`:
//!   scanner primitives, a recursive-descent parser, and a line-writer-based
//!   renderer that reproduces the IDE's exact formatting.
//! - [`model`] — the object graph itself: [`model::Literal`]/[`model::Value`]
//!   trees, [`model::Object`] records with per-`isa` behavior, reference
//!   linking with weak back-edges, section bucketing, and the
//!   [`model::Project`] mutation API.
//! - [`workspace`] — the XML workspace manifest (`contents.xcworkspacedata`)
//!   and its `group:`/`container:`/`absolute:` location resolution.
//! - [`config`] — the `.xcconfig` layered build-configuration store: a
//!   line-oriented parser, and a four-level lookup tree with transitive
//!   include overlay and cycle protection.
//! - [`path_resolution`] — shared group/file-reference path resolution,
//!   used by both [`model`] and [`workspace`].
//!
//! [`loader::Loader`] decouples every parser/renderer from `std::fs`, so
//! callers can substitute in-memory fixtures (every test in this crate does)
//! or a different storage backend without the core ever depending on a real
//! filesystem.
//!
//! Every type here is built on `Rc`/`RefCell`/`Weak`, not their atomic
//! counterparts: the crate is intentionally `!Send`/`!Sync`. Callers must
//! externally serialize mutation of a given `Project`, `Workspace`, or
//! `Configuration`; there is no background work and nothing here blocks
//! except the explicit `Loader` calls at the load/write boundary.

pub mod collections;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod path_resolution;
pub mod plist;
pub mod workspace;

pub use error::{Error, Result};
pub use loader::{FsLoader, Loader};
pub use model::{Object, ObjectRef, Project};
