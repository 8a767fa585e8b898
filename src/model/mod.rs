//! The object graph: [`Literal`]/[`Value`] trees, [`Object`] records,
//! [`Sections`] bucketing, the [`linker`], and the [`Project`] mutation API
//! (`spec.md` §3, §4.3, §4.4, §4.6).

pub mod linker;
pub mod literal;
pub mod object;
pub mod project;
pub mod sections;

pub use literal::{Array, Dictionary, Literal, ObjectRef, Value, WeakObjectRef};
pub use object::{Object, ObjectBehavior};
pub use project::{EnumerateOptions, Project};
pub use sections::{Section, Sections};
