//! The ASCII property-list dialect used by `project.pbxproj`: scanner
//! primitives, recursive-descent parser, and line-writer-based renderer
//! (`spec.md` §4.1, §4.2, §4.5).

pub mod line_writer;
pub mod parser;
pub mod render;
pub mod scanner;

pub(crate) const UTF8_PROLOGUE: &str = "// !$*UTF8*$!";
