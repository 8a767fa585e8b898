//! Error types for every fallible surface of the crate.
//!
//! Each on-disk format gets its own closed error enum; [`Error`] composes them
//! into one type so that `Project`/`Workspace`/`Configuration` loaders can
//! return a single `Result` alias. I/O failures at the `load`/`write`
//! boundary are carried as [`anyhow::Error`] so callers still get a rich
//! chain of `.context(...)` without the crate enumerating every possible
//! filesystem failure.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Plist(#[from] PlistError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Errors raised while parsing or rendering the ASCII property-list dialect
/// used by `project.pbxproj` (`spec.md` §4.2, §4.5, §7).
#[derive(Debug, Error)]
pub enum PlistError {
    #[error("expected {expected}, found {context:?}")]
    UnexpectedToken { expected: String, context: String },
    #[error("unterminated quoted string")]
    UnterminatedString,
    #[error("unknown escape sequence '\\{0}'")]
    UnknownEscape(char),
    #[error("the root value of a property list must be a dictionary")]
    MissingRootDictionary,
    #[error("unknown value kind encountered while rendering")]
    UnknownValueKind,
}

/// Errors raised while linking the flat `objects` dictionary into a graph, or
/// while constructing a new object (`spec.md` §4.3, §4.4, §7).
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("root dictionary is missing an 'objects' entry")]
    MissingObjects,
    #[error("non-string key found in the 'objects' dictionary")]
    NonStringObjectKey,
    #[error("object '{0}' is not a dictionary")]
    NonDictionaryObjectValue(String),
    #[error("'objects' dictionary is missing after linking")]
    ObjectsMissingPostLink,
    #[error("object '{0}' has an invalid entry after linking")]
    InvalidPostLinkEntry(String),
    #[error("cannot construct an object without an 'isa' entry")]
    MissingIsa,
}

/// Errors raised while parsing or rendering `contents.xcworkspacedata`
/// (`spec.md` §4.7, §7).
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("XML is not well-formed: {0}")]
    Xml(String),
    #[error("an element is missing a name")]
    MissingElementName,
    #[error("an attribute is missing a value")]
    AttributeWithoutValue,
    #[error("attribute value could not be hex-transformed: {0}")]
    HexTransform(String),
}

/// Errors raised while parsing `.xcconfig` text (`spec.md` §4.9, §7).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid line: {0}")]
    InvalidLine(String),
    #[error("missing opening '\"' in #include path")]
    IncludeMissingOpenQuote,
    #[error("missing closing '\"' in #include path")]
    IncludeMissingCloseQuote,
    #[error("unexpected characters after #include directive: {0:?}")]
    IncludeTrailingChars(String),
    #[error("configuration line is missing a key")]
    MissingKey,
    #[error("invalid conditional name '{0}' (expected config, sdk, or arch)")]
    InvalidConditionalName(String),
    #[error("missing '=' in conditional")]
    ConditionalMissingEquals,
    #[error("missing closing ']' in conditional")]
    ConditionalMissingCloseBracket,
    #[error("missing '=' in assignment")]
    AssignmentMissingEquals,
    #[error("missing closing '\"' in value")]
    ValueMissingCloseQuote,
    #[error("dangling escape at end of value")]
    DanglingEscape,
    #[error("unknown escape sequence '\\{0}'")]
    UnknownEscape(char),
    #[error("required include '{0}' forms a cycle or was already loading in this outer load")]
    IncludeCycle(String),
}
