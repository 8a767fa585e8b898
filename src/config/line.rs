//! The [`Line`] and [`Conditionals`] types that make up a [`Configuration`]'s
//! line list, the round-trip source of truth (`spec.md` §3 "Configuration",
//! §9 "Configuration tree vs line list").
//!
//! [`Configuration`]: crate::config::Configuration

use crate::config::ConfigRef;
use camino::Utf8PathBuf;

/// A key's qualifiers, over the closed alphabet `{config, sdk, arch}`; a
/// missing qualifier defaults to `"*"`, a literal coordinate, not a
/// wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Conditionals {
    pub config: String,
    pub sdk: String,
    pub arch: String,
}

impl Default for Conditionals {
    fn default() -> Self {
        Conditionals {
            config: "*".to_string(),
            sdk: "*".to_string(),
            arch: "*".to_string(),
        }
    }
}

/// One logical line of a `.xcconfig` file.
#[derive(Debug, Clone)]
pub enum Line {
    Empty,
    Comment(String),
    Include {
        path: String,
        optional: bool,
        resolved_url: Option<Utf8PathBuf>,
        loaded: Option<ConfigRef>,
    },
    Config {
        key: String,
        conditionals: Conditionals,
        values: Vec<String>,
        trailing_comment: Option<String>,
    },
}
