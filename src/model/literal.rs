//! [`Literal`] and [`Value`] — the two building blocks of every parsed
//! document in this crate (`spec.md` §3 "Literal"/"Value").

use crate::collections::OrderedMap;
use crate::model::object::Object;
use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

/// A graph-owned object: the only strong handle into the graph. Lives inside
/// a [`crate::model::sections::Section`].
pub type ObjectRef = Rc<RefCell<Object>>;

/// A weak handle into the graph. Dereferencing through [`Weak::upgrade`]
/// fails gracefully once the target has been removed — every back-reference
/// set, every `Literal::Ref` target, and every configuration downstream set
/// is stored this way (`spec.md` §3 "Ownership").
pub type WeakObjectRef = Weak<RefCell<Object>>;

/// A scalar value in a plist: either a plain string, or a reference to
/// another object in the graph.
///
/// Equality and hashing only ever consider the string payload — a reference
/// to id `X` compares equal to the plain string `X` (`spec.md` §3, Testable
/// Property 8). This lets a `Dictionary`/`Section` use `Literal` as a key
/// without callers needing to know whether a particular key was linked.
#[derive(Clone)]
pub enum Literal {
    String(String),
    Ref {
        id: String,
        target: WeakObjectRef,
        /// Suppresses `/* comment */` emission for this occurrence at
        /// render time (`spec.md` §4.3, §4.5).
        silent: bool,
    },
}

impl Literal {
    pub fn string(s: impl Into<String>) -> Self {
        Literal::String(s.into())
    }

    pub fn reference(id: impl Into<String>, target: WeakObjectRef, silent: bool) -> Self {
        Literal::Ref {
            id: id.into(),
            target,
            silent,
        }
    }

    /// The underlying string payload, whichever variant this is.
    pub fn as_str(&self) -> &str {
        match self {
            Literal::String(s) => s,
            Literal::Ref { id, .. } => id,
        }
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, Literal::Ref { .. })
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, Literal::Ref { silent: true, .. })
    }

    /// Upgrade the weak target, if this is a `Ref` and the target is alive.
    pub fn resolve(&self) -> Option<ObjectRef> {
        match self {
            Literal::Ref { target, .. } => target.upgrade(),
            Literal::String(_) => None,
        }
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl std::fmt::Debug for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) => write!(f, "Literal::String({s:?})"),
            Literal::Ref { id, silent, .. } => {
                write!(f, "Literal::Ref({id:?}, silent={silent})")
            }
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

/// An ordered dictionary keyed by [`Literal`], valued by [`Value`].
pub type Dictionary = OrderedMap<Literal, Value>;

/// An ordered sequence of values.
pub type Array = Vec<Value>;

/// Any value that can appear in the graph (`spec.md` §3 "Value").
///
/// `Object` and `Sections` only ever occur as the value type of a
/// [`crate::model::sections::Section`] and a `Project`'s root `objects`
/// entry respectively; every other occurrence of an object in the graph is
/// a weak `Literal::Ref`, never an embedded `Value::Object`.
#[derive(Debug, Clone)]
pub enum Value {
    Literal(Literal),
    Dictionary(Dictionary),
    Array(Array),
    Object(ObjectRef),
    Sections(crate::model::sections::Sections),
}

impl Value {
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Literal(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_sections(&self) -> Option<&crate::model::sections::Sections> {
        match self {
            Value::Sections(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sections_mut(&mut self) -> Option<&mut crate::model::sections::Sections> {
        match self {
            Value::Sections(s) => Some(s),
            _ => None,
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Literal(Literal::string(s))
    }
}
