//! Resolution of type names found in stack trace text.
//!
//! When the decoder reads a header it asks a [`TypeResolver`] whether the
//! type name denotes a failure type it can construct. If it can, the node is
//! built with [`ConstructibleType::construct_default`] and its message and
//! frames are filled in afterwards. If it cannot, the decoder substitutes a
//! surrogate node that keeps the name and message verbatim.
//!
//! Three resolvers are provided:
//!
//! - [`AnyType`] resolves every name. This is the default.
//! - [`KnownTypes`] resolves only the names registered with it.
//! - Any `Fn(&str) -> bool` closure resolves the names it returns `true` for.
//!
//! # Examples
//!
//! ```
//! use failtrace::{Codec, resolver::KnownTypes};
//!
//! let codec = Codec::new().with_resolver(KnownTypes::from_iter(["java.lang.Exception"]));
//! let node = codec.decode("com.acme.GoneError: missing\n").unwrap();
//! assert!(node.is_surrogate());
//! assert_eq!(node.type_name(), "com.acme.GoneError");
//! ```

use alloc::string::{String, ToString};

use hashbrown::HashSet;
use rustc_hash::FxBuildHasher;

use crate::FailureNode;

/// A failure type that can be instantiated without arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructibleType {
    name: String,
}

impl ConstructibleType {
    /// Creates a type handle for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The fully qualified type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produces a fresh node of this type with no message, frames, cause, or
    /// suppressed entries.
    pub fn construct_default(&self) -> FailureNode {
        FailureNode::new(self.name.clone())
    }
}

/// Looks up failure types by name.
///
/// Implementations return `None` rather than an error for names they do not
/// know.
pub trait TypeResolver {
    /// Resolves `type_name` to a constructible type.
    fn resolve(&self, type_name: &str) -> Option<ConstructibleType>;
}

impl<F> TypeResolver for F
where
    F: Fn(&str) -> bool,
{
    fn resolve(&self, type_name: &str) -> Option<ConstructibleType> {
        self(type_name).then(|| ConstructibleType::new(type_name))
    }
}

/// A resolver that accepts every type name.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyType;

impl TypeResolver for AnyType {
    fn resolve(&self, type_name: &str) -> Option<ConstructibleType> {
        Some(ConstructibleType::new(type_name))
    }
}

/// A resolver that accepts a fixed set of type names.
#[derive(Debug, Clone, Default)]
pub struct KnownTypes {
    names: HashSet<String, FxBuildHasher>,
}

impl KnownTypes {
    /// Creates an empty registry. It resolves nothing until names are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type name.
    pub fn insert(&mut self, name: impl Into<String>) -> &mut Self {
        self.names.insert(name.into());
        self
    }

    /// Returns `true` if `name` has been registered.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

impl<S: ToString> FromIterator<S> for KnownTypes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl TypeResolver for KnownTypes {
    fn resolve(&self, type_name: &str) -> Option<ConstructibleType> {
        self.contains(type_name)
            .then(|| ConstructibleType::new(type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_type() {
        let ty = AnyType.resolve("anything.At.All").unwrap();
        assert_eq!(ty.name(), "anything.At.All");
        let node = ty.construct_default();
        assert_eq!(node.type_name(), "anything.At.All");
        assert!(node.message().is_none());
        assert!(!node.is_surrogate());
    }

    #[test]
    fn test_known_types() {
        let mut known = KnownTypes::new();
        known.insert("a.A").insert("b.B");
        assert!(known.resolve("a.A").is_some());
        assert!(known.resolve("c.C").is_none());

        let known: KnownTypes = ["x.X"].into_iter().collect();
        assert!(known.contains("x.X"));
    }

    #[test]
    fn test_closure_resolver() {
        let java_only = |name: &str| name.starts_with("java.");
        assert!(java_only.resolve("java.lang.Error").is_some());
        assert!(java_only.resolve("kotlin.Error").is_none());
    }
}
