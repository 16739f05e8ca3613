//! Global String Interner
//!
//! Turns shader property and keyword names into compact integer handles.
//! Every global shading input the pipeline uploads is addressed through a
//! [`PropertyId`], so the command stream compares and hashes integers
//! instead of strings on the hot path.

use std::fmt;

use lasso::{Spur, ThreadedRodeo};
use once_cell::sync::Lazy;

/// Global interner instance.
static INTERNER: Lazy<ThreadedRodeo> = Lazy::new(ThreadedRodeo::new);

/// Raw symbol type.
pub type Symbol = Spur;

/// Interns a string and returns its symbol.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up an already interned string without allocating.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Identifier of a global shader property or keyword.
///
/// Two ids built from the same name are always equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(Symbol);

impl PropertyId {
    /// Interns `name` and returns its id.
    #[inline]
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(intern(name))
    }

    /// Returns the id for `name` if it was ever interned.
    #[inline]
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        get(name).map(Self)
    }

    /// The property name.
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        resolve(self.0)
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyId").field(&self.name()).finish()
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
