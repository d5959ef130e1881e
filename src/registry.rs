//! String interning for render formats and render options.
//!
//! Managers and commands refer to formats such as `"Spacefill"` and
//! options such as `"Smooth Backbones"` through compact [`Token`]s. One
//! [`TokenRegistry`] is created per scene and handed to every component
//! that needs to resolve names.

use std::fmt;

use rustc_hash::FxHashMap;

/// Class of render format tokens.
pub const RENDER_FORMAT: &str = "Render Format";
/// Class of render option tokens.
pub const RENDER_OPTION: &str = "Render Option";

/// Interned `(class, name)` pair. Tokens start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u32);

impl Token {
    /// Token from its raw value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw value.
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interns `(class, name)` pairs into [`Token`]s.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    by_class: FxHashMap<String, FxHashMap<String, Token>>,
    entries: Vec<(String, String)>,
}

impl TokenRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for `(class, name)`, allocating one on first use.
    pub fn intern(&mut self, class: &str, name: &str) -> Token {
        if let Some(token) = self.get(class, name) {
            return token;
        }
        self.entries.push((class.to_owned(), name.to_owned()));
        let token = Token(self.entries.len() as u32);
        let _ = self
            .by_class
            .entry(class.to_owned())
            .or_default()
            .insert(name.to_owned(), token);
        token
    }

    /// Existing token for `(class, name)`.
    #[must_use]
    pub fn get(&self, class: &str, name: &str) -> Option<Token> {
        self.by_class.get(class)?.get(name).copied()
    }

    /// Name a token was interned under.
    #[must_use]
    pub fn name(&self, token: Token) -> Option<&str> {
        self.entry(token).map(|(_, name)| name.as_str())
    }

    /// Class a token was interned under.
    #[must_use]
    pub fn class(&self, token: Token) -> Option<&str> {
        self.entry(token).map(|(class, _)| class.as_str())
    }

    fn entry(&self, token: Token) -> Option<&(String, String)> {
        let index = token.0.checked_sub(1)?;
        self.entries.get(index as usize)
    }

    /// Every token of `class`, sorted by name.
    #[must_use]
    pub fn tokens(&self, class: &str) -> Vec<Token> {
        let Some(names) = self.by_class.get(class) else {
            return Vec::new();
        };
        let mut tokens: Vec<(&str, Token)> =
            names.iter().map(|(name, token)| (name.as_str(), *token)).collect();
        tokens.sort_unstable();
        tokens.into_iter().map(|(_, token)| token).collect()
    }

    /// Number of interned tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_start_at_one_and_are_stable() {
        let mut registry = TokenRegistry::new();
        let spacefill = registry.intern(RENDER_FORMAT, "Spacefill");
        let smooth = registry.intern(RENDER_OPTION, "Smooth Backbones");
        assert_eq!(spacefill.raw(), 1);
        assert_eq!(smooth.raw(), 2);
        assert_eq!(registry.intern(RENDER_FORMAT, "Spacefill"), spacefill);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn same_name_in_different_classes_differs() {
        let mut registry = TokenRegistry::new();
        let a = registry.intern(RENDER_FORMAT, "Cartoon");
        let b = registry.intern(RENDER_OPTION, "Cartoon");
        assert_ne!(a, b);
        assert_eq!(registry.class(b), Some(RENDER_OPTION));
    }

    #[test]
    fn reverse_lookup_and_listing() {
        let mut registry = TokenRegistry::new();
        let trace = registry.intern(RENDER_FORMAT, "Backbone Trace");
        let cartoon = registry.intern(RENDER_FORMAT, "Cartoon");
        assert_eq!(registry.name(trace), Some("Backbone Trace"));
        assert_eq!(registry.tokens(RENDER_FORMAT), vec![trace, cartoon]);
        assert!(registry.tokens("Nothing").is_empty());
        assert_eq!(registry.name(Token::from_raw(0)), None);
        assert_eq!(registry.get(RENDER_FORMAT, "Ribbons"), None);
    }
}
