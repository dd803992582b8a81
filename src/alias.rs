//! Alias definitions and their one-pass expansion.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::SmashError;
use crate::lexer::{self, Token};

/// Alias names are barewords: a letter or underscore followed by word characters.
pub fn is_valid_name(name: &str) -> bool {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("alias name pattern"))
        .is_match(name)
}

/// Insertion-ordered mapping from alias name to raw replacement text.
///
/// Listing iterates in insertion order and redefinition keeps the original
/// position, so the store is a plain vector of pairs rather than a hash map.
#[derive(Debug, Default)]
pub struct AliasStore {
    entries: Vec<(String, String)>,
}

impl AliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a definition; replacement preserves the position.
    pub fn define(&mut self, name: impl Into<String>, replacement: impl Into<String>) {
        let name = name.into();
        let replacement = replacement.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = replacement,
            None => self.entries.push((name, replacement)),
        }
    }

    /// Remove a definition. Returns `false` when the name was not defined.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        self.entries.len() != before
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r.as_str())
    }

    /// `(name, replacement)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Expand aliases at the head of every `&&`-separated segment.
///
/// The replacement text is re-tokenized and its tokens are spliced in place
/// of the matched word. Expansion is one level deep: spliced tokens are not
/// looked up again, so `alias x='x'` cannot loop. The `alias` and `unalias`
/// verbs themselves are never expanded.
pub fn expand_tokens(store: &AliasStore, tokens: Vec<Token>) -> Result<Vec<Token>, SmashError> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut at_head = true;

    for token in tokens {
        match token {
            Token::AndOp => {
                at_head = true;
                out.push(Token::AndOp);
            }
            Token::Word(word) if at_head => {
                at_head = false;
                if word != "alias" && word != "unalias" {
                    if let Some(replacement) = store.lookup(&word) {
                        out.extend(lexer::split_into_tokens(replacement)?);
                        continue;
                    }
                }
                out.push(Token::Word(word));
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::split_into_tokens;

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    fn expand(store: &AliasStore, line: &str) -> Vec<Token> {
        expand_tokens(store, split_into_tokens(line).unwrap()).unwrap()
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("ll"));
        assert!(is_valid_name("_x1"));
        assert!(!is_valid_name("1x"));
        assert!(!is_valid_name("a-b"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn test_listing_preserves_insertion_order() {
        let mut store = AliasStore::new();
        store.define("b", "echo b");
        store.define("a", "echo a");
        store.define("c", "echo c");
        let names: Vec<&str> = store.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_redefinition_keeps_position() {
        let mut store = AliasStore::new();
        store.define("a", "echo 1");
        store.define("b", "echo 2");
        store.define("a", "echo 3");
        let entries: Vec<(&str, &str)> = store.iter().collect();
        assert_eq!(entries, vec![("a", "echo 3"), ("b", "echo 2")]);
    }

    #[test]
    fn test_remove() {
        let mut store = AliasStore::new();
        store.define("a", "echo 1");
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_expansion_replaces_first_word_only() {
        let mut store = AliasStore::new();
        store.define("ll", "ls -l");
        let tokens = expand(&store, "ll /tmp ll");
        assert_eq!(
            tokens,
            vec![word("ls"), word("-l"), word("/tmp"), word("ll")]
        );
    }

    #[test]
    fn test_expansion_is_one_level_deep() {
        let mut store = AliasStore::new();
        store.define("x", "x");
        let tokens = expand(&store, "x");
        assert_eq!(tokens, vec![word("x")]);
    }

    #[test]
    fn test_expansion_after_and_operator() {
        let mut store = AliasStore::new();
        store.define("p", "pwd");
        let tokens = expand(&store, "cd /tmp && p");
        assert_eq!(
            tokens,
            vec![word("cd"), word("/tmp"), Token::AndOp, word("pwd")]
        );
    }

    #[test]
    fn test_replacement_may_contain_a_chain() {
        let mut store = AliasStore::new();
        store.define("up2", "cd .. && cd ..");
        let tokens = expand(&store, "up2");
        assert_eq!(
            tokens,
            vec![
                word("cd"),
                word(".."),
                Token::AndOp,
                word("cd"),
                word("..")
            ]
        );
    }

    #[test]
    fn test_alias_and_unalias_verbs_are_not_expanded() {
        let mut store = AliasStore::new();
        store.define("alias", "echo no");
        store.define("unalias", "echo no");
        assert_eq!(expand(&store, "alias"), vec![word("alias")]);
        assert_eq!(
            expand(&store, "unalias x"),
            vec![word("unalias"), word("x")]
        );
    }

    #[test]
    fn test_background_marker_survives_expansion() {
        let mut store = AliasStore::new();
        store.define("s", "sleep 100");
        let tokens = expand(&store, "s &");
        assert_eq!(
            tokens,
            vec![word("sleep"), word("100"), Token::Ampersand]
        );
    }
}
