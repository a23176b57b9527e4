/* Symbols, alphabets and transition labels. Alphabets are written as comma separated tokens,
 * labels additionally accept single character ranges such as a-z. */

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::btree_set::Iter;
use std::collections::BTreeSet;
use std::fmt;

/// The marker used to write an epsilon label. An empty label means the same thing.
pub const EPSILON_MARKER: &str = "ε";

#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    Epsilon,
    Literal(String),
}

impl Symbol {
    pub fn literal(token: &str) -> Self {
        Symbol::Literal(token.to_string())
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }
}

impl From<char> for Symbol {
    fn from(ch: char) -> Self {
        Symbol::Literal(ch.to_string())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "{}", EPSILON_MARKER),
            Symbol::Literal(token) => write!(f, "{}", token),
        }
    }
}

/// The finite set of symbols an automaton is defined over. Never contains epsilon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alphabet {
    symbols: BTreeSet<Symbol>,
}

impl Alphabet {
    pub fn new() -> Self {
        Alphabet {
            symbols: BTreeSet::new(),
        }
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in their sorted order. Every algorithm iterates the alphabet through this, which
    /// keeps derived automata reproducible.
    pub fn iter(&self) -> Iter<'_, Symbol> {
        self.symbols.iter()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self.symbols.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", tokens.join(","))
    }
}

/// The set of symbols carried by one transition label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolSet {
    symbols: BTreeSet<Symbol>,
}

impl SymbolSet {
    pub fn epsilon() -> Self {
        SymbolSet {
            symbols: BTreeSet::from([Symbol::Epsilon]),
        }
    }

    pub fn single(symbol: Symbol) -> Self {
        SymbolSet {
            symbols: BTreeSet::from([symbol]),
        }
    }

    /// A label made of exactly these tokens, each taken literally. `ε` stands for epsilon and no
    /// tokens at all mean an epsilon label, as with [`parse_label`].
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols: BTreeSet<Symbol> = tokens
            .into_iter()
            .map(|token| match token.as_ref() {
                EPSILON_MARKER => Symbol::Epsilon,
                token => Symbol::literal(token),
            })
            .collect();

        if symbols.is_empty() {
            return SymbolSet::epsilon();
        }

        SymbolSet { symbols }
    }

    /// True if this label can be followed without consuming input.
    pub fn contains_epsilon(&self) -> bool {
        self.symbols.contains(&Symbol::Epsilon)
    }

    pub fn is_epsilon(&self) -> bool {
        self.symbols.len() == 1 && self.contains_epsilon()
    }

    pub fn iter(&self) -> Iter<'_, Symbol> {
        self.symbols.iter()
    }

    /// Symbols of the label other than epsilon.
    pub fn literals(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| !s.is_epsilon())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl fmt::Display for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self.symbols.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", tokens.join(","))
    }
}

fn split_tokens(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(',').map(str::trim).filter(|token| !token.is_empty())
}

// Both ends must be lowercase letters, uppercase letters or digits, and ascending.
fn expand_range(token: &str) -> Option<Vec<Symbol>> {
    let chars: Vec<char> = token.chars().collect();

    if chars.len() != 3 || chars[1] != '-' {
        return None;
    }

    let (start, end) = (chars[0], chars[2]);

    let same_class = (start.is_ascii_lowercase() && end.is_ascii_lowercase())
        || (start.is_ascii_uppercase() && end.is_ascii_uppercase())
        || (start.is_ascii_digit() && end.is_ascii_digit());

    if !same_class || start > end {
        return None;
    }

    Some((start..=end).map(Symbol::from).collect())
}

/// Parse an alphabet specification such as `a, b, c`. Tokens are literal: no range expansion is
/// applied, and an epsilon marker is discarded since an alphabet never contains epsilon.
pub fn parse_alphabet(spec: &str) -> Alphabet {
    let mut alphabet = Alphabet::new();

    for token in split_tokens(spec) {
        if token == EPSILON_MARKER {
            warn!("Ignoring epsilon marker in alphabet specification {:?}", spec);
            continue;
        }
        alphabet.symbols.insert(Symbol::literal(token));
    }

    alphabet
}

/// Parse a transition label. Tokens of the form `x-y` expand to every symbol from x to y
/// inclusive, malformed or descending ranges stay literal. An empty label or the epsilon marker
/// yields the epsilon label.
pub fn parse_label(spec: &str) -> SymbolSet {
    let mut symbols = BTreeSet::new();

    for token in split_tokens(spec) {
        if token == EPSILON_MARKER {
            symbols.insert(Symbol::Epsilon);
            continue;
        }
        match expand_range(token) {
            Some(range) => symbols.extend(range),
            None => {
                symbols.insert(Symbol::literal(token));
            }
        }
    }

    if symbols.is_empty() {
        return SymbolSet::epsilon();
    }

    SymbolSet { symbols }
}

/// Whether a real input symbol is accepted by a label. Epsilon is never matched this way.
pub fn matches(label: &SymbolSet, symbol: &Symbol) -> bool {
    !symbol.is_epsilon() && label.symbols.contains(symbol)
}
