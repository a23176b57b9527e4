/* The automaton graph: an alphabet, named states and labeled transitions. This module only does
 * bookkeeping and referential integrity checks, the algorithms live elsewhere and never mutate
 * a graph they are given. */

use crate::classify::{classify, Classification};
use crate::symbol::{parse_alphabet, parse_label, Alphabet, Symbol, SymbolSet};
use color_eyre::eyre::{Report, Result};
use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::OnceLock;

/// Referential integrity violations reported by the mutation API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A state with this name already exists
    DuplicateState(String),
    /// No state with this name exists
    UnknownState(String),
    /// A transition label uses a symbol outside the declared alphabet
    SymbolNotInAlphabet(Symbol),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DuplicateState(name) => {
                write!(f, "Error: State '{}' already exists!", name)
            }
            GraphError::UnknownState(name) => write!(f, "Error: State '{}' does not exist!", name),
            GraphError::SymbolNotInAlphabet(symbol) => {
                write!(f, "Error: Symbol '{}' is not in the automaton's alphabet!", symbol)
            }
        }
    }
}

impl std::error::Error for GraphError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    name: String,
    is_start: bool,
    is_final: bool,
}

impl State {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn is_start(&self) -> bool {
        self.is_start
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    from: String,
    to: String,
    label: SymbolSet,
}

impl Transition {
    pub fn get_from(&self) -> &str {
        &self.from
    }

    pub fn get_to(&self) -> &str {
        &self.to
    }

    pub fn get_label(&self) -> &SymbolSet {
        &self.label
    }
}

#[derive(Debug, Clone, Default)]
pub struct AutomatonGraph {
    alphabet: Alphabet,
    states: Vec<State>,
    transitions: Vec<Transition>,
    version: u64,
    classification: OnceLock<Classification>,
}

impl AutomatonGraph {
    /// Create an empty graph over the alphabet described by `alphabet_spec`, e.g. `"a,b"`.
    pub fn new(alphabet_spec: &str) -> Self {
        Self::with_alphabet(parse_alphabet(alphabet_spec))
    }

    pub fn with_alphabet(alphabet: Alphabet) -> Self {
        AutomatonGraph {
            alphabet,
            ..Default::default()
        }
    }

    // Every mutation goes through here so that the memoized classification can never outlive
    // the structure it was computed for.
    fn touch(&mut self) {
        self.version += 1;
        self.classification = OnceLock::new();
    }

    pub fn get_alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn get_states(&self) -> &[State] {
        &self.states
    }

    pub fn get_transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn get_state(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.name == name)
    }

    pub fn contains_state(&self, name: &str) -> bool {
        self.get_state(name).is_some()
    }

    pub fn get_num_states(&self) -> usize {
        self.states.len()
    }

    /// Structural version, bumped by every mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The classification of the graph, computed on first use and kept until the next mutation.
    pub fn classification(&self) -> &Classification {
        self.classification.get_or_init(|| classify(self))
    }

    pub fn start_states(&self) -> impl Iterator<Item = &State> {
        self.states.iter().filter(|s| s.is_start)
    }

    pub fn final_states(&self) -> impl Iterator<Item = &State> {
        self.states.iter().filter(|s| s.is_final)
    }

    pub fn add_state(&mut self, name: &str, is_start: bool, is_final: bool) -> Result<(), GraphError> {
        if self.contains_state(name) {
            return Err(GraphError::DuplicateState(name.to_string()));
        }

        self.states.push(State {
            name: name.to_string(),
            is_start,
            is_final,
        });
        self.touch();
        Ok(())
    }

    /// Remove a state together with every transition entering or leaving it.
    pub fn remove_state(&mut self, name: &str) -> Result<(), GraphError> {
        let position = self
            .states
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| GraphError::UnknownState(name.to_string()))?;

        self.states.remove(position);

        let before = self.transitions.len();
        self.transitions.retain(|t| t.from != name && t.to != name);
        trace!(
            "Removed state {} and {} incident transitions",
            name,
            before - self.transitions.len()
        );

        self.touch();
        Ok(())
    }

    fn get_mut_state(&mut self, name: &str) -> Result<&mut State, GraphError> {
        self.states
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| GraphError::UnknownState(name.to_string()))
    }

    pub fn set_start(&mut self, name: &str, is_start: bool) -> Result<(), GraphError> {
        self.get_mut_state(name)?.is_start = is_start;
        self.touch();
        Ok(())
    }

    pub fn set_final(&mut self, name: &str, is_final: bool) -> Result<(), GraphError> {
        self.get_mut_state(name)?.is_final = is_final;
        self.touch();
        Ok(())
    }

    /// Make `name` the only start state.
    pub fn set_unique_start(&mut self, name: &str) -> Result<(), GraphError> {
        if !self.contains_state(name) {
            return Err(GraphError::UnknownState(name.to_string()));
        }

        for state in self.states.iter_mut() {
            state.is_start = state.name == name;
        }
        self.touch();
        Ok(())
    }

    /// Add a transition whose label is written in label syntax, e.g. `"a,b"`, `"a-z"` or `"ε"`.
    pub fn add_transition(&mut self, from: &str, to: &str, label: &str) -> Result<(), GraphError> {
        self.add_transition_label(from, to, parse_label(label))
    }

    /// Add a transition with an already parsed label. Adding an identical transition twice is a
    /// no-op.
    pub fn add_transition_label(
        &mut self,
        from: &str,
        to: &str,
        label: SymbolSet,
    ) -> Result<(), GraphError> {
        for endpoint in [from, to] {
            if !self.contains_state(endpoint) {
                return Err(GraphError::UnknownState(endpoint.to_string()));
            }
        }

        if let Some(symbol) = label.literals().find(|s| !self.alphabet.contains(s)) {
            return Err(GraphError::SymbolNotInAlphabet(symbol.clone()));
        }

        let transition = Transition {
            from: from.to_string(),
            to: to.to_string(),
            label,
        };

        if self.transitions.contains(&transition) {
            return Ok(());
        }

        self.transitions.push(transition);
        self.touch();
        Ok(())
    }

    /// Remove transitions from `from` to `to`. With a label only the transitions carrying exactly
    /// that label go, without one every transition between the two states does. Returns the
    /// number of transitions removed.
    pub fn remove_transition(
        &mut self,
        from: &str,
        to: &str,
        label: Option<&str>,
    ) -> Result<usize, GraphError> {
        for endpoint in [from, to] {
            if !self.contains_state(endpoint) {
                return Err(GraphError::UnknownState(endpoint.to_string()));
            }
        }

        let label = label.map(parse_label);
        let before = self.transitions.len();

        self.transitions.retain(|t| {
            let same_label = match &label {
                Some(label) => t.label == *label,
                None => true,
            };
            !(t.from == from && t.to == to && same_label)
        });

        let removed = before - self.transitions.len();
        if removed > 0 {
            self.touch();
        }
        Ok(removed)
    }

    // Derived automata are built from states and symbols of a graph that already passed the
    // checks, so these skip them.
    pub(crate) fn insert_state(&mut self, name: String, is_start: bool, is_final: bool) {
        debug_assert!(!self.contains_state(&name));
        self.states.push(State {
            name,
            is_start,
            is_final,
        });
        self.touch();
    }

    pub(crate) fn insert_transition(&mut self, from: String, to: String, label: SymbolSet) {
        debug_assert!(self.contains_state(&from) && self.contains_state(&to));
        self.transitions.push(Transition { from, to, label });
        self.touch();
    }

    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            alphabet: self.alphabet.to_string(),
            states: self.states.clone(),
            transitions: self
                .transitions
                .iter()
                .map(|t| TransitionDocument {
                    from: t.from.clone(),
                    to: t.to.clone(),
                    label: LabelDocument::Symbols(
                        t.label.iter().map(|symbol| symbol.to_string()).collect(),
                    ),
                })
                .collect(),
        }
    }

    /// Rebuild a graph from a document. The document is replayed through the mutation API, so
    /// every integrity check applies.
    pub fn from_document(document: &GraphDocument) -> Result<Self, GraphError> {
        let mut graph = AutomatonGraph::new(&document.alphabet);

        for state in &document.states {
            graph.add_state(&state.name, state.is_start, state.is_final)?;
        }

        for transition in &document.transitions {
            graph.add_transition_label(
                &transition.from,
                &transition.to,
                transition.label.to_symbol_set(),
            )?;
        }

        Ok(graph)
    }

    /// Save the graph as a JSON document
    pub fn save_graph(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_document())?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Load a graph saved with [`AutomatonGraph::save_graph`]
    pub fn load_graph(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let document: GraphDocument = serde_json::from_reader(reader)?;

        AutomatonGraph::from_document(&document).map_err(Report::new)
    }
}

impl PartialEq for AutomatonGraph {
    fn eq(&self, other: &Self) -> bool {
        self.alphabet == other.alphabet
            && self.states == other.states
            && self.transitions == other.transitions
    }
}

impl fmt::Display for AutomatonGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Alphabet: {{{}}}", self.alphabet)?;
        for state in &self.states {
            let mut flags = Vec::new();
            if state.is_start {
                flags.push("start");
            }
            if state.is_final {
                flags.push("final");
            }
            if flags.is_empty() {
                writeln!(f, "State {}", state.name)?;
            } else {
                writeln!(f, "State {} ({})", state.name, flags.join(", "))?;
            }
        }
        for transition in &self.transitions {
            writeln!(
                f,
                "({}) --{}--> ({})",
                transition.from, transition.label, transition.to
            )?;
        }
        Ok(())
    }
}

/// Serializable form of a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub alphabet: String,
    pub states: Vec<State>,
    pub transitions: Vec<TransitionDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDocument {
    pub from: String,
    pub to: String,
    pub label: LabelDocument,
}

/// A label in a document. Hand written documents may use label syntax such as `"a-z,_"`. Saved
/// documents list every symbol, since a literal symbol like `a-c` would read back as a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelDocument {
    Text(String),
    Symbols(Vec<String>),
}

impl LabelDocument {
    pub fn to_symbol_set(&self) -> SymbolSet {
        match self {
            LabelDocument::Text(label) => parse_label(label),
            LabelDocument::Symbols(tokens) => SymbolSet::from_tokens(tokens),
        }
    }
}
