/* Run an automaton on an input string. A DFA is run deterministically, one state per step, an
 * NFA is run on sets of states closed under epsilon transitions. */

use crate::classify::Classification;
use crate::graph::AutomatonGraph;
use crate::index::TransitionIndex;
use crate::symbol::{Alphabet, Symbol};
use bitvec::prelude::*;
use log::{debug, trace};
use serde::Serialize;
use std::fmt;

/// One entry of a simulation trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Configuration {
    /// The current state of a DFA
    State(String),
    /// The current states of an NFA after epsilon closure, sorted by name
    States(Vec<String>),
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Configuration::State(name) => write!(f, "{}", name),
            Configuration::States(names) => write!(f, "{{{}}}", names.join(",")),
        }
    }
}

/// How a simulation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    /// All input was consumed without reaching a final state
    Rejected,
    /// The input symbol at `position` is not part of the alphabet
    SymbolNotInAlphabet { symbol: Symbol, position: usize },
    /// No transition could consume the input symbol at `position`
    Stuck { symbol: Symbol, position: usize },
    CannotSimulateInvalidAutomaton { reason: String },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Accepted => write!(f, "String accepted."),
            Outcome::Rejected => write!(f, "String rejected."),
            Outcome::SymbolNotInAlphabet { symbol, .. } => {
                write!(f, "Input symbol '{}' is not in the alphabet.", symbol)
            }
            Outcome::Stuck { symbol, position } => write!(
                f,
                "Simulation stuck. No transition found for symbol '{}' at position {}.",
                symbol, position
            ),
            Outcome::CannotSimulateInvalidAutomaton { reason } => {
                write!(f, "Cannot simulate an invalid automaton: {}", reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    accepted: bool,
    outcome: Outcome,
    trace: Vec<Configuration>,
}

impl SimulationResult {
    fn new(outcome: Outcome, trace: Vec<Configuration>) -> Self {
        SimulationResult {
            accepted: outcome == Outcome::Accepted,
            outcome,
            trace,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn get_outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Configurations visited, starting with the initial one
    pub fn get_trace(&self) -> &[Configuration] {
        &self.trace
    }
}

/// Runs one graph against any number of inputs, reusing the transition index.
pub struct Simulator<'g> {
    index: TransitionIndex<'g>,
    alphabet: &'g Alphabet,
    classification: Classification,
}

impl<'g> Simulator<'g> {
    pub fn new(graph: &'g AutomatonGraph) -> Self {
        Self::with_classification(graph, graph.classification().clone())
    }

    pub fn with_classification(graph: &'g AutomatonGraph, classification: Classification) -> Self {
        Simulator {
            index: TransitionIndex::new(graph),
            alphabet: graph.get_alphabet(),
            classification,
        }
    }

    /// Run on a string, one symbol per character
    pub fn run(&self, input: &str) -> SimulationResult {
        let symbols: Vec<Symbol> = input.chars().map(Symbol::from).collect();
        self.run_symbols(&symbols)
    }

    pub fn run_symbols(&self, input: &[Symbol]) -> SimulationResult {
        let result = match &self.classification {
            Classification::Dfa => self.run_dfa(input),
            Classification::Nfa { .. } => self.run_nfa(input),
            Classification::Invalid { reason } => SimulationResult::new(
                Outcome::CannotSimulateInvalidAutomaton {
                    reason: reason.clone(),
                },
                Vec::new(),
            ),
        };

        debug!(
            "Simulated {} symbols: {}",
            input.len(),
            result.get_outcome()
        );
        result
    }

    fn run_dfa(&self, input: &[Symbol]) -> SimulationResult {
        let Some(mut state) = self.index.get_start_states().first_one() else {
            return SimulationResult::new(
                Outcome::CannotSimulateInvalidAutomaton {
                    reason: "needs exactly one start state".to_string(),
                },
                Vec::new(),
            );
        };

        let mut trace = vec![Configuration::State(
            self.index.state_name(state).to_string(),
        )];

        for (position, symbol) in input.iter().enumerate() {
            if !self.alphabet.contains(symbol) {
                let outcome = Outcome::SymbolNotInAlphabet {
                    symbol: symbol.clone(),
                    position,
                };
                return SimulationResult::new(outcome, trace);
            }

            // A DFA has exactly one matching transition, anything else is reported as stuck
            let Some(&next) = self.index.targets(state, symbol).first() else {
                let outcome = Outcome::Stuck {
                    symbol: symbol.clone(),
                    position,
                };
                return SimulationResult::new(outcome, trace);
            };

            trace!(
                "{} --{}--> {}",
                self.index.state_name(state),
                symbol,
                self.index.state_name(next)
            );
            state = next;
            trace.push(Configuration::State(
                self.index.state_name(state).to_string(),
            ));
        }

        let outcome = if self.index.get_acceptor_states()[state] {
            Outcome::Accepted
        } else {
            Outcome::Rejected
        };

        SimulationResult::new(outcome, trace)
    }

    fn run_nfa(&self, input: &[Symbol]) -> SimulationResult {
        let mut current: BitVec<u8> = self.index.epsilon_closure(self.index.get_start_states());
        let mut trace = vec![Configuration::States(self.index.state_names(&current))];

        for (position, symbol) in input.iter().enumerate() {
            if !self.alphabet.contains(symbol) {
                let outcome = Outcome::SymbolNotInAlphabet {
                    symbol: symbol.clone(),
                    position,
                };
                return SimulationResult::new(outcome, trace);
            }

            let moved = self.index.delta(&current, symbol);
            if moved.not_any() {
                let outcome = Outcome::Stuck {
                    symbol: symbol.clone(),
                    position,
                };
                return SimulationResult::new(outcome, trace);
            }

            current = self.index.epsilon_closure(&moved);
            trace!("--{}--> {}", symbol, self.index.set_name(&current));
            trace.push(Configuration::States(self.index.state_names(&current)));
        }

        let outcome = if self.index.contains_accept(&current) {
            Outcome::Accepted
        } else {
            Outcome::Rejected
        };

        SimulationResult::new(outcome, trace)
    }
}

/// Simulate `graph` on `input` using its memoized classification.
pub fn simulate(graph: &AutomatonGraph, input: &str) -> SimulationResult {
    Simulator::new(graph).run(input)
}

/// Simulate under an explicit classification.
pub fn simulate_symbols(
    graph: &AutomatonGraph,
    classification: &Classification,
    input: &[Symbol],
) -> SimulationResult {
    Simulator::with_classification(graph, classification.clone()).run_symbols(input)
}
