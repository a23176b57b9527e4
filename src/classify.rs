/* Decide whether a graph is a DFA, an NFA or neither. The stricter DFA test runs first, so an
 * automaton meeting both is reported as a DFA. */

use crate::graph::AutomatonGraph;
use crate::index::TransitionIndex;
use log::debug;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Every DFA constraint holds
    Dfa,
    /// Not a DFA, but runnable as an NFA. `reason` says which DFA constraint failed.
    Nfa { reason: String },
    /// Not runnable at all
    Invalid { reason: String },
}

impl Classification {
    pub fn is_dfa(&self) -> bool {
        matches!(self, Classification::Dfa)
    }

    pub fn is_nfa(&self) -> bool {
        matches!(self, Classification::Nfa { .. })
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Classification::Invalid { .. })
    }

    pub fn reason(&self) -> &str {
        match self {
            Classification::Dfa => "DFA is valid.",
            Classification::Nfa { reason } | Classification::Invalid { reason } => reason,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Dfa => write!(f, "DFA"),
            Classification::Nfa { reason } => write!(f, "NFA ({})", reason),
            Classification::Invalid { reason } => write!(f, "Invalid ({})", reason),
        }
    }
}

fn check_dfa(graph: &AutomatonGraph) -> Result<(), String> {
    if graph.start_states().count() != 1 {
        return Err("needs exactly one start state".to_string());
    }

    if graph.final_states().count() == 0 {
        return Err("needs a final state".to_string());
    }

    if graph
        .get_transitions()
        .iter()
        .any(|t| t.get_label().contains_epsilon())
    {
        return Err("epsilon not allowed".to_string());
    }

    let index = TransitionIndex::new(graph);

    for state in 0..index.get_num_states() {
        for symbol in index.get_symbols() {
            let count = index.targets(state, symbol).len();

            if count != 1 {
                return Err(format!(
                    "state '{}' must have exactly one transition for symbol '{}', found {}",
                    index.state_name(state),
                    symbol,
                    count
                ));
            }
        }
    }

    Ok(())
}

fn check_nfa(graph: &AutomatonGraph) -> Result<(), String> {
    if graph.start_states().count() == 0 {
        return Err("needs at least one start state".to_string());
    }

    if graph.final_states().count() == 0 {
        return Err("needs a final state".to_string());
    }

    for transition in graph.get_transitions() {
        for endpoint in [transition.get_from(), transition.get_to()] {
            if !graph.contains_state(endpoint) {
                return Err(format!("transition references unknown state '{}'", endpoint));
            }
        }
    }

    Ok(())
}

/// Classify a graph. Prefer [`AutomatonGraph::classification`], which memoizes the result.
pub fn classify(graph: &AutomatonGraph) -> Classification {
    let classification = match check_dfa(graph) {
        Ok(()) => Classification::Dfa,
        Err(dfa_reason) => match check_nfa(graph) {
            Ok(()) => Classification::Nfa { reason: dfa_reason },
            Err(reason) => Classification::Invalid { reason },
        },
    };

    debug!(
        "Classified automaton with {} states: {}",
        graph.get_num_states(),
        classification
    );

    classification
}

/// Check whether a graph behaves deterministically: no epsilon transitions, exactly one start
/// state and at most one matching transition per state and symbol. Unlike the DFA test this
/// accepts partial automata and does not require a final state.
pub fn is_deterministic(graph: &AutomatonGraph) -> (bool, String) {
    if graph
        .get_transitions()
        .iter()
        .any(|t| t.get_label().contains_epsilon())
    {
        return (false, "Automaton has epsilon transitions.".to_string());
    }

    if graph.start_states().count() != 1 {
        return (false, "Automaton must have exactly one start state.".to_string());
    }

    let index = TransitionIndex::new(graph);

    for state in 0..index.get_num_states() {
        for symbol in index.get_symbols() {
            if index.targets(state, symbol).len() > 1 {
                return (
                    false,
                    format!(
                        "State '{}' has multiple transitions for symbol '{}'.",
                        index.state_name(state),
                        symbol
                    ),
                );
            }
        }
    }

    (true, "Automaton is deterministic.".to_string())
}
