//! Property-based tests for the conversion and minimization laws.
//!
//! Random automata over {a, b} are run on random strings: a converted DFA must agree with its
//! NFA, a minimized DFA must agree with its input, and minimizing twice changes nothing.

use fakit::{construct_dfa, minimize, simulate, to_dfa, AutomatonGraph, SubsetOptions};
use proptest::prelude::*;

const LABELS: [&str; 4] = ["a", "b", "a,b", "ε"];

fn state_name(id: usize) -> String {
    format!("q{}", id)
}

fn build_graph(finals: &[bool], transitions: &[(usize, usize, &str)]) -> AutomatonGraph {
    let mut graph = AutomatonGraph::new("a,b");
    let any_final = finals.iter().any(|&f| f);

    for (id, &is_final) in finals.iter().enumerate() {
        // Keep at least one final state so the graph is runnable
        let is_final = is_final || (!any_final && id == finals.len() - 1);
        graph.add_state(&state_name(id), id == 0, is_final).unwrap();
    }

    for &(from, to, label) in transitions {
        graph
            .add_transition(&state_name(from), &state_name(to), label)
            .unwrap();
    }

    graph
}

// ============================================================================
// Strategies
// ============================================================================

/// Final flags and labeled transitions of an automaton with 1 to 4 states
fn nfa_strategy() -> impl Strategy<Value = (Vec<bool>, Vec<(usize, usize, usize)>)> {
    (1usize..=4).prop_flat_map(|n| {
        (
            prop::collection::vec(any::<bool>(), n),
            prop::collection::vec((0..n, 0..n, 0..LABELS.len()), 0..10),
        )
    })
}

/// Final flags and the (a, b) targets of every state of a complete DFA
fn dfa_strategy() -> impl Strategy<Value = (Vec<bool>, Vec<(usize, usize)>)> {
    (1usize..=6).prop_flat_map(|n| {
        (
            prop::collection::vec(any::<bool>(), n),
            prop::collection::vec((0..n, 0..n), n),
        )
    })
}

fn inputs_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[ab]{0,8}", 1..20)
}

fn nfa_from(finals: &[bool], transitions: &[(usize, usize, usize)]) -> AutomatonGraph {
    let transitions: Vec<(usize, usize, &str)> = transitions
        .iter()
        .map(|&(from, to, label)| (from, to, LABELS[label]))
        .collect();
    build_graph(finals, &transitions)
}

fn dfa_from(finals: &[bool], targets: &[(usize, usize)]) -> AutomatonGraph {
    let mut transitions = Vec::new();
    for (from, &(on_a, on_b)) in targets.iter().enumerate() {
        transitions.push((from, on_a, "a"));
        transitions.push((from, on_b, "b"));
    }
    build_graph(finals, &transitions)
}

fn accepts(graph: &AutomatonGraph, input: &str) -> bool {
    simulate(graph, input).is_accepted()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn subset_construction_preserves_language(
        (finals, transitions) in nfa_strategy(),
        inputs in inputs_strategy(),
    ) {
        let nfa = nfa_from(&finals, &transitions);
        prop_assume!(nfa.classification().is_nfa());

        let (dfa, trace) = to_dfa(&nfa).unwrap();
        prop_assert_eq!(trace.dfa_state_count, dfa.get_num_states());

        for input in &inputs {
            prop_assert_eq!(accepts(&nfa, input), accepts(&dfa, input), "input {:?}", input);
        }
    }

    #[test]
    fn completed_conversion_minimizes_to_same_language(
        (finals, transitions) in nfa_strategy(),
        inputs in inputs_strategy(),
    ) {
        let nfa = nfa_from(&finals, &transitions);
        prop_assume!(nfa.classification().is_nfa());

        let options = SubsetOptions { complete: true, ..Default::default() };
        let (dfa, _) = construct_dfa(&nfa, options).unwrap();
        // No reachable final state leaves nothing to minimize
        prop_assume!(dfa.classification().is_dfa());

        let (minimal_dfa, _) = minimize(&dfa).unwrap();
        for input in &inputs {
            prop_assert_eq!(accepts(&nfa, input), accepts(&minimal_dfa, input), "input {:?}", input);
        }
    }

    #[test]
    fn minimization_preserves_language(
        (finals, targets) in dfa_strategy(),
        inputs in inputs_strategy(),
    ) {
        let dfa = dfa_from(&finals, &targets);
        prop_assert!(dfa.classification().is_dfa());

        let (minimal_dfa, trace) = minimize(&dfa).unwrap();
        prop_assert!(minimal_dfa.get_num_states() <= dfa.get_num_states());
        prop_assert_eq!(trace.minimized_state_count, minimal_dfa.get_num_states());

        for input in &inputs {
            prop_assert_eq!(accepts(&dfa, input), accepts(&minimal_dfa, input), "input {:?}", input);
        }
    }

    #[test]
    fn minimization_is_idempotent((finals, targets) in dfa_strategy()) {
        let dfa = dfa_from(&finals, &targets);

        let (once, _) = minimize(&dfa).unwrap();
        let (twice, trace) = minimize(&once).unwrap();

        prop_assert!(trace.already_minimal);
        prop_assert_eq!(once.get_num_states(), twice.get_num_states());
    }

    #[test]
    fn epsilon_chain_accepts_empty_input(length in 1usize..8) {
        let mut finals = vec![false; length + 1];
        finals[length] = true;
        let transitions: Vec<(usize, usize, &str)> =
            (0..length).map(|id| (id, id + 1, "ε")).collect();
        let nfa = build_graph(&finals, &transitions);

        prop_assert!(accepts(&nfa, ""));
        prop_assert!(!accepts(&nfa, "a"));
    }
}
