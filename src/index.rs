/* A transition index built once per algorithm invocation. States are numbered in the order the
 * graph holds them and sets of states are bit vectors over those numbers, so lookups by
 * (state, symbol) are direct instead of rescanning the transition list. */

use crate::graph::{AutomatonGraph, State};
use crate::symbol::Symbol;
use bitvec::prelude::*;
use std::collections::{HashMap, VecDeque};

pub type StateId = usize;

pub struct TransitionIndex<'g> {
    graph: &'g AutomatonGraph,
    state_ids: HashMap<&'g str, StateId>,
    symbols: Vec<Symbol>,
    symbol_ids: HashMap<Symbol, usize>,
    moves: Vec<Vec<Vec<StateId>>>, // moves[state][symbol], one entry per transition
    epsilon_moves: Vec<Vec<StateId>>,
    start_states: BitVec<u8>,
    accept_states: BitVec<u8>,
}

impl<'g> TransitionIndex<'g> {
    pub fn new(graph: &'g AutomatonGraph) -> Self {
        let num_states = graph.get_num_states();

        let state_ids: HashMap<&'g str, StateId> = graph
            .get_states()
            .iter()
            .enumerate()
            .map(|(id, state)| (state.get_name(), id))
            .collect();

        let symbols: Vec<Symbol> = graph.get_alphabet().iter().cloned().collect();
        let symbol_ids: HashMap<Symbol, usize> = symbols
            .iter()
            .enumerate()
            .map(|(id, symbol)| (symbol.clone(), id))
            .collect();

        let mut moves = vec![vec![Vec::new(); symbols.len()]; num_states];
        let mut epsilon_moves = vec![Vec::new(); num_states];

        for transition in graph.get_transitions() {
            // The graph API guarantees both endpoints exist
            let (Some(&from), Some(&to)) = (
                state_ids.get(transition.get_from()),
                state_ids.get(transition.get_to()),
            ) else {
                continue;
            };

            for symbol in transition.get_label().iter() {
                match symbol {
                    Symbol::Epsilon => epsilon_moves[from].push(to),
                    Symbol::Literal(_) => {
                        if let Some(&symbol_id) = symbol_ids.get(symbol) {
                            moves[from][symbol_id].push(to);
                        }
                    }
                }
            }
        }

        let mut start_states = BitVec::repeat(false, num_states);
        let mut accept_states = BitVec::repeat(false, num_states);

        for (id, state) in graph.get_states().iter().enumerate() {
            start_states.set(id, state.is_start());
            accept_states.set(id, state.is_final());
        }

        TransitionIndex {
            graph,
            state_ids,
            symbols,
            symbol_ids,
            moves,
            epsilon_moves,
            start_states,
            accept_states,
        }
    }

    pub fn get_num_states(&self) -> usize {
        self.moves.len()
    }

    /// The alphabet in sorted order
    pub fn get_symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.state_ids.get(name).copied()
    }

    pub fn get_state(&self, id: StateId) -> &'g State {
        &self.graph.get_states()[id]
    }

    pub fn state_name(&self, id: StateId) -> &'g str {
        self.get_state(id).get_name()
    }

    /// Targets of every transition leaving `state` that matches `symbol`. Duplicates are kept, one
    /// per transition.
    pub fn targets(&self, state: StateId, symbol: &Symbol) -> &[StateId] {
        match self.symbol_ids.get(symbol) {
            Some(&symbol_id) => &self.moves[state][symbol_id],
            None => &[],
        }
    }

    pub fn get_start_states(&self) -> &BitVec<u8> {
        &self.start_states
    }

    pub fn get_acceptor_states(&self) -> &BitVec<u8> {
        &self.accept_states
    }

    pub fn empty_set(&self) -> BitVec<u8> {
        BitVec::repeat(false, self.get_num_states())
    }

    /// All states reachable from `states` using only epsilon transitions, `states` included.
    pub fn epsilon_closure(&self, states: &BitVec<u8>) -> BitVec<u8> {
        let mut closure = states.clone();
        let mut work_list: VecDeque<StateId> = states.iter_ones().collect();

        while let Some(state) = work_list.pop_front() {
            for &target in &self.epsilon_moves[state] {
                if !closure[target] {
                    closure.set(target, true);
                    work_list.push_back(target);
                }
            }
        }

        closure
    }

    /// The set of states reachable from `states` by one transition on `symbol`
    pub fn delta(&self, states: &BitVec<u8>, symbol: &Symbol) -> BitVec<u8> {
        let mut result = self.empty_set();

        for state in states.iter_ones() {
            for &target in self.targets(state, symbol) {
                result.set(target, true);
            }
        }

        result
    }

    pub fn contains_accept(&self, states: &BitVec<u8>) -> bool {
        states.iter_ones().any(|state| self.accept_states[state])
    }

    /// Names of the states in `states`, sorted
    pub fn state_names(&self, states: &BitVec<u8>) -> Vec<String> {
        let mut names: Vec<String> = states
            .iter_ones()
            .map(|state| self.state_name(state).to_string())
            .collect();
        names.sort();
        names
    }

    /// Name for a derived state standing for a set of original states, e.g. `{q0,q2}`
    pub fn set_name(&self, states: &BitVec<u8>) -> String {
        format!("{{{}}}", self.state_names(states).join(","))
    }
}
