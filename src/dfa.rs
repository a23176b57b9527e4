/* Perform subset construction to convert an NFA into a DFA
 * Refine state partitions until they are stable to build the minimal DFA */

use crate::classify::Classification;
use crate::graph::AutomatonGraph;
use crate::index::{StateId, TransitionIndex};
use crate::symbol::SymbolSet;
use bitvec::prelude::*;
use log::{debug, trace};
use serde::Serialize;
use std::collections::VecDeque;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

/// A struct which is a bitvec and its hash stored together to ease fetching the hash of the bitvec
/// quickly instead of calculating it each time.

#[derive(Clone)]
struct HashedBitVec {
    bv: BitVec<u8>,
    hash: u64,
}

impl HashedBitVec {
    fn new(bv: BitVec<u8>) -> Self {
        let mut hasher = DefaultHasher::new();
        bv.hash(&mut hasher);
        let hash = hasher.finish();
        Self { bv, hash }
    }
}

impl Hash for HashedBitVec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialEq for HashedBitVec {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.bv == other.bv
    }
}

impl Eq for HashedBitVec {}

/// List of possible errors during subset construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The automaton is not an NFA
    NotConvertible(String),
    /// Subset construction discovered more DFA states than the configured limit
    StateLimitExceeded(usize),
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::NotConvertible(reason) => {
                write!(f, "Error: Only an NFA can be converted to a DFA! {}", reason)
            }
            ConversionError::StateLimitExceeded(limit) => write!(
                f,
                "Error: Subset construction exceeded the limit of {} DFA states!",
                limit
            ),
        }
    }
}

impl std::error::Error for ConversionError {}

/// List of possible errors during minimization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinimizationError {
    /// The automaton is not a DFA
    NotMinimizable(String),
}

impl std::fmt::Display for MinimizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinimizationError::NotMinimizable(reason) => {
                write!(f, "Error: Only a DFA can be minimized! {}", reason)
            }
        }
    }
}

impl std::error::Error for MinimizationError {}

/// Options for subset construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubsetOptions {
    /// Give up once this many DFA states have been discovered
    pub max_states: Option<usize>,
    /// Add a dead state `{}` so that every state has a transition on every symbol
    pub complete: bool,
}

/// One (DFA state, symbol) pair processed by subset construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionStep {
    pub from: String,
    pub symbol: String,
    /// NFA states reached by the symbol, before the epsilon closure
    pub moved_to: Vec<String>,
    pub closure: Vec<String>,
    pub to: String,
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionTrace {
    pub nfa_state_count: usize,
    pub dfa_state_count: usize,
    pub initial_closure: Vec<String>,
    pub steps: Vec<ConversionStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimizationTrace {
    pub original_state_count: usize,
    pub minimized_state_count: usize,
    /// Every partition visited, starting with final / non-final, as block member names
    pub partitions: Vec<Vec<Vec<String>>>,
    pub already_minimal: bool,
}

impl MinimizationTrace {
    pub fn reduction_percentage(&self) -> f64 {
        if self.original_state_count == 0 {
            return 0.0;
        }
        let removed = self.original_state_count - self.minimized_state_count;
        removed as f64 * 100.0 / self.original_state_count as f64
    }
}

// Names of derived states are built from the original names. Should an original state already
// be called e.g. "{q0}", primes keep the derived names unique.
fn fresh_name(used: &mut HashSet<String>, base: String) -> String {
    let mut name = base;
    while used.contains(&name) {
        name.push('\'');
    }
    used.insert(name.clone());
    name
}

/// Apply the subset construction algorithm on an NFA to build an equivalent DFA. Only subsets
/// reachable from the start closure are materialized. Unless `options.complete` is set, a symbol
/// leading nowhere gets no transition, so the result may be partial.
pub fn construct_dfa(
    nfa: &AutomatonGraph,
    options: SubsetOptions,
) -> Result<(AutomatonGraph, ConversionTrace), ConversionError> {
    match nfa.classification() {
        Classification::Nfa { .. } => {}
        Classification::Dfa => {
            return Err(ConversionError::NotConvertible(
                "automaton is already a DFA".to_string(),
            ))
        }
        Classification::Invalid { reason } => {
            return Err(ConversionError::NotConvertible(reason.clone()))
        }
    }

    let index = TransitionIndex::new(nfa);
    let mut result = AutomatonGraph::with_alphabet(nfa.get_alphabet().clone());
    let mut q_list: HashMap<HashedBitVec, String> = HashMap::new(); // Mapping from nfa state set to DFA state
    let mut work_list: VecDeque<HashedBitVec> = VecDeque::new();
    let mut used_names = HashSet::new();

    let limit_reached = |discovered: usize| match options.max_states {
        Some(max_states) => discovered >= max_states,
        None => false,
    };

    if limit_reached(0) {
        return Err(ConversionError::StateLimitExceeded(0));
    }

    let q0 = HashedBitVec::new(index.epsilon_closure(index.get_start_states()));
    let q0_name = fresh_name(&mut used_names, index.set_name(&q0.bv));

    result.insert_state(q0_name.clone(), true, index.contains_accept(&q0.bv));
    q_list.insert(q0.clone(), q0_name);
    work_list.push_back(q0.clone());

    let mut trace = ConversionTrace {
        nfa_state_count: nfa.get_num_states(),
        dfa_state_count: 0,
        initial_closure: index.state_names(&q0.bv),
        steps: Vec::new(),
    };

    while let Some(q) = work_list.pop_front() {
        let Some(q_name) = q_list.get(&q).cloned() else {
            continue;
        };

        for symbol in index.get_symbols() {
            let end_states = index.delta(&q.bv, symbol);
            if end_states.not_any() && !options.complete {
                continue;
            }

            // With `complete` an empty move becomes the dead state, whose closure is empty too
            let t = HashedBitVec::new(index.epsilon_closure(&end_states));

            let (t_name, is_new) = match q_list.get(&t) {
                Some(existing) => (existing.clone(), false),
                None => {
                    if let Some(max_states) = options.max_states {
                        if limit_reached(q_list.len()) {
                            return Err(ConversionError::StateLimitExceeded(max_states));
                        }
                    }

                    let t_name = fresh_name(&mut used_names, index.set_name(&t.bv));
                    result.insert_state(t_name.clone(), false, index.contains_accept(&t.bv));
                    q_list.insert(t.clone(), t_name.clone());
                    work_list.push_back(t.clone());
                    (t_name, true)
                }
            };

            trace!("{} --{}--> {}", q_name, symbol, t_name);

            result.insert_transition(
                q_name.clone(),
                t_name.clone(),
                SymbolSet::single(symbol.clone()),
            );

            trace.steps.push(ConversionStep {
                from: q_name.clone(),
                symbol: symbol.to_string(),
                moved_to: index.state_names(&end_states),
                closure: index.state_names(&t.bv),
                to: t_name,
                is_new,
            });
        }
    }

    trace.dfa_state_count = result.get_num_states();

    debug!(
        "Subset construction turned {} NFA states into {} DFA states",
        trace.nfa_state_count, trace.dfa_state_count
    );

    Ok((result, trace))
}

/// Convert an NFA into an equivalent DFA with the default [`SubsetOptions`]
pub fn to_dfa(nfa: &AutomatonGraph) -> Result<(AutomatonGraph, ConversionTrace), ConversionError> {
    construct_dfa(nfa, SubsetOptions::default())
}

/// A partition of the DFA states into blocks of states not yet known to be distinguishable
#[derive(Debug, Clone)]
struct Partition {
    block_of: Vec<usize>,
    blocks: Vec<Vec<StateId>>,
}

impl Partition {
    fn from_blocks(blocks: Vec<Vec<StateId>>, num_states: usize) -> Self {
        let mut block_of = vec![0; num_states];
        for (block_id, block) in blocks.iter().enumerate() {
            for &state in block {
                block_of[state] = block_id;
            }
        }
        Partition { block_of, blocks }
    }

    /// Final states in one block, non-final states in the other. Empty blocks are left out.
    fn initial(index: &TransitionIndex) -> Self {
        let accept_states = index.get_acceptor_states();
        let finals: Vec<StateId> = accept_states.iter_ones().collect();
        let non_finals: Vec<StateId> = accept_states.iter_zeros().collect();

        let blocks = [finals, non_finals]
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect();

        Partition::from_blocks(blocks, index.get_num_states())
    }

    fn get_set_of_state(&self, state: StateId) -> usize {
        self.block_of[state]
    }

    fn get_num_sets(&self) -> usize {
        self.blocks.len()
    }

    /// Split every block so that two states stay together only if no symbol tells them apart
    /// under the current partition.
    fn refine(&self, index: &TransitionIndex) -> Partition {
        let mut blocks: Vec<Vec<StateId>> = Vec::with_capacity(self.blocks.len());

        for block in &self.blocks {
            if block.len() == 1 {
                // Cannot split a set with only 1 element
                blocks.push(block.clone());
                continue;
            }

            let mut sub_blocks: Vec<Vec<StateId>> = Vec::new();

            for &state in block {
                let same = sub_blocks
                    .iter_mut()
                    .find(|sub_block| compare_transitions(sub_block[0], state, index, self));

                match same {
                    Some(sub_block) => sub_block.push(state),
                    None => sub_blocks.push(vec![state]),
                }
            }

            blocks.extend(sub_blocks);
        }

        Partition::from_blocks(blocks, index.get_num_states())
    }

    fn canonical(&self) -> Vec<Vec<StateId>> {
        let mut blocks: Vec<Vec<StateId>> = self
            .blocks
            .iter()
            .map(|block| {
                let mut block = block.clone();
                block.sort_unstable();
                block
            })
            .collect();
        blocks.sort();
        blocks
    }

    /// Same blocks with the same members, regardless of order
    fn same_membership(&self, other: &Partition) -> bool {
        self.get_num_sets() == other.get_num_sets() && self.canonical() == other.canonical()
    }

    fn block_names(&self, index: &TransitionIndex) -> Vec<Vec<String>> {
        self.blocks
            .iter()
            .map(|block| {
                let mut names: Vec<String> = block
                    .iter()
                    .map(|&state| index.state_name(state).to_string())
                    .collect();
                names.sort();
                names
            })
            .collect()
    }
}

fn compare_transitions(
    state1: StateId,
    state2: StateId,
    index: &TransitionIndex,
    partition: &Partition,
) -> bool {
    for symbol in index.get_symbols() {
        let state1_dest = index.targets(state1, symbol).first();
        let state2_dest = index.targets(state2, symbol).first();

        match (state1_dest, state2_dest) {
            (None, None) => {} // If both don't have a transition, no splitting
            (Some(_), None) | (None, Some(_)) => return false, // If only one has a transition, split
            (Some(&state1_dest), Some(&state2_dest)) => {
                // If both have transitions, make sure both transition to the same set
                if partition.get_set_of_state(state1_dest) != partition.get_set_of_state(state2_dest)
                {
                    return false;
                }
            }
        }
    }
    true
}

/// Minimize a DFA by partition refinement. States that no input string can tell apart are merged
/// into one state named after its members, e.g. `{q0,q2}`. A DFA that is already minimal comes
/// back as an identical copy.
pub fn construct_minimal_dfa(
    dfa: &AutomatonGraph,
) -> Result<(AutomatonGraph, MinimizationTrace), MinimizationError> {
    match dfa.classification() {
        Classification::Dfa => {}
        Classification::Nfa { reason } => {
            return Err(MinimizationError::NotMinimizable(format!(
                "The automaton is an NFA: {}",
                reason
            )))
        }
        Classification::Invalid { reason } => {
            return Err(MinimizationError::NotMinimizable(reason.clone()))
        }
    }

    let index = TransitionIndex::new(dfa);
    let num_states = index.get_num_states();

    let mut partition = Partition::initial(&index);
    let mut partitions = vec![partition.block_names(&index)];

    loop {
        let refined = partition.refine(&index);
        if refined.same_membership(&partition) {
            break;
        }
        debug!(
            "Refined partition from {} to {} blocks",
            partition.get_num_sets(),
            refined.get_num_sets()
        );
        partitions.push(refined.block_names(&index));
        partition = refined;
    }

    let mut trace = MinimizationTrace {
        original_state_count: num_states,
        minimized_state_count: partition.get_num_sets(),
        partitions,
        already_minimal: partition.get_num_sets() == num_states,
    };

    if trace.already_minimal {
        debug!("DFA with {} states is already minimal", num_states);
        return Ok((dfa.clone(), trace));
    }

    // Order the merged states by their first original member so the result reads like the input
    let mut blocks = partition.canonical();
    blocks.sort_by_key(|block| block[0]);
    let partition = Partition::from_blocks(blocks, num_states);

    let mut minimal_dfa = AutomatonGraph::with_alphabet(dfa.get_alphabet().clone());
    let mut used_names = HashSet::new();
    let mut block_names = Vec::with_capacity(partition.get_num_sets());

    for block in &partition.blocks {
        let mut names: Vec<&str> = block.iter().map(|&s| index.state_name(s)).collect();
        names.sort_unstable();
        let name = fresh_name(&mut used_names, format!("{{{}}}", names.join(",")));

        let is_start = block.iter().any(|&s| index.get_start_states()[s]);
        let is_final = block.iter().any(|&s| index.get_acceptor_states()[s]);

        minimal_dfa.insert_state(name.clone(), is_start, is_final);
        block_names.push(name);
    }

    for (block_id, block) in partition.blocks.iter().enumerate() {
        // All members agree on the destination block, so any member represents the block
        let representative = block[0];

        for symbol in index.get_symbols() {
            if let Some(&destination) = index.targets(representative, symbol).first() {
                let destination_block = partition.get_set_of_state(destination);
                minimal_dfa.insert_transition(
                    block_names[block_id].clone(),
                    block_names[destination_block].clone(),
                    SymbolSet::single(symbol.clone()),
                );
            }
        }
    }

    trace.minimized_state_count = minimal_dfa.get_num_states();

    debug!(
        "Minimized DFA from {} to {} states",
        trace.original_state_count, trace.minimized_state_count
    );

    Ok((minimal_dfa, trace))
}

pub fn minimize(
    dfa: &AutomatonGraph,
) -> Result<(AutomatonGraph, MinimizationTrace), MinimizationError> {
    construct_minimal_dfa(dfa)
}
