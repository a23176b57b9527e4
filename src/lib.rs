//! # fakit
//!
//! A finite automata workbench built around a single mutable graph model.
//!
//! This library provides functionality to:
//! - Parse alphabets and transition labels, with character ranges such as `a-z`
//! - Build and edit automata as graphs of named states and labeled transitions
//! - Classify a graph as a DFA, an NFA or neither
//! - Simulate a graph on an input string, deterministically or with epsilon closures
//! - Convert NFAs to DFAs using Subset Construction
//! - Minimize DFAs using partition refinement
//! - Export the automata as JSON or Graphviz DOT

pub mod classify;
pub mod dfa;
pub mod graph;
pub mod index;
pub mod simulate;
pub mod symbol;
pub mod visualizer;

// Re-export commonly used functions for convenience
pub use classify::{classify, is_deterministic, Classification};
pub use dfa::{
    construct_dfa, construct_minimal_dfa, minimize, to_dfa, ConversionError, MinimizationError,
    SubsetOptions,
};
pub use graph::{AutomatonGraph, GraphDocument, GraphError, LabelDocument};
pub use simulate::{simulate, Outcome, SimulationResult};
pub use visualizer::{export, save_dot, to_dot};
