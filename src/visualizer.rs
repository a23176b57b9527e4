/* Export automata for display: a node and edge view for graph frontends and Graphviz DOT built
 * from a petgraph graph. */

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::process::Command;

use color_eyre::eyre::{eyre, Result};
use log::{debug, info};
use petgraph::dot::Dot;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::prelude::StableGraph;
use serde::{Deserialize, Serialize};

use crate::graph::AutomatonGraph;

/// A state as handed to a graph rendering frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub is_start: bool,
    pub is_final: bool,
}

/// One edge per transition. Epsilon is shown as `ε`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphView {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Export the nodes and edges of a graph for display
pub fn export(graph: &AutomatonGraph) -> GraphView {
    let nodes = graph
        .get_states()
        .iter()
        .map(|state| Node {
            id: state.get_name().to_string(),
            name: state.get_name().to_string(),
            is_start: state.is_start(),
            is_final: state.is_final(),
        })
        .collect();

    let edges = graph
        .get_transitions()
        .iter()
        .map(|transition| Edge {
            source: transition.get_from().to_string(),
            target: transition.get_to().to_string(),
            label: transition.get_label().to_string(),
        })
        .collect();

    GraphView { nodes, edges }
}

fn generate_stable_graph(graph: &AutomatonGraph) -> StableGraph<String, String> {
    let mut stable_graph: StableGraph<String, String> = StableGraph::new();
    let mut node_map: HashMap<&str, NodeIndex> = HashMap::new();

    // Add all nodes, marking start and accept states

    for state in graph.get_states() {
        let mut node_label = state.get_name().to_string();
        if state.is_final() {
            node_label = format!("Accept\n{}", node_label);
        }
        if state.is_start() {
            node_label = format!("Start\n{}", node_label);
        }

        let node = stable_graph.add_node(node_label);
        node_map.insert(state.get_name(), node);
    }

    // Parallel transitions share one edge whose label lists all of them

    let mut edge_map: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();

    for transition in graph.get_transitions() {
        let (Some(&source), Some(&target)) = (
            node_map.get(transition.get_from()),
            node_map.get(transition.get_to()),
        ) else {
            continue;
        };

        let edge_label = transition.get_label().to_string();

        match edge_map.get(&(source, target)) {
            Some(&edge_idx) => {
                if let Some(label) = stable_graph.edge_weight_mut(edge_idx) {
                    label.push_str(", ");
                    label.push_str(&edge_label);
                }
            }
            None => {
                let edge_idx = stable_graph.add_edge(source, target, edge_label);
                edge_map.insert((source, target), edge_idx);
            }
        }
    }

    stable_graph
}

/// Graphviz DOT source for a graph
pub fn to_dot(graph: &AutomatonGraph) -> String {
    let stable_graph = generate_stable_graph(graph);
    Dot::new(&stable_graph).to_string()
}

/// Write `<filename>.dot`. With `render`, Graphviz turns it into `<filename>.jpg`.
pub fn save_dot(graph: &AutomatonGraph, filename: &str, render: bool) -> Result<()> {
    let dot_filename = format!("{}.dot", filename);
    let mut dot_file = File::create(&dot_filename)?;

    dot_file.write_all(to_dot(graph).as_bytes())?;
    debug!("Wrote {}", dot_filename);

    if render {
        let jpg_filename = format!("{}.jpg", filename);
        let output = Command::new("dot")
            .args(["-Tjpg", &dot_filename, "-o", &jpg_filename])
            .output()?;

        if !output.status.success() {
            return Err(eyre!(
                "Error: Graphviz failed to render {}! {}",
                dot_filename,
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        info!("Automaton vizualization saved as {}", jpg_filename);
    }

    Ok(())
}

#[cfg(test)]
mod visualizer_tests {
    use super::*;

    fn sample_graph() -> AutomatonGraph {
        let mut graph = AutomatonGraph::new("a,b");
        graph.add_state("q0", true, false).unwrap();
        graph.add_state("q1", false, true).unwrap();
        graph.add_transition("q0", "q1", "a").unwrap();
        graph.add_transition("q0", "q1", "b").unwrap();
        graph.add_transition("q1", "q1", "ε").unwrap();
        graph
    }

    #[test]
    fn test_export() {
        let view = export(&sample_graph());

        assert_eq!(view.nodes.len(), 2);
        assert_eq!(
            view.nodes[0],
            Node {
                id: "q0".to_string(),
                name: "q0".to_string(),
                is_start: true,
                is_final: false,
            }
        );
        assert!(view.nodes[1].is_final);

        let labels: Vec<&str> = view.edges.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "ε"]);
        assert_eq!(view.edges[2].source, "q1");
        assert_eq!(view.edges[2].target, "q1");
    }

    #[test]
    fn test_export_json() {
        let json = export(&sample_graph()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["nodes"][0]["is_start"], true);
        assert_eq!(value["edges"][0]["source"], "q0");
        assert_eq!(value["edges"][2]["label"], "ε");
    }

    #[test]
    fn test_stable_graph_merges_parallel_edges() {
        let stable_graph = generate_stable_graph(&sample_graph());

        assert_eq!(stable_graph.node_count(), 2);
        assert_eq!(stable_graph.edge_count(), 2);

        let labels: Vec<&str> = stable_graph
            .edge_indices()
            .filter_map(|edge| stable_graph.edge_weight(edge))
            .map(|label| label.as_str())
            .collect();
        assert!(labels.contains(&"a, b"));
        assert!(labels.contains(&"ε"));
    }

    #[test]
    fn test_to_dot() {
        let dot = to_dot(&sample_graph());

        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("Start"));
        assert!(dot.contains("Accept"));
        assert!(dot.contains("q1"));
        assert!(dot.contains("a, b"));
    }
}
