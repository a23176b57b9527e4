mod integration_tests_helper {

    use fakit::AutomatonGraph;
    use std::path::PathBuf;

    pub fn test_data_path(file_name: &str) -> PathBuf {
        let manifest_dir = env!("CARGO_MANIFEST_DIR");

        let mut path = PathBuf::from(manifest_dir);
        path.push("test_data");
        path.push(file_name);
        path
    }

    pub fn load(file_name: &str) -> AutomatonGraph {
        let graph = AutomatonGraph::load_graph(&test_data_path(file_name));

        // assert that loading the document was successful
        assert!(graph.is_ok());

        graph.unwrap()
    }

    pub fn temp_path(file_name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("fakit_{}_{}", std::process::id(), file_name));
        path
    }

    pub fn accepts(graph: &AutomatonGraph, input: &str) -> bool {
        fakit::simulate(graph, input).is_accepted()
    }
}

mod integration_tests {
    use crate::integration_tests_helper::{accepts, load, temp_path, test_data_path};

    use fakit::simulate::{simulate_symbols, Configuration};
    use fakit::symbol::{Symbol, SymbolSet};
    use fakit::{
        construct_dfa, minimize, simulate, to_dfa, AutomatonGraph, Classification, Outcome,
        SubsetOptions,
    };

    #[test]
    fn test_even_number_of_as() {
        let graph = load("even_as.json");
        assert_eq!(*graph.classification(), Classification::Dfa);

        let result = simulate(&graph, "abba");
        assert!(result.is_accepted());
        assert_eq!(*result.get_outcome(), Outcome::Accepted);
        assert_eq!(result.get_trace().len(), 5);

        assert!(accepts(&graph, "aab"));
        assert!(!accepts(&graph, "ab"));
        assert!(!accepts(&graph, "aaab"));
        assert!(accepts(&graph, ""));
    }

    #[test]
    fn test_ends_with_ab() {
        let graph = load("ends_with_ab.json");
        assert!(graph.classification().is_nfa());

        let result = simulate(&graph, "aab");
        assert!(result.is_accepted());
        assert_eq!(
            result.get_trace().last(),
            Some(&Configuration::States(vec![
                "q0".to_string(),
                "q2".to_string()
            ]))
        );

        assert!(!accepts(&graph, "aba"));
    }

    #[test]
    fn test_symbol_not_in_alphabet() {
        let graph = load("even_as.json");
        let result = simulate(&graph, "abc");

        assert!(!result.is_accepted());
        assert_eq!(
            result.get_outcome().to_string(),
            "Input symbol 'c' is not in the alphabet."
        );
    }

    #[test]
    fn test_ranges_in_document() {
        let graph = load("identifier.json");
        assert_eq!(graph.get_alphabet().len(), 37);

        assert!(accepts(&graph, "foo_1"));
        assert!(accepts(&graph, "_"));
        assert!(!accepts(&graph, "1foo"));
        assert!(!accepts(&graph, ""));
    }

    #[test]
    fn test_alphabet_keeps_ranges_literal() {
        let mut graph = AutomatonGraph::new("a-z,0-9,_");
        assert_eq!(graph.get_alphabet().len(), 3);

        graph.add_state("start", true, false).unwrap();
        graph.add_state("ident", false, true).unwrap();
        // A label range expands to symbols the alphabet does not hold
        assert!(graph.add_transition("start", "ident", "a-z").is_err());
    }

    #[test]
    fn test_save_and_load_range_like_symbol() {
        let mut graph = AutomatonGraph::new("a-c,x");
        graph.add_state("q0", true, false).unwrap();
        graph.add_state("q1", false, true).unwrap();
        graph
            .add_transition_label("q0", "q1", SymbolSet::single(Symbol::literal("a-c")))
            .unwrap();
        graph.add_transition("q0", "q0", "x").unwrap();

        let path = temp_path("range_like_symbol.json");
        graph.save_graph(&path).unwrap();
        let loaded = AutomatonGraph::load_graph(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, graph);
        let input = [Symbol::literal("x"), Symbol::literal("a-c")];
        assert!(simulate_symbols(&loaded, loaded.classification(), &input).is_accepted());
    }

    #[test]
    fn test_document_with_unknown_state_is_rejected() {
        let graph = AutomatonGraph::load_graph(&test_data_path("unknown_state.json"));
        assert!(graph.is_err());
    }

    #[test]
    fn test_convert_epsilon_nfa() {
        let nfa = load("epsilon_nfa.json");
        let (dfa, trace) = to_dfa(&nfa).unwrap();

        assert_eq!(trace.dfa_state_count, dfa.get_num_states());
        for input in ["", "a", "b", "ab", "ba", "aa", "bb"] {
            assert_eq!(accepts(&dfa, input), input == "a" || input == "b", "{input}");
            assert_eq!(accepts(&nfa, input), accepts(&dfa, input), "{input}");
        }

        // The source graph is left untouched
        assert_eq!(nfa, load("epsilon_nfa.json"));
    }

    #[test]
    fn test_convert_then_minimize() {
        let nfa = load("ends_with_ab.json");
        let options = SubsetOptions {
            complete: true,
            ..Default::default()
        };

        let (dfa, _) = construct_dfa(&nfa, options).unwrap();
        let (minimal_dfa, _) = minimize(&dfa).unwrap();

        assert_eq!(minimal_dfa.get_num_states(), 3);
        for input in ["", "ab", "aab", "abab", "aba", "b", "bab"] {
            assert_eq!(accepts(&nfa, input), accepts(&minimal_dfa, input), "{input}");
        }
    }

    #[test]
    fn test_minimize_redundant_dfa() {
        let dfa = load("redundant_dfa.json");
        let (minimal_dfa, trace) = minimize(&dfa).unwrap();

        assert_eq!(minimal_dfa.get_num_states(), 2);
        assert_eq!(trace.reduction_percentage(), 50.0);

        let (again, trace) = minimize(&minimal_dfa).unwrap();
        assert!(trace.already_minimal);
        assert_eq!(again.get_num_states(), 2);
    }

    #[test]
    fn test_save_and_load_converted_dfa() {
        let nfa = load("ends_with_ab.json");
        let (dfa, _) = to_dfa(&nfa).unwrap();

        let path = temp_path("converted_dfa.json");
        dfa.save_graph(&path).unwrap();
        let loaded = AutomatonGraph::load_graph(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, dfa);
        assert_eq!(*loaded.classification(), Classification::Dfa);
    }

    #[test]
    fn test_edits_invalidate_classification() {
        let mut graph = load("even_as.json");
        assert!(graph.classification().is_dfa());

        graph.add_transition("q0", "q0", "ε").unwrap();
        assert!(graph.classification().is_nfa());

        graph.remove_transition("q0", "q0", Some("ε")).unwrap();
        assert!(graph.classification().is_dfa());

        graph.remove_state("q1").unwrap();
        assert!(graph.classification().is_nfa());
    }

    #[test]
    fn test_save_dot() {
        let graph = load("ends_with_ab.json");
        let path = temp_path("ends_with_ab");
        let name = path.to_str().unwrap();

        fakit::save_dot(&graph, name, false).unwrap();

        let dot_path = format!("{}.dot", name);
        let dot = std::fs::read_to_string(&dot_path).unwrap();
        std::fs::remove_file(&dot_path).unwrap();

        assert!(dot.contains("digraph"));
        assert!(dot.contains("a,b"));
    }
}
