use clap::{Arg, ArgAction, Command};
use color_eyre::eyre::{eyre, Report, Result};
use fakit::simulate::Configuration;
use fakit::{
    construct_dfa, construct_minimal_dfa, export, is_deterministic, save_dot, simulate,
    AutomatonGraph, SubsetOptions,
};
use std::fs;
use std::path::PathBuf;

fn format_trace(trace: &[Configuration]) -> String {
    trace
        .iter()
        .map(|configuration| configuration.to_string())
        .collect::<Vec<String>>()
        .join(" -> ")
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let args = Command::new("fakit")
        .version("0.1.0")
        .about("A finite automata workbench: classify, simulate, convert and minimize automata stored as JSON graph documents")
        .arg(
            Arg::new("automaton")
                .short('a')
                .long("automaton")
                .value_name("AUTOMATON FILE")
                .help("The JSON graph document describing the automaton")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("check-determinism")
                .short('c')
                .long("check-determinism")
                .help("Report whether the automaton is deterministic. Partial automata count as deterministic")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("simulate")
                .short('s')
                .long("simulate")
                .value_name("INPUT")
                .help("Run the automaton on the input string, one symbol per character. May be repeated")
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("save-dfa")
                .short('d')
                .long("save-dfa")
                .value_name("DFA FILE")
                .help("Save the DFA obtained after Subset Construction of the NFA")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("save-minimal-dfa")
                .short('m')
                .long("save-minimal-dfa")
                .value_name("MINIMAL DFA FILE")
                .help("Save the minimal DFA. An NFA is converted first, which needs --complete to yield a DFA")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("export-json")
                .short('j')
                .long("export-json")
                .value_name("JSON FILE")
                .help("Export the nodes and edges of the automaton for a graph frontend")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dot")
                .short('g')
                .long("dot")
                .value_name("DOT FILE NAME")
                .help("Write the automaton as <name>.dot")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("render")
                .long("render")
                .help("Render the dot file to <name>.jpg with Graphviz")
                .requires("dot")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-dfa-states")
                .long("max-dfa-states")
                .value_name("N")
                .help("Abort Subset Construction once more than N DFA states are discovered")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("complete")
                .long("complete")
                .help("Add a dead state during Subset Construction so the DFA has a transition for every symbol")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let automaton_path = args
        .get_one::<PathBuf>("automaton")
        .ok_or_else(|| eyre!("Error: An automaton file must be provided!"))?;

    let graph = AutomatonGraph::load_graph(automaton_path)?;
    let classification = graph.classification();

    println!("Classification: {}", classification);

    if args.get_flag("check-determinism") {
        let (_, message) = is_deterministic(&graph);
        println!("{}", message);
    }

    if let Some(inputs) = args.get_many::<String>("simulate") {
        for input in inputs {
            let result = simulate(&graph, input);
            println!("{:?}: {}", input, result.get_outcome());
            println!("  {}", format_trace(result.get_trace()));
        }
    }

    let options = SubsetOptions {
        max_states: args.get_one::<usize>("max-dfa-states").copied(),
        complete: args.get_flag("complete"),
    };

    let save_dfa = args.get_one::<PathBuf>("save-dfa");
    let save_minimal_dfa = args.get_one::<PathBuf>("save-minimal-dfa");

    let mut dfa: Option<AutomatonGraph> = None;

    if save_dfa.is_some() || (save_minimal_dfa.is_some() && classification.is_nfa()) {
        let (converted, trace) = construct_dfa(&graph, options).map_err(Report::new)?;
        println!(
            "Subset Construction: {} NFA states -> {} DFA states",
            trace.nfa_state_count, trace.dfa_state_count
        );

        if let Some(path) = save_dfa {
            converted.save_graph(path)?;
            println!("DFA saved as {}", path.display());
        }

        dfa = Some(converted);
    }

    if let Some(path) = save_minimal_dfa {
        let source = dfa.as_ref().unwrap_or(&graph);
        let (minimal_dfa, trace) = construct_minimal_dfa(source).map_err(Report::new)?;

        if trace.already_minimal {
            println!("DFA is already minimal");
        } else {
            println!(
                "Minimization: {} states -> {} states ({:.1}% reduction)",
                trace.original_state_count,
                trace.minimized_state_count,
                trace.reduction_percentage()
            );
        }

        minimal_dfa.save_graph(path)?;
        println!("Minimal DFA saved as {}", path.display());
    }

    if let Some(path) = args.get_one::<PathBuf>("export-json") {
        fs::write(path, export(&graph).to_json()?)?;
    }

    if let Some(name) = args.get_one::<String>("dot") {
        save_dot(&graph, name, args.get_flag("render"))?;
    }

    Ok(())
}
