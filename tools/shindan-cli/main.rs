use clap::{Parser, Subcommand};
use shindan::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Walks an operator through a diagnostic flow and records the outcome
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding the current session and the session history
    #[arg(long, env = "SHINDAN_DATA_DIR", default_value = ".shindan", global = true)]
    data_dir: PathBuf,

    /// Log every transition (overrides SHINDAN_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a flow document and report the first problem found
    Validate {
        /// Path to the flow JSON file
        flow: PathBuf,
    },
    /// Run a flow interactively, resuming an unfinished session if there is one
    Run {
        /// Path to the flow JSON file
        flow: PathBuf,
        /// Discard any unfinished session and start over
        #[arg(long)]
        fresh: bool,
    },
    /// Feed a JSON array of responses through a flow in memory and print the summary
    Replay {
        /// Path to the flow JSON file
        flow: PathBuf,
        /// Path to a JSON array of responses, e.g. ["yes", true, 12.4]
        responses: PathBuf,
        /// Print the summary without session id and timestamps
        #[arg(long)]
        normalized: bool,
    },
    /// List finished sessions
    History {
        /// Print the raw summaries as JSON
        #[arg(long)]
        json: bool,
        /// Delete the history instead of listing it
        #[arg(long)]
        clear: bool,
    },
    /// Drop the persisted current session; history is kept
    Reset,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Validate { flow } => run_validate(&flow),
        Command::Run { flow, fresh } => run_interactive(&flow, &cli.data_dir, fresh),
        Command::Replay {
            flow,
            responses,
            normalized,
        } => run_replay(&flow, &responses, normalized),
        Command::History { json, clear } => run_history(&open_store(&cli.data_dir), json, clear),
        Command::Reset => {
            open_store(&cli.data_dir)
                .clear_session_state()
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to reset session: {}", e)));
            println!("Current session cleared.");
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("shindan=debug")
    } else {
        EnvFilter::try_from_env("SHINDAN_LOG").unwrap_or_else(|_| EnvFilter::new("shindan=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_validate(path: &Path) {
    let flow = load(path);
    let terminals = flow.terminal_nodes().count();

    println!("Flow '{}' v{} is valid.", flow.flow_id(), flow.flow_version());
    if let Some(title) = flow.title() {
        println!("  Title:       {}", title);
    }
    println!("  Start node:  {}", flow.start_node());
    println!("  Nodes:       {}", flow.nodes().len());
    println!("  Terminals:   {}", terminals);
}

/// Runs the operator loop against a directory-backed store.
fn run_interactive(flow_path: &Path, data_dir: &Path, fresh: bool) {
    let flow = load(flow_path);
    let engine = Engine::new(flow, open_store(data_dir));

    let resumed = if fresh {
        None
    } else {
        engine
            .resume_session()
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to read session: {}", e)))
    };

    let mut state = match resumed {
        Some(state) => {
            println!(
                "--- Resuming session {} at node '{}' ({} step(s) recorded) ---",
                state.session_id,
                state.current_node_id,
                state.events.len()
            );
            state
        }
        None => {
            let state = engine
                .start_session()
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to start session: {}", e)));
            let title = engine.flow().title().unwrap_or(engine.flow().flow_id());
            println!("--- {} (session {}) ---", title, state.session_id);
            state
        }
    };
    println!("Type 'stop' at any prompt to end the diagnostic early.");

    while state.is_active() {
        let node = engine
            .current_node(&state)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));

        describe_node(&state.current_node_id, node);
        let input = prompt_for_input(input_hint(node), input_default(node));

        let next = if input.eq_ignore_ascii_case("stop") {
            engine.stop_session(&state)
        } else {
            engine.process_response(&state, ResponseValue::parse_for(node, &input))
        };

        match next {
            Ok(next) => state = next,
            Err(EngineError::Storage(e)) => {
                exit_with_error(&format!("Progress could not be saved: {}", e))
            }
            Err(e) => println!("  !! {}", e),
        }
    }

    print_outcome(&state);
}

fn run_replay(flow_path: &Path, responses_path: &Path, normalized: bool) {
    let flow = load(flow_path);
    let responses: Vec<ResponseValue> = fs::read_to_string(responses_path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()))
        .unwrap_or_else(|e| {
            exit_with_error(&format!(
                "Failed to load responses from '{}': {}",
                responses_path.display(),
                e
            ))
        });

    let engine = Engine::new(flow, MemoryStore::new());
    let mut state = engine
        .start_session()
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    for (step, response) in responses.into_iter().enumerate() {
        if state.is_finished() {
            exit_with_error(&format!(
                "Session finished after {} response(s); the script has more",
                step
            ));
        }
        state = engine
            .process_response(&state, response)
            .unwrap_or_else(|e| exit_with_error(&format!("Response #{} rejected: {}", step + 1, e)));
    }

    let Some(summary) = SessionSummary::from_state(&state) else {
        exit_with_error(&format!(
            "Responses ran out at node '{}' before the flow reached a Terminal node",
            state.current_node_id
        ));
    };

    let output = if normalized {
        serde_json::to_string_pretty(&summary.normalized())
    } else {
        serde_json::to_string_pretty(&summary)
    };
    match output {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to serialize summary: {}", e)),
    }
}

fn run_history(store: &FileStore, json: bool, clear: bool) {
    if clear {
        store
            .clear_session_history()
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to clear history: {}", e)));
        println!("Session history cleared.");
        return;
    }

    let history = store
        .session_history()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read history: {}", e)));

    if json {
        match serde_json::to_string_pretty(&history) {
            Ok(text) => println!("{}", text),
            Err(e) => exit_with_error(&format!("Failed to serialize history: {}", e)),
        }
        return;
    }

    if history.is_empty() {
        println!("No finished sessions in '{}'.", store.dir().display());
        return;
    }
    for summary in &history {
        let outcome = match (&summary.result, summary.stopped) {
            (Some(result), _) => result.clone(),
            (None, true) => "stopped".to_string(),
            (None, false) => "-".to_string(),
        };
        println!(
            "{}  {} v{}  {}  {} step(s)  {}",
            summary.completed_at.format("%Y-%m-%d %H:%M:%S"),
            summary.flow_id,
            summary.flow_version,
            summary.session_id,
            summary.events.len(),
            outcome
        );
    }
}

fn describe_node(node_id: &str, node: &Node) {
    println!();
    match node {
        Node::Question(question) => {
            println!("[{}] {}", node_id, question.text);
            let options: Vec<&str> = question.answers.keys().map(String::as_str).collect();
            println!("  Options: {}", options.join(" / "));
        }
        Node::Safety(safety) => println!("[{}] SAFETY: {}", node_id, safety.text),
        Node::Measure(measure) => {
            println!("[{}] {}", node_id, measure.text);
            println!(
                "  Valid range: {} to {}{}",
                measure.valid_range.min,
                measure.valid_range.max,
                measure.unit.as_deref().map(|u| format!(" {}", u)).unwrap_or_default()
            );
        }
        Node::Terminal(terminal) => println!("[{}] {}", node_id, terminal.result),
    }
}

fn input_hint(node: &Node) -> &'static str {
    match node.kind() {
        NodeKind::Question => "Answer",
        NodeKind::Safety => "Confirm",
        NodeKind::Measure => "Reading",
        NodeKind::Terminal => "Acknowledge",
    }
}

/// Acknowledgements accept an empty line as "yes"; answers and readings have
/// no default.
fn input_default(node: &Node) -> Option<&'static str> {
    match node.kind() {
        NodeKind::Safety | NodeKind::Terminal => Some("yes"),
        NodeKind::Question | NodeKind::Measure => None,
    }
}

fn print_outcome(state: &SessionState) {
    let (heading, artifact) = if state.completed {
        (
            format!(
                "Diagnostic complete: {}",
                state.result.as_deref().unwrap_or_default()
            ),
            state.artifact.as_ref(),
        )
    } else {
        (
            "Diagnostic stopped; partial report follows".to_string(),
            state.partial_artifact.as_ref(),
        )
    };

    println!("\n--- {} ---", heading);
    for (field, value) in artifact.into_iter().flatten() {
        println!("  {:<24} {}", field, value);
    }
    println!();
}

fn load(path: &Path) -> FlowDefinition {
    load_flow(path).unwrap_or_else(|e| exit_with_error(&e.to_string()))
}

fn open_store(dir: &Path) -> FileStore {
    FileStore::open(dir).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to open data directory '{}': {}",
            dir.display(),
            e
        ))
    })
}

/// A helper function to prompt the user and read a line of input.
/// End of input counts as `stop`.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    if let Err(e) = io::stdout().flush() {
        exit_with_error(&format!("Failed to write prompt: {}", e));
    }

    match io::stdin().read_line(&mut line) {
        Ok(0) => return "stop".to_string(),
        Ok(_) => {}
        Err(e) => exit_with_error(&format!("Failed to read line: {}", e)),
    }
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
