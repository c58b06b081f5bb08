use clap::Parser;
use rand::Rng;
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;
use serde_json::Value;
use shindan::flow::MeasureNode;
use shindan::prelude::*;
use std::fs;

/// A CLI tool to generate response scripts for `shindan-cli replay`
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the flow JSON file to walk
    flow: String,

    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_responses.json")]
    output: String,

    /// Give up if no Terminal node is reached after this many steps
    #[arg(long, default_value_t = 256)]
    max_steps: usize,

    /// Number of scripts to generate; more than one writes a JSON array of scripts
    #[arg(short, long, default_value_t = 1)]
    count: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.count == 0 {
        eprintln!("Error: --count must be at least 1");
        std::process::exit(1);
    }

    let flow = load_flow(&cli.flow)?;
    println!(
        "Generating {} response script(s) for flow '{}' v{}...",
        cli.count,
        flow.flow_id(),
        flow.flow_version()
    );

    let mut scripts = Vec::with_capacity(cli.count);
    for _ in 0..cli.count {
        let Some((script, terminal)) = random_walk(&flow, &mut rng, cli.max_steps) else {
            eprintln!(
                "Error: no Terminal node reached within {} steps; raise --max-steps",
                cli.max_steps
            );
            std::process::exit(1);
        };
        println!("-> {} response(s) ending at '{}'.", script.len(), terminal);
        scripts.push(script);
    }

    let json_output = if let [script] = scripts.as_slice() {
        serde_json::to_string_pretty(script)?
    } else {
        serde_json::to_string_pretty(&scripts)?
    };
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved response script to '{}'",
        cli.output
    );

    Ok(())
}

/// Walks from the start node choosing a random valid response at each step.
/// Returns the responses and the Terminal node reached.
fn random_walk(
    flow: &FlowDefinition,
    rng: &mut ThreadRng,
    max_steps: usize,
) -> Option<(Vec<Value>, String)> {
    let mut node_id = flow.start_node();
    let mut script = Vec::new();

    for _ in 0..max_steps {
        let (response, next) = match flow.node(node_id)? {
            Node::Terminal(_) => return Some((script, node_id.to_string())),
            Node::Question(question) => {
                let options: Vec<(&String, &String)> = question.answers.iter().collect();
                let &(answer, next) = options.choose(rng)?;
                (Value::from(answer.as_str()), next.as_str())
            }
            Node::Safety(safety) => (Value::Bool(true), safety.next.as_str()),
            Node::Measure(measure) => {
                let (reading, branch) = generate_reading(measure, rng)?;
                (Value::from(reading), branch)
            }
        };
        script.push(response);
        node_id = next;
    }
    None
}

/// Picks a branch at random, then a reading inside the valid range that the
/// engine would route to it. Readings are rounded to two decimals.
fn generate_reading<'a>(measure: &'a MeasureNode, rng: &mut ThreadRng) -> Option<(f64, &'a str)> {
    let range = measure.valid_range;
    let mut branches: Vec<usize> = (0..measure.branches.len()).collect();

    while !branches.is_empty() {
        let pick = branches.swap_remove(rng.random_range(0..branches.len()));
        let target = &measure.branches[pick];

        for _ in 0..64 {
            let reading = (rng.random_range(range.min..=range.max) * 100.0).round() / 100.0;
            let reading = reading.clamp(range.min, range.max);
            if measure
                .select_branch(reading)
                .is_some_and(|branch| std::ptr::eq(branch, target))
            {
                return Some((reading, target.next.as_str()));
            }
        }

        // Equality conditions are rarely hit by sampling; try the threshold itself.
        let threshold = target.condition.threshold;
        if range.contains(threshold)
            && measure
                .select_branch(threshold)
                .is_some_and(|branch| std::ptr::eq(branch, target))
        {
            return Some((threshold, target.next.as_str()));
        }
    }
    None
}
