use anyhow::{anyhow, Result};
use clap::{arg, Command};
use serde_json::{json, Map, Value};
use std::{fs, path::PathBuf};
use toolswitch_algorithms::tool_switching::hgs::{self, Ktns, Params, Problem};
use toolswitch_challenges::tool_switching::*;
use toolswitch_runtime::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("toolswitch")
        .about("Sequences jobs to minimize tool switches")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("solve")
                .about("Solves every instance matching the given names")
                .arg(
                    arg!(<INSTANCES_PATH> "Directory holding the instance files")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(<INSTANCE_NAMES> "File name prefix, or '-' separated prefixes when it contains 'L'")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(<SOLUTION_PATH> "File receiving one 'cost,seconds' line per instance")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(<SEED> "Random seed, 0 to seed from the clock")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--hyperparameters [HYPERPARAMETERS] "Hyperparameters json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--"max-it-noimprov" [MAX_IT_NOIMPROV] "Iterations without improvement before stopping")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"time-limit" [TIME_LIMIT] "Wall clock limit per instance, in seconds")
                        .value_parser(clap::value_parser!(f64)),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Generates a random instance")
                .arg(arg!(<NUM_JOBS> "Number of jobs").value_parser(clap::value_parser!(usize)))
                .arg(arg!(<NUM_TOOLS> "Number of tools").value_parser(clap::value_parser!(usize)))
                .arg(
                    arg!(--seed [SEED] "Random seed, 0 to seed from the clock")
                        .default_value("0")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, the instance is written to this file instead of stdout")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("evaluate")
                .about("Verifies a job sequence and reports its costs")
                .arg(
                    arg!(<INSTANCE> "Path to an instance file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(<SEQUENCE> "Sequence json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("solve", sub_m)) => solve(
            sub_m.get_one::<PathBuf>("INSTANCES_PATH").unwrap().clone(),
            sub_m.get_one::<String>("INSTANCE_NAMES").unwrap().clone(),
            sub_m.get_one::<PathBuf>("SOLUTION_PATH").unwrap().clone(),
            *sub_m.get_one::<u64>("SEED").unwrap(),
            sub_m.get_one::<String>("hyperparameters").cloned(),
            sub_m.get_one::<usize>("max-it-noimprov").cloned(),
            sub_m.get_one::<f64>("time-limit").cloned(),
        ),
        Some(("generate", sub_m)) => generate(
            *sub_m.get_one::<usize>("NUM_JOBS").unwrap(),
            *sub_m.get_one::<usize>("NUM_TOOLS").unwrap(),
            *sub_m.get_one::<u64>("seed").unwrap(),
            sub_m.get_one::<PathBuf>("output").cloned(),
        ),
        Some(("evaluate", sub_m)) => evaluate(
            sub_m.get_one::<PathBuf>("INSTANCE").unwrap().clone(),
            sub_m.get_one::<String>("SEQUENCE").unwrap().clone(),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

pub fn solve(
    instances_path: PathBuf,
    instance_names: String,
    solution_path: PathBuf,
    seed: u64,
    hyperparameters: Option<String>,
    max_it_noimprov: Option<usize>,
    time_limit: Option<f64>,
) -> Result<()> {
    let mut hyperparameters = load_hyperparameters(hyperparameters.as_deref())?;
    hyperparameters.insert("seed".to_string(), json!(resolve_seed(seed)));
    if let Some(n) = max_it_noimprov {
        hyperparameters.insert("max_it_noimprov".to_string(), json!(n));
    }
    if let Some(secs) = time_limit {
        hyperparameters.insert("time_limit_secs".to_string(), json!(secs));
    }
    let params = Params::initialize(&Some(hyperparameters))?;

    let files = discover_instances(&instances_path, &instance_names)?;
    info!(
        event = "run_start",
        instances = files.len(),
        seed = params.seed,
        path = %instances_path.display(),
        names = instance_names.as_str(),
    );

    for file in &files {
        let challenge = read_instance(file)?;
        let data = Problem::load(&challenge)?;
        info!(
            event = "instance_start",
            file = %file.display(),
            jobs = data.num_jobs,
            tools = data.num_tools,
            capacity = data.max_capacity,
        );

        let result = hgs::run(&data, &params, params.max_it_noimprov_for(data.num_jobs))?;
        let solution = Solution {
            sequence: result.sequence.clone(),
        };
        challenge.verify_solution(&solution, Some(result.switches))?;
        append_result(&solution_path, result.switches, result.elapsed.as_secs_f64())?;

        info!(
            event = "instance_end",
            file = %file.display(),
            switches = result.switches,
            iterations = result.iterations,
            elapsed_sec = result.elapsed.as_secs_f64(),
        );
    }

    info!(event = "run_end", instances = files.len());
    Ok(())
}

pub fn generate(
    num_jobs: usize,
    num_tools: usize,
    seed: u64,
    output_file: Option<PathBuf>,
) -> Result<()> {
    let mut seed_bytes = [0u8; 32];
    seed_bytes[..8].copy_from_slice(&resolve_seed(seed).to_le_bytes());
    let difficulty = Difficulty {
        num_jobs,
        num_tools,
    };
    let challenge = Challenge::generate_instance(&seed_bytes, &difficulty)?;

    match output_file {
        Some(path) => {
            let text = format_instance(&challenge, InstanceFormat::for_path(&path));
            fs::write(&path, text)
                .map_err(|e| anyhow!("Failed to write instance file {}: {}", path.display(), e))?;
            info!(
                event = "instance_generated",
                file = %path.display(),
                capacity = challenge.max_capacity,
            );
        }
        None => print!("{}", format_instance(&challenge, InstanceFormat::Standard)),
    }
    Ok(())
}

pub fn evaluate(instance_path: PathBuf, sequence: String) -> Result<()> {
    let challenge = read_instance(&instance_path)?;
    let solution = load_sequence(&sequence)?;
    let switches = challenge.evaluate_switches(&solution)?;

    let data = Problem::load(&challenge)?;
    let mut ktns = Ktns::new(&data);
    ktns.evaluate(&data, &solution.sequence, None);

    println!(
        "{}",
        json!({ "switches": switches, "zero_blocks": ktns.zero_blocks() })
    );
    Ok(())
}

fn load_hyperparameters(hyperparameters: Option<&str>) -> Result<Map<String, Value>> {
    let Some(hyperparameters) = hyperparameters else {
        return Ok(Map::new());
    };
    let text = if hyperparameters.ends_with(".json") {
        fs::read_to_string(hyperparameters)
            .map_err(|e| anyhow!("Failed to read hyperparameters file {}: {}", hyperparameters, e))?
    } else {
        hyperparameters.to_string()
    };
    match serde_json::from_str::<Value>(&text)
        .map_err(|e| anyhow!("Failed to parse hyperparameters: {}", e))?
    {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("Hyperparameters must be a json object, found {}", other)),
    }
}
