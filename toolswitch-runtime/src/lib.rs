use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use toolswitch_challenges::tool_switching::Solution;

pub mod discovery;
pub mod instance;

pub use discovery::{discover_instances, instance_prefixes};
pub use instance::{format_instance, parse_instance, read_instance, InstanceFormat};

/// Appends `cost,seconds` to the result file, creating it if needed.
pub fn append_result(path: &Path, cost: u32, seconds: f64) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open result file {}", path.display()))?;
    writeln!(file, "{},{}", cost, seconds)
        .with_context(|| format!("Failed to write result file {}", path.display()))
}

/// Seed 0 asks for a seed taken from the clock.
pub fn resolve_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

/// Sequence given inline, in a `.json` file, or on stdin with `-`; either a
/// bare array of jobs or a `{"sequence": [...]}` object.
pub fn load_sequence(arg: &str) -> Result<Solution> {
    let text = if arg == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read sequence from stdin")?;
        buffer
    } else if arg.ends_with(".json") {
        fs::read_to_string(arg).with_context(|| format!("Failed to read sequence file {}", arg))?
    } else {
        arg.to_string()
    };

    match serde_json::from_str::<Value>(&text).context("Failed to parse sequence")? {
        Value::Array(jobs) => {
            let sequence = jobs
                .iter()
                .map(|v| {
                    v.as_u64()
                        .map(|job| job as usize)
                        .ok_or_else(|| anyhow!("Invalid job {} in sequence", v))
                })
                .collect::<Result<Vec<usize>>>()?;
            Ok(Solution { sequence })
        }
        Value::Object(map) => Solution::try_from(map).context("Failed to parse sequence"),
        other => Err(anyhow!("Expected a job array, found {}", other)),
    }
}
