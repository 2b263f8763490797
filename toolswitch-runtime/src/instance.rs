use anyhow::{anyhow, bail, Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use toolswitch_challenges::tool_switching::Challenge;

/// Both layouts store one row per tool and one column per job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceFormat {
    /// `num_jobs`, `num_tools` and `max_capacity` on three header lines.
    Standard,
    /// `num_jobs num_tools max_capacity` on a single header line.
    Yanasse,
}

impl InstanceFormat {
    /// Yanasse when any component of the path mentions it.
    pub fn for_path(path: &Path) -> Self {
        if path.to_string_lossy().contains("Yanasse") {
            InstanceFormat::Yanasse
        } else {
            InstanceFormat::Standard
        }
    }
}

pub fn read_instance(path: &Path) -> Result<Challenge> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read instance file {}", path.display()))?;
    parse_instance(&text, InstanceFormat::for_path(path))
        .with_context(|| format!("Invalid instance file {}", path.display()))
}

pub fn parse_instance(text: &str, format: InstanceFormat) -> Result<Challenge> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (num_jobs, num_tools, max_capacity) = match format {
        InstanceFormat::Standard => {
            let mut header = [0usize; 3];
            for (value, name) in header
                .iter_mut()
                .zip(["number of jobs", "number of tools", "magazine capacity"])
            {
                let (line_no, line) = lines
                    .next()
                    .ok_or_else(|| anyhow!("Missing header line: {}", name))?;
                *value = parse_count(line, line_no, name)?;
            }
            (header[0], header[1], header[2])
        }
        InstanceFormat::Yanasse => {
            let (line_no, line) = lines
                .next()
                .ok_or_else(|| anyhow!("Missing header line"))?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != 3 {
                bail!(
                    "Line {}: expected 'jobs tools capacity', found {} values",
                    line_no,
                    tokens.len()
                );
            }
            (
                parse_count(tokens[0], line_no, "number of jobs")?,
                parse_count(tokens[1], line_no, "number of tools")?,
                parse_count(tokens[2], line_no, "magazine capacity")?,
            )
        }
    };

    let mut jobs_tools = vec![vec![false; num_tools]; num_jobs];
    let mut tool = 0;
    for (line_no, line) in lines {
        if tool == num_tools {
            bail!("Line {}: more than {} tool rows", line_no, num_tools);
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != num_jobs {
            bail!(
                "Line {}: tool {} has {} entries, expected one per job ({})",
                line_no,
                tool,
                tokens.len(),
                num_jobs
            );
        }
        for (job, token) in tokens.into_iter().enumerate() {
            jobs_tools[job][tool] = match token {
                "0" => false,
                "1" => true,
                _ => bail!("Line {}: expected 0 or 1, found '{}'", line_no, token),
            };
        }
        tool += 1;
    }
    if tool != num_tools {
        bail!("Found {} tool rows, expected {}", tool, num_tools);
    }

    Challenge::new(num_jobs, num_tools, max_capacity, jobs_tools)
}

fn parse_count(token: &str, line_no: usize, name: &str) -> Result<usize> {
    token
        .parse::<usize>()
        .map_err(|_| anyhow!("Line {}: invalid {} '{}'", line_no, name, token))
}

pub fn format_instance(challenge: &Challenge, format: InstanceFormat) -> String {
    let mut out = String::new();
    match format {
        InstanceFormat::Standard => {
            let _ = writeln!(out, "{}", challenge.num_jobs);
            let _ = writeln!(out, "{}", challenge.num_tools);
            let _ = writeln!(out, "{}", challenge.max_capacity);
        }
        InstanceFormat::Yanasse => {
            let _ = writeln!(
                out,
                "{} {} {}",
                challenge.num_jobs, challenge.num_tools, challenge.max_capacity
            );
        }
    }
    for tool in 0..challenge.num_tools {
        let row: Vec<&str> = (0..challenge.num_jobs)
            .map(|job| if challenge.needs(job, tool) { "1" } else { "0" })
            .collect();
        let _ = writeln!(out, "{}", row.join(" "));
    }
    out
}
