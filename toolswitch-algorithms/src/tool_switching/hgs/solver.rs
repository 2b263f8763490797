use super::genetic::Genetic;
use super::params::Params;
use super::problem::Problem;
use anyhow::{anyhow, Result};
use rand::{rngs::SmallRng, SeedableRng};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use toolswitch_challenges::tool_switching::*;
use tracing::info;

#[derive(Clone, Debug)]
pub struct RunResult {
    pub sequence: Vec<usize>,
    pub switches: u32,
    pub zero_blocks: f64,
    pub iterations: usize,
    pub diversifications: usize,
    pub improves_primary: usize,
    pub improves_secondary: usize,
    pub elapsed: Duration,
}

/// One full search on `data`, stopping after `max_it_noimprov` iterations
/// without a new best.
pub fn run(data: &Problem, params: &Params, max_it_noimprov: usize) -> Result<RunResult> {
    Solver::solve(data, params, max_it_noimprov, &Instant::now(), None)
}

pub struct Solver;

impl Solver {
    fn solve(
        data: &Problem,
        params: &Params,
        max_it_noimprov: usize,
        t0: &Instant,
        save_solution: Option<&dyn Fn(&Solution) -> Result<()>>,
    ) -> Result<RunResult> {
        data.validate()?;
        params.validate()?;
        let mut rng = SmallRng::seed_from_u64(params.seed);
        let mut ga = Genetic::new(data, *params);
        let stats = ga.run(&mut rng, t0, max_it_noimprov, save_solution)?;

        let best = ga
            .population
            .best()
            .ok_or_else(|| anyhow!("Search ended with an empty population"))?;
        let result = RunResult {
            sequence: best.sequence.clone(),
            switches: best.switches,
            zero_blocks: best.zero_blocks,
            iterations: stats.iterations,
            diversifications: stats.diversifications,
            improves_primary: ga.ls.improves_primary,
            improves_secondary: ga.ls.improves_secondary,
            elapsed: t0.elapsed(),
        };
        info!(
            event = "solved",
            switches = result.switches,
            zero_blocks = result.zero_blocks,
            iterations = result.iterations,
            improves_primary = result.improves_primary,
            improves_secondary = result.improves_secondary,
            elapsed_sec = result.elapsed.as_secs_f64(),
        );
        Ok(result)
    }

    pub fn solve_challenge_instance(
        challenge: &Challenge,
        hyperparameters: &Option<Map<String, Value>>,
        save_solution: Option<&dyn Fn(&Solution) -> Result<()>>,
    ) -> Result<RunResult> {
        let t0 = Instant::now();
        let data = Problem::load(challenge)?;
        let params = Params::initialize(hyperparameters)?;
        let max_it_noimprov = params.max_it_noimprov_for(data.num_jobs);
        Self::solve(&data, &params, max_it_noimprov, &t0, save_solution)
    }
}
