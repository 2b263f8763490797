use anyhow::Result;
use serde_json::{Map, Value};
mod genetic;
mod individual;
mod ktns;
mod local_search;
mod params;
mod population;
mod problem;
mod solver;
pub use genetic::{crossover_ox, Genetic, RunStats};
pub use individual::Individual;
pub use ktns::Ktns;
pub use local_search::{LocalSearch, Neighborhood};
pub use params::Params;
pub use population::Population;
pub use problem::Problem;
pub use solver::{run, RunResult, Solver};
use toolswitch_challenges::tool_switching::*;

pub fn solve_challenge(
    challenge: &Challenge,
    save_solution: &dyn Fn(&Solution) -> Result<()>,
    hyperparameters: &Option<Map<String, Value>>,
) -> Result<()> {
    let result = Solver::solve_challenge_instance(challenge, hyperparameters, Some(save_solution))?;
    save_solution(&Solution {
        sequence: result.sequence,
    })
}
