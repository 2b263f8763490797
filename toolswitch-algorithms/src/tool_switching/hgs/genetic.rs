use super::individual::Individual;
use super::ktns::Ktns;
use super::local_search::LocalSearch;
use super::params::Params;
use super::population::Population;
use super::problem::Problem;
use anyhow::Result;
use rand::{rngs::SmallRng, Rng};
use std::time::{Duration, Instant};
use toolswitch_challenges::tool_switching::Solution;
use tracing::info;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub iterations: usize,
    pub diversifications: usize,
    /// The population refused an individual and the search stopped early.
    pub aborted: bool,
}

pub struct Genetic<'a> {
    pub data: &'a Problem,
    pub params: Params,
    pub population: Population<'a>,
    pub ls: LocalSearch<'a>,
    ktns: Ktns,
    offspring: Individual,
    used: Vec<bool>,
}

impl<'a> Genetic<'a> {
    pub fn new(data: &'a Problem, params: Params) -> Self {
        let mut ktns = Ktns::new(data);
        let offspring = Individual::new_from_sequence(data, &mut ktns, (0..data.num_jobs).collect());
        Self {
            data,
            params,
            population: Population::new(data, params),
            ls: LocalSearch::new(data),
            ktns,
            offspring,
            used: vec![false; data.num_jobs],
        }
    }

    /// Fill the population with educated random individuals. Returns false
    /// if the population refused one.
    pub fn initialize_population(&mut self, rng: &mut SmallRng) -> bool {
        for _ in 0..self.params.population_size {
            let mut indiv = Individual::new_random(self.data, &mut self.ktns, rng);
            self.ls.run(&mut indiv, &mut self.ktns, rng);
            if self.population.add(&indiv).is_none() {
                return false;
            }
        }
        true
    }

    /// Build the offspring of two members (given by slot) with an ordered
    /// crossover and evaluate its switches.
    pub fn crossover(&mut self, parent_a: usize, parent_b: usize, rng: &mut SmallRng) {
        let n = self.data.num_jobs;
        let mut begin = rng.gen_range(0..n);
        let mut end = rng.gen_range(0..n);
        while end == begin && n > 1 {
            end = rng.gen_range(0..n);
        }
        if begin > end {
            std::mem::swap(&mut begin, &mut end);
        }

        crossover_ox(
            &self.population.get(parent_a).sequence,
            &self.population.get(parent_b).sequence,
            begin,
            end,
            &mut self.used,
            &mut self.offspring.sequence,
        );
        self.offspring.switches = self.ktns.evaluate(self.data, &self.offspring.sequence, None);
    }

    pub fn run(
        &mut self,
        rng: &mut SmallRng,
        t0: &Instant,
        max_it_noimprov: usize,
        save_solution: Option<&dyn Fn(&Solution) -> Result<()>>,
    ) -> Result<RunStats> {
        let mut stats = RunStats::default();

        info!(event = "phase_start", phase = "initial_population", size = self.params.population_size);
        if !self.initialize_population(rng) {
            stats.aborted = true;
            return Ok(stats);
        }
        if let (Some(best), Some(save)) = (self.population.best(), save_solution) {
            save(&Solution { sequence: best.sequence.clone() })?;
        }

        info!(event = "phase_start", phase = "genetic", max_it_noimprov);
        // unrepresentable limits are rejected by `Params::validate`
        let time_limit = self
            .params
            .time_limit_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
        let mut it_noimprov: usize = 1;
        let mut it_diversify: usize = 1;
        while it_noimprov < max_it_noimprov {
            if time_limit.map_or(false, |limit| t0.elapsed() >= limit) {
                info!(event = "time_limit_reached", elapsed_sec = t0.elapsed().as_secs_f64());
                break;
            }

            // Generates a new individual by crossover and education
            let parent_a = self.population.binary_tournament(rng);
            let parent_b = self.population.binary_tournament(rng);
            self.crossover(parent_a, parent_b, rng);
            self.offspring.zero_blocks = self.ktns.zero_blocks();
            self.ls.run(&mut self.offspring, &mut self.ktns, rng);

            let rank = match self.population.add(&self.offspring) {
                Some(rank) => rank,
                None => {
                    stats.aborted = true;
                    break;
                }
            };
            stats.iterations += 1;

            if rank == 0 {
                it_noimprov = 1;
                it_diversify = 1;
                info!(
                    event = "new_best",
                    iteration = stats.iterations,
                    switches = self.offspring.switches,
                    zero_blocks = self.offspring.zero_blocks,
                    elapsed_sec = t0.elapsed().as_secs_f64(),
                );
                if let Some(save) = save_solution {
                    save(&Solution { sequence: self.offspring.sequence.clone() })?;
                }
            } else {
                it_noimprov += 1;
            }

            // the counter is at least 2 here, so max_diversify 1 diversifies every iteration
            it_diversify += 1;
            if it_diversify >= self.params.max_diversify {
                if !self.population.diversify(&mut self.ls, &mut self.ktns, rng) {
                    stats.aborted = true;
                    break;
                }
                it_diversify = 1;
                stats.diversifications += 1;
            }

            if stats.iterations % self.params.nb_it_traces.max(1) == 0 {
                self.population.trace_status(stats.iterations, it_noimprov, t0.elapsed().as_secs_f64());
            }
        }

        info!(
            event = "phase_end",
            phase = "genetic",
            iterations = stats.iterations,
            diversifications = stats.diversifications,
            aborted = stats.aborted,
            elapsed_sec = t0.elapsed().as_secs_f64(),
        );
        Ok(stats)
    }
}

/// Ordered crossover: the child keeps `parent_a[begin..=end]` in place and the
/// remaining positions, from `end + 1` wrapping around to `begin - 1`, take
/// the unused jobs in the cyclic order of `parent_b` starting after `end`.
pub fn crossover_ox(
    parent_a: &[usize],
    parent_b: &[usize],
    begin: usize,
    end: usize,
    used: &mut [bool],
    child: &mut [usize],
) {
    let n = parent_a.len();
    debug_assert!(begin <= end && end < n);
    used.fill(false);
    for pos in begin..=end {
        child[pos] = parent_a[pos];
        used[parent_a[pos]] = true;
    }

    let mut write = (end + 1) % n;
    for offset in 1..=n {
        let job = parent_b[(end + offset) % n];
        if !used[job] {
            used[job] = true;
            child[write] = job;
            write = (write + 1) % n;
        }
    }
}
