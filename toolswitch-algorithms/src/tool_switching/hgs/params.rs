use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Params {

    /// Seed of the run's random generator
    pub seed: u64,

    /// Number of individuals kept after each survivor selection
    /// Keep at least 2, the biased fitness compares ranks over n-1
    pub population_size: usize,

    /// Number of additional individuals before survivor selection triggers
    /// Keep of a similar magnitude as population_size, for example 2x
    pub max_population_size: usize,

    /// Number of elite individuals guaranteed to be preserved
    /// Recommended values are around population_size / 2
    pub number_elite: usize,

    /// Number of closest individuals to measure diversity
    /// Keep between 1 and 5
    pub number_close_individuals: usize,

    /// Number of iterations between two diversifications
    pub max_diversify: usize,

    /// Termination criterion: no improvement for this many iterations
    /// Defaults to min(20 * num_jobs, 1000) when unset
    pub max_it_noimprov: Option<usize>,

    /// Termination criterion: wall clock, checked between iterations
    pub time_limit_secs: Option<f64>,

    /// Number of iterations between population status traces
    /// Only impacts logging but not algorithm behavior
    pub nb_it_traces: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            seed: 0,
            population_size: 20,
            max_population_size: 40,
            number_elite: 10,
            number_close_individuals: 3,
            max_diversify: 1000,
            max_it_noimprov: None,
            time_limit_secs: None,
            nb_it_traces: 100,
        }
    }
}

impl Params {
    /// Start from the defaults, then override any user-provided key
    pub fn initialize(hyperparameters: &Option<Map<String, Value>>) -> Result<Self> {
        let mut merged_params = serde_json::to_value(Self::default())?;
        if let (Value::Object(ref mut obj), Some(map)) = (&mut merged_params, hyperparameters) {
            for (k, v) in map {
                obj.insert(k.clone(), v.clone());
            }
        }

        if let Value::Object(ref map) = merged_params {
            for (k, v) in map {
                debug!(event = "param", name = k.as_str(), value = %v);
            }
        }

        let params: Params = serde_json::from_value(merged_params)
            .map_err(|e| anyhow!("Invalid hyperparameters: {}", e))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            bail!(
                "population_size must be at least 2, got {}",
                self.population_size
            );
        }
        if self.number_close_individuals == 0 {
            bail!("number_close_individuals must be at least 1");
        }
        if self.max_diversify == 0 {
            bail!("max_diversify must be at least 1");
        }
        if let Some(limit) = self.time_limit_secs {
            if Duration::try_from_secs_f64(limit).is_err() {
                bail!("time_limit_secs must be a non-negative number of seconds, got {}", limit);
            }
        }
        Ok(())
    }

    pub fn max_it_noimprov_for(&self, num_jobs: usize) -> usize {
        self.max_it_noimprov
            .unwrap_or_else(|| (20 * num_jobs).min(1000))
    }
}
