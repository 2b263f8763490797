use anyhow::{anyhow, Result};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{from_value, Map, Value};

#[derive(Serialize, Deserialize, Debug, Copy, Clone)]
pub struct Difficulty {
    pub num_jobs: usize,
    pub num_tools: usize,
}

impl From<Vec<i32>> for Difficulty {
    fn from(arr: Vec<i32>) -> Self {
        Self {
            num_jobs: arr[0] as usize,
            num_tools: arr[1] as usize,
        }
    }
}

impl Into<Vec<i32>> for Difficulty {
    fn into(self) -> Vec<i32> {
        vec![self.num_jobs as i32, self.num_tools as i32]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub sequence: Vec<usize>,
}

impl Solution {
    pub fn new() -> Self {
        Self {
            sequence: Vec::new(),
        }
    }
}

impl TryFrom<Map<String, Value>> for Solution {
    type Error = serde_json::Error;

    fn try_from(v: Map<String, Value>) -> Result<Self, Self::Error> {
        from_value(Value::Object(v))
    }
}

/// A tool switching instance: `jobs_tools[job][tool]` is true when `job`
/// cannot be processed unless `tool` sits in the magazine.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Challenge {
    pub seed: [u8; 32],
    pub num_jobs: usize,
    pub num_tools: usize,
    pub max_capacity: usize,
    pub jobs_tools: Vec<Vec<bool>>,
}

impl Challenge {
    pub fn new(
        num_jobs: usize,
        num_tools: usize,
        max_capacity: usize,
        jobs_tools: Vec<Vec<bool>>,
    ) -> Result<Self> {
        let challenge = Challenge {
            seed: [0; 32],
            num_jobs,
            num_tools,
            max_capacity,
            jobs_tools,
        };
        challenge.validate()?;
        Ok(challenge)
    }

    pub fn generate_instance(seed: &[u8; 32], difficulty: &Difficulty) -> Result<Self> {
        if difficulty.num_jobs == 0 {
            return Err(anyhow!("Difficulty must ask for at least one job"));
        }
        if difficulty.num_tools < 2 {
            return Err(anyhow!("Difficulty must ask for at least two tools"));
        }
        let mut rng = SmallRng::from_seed(seed.clone());
        let num_tools = difficulty.num_tools;

        // Magazine holds between a quarter and a half of the tool set
        let lo = (num_tools / 4).max(1);
        let hi = (num_tools / 2).max(lo);
        let max_capacity = rng.gen_range(lo..=hi);

        let mut tools: Vec<usize> = (0..num_tools).collect();
        let jobs_tools = (0..difficulty.num_jobs)
            .map(|_| {
                let size = rng.gen_range(1..=max_capacity);
                // partial Fisher-Yates: the first `size` slots are a uniform sample
                for k in 0..size {
                    let j = rng.gen_range(k..num_tools);
                    tools.swap(k, j);
                }
                let mut row = vec![false; num_tools];
                for &t in &tools[..size] {
                    row[t] = true;
                }
                row
            })
            .collect();

        let challenge = Challenge {
            seed: seed.clone(),
            num_jobs: difficulty.num_jobs,
            num_tools,
            max_capacity,
            jobs_tools,
        };
        challenge.validate()?;
        Ok(challenge)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_jobs == 0 {
            return Err(anyhow!("Instance has no jobs"));
        }
        if self.max_capacity > self.num_tools {
            return Err(anyhow!(
                "Magazine capacity ({}) exceeds number of tools ({})",
                self.max_capacity,
                self.num_tools
            ));
        }
        if self.jobs_tools.len() != self.num_jobs {
            return Err(anyhow!(
                "Incidence matrix has {} rows, expected one per job ({})",
                self.jobs_tools.len(),
                self.num_jobs
            ));
        }
        for (job, row) in self.jobs_tools.iter().enumerate() {
            if row.len() != self.num_tools {
                return Err(anyhow!(
                    "Job {} has {} tool entries, expected {}",
                    job,
                    row.len(),
                    self.num_tools
                ));
            }
            let required = row.iter().filter(|&&b| b).count();
            if required > self.max_capacity {
                return Err(anyhow!(
                    "Job {} requires {} tools but the magazine holds {}",
                    job,
                    required,
                    self.max_capacity
                ));
            }
        }
        Ok(())
    }

    pub fn needs(&self, job: usize, tool: usize) -> bool {
        self.jobs_tools[job][tool]
    }

    pub fn verify_sequence(&self, sequence: &[usize]) -> Result<()> {
        if sequence.len() != self.num_jobs {
            return Err(anyhow!(
                "Sequence has {} jobs, expected {}",
                sequence.len(),
                self.num_jobs
            ));
        }
        let mut seen = vec![false; self.num_jobs];
        for &job in sequence {
            if job >= self.num_jobs {
                return Err(anyhow!("Job {} is out of range", job));
            }
            if seen[job] {
                return Err(anyhow!("Job {} is sequenced more than once", job));
            }
            seen[job] = true;
        }
        Ok(())
    }

    /// Minimum number of tool switches for the solution's job order, computed
    /// by keeping the tools needed soonest.
    pub fn evaluate_switches(&self, solution: &Solution) -> Result<u32> {
        self.verify_sequence(&solution.sequence)?;
        let seq = &solution.sequence;
        let n = self.num_jobs;
        let next_use = |tool: usize, from: usize| -> usize {
            (from..n)
                .find(|&pos| self.needs(seq[pos], tool))
                .unwrap_or(n)
        };

        let mut loaded = vec![false; self.num_tools];
        let mut count = 0;
        for tool in 0..self.num_tools {
            if self.needs(seq[0], tool) {
                loaded[tool] = true;
                count += 1;
            }
        }
        while count < self.max_capacity {
            let tool = (0..self.num_tools)
                .filter(|&t| !loaded[t])
                .min_by_key(|&t| next_use(t, 0))
                .ok_or_else(|| anyhow!("No tool left to fill the magazine"))?;
            loaded[tool] = true;
            count += 1;
        }

        let mut switches = 0;
        for pos in 1..n {
            for tool in 0..self.num_tools {
                if !loaded[tool] && self.needs(seq[pos], tool) {
                    loaded[tool] = true;
                    count += 1;
                }
            }
            while count > self.max_capacity {
                let mut victim = None;
                let mut farthest = pos;
                for tool in 0..self.num_tools {
                    if loaded[tool] {
                        let next = next_use(tool, pos);
                        if next > farthest {
                            farthest = next;
                            victim = Some(tool);
                        }
                    }
                }
                let tool = victim.ok_or_else(|| {
                    anyhow!("Job at position {} does not fit in the magazine", pos)
                })?;
                loaded[tool] = false;
                count -= 1;
                switches += 1;
            }
        }
        Ok(switches)
    }

    pub fn verify_solution(&self, solution: &Solution, max_switches: Option<u32>) -> Result<u32> {
        let switches = self.evaluate_switches(solution)?;
        match max_switches {
            Some(bound) if switches > bound => Err(anyhow!(
                "Solution needs {} switches, more than the allowed {}",
                switches,
                bound
            )),
            _ => Ok(switches),
        }
    }
}
