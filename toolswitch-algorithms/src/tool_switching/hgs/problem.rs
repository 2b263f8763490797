use anyhow::{bail, Result};
use toolswitch_challenges::tool_switching::Challenge;
use tracing::debug;

pub struct Problem {
    pub num_jobs: usize,
    pub num_tools: usize,
    pub max_capacity: usize,
    /// Row-major `num_jobs x num_tools` incidence.
    pub jobs_tools: Vec<bool>,
}

impl Problem {
    pub fn load(challenge: &Challenge) -> Result<Self> {
        challenge.validate()?;
        debug!(
            event = "instance_loaded",
            jobs = challenge.num_jobs,
            tools = challenge.num_tools,
            capacity = challenge.max_capacity,
        );

        let mut jobs_tools = Vec::with_capacity(challenge.num_jobs * challenge.num_tools);
        for row in &challenge.jobs_tools {
            jobs_tools.extend_from_slice(row);
        }
        Ok(Problem {
            num_jobs: challenge.num_jobs,
            num_tools: challenge.num_tools,
            max_capacity: challenge.max_capacity,
            jobs_tools,
        })
    }

    /// Same checks as `Challenge::validate`, for problems built by hand.
    pub fn validate(&self) -> Result<()> {
        if self.num_jobs == 0 {
            bail!("Instance has no jobs");
        }
        if self.max_capacity > self.num_tools {
            bail!(
                "Magazine capacity ({}) exceeds number of tools ({})",
                self.max_capacity,
                self.num_tools
            );
        }
        if self.jobs_tools.len() != self.num_jobs * self.num_tools {
            bail!(
                "Incidence matrix has {} entries, expected {} jobs x {} tools",
                self.jobs_tools.len(),
                self.num_jobs,
                self.num_tools
            );
        }
        for (job, row) in self.jobs_tools.chunks(self.num_tools.max(1)).enumerate() {
            let required = row.iter().filter(|&&b| b).count();
            if required > self.max_capacity {
                bail!(
                    "Job {} requires {} tools but the magazine holds {}",
                    job,
                    required,
                    self.max_capacity
                );
            }
        }
        Ok(())
    }

    #[inline(always)]
    pub fn needs(&self, job: usize, tool: usize) -> bool {
        debug_assert!(job < self.num_jobs && tool < self.num_tools);
        self.jobs_tools[job * self.num_tools + tool]
    }
}
