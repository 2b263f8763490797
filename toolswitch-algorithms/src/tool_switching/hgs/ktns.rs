use super::problem::Problem;

/// Keep Tool Needed Soonest. Scratch tables are sized once per instance and
/// overwritten by every call to [`Ktns::evaluate`].
pub struct Ktns {
    num_jobs: usize,
    num_tools: usize,
    max_capacity: usize,
    /// `next_need[tool * num_jobs + pos]`: first position >= pos needing `tool`,
    /// `num_jobs` when none does.
    next_need: Vec<usize>,
    loaded: Vec<bool>,
    /// `magazine[pos * num_tools + tool]`: magazine content while processing `pos`.
    magazine: Vec<bool>,
}

impl Ktns {
    pub fn new(data: &Problem) -> Self {
        Ktns {
            num_jobs: data.num_jobs,
            num_tools: data.num_tools,
            max_capacity: data.max_capacity,
            next_need: vec![0; data.num_tools * data.num_jobs],
            loaded: vec![false; data.num_tools],
            magazine: vec![false; data.num_jobs * data.num_tools],
        }
    }

    /// Minimum number of tool switches to process `sequence`. The job at
    /// `skip`, if any, is treated as needing no tool. The magazine plan stays
    /// readable through [`Ktns::is_loaded`] until the next call.
    pub fn evaluate(&mut self, data: &Problem, sequence: &[usize], skip: Option<usize>) -> u32 {
        let nj = self.num_jobs;
        let nt = self.num_tools;
        debug_assert_eq!(sequence.len(), nj);

        for pos in (0..nj).rev() {
            let job = sequence[pos];
            let active = skip != Some(pos);
            for tool in 0..nt {
                let idx = tool * nj + pos;
                self.next_need[idx] = if active && data.needs(job, tool) {
                    pos
                } else if pos + 1 < nj {
                    self.next_need[idx + 1]
                } else {
                    nj
                };
            }
        }

        let mut count = 0;
        for tool in 0..nt {
            let needed = self.next_need[tool * nj] == 0;
            self.loaded[tool] = needed;
            if needed {
                count += 1;
            }
        }
        while count < self.max_capacity {
            let mut best = None;
            let mut soonest = usize::MAX;
            for tool in 0..nt {
                if !self.loaded[tool] && self.next_need[tool * nj] < soonest {
                    soonest = self.next_need[tool * nj];
                    best = Some(tool);
                }
            }
            match best {
                Some(tool) => {
                    self.loaded[tool] = true;
                    count += 1;
                }
                None => break,
            }
        }
        self.magazine[..nt].copy_from_slice(&self.loaded);

        let mut switches = 0;
        for pos in 1..nj {
            for tool in 0..nt {
                if !self.loaded[tool] && self.next_need[tool * nj + pos] == pos {
                    self.loaded[tool] = true;
                    count += 1;
                }
            }
            while count > self.max_capacity {
                let mut victim = None;
                let mut farthest = pos;
                for tool in 0..nt {
                    if self.loaded[tool] && self.next_need[tool * nj + pos] > farthest {
                        farthest = self.next_need[tool * nj + pos];
                        victim = Some(tool);
                    }
                }
                let Some(tool) = victim else {
                    unreachable!(
                        "job {} at position {} needs more than {} tools",
                        sequence[pos], pos, self.max_capacity
                    );
                };
                self.loaded[tool] = false;
                count -= 1;
                switches += 1;
            }
            self.magazine[pos * nt..(pos + 1) * nt].copy_from_slice(&self.loaded);
        }
        switches
    }

    #[inline(always)]
    pub fn is_loaded(&self, pos: usize, tool: usize) -> bool {
        self.magazine[pos * self.num_tools + tool]
    }

    /// Smoothness of the last evaluated plan: for every tool, the square roots
    /// of the lengths of the gaps during which it is out of the magazine
    /// after having been in it.
    pub fn zero_blocks(&self) -> f64 {
        let mut total = 0.0;
        for tool in 0..self.num_tools {
            let mut block = 0usize;
            for pos in 1..self.num_jobs {
                let now = self.is_loaded(pos, tool);
                if (self.is_loaded(pos - 1, tool) || block > 0) && !now {
                    block += 1;
                }
                if block > 0 && now {
                    total += (block as f64).sqrt();
                    block = 0;
                }
            }
            total += (block as f64).sqrt();
        }
        total
    }
}
