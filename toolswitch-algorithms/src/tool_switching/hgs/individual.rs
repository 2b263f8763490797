use super::ktns::Ktns;
use super::problem::Problem;
use rand::{rngs::SmallRng, seq::SliceRandom};

const NO_SUCC: usize = usize::MAX;

#[derive(Clone, Debug)]
pub struct Individual {
    pub sequence: Vec<usize>,
    pub switches: u32,
    pub zero_blocks: f64,
    pub age: usize,
    pub div_rank: f64,
    pub fit_rank: f64,
    pub biased_fitness: f64,
    pub fitness_computed: bool,
    /// Sorted ascending `(distance, slot)`, one entry per other population member.
    pub closest: Vec<(f64, usize)>,
    /// `succ[job]`: job sequenced right after `job`, `NO_SUCC` for the last one.
    succ: Vec<usize>,
}

impl Individual {
    pub fn new_from_sequence(data: &Problem, ktns: &mut Ktns, sequence: Vec<usize>) -> Self {
        let mut indiv = Self {
            sequence,
            switches: 0,
            zero_blocks: 0.0,
            age: 0,
            div_rank: 0.0,
            fit_rank: 0.0,
            biased_fitness: 0.0,
            fitness_computed: false,
            closest: Vec::new(),
            succ: Vec::new(),
        };
        indiv.evaluate(data, ktns);
        indiv
    }

    pub fn new_random(data: &Problem, ktns: &mut Ktns, rng: &mut SmallRng) -> Self {
        let mut sequence: Vec<usize> = (0..data.num_jobs).collect();
        sequence.shuffle(rng);
        Self::new_from_sequence(data, ktns, sequence)
    }

    /// Refreshes both cached costs from the current sequence.
    pub fn evaluate(&mut self, data: &Problem, ktns: &mut Ktns) {
        self.switches = ktns.evaluate(data, &self.sequence, None);
        self.zero_blocks = ktns.zero_blocks();
    }

    /// Overwrites `self` with `source`, starting a fresh life.
    pub fn copy_from(&mut self, source: &Individual) {
        self.sequence.clone_from(&source.sequence);
        self.switches = source.switches;
        self.zero_blocks = source.zero_blocks;
        self.closest.clone_from(&source.closest);
        self.fitness_computed = source.fitness_computed;
        self.age = 0;
    }

    pub fn refresh_successors(&mut self) {
        self.succ.clear();
        self.succ.resize(self.sequence.len(), NO_SUCC);
        for pair in self.sequence.windows(2) {
            self.succ[pair[0]] = pair[1];
        }
    }

    /// Number of adjacencies of `other` that `self` has in neither direction.
    /// Successors of `self` must be fresh.
    pub fn distance(&self, other: &Individual) -> usize {
        debug_assert_eq!(self.succ.len(), self.sequence.len());
        other
            .sequence
            .windows(2)
            .filter(|pair| self.succ[pair[0]] != pair[1] && self.succ[pair[1]] != pair[0])
            .count()
    }

    pub fn add_close(&mut self, slot: usize, distance: f64) {
        let pos = self.closest.partition_point(|&(d, _)| d <= distance);
        self.closest.insert(pos, (distance, slot));
    }

    pub fn remove_close(&mut self, slot: usize) {
        if let Some(pos) = self.closest.iter().position(|&(_, s)| s == slot) {
            self.closest.remove(pos);
        }
    }

    /// Mean distance to the `n` nearest peers (fewer when the population is small).
    pub fn avg_closest(&self, n: usize) -> f64 {
        assert!(
            !self.closest.is_empty(),
            "average distance requested for an individual without peers"
        );
        let k = n.min(self.closest.len());
        self.closest[..k].iter().map(|&(d, _)| d).sum::<f64>() / k as f64
    }

    pub fn is_permutation(&self, num_jobs: usize) -> bool {
        if self.sequence.len() != num_jobs {
            return false;
        }
        let mut seen = vec![false; num_jobs];
        self.sequence
            .iter()
            .all(|&job| job < num_jobs && !std::mem::replace(&mut seen[job], true))
    }
}
