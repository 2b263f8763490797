use super::individual::Individual;
use super::ktns::Ktns;
use super::problem::Problem;
use rand::{rngs::SmallRng, seq::SliceRandom};
use tracing::trace;

/// Minimum smoothness gain for a move that keeps the switch count.
const EPSILON: f64 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Neighborhood {
    /// Reverse the segment `i..=j`.
    TwoOpt,
    /// Move the job at `i` to position `j`.
    Relocate,
    /// Exchange the jobs at `i` and `j`.
    Swap,
}

impl Neighborhood {
    /// Order in which a round tries the neighborhoods.
    pub const ROUND: [Neighborhood; 3] = [Neighborhood::TwoOpt, Neighborhood::Relocate, Neighborhood::Swap];

    #[inline]
    pub fn apply(self, sequence: &mut [usize], i: usize, j: usize) {
        match self {
            Neighborhood::TwoOpt => sequence[i..=j].reverse(),
            Neighborhood::Relocate => sequence[i..=j].rotate_left(1),
            Neighborhood::Swap => sequence.swap(i, j),
        }
    }

    #[inline]
    pub fn revert(self, sequence: &mut [usize], i: usize, j: usize) {
        match self {
            Neighborhood::TwoOpt => sequence[i..=j].reverse(),
            Neighborhood::Relocate => sequence[i..=j].rotate_right(1),
            Neighborhood::Swap => sequence.swap(i, j),
        }
    }
}

pub struct LocalSearch<'a> {
    pub data: &'a Problem,
    /// Every position pair `i < j`, reshuffled at the start of each round.
    pairs: Vec<(usize, usize)>,
    pub improves_primary: usize,
    pub improves_secondary: usize,
}

impl<'a> LocalSearch<'a> {
    pub fn new(data: &'a Problem) -> Self {
        let n = data.num_jobs;
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in i + 1..n {
                pairs.push((i, j));
            }
        }
        Self {
            data,
            pairs,
            improves_primary: 0,
            improves_secondary: 0,
        }
    }

    /// Education: improve `indiv` in place until no neighborhood helps.
    /// Its cached costs must be up to date on entry and are kept so.
    pub fn run(&mut self, indiv: &mut Individual, ktns: &mut Ktns, rng: &mut SmallRng) {
        loop {
            self.pairs.shuffle(rng);
            let improved = Neighborhood::ROUND
                .into_iter()
                .any(|neighborhood| self.search(neighborhood, indiv, ktns));
            if !improved {
                break;
            }
        }
        debug_assert!(indiv.is_permutation(self.data.num_jobs));
    }

    /// One first-improvement pass over every pair. Returns whether any move was kept.
    pub fn search(&mut self, neighborhood: Neighborhood, indiv: &mut Individual, ktns: &mut Ktns) -> bool {
        let mut improved = false;
        for &(i, j) in self.pairs.iter() {
            neighborhood.apply(&mut indiv.sequence, i, j);
            let switches = ktns.evaluate(self.data, &indiv.sequence, None);
            if switches <= indiv.switches {
                let zero_blocks = ktns.zero_blocks();
                if switches < indiv.switches {
                    self.improves_primary += 1;
                } else if zero_blocks < indiv.zero_blocks - EPSILON {
                    self.improves_secondary += 1;
                } else {
                    neighborhood.revert(&mut indiv.sequence, i, j);
                    continue;
                }
                trace!(
                    event = "move_accepted",
                    neighborhood = ?neighborhood,
                    i,
                    j,
                    switches,
                    zero_blocks,
                );
                indiv.switches = switches;
                indiv.zero_blocks = zero_blocks;
                improved = true;
                continue;
            }
            neighborhood.revert(&mut indiv.sequence, i, j);
        }
        improved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use toolswitch_challenges::tool_switching::{Challenge, Difficulty};

    fn random_problem(seed: u8, num_jobs: usize, num_tools: usize) -> Problem {
        let difficulty = Difficulty { num_jobs, num_tools };
        let challenge = Challenge::generate_instance(&[seed; 32], &difficulty).unwrap();
        Problem::load(&challenge).unwrap()
    }

    #[test]
    fn test_moves_revert_exactly() {
        let original: Vec<usize> = (0..8).collect();
        for neighborhood in Neighborhood::ROUND {
            for i in 0..8 {
                for j in i + 1..8 {
                    let mut sequence = original.clone();
                    neighborhood.apply(&mut sequence, i, j);
                    neighborhood.revert(&mut sequence, i, j);
                    assert_eq!(sequence, original);
                }
            }
        }
        let mut sequence = original.clone();
        Neighborhood::Relocate.apply(&mut sequence, 1, 4);
        assert_eq!(sequence, vec![0, 2, 3, 4, 1, 5, 6, 7]);
    }

    #[test]
    fn test_education_never_worsens_and_ends_in_local_optimum() {
        for seed in 0..5u8 {
            let data = random_problem(seed, 10, 8);
            let mut ktns = Ktns::new(&data);
            let mut rng = SmallRng::seed_from_u64(seed as u64);
            let mut ls = LocalSearch::new(&data);

            let mut indiv = Individual::new_random(&data, &mut ktns, &mut rng);
            let before = (indiv.switches, indiv.zero_blocks);
            ls.run(&mut indiv, &mut ktns, &mut rng);

            assert!(indiv.is_permutation(data.num_jobs));
            assert!(
                indiv.switches < before.0
                    || (indiv.switches == before.0 && indiv.zero_blocks <= before.1)
            );
            // cached costs match the sequence
            assert_eq!(indiv.switches, ktns.evaluate(&data, &indiv.sequence, None));
            assert!((indiv.zero_blocks - ktns.zero_blocks()).abs() < 1e-9);

            // no single move improves any more
            for neighborhood in Neighborhood::ROUND {
                for i in 0..data.num_jobs {
                    for j in i + 1..data.num_jobs {
                        let mut sequence = indiv.sequence.clone();
                        neighborhood.apply(&mut sequence, i, j);
                        let switches = ktns.evaluate(&data, &sequence, None);
                        assert!(switches >= indiv.switches);
                        if switches == indiv.switches {
                            assert!(ktns.zero_blocks() >= indiv.zero_blocks - EPSILON);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_counts_improvements() {
        let data = random_problem(11, 12, 10);
        let mut ktns = Ktns::new(&data);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut ls = LocalSearch::new(&data);
        let mut total_gain = 0;
        for _ in 0..5 {
            let mut indiv = Individual::new_random(&data, &mut ktns, &mut rng);
            let before = indiv.switches;
            ls.run(&mut indiv, &mut ktns, &mut rng);
            total_gain += before - indiv.switches;
        }
        assert!(ls.improves_primary >= 1 || total_gain == 0);
        assert!(ls.improves_primary <= total_gain as usize);
    }
}
