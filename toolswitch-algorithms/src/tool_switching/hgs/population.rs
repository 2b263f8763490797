use super::individual::Individual;
use super::ktns::Ktns;
use super::local_search::LocalSearch;
use super::params::Params;
use super::problem::Problem;
use rand::{rngs::SmallRng, Rng};
use tracing::debug;

/// Penalty added to the biased fitness of clones before survivor selection.
const CLONE_PENALTY: f64 = 5.0;
const CLONE_DISTANCE: f64 = 0.001;
/// Share of the base population kept through a diversification.
const DIVERSIFY_KEEP: f64 = 0.3;

/// Members live in `slots`; proximity lists refer to them by slot id.
pub struct Population<'a> {
    pub data: &'a Problem,
    params: Params,
    slots: Vec<Option<Individual>>,
    free: Vec<usize>,
    order_cost: Vec<usize>, // slot ids sorted by increasing (switches, zero_blocks)
}

impl<'a> Population<'a> {
    pub fn new(data: &'a Problem, params: Params) -> Self {
        Self {
            data,
            params,
            slots: Vec::new(),
            free: Vec::new(),
            order_cost: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order_cost.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order_cost.is_empty()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> &Individual {
        match &self.slots[slot] {
            Some(indiv) => indiv,
            None => panic!("slot {} is vacant", slot),
        }
    }

    #[inline]
    fn get_mut(&mut self, slot: usize) -> &mut Individual {
        match &mut self.slots[slot] {
            Some(indiv) => indiv,
            None => panic!("slot {} is vacant", slot),
        }
    }

    pub fn at_rank(&self, rank: usize) -> &Individual {
        self.get(self.order_cost[rank])
    }

    /// Members from best to worst.
    pub fn iter(&self) -> impl Iterator<Item = &Individual> + '_ {
        self.order_cost.iter().map(move |&slot| self.get(slot))
    }

    pub fn best(&self) -> Option<&Individual> {
        self.order_cost.first().map(|&slot| self.get(slot))
    }

    /// Insert a copy of `indiv` and return its rank, culling back to
    /// `population_size` once the ceiling is exceeded. `None` means the
    /// individual is unusable and the search should stop.
    pub fn add(&mut self, indiv: &Individual) -> Option<usize> {
        if indiv.sequence.len() != self.data.num_jobs || !indiv.zero_blocks.is_finite() {
            return None;
        }
        debug_assert!(indiv.is_permutation(self.data.num_jobs));

        let mut copy = indiv.clone();
        copy.age = 0;
        copy.closest.clear();
        copy.refresh_successors();

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };

        for &other in &self.order_cost {
            let member = match &mut self.slots[other] {
                Some(member) => member,
                None => panic!("slot {} is vacant", other),
            };
            let d = copy.distance(member) as f64;
            member.add_close(slot, d);
            copy.add_close(other, d);
        }

        let rank = self.order_cost.partition_point(|&s| {
            let member = self.get(s);
            member.switches < copy.switches
                || (member.switches == copy.switches && member.zero_blocks <= copy.zero_blocks)
        });
        self.order_cost.insert(rank, slot);
        self.slots[slot] = Some(copy);

        if self.len() > self.params.population_size + self.params.max_population_size {
            self.survivors_selection();
        }
        debug_assert!(self.is_sorted());
        Some(rank)
    }

    /// Reduces the population to retain only population_size individuals
    pub fn survivors_selection(&mut self) {
        while self.len() > self.params.population_size {
            let rank = self.select_to_remove();
            self.remove_at_rank(rank);
        }
    }

    /// Remove the member at `rank` and erase it from every proximity list.
    pub fn remove_at_rank(&mut self, rank: usize) {
        let slot = self.order_cost.remove(rank);
        self.slots[slot] = None;
        self.free.push(slot);
        for &other in &self.order_cost {
            if let Some(member) = &mut self.slots[other] {
                member.remove_close(slot);
            }
        }
    }

    /// Ages every member, then returns the rank with the worst biased fitness,
    /// clones being penalized first. The best member is never penalized.
    /// Ties go to the worse ranked member.
    pub fn select_to_remove(&mut self) -> usize {
        for &slot in &self.order_cost {
            if let Some(member) = &mut self.slots[slot] {
                member.age += 1;
            }
        }
        self.update_biased_fitnesses();

        let n = self.len();
        let mut penalties = vec![0.0; n];
        for r in 1..n {
            let member = self.at_rank(r);
            if member.avg_closest(1) <= CLONE_DISTANCE {
                penalties[r] += CLONE_PENALTY;
            }
            let twins = self
                .iter()
                .filter(|other| {
                    other.switches == member.switches && other.zero_blocks == member.zero_blocks
                })
                .count();
            if twins > 1 {
                penalties[r] += CLONE_PENALTY;
            }
        }

        let mut worst_rank = 0;
        let mut worst_fit = f64::NEG_INFINITY;
        for r in 0..n {
            let slot = self.order_cost[r];
            let member = self.get_mut(slot);
            member.biased_fitness += penalties[r];
            if member.biased_fitness >= worst_fit {
                worst_fit = member.biased_fitness;
                worst_rank = r;
            }
        }
        worst_rank
    }

    /// Compute biased fitness for all members
    pub fn update_biased_fitnesses(&mut self) {
        let n = self.len();
        assert!(n >= 2, "biased fitness needs at least two individuals, got {}", n);

        let avg_closest: Vec<f64> = self
            .iter()
            .map(|member| member.avg_closest(self.params.number_close_individuals))
            .collect();

        // Diversity ranking: larger average distance first, stable within 1e-6
        let mut by_diversity: Vec<usize> = (0..n).collect();
        for i in 0..n - 1 {
            for j in 0..n - i - 1 {
                if avg_closest[by_diversity[j]] < avg_closest[by_diversity[j + 1]] - 1e-6 {
                    by_diversity.swap(j, j + 1);
                }
            }
        }

        let denom = (n - 1) as f64;
        let scale = 1.0 - (self.params.number_elite as f64) / (n as f64);
        for (pos, &rank) in by_diversity.iter().enumerate() {
            let slot = self.order_cost[rank];
            let member = self.get_mut(slot);
            member.div_rank = (pos as f64) / denom;
            member.fit_rank = (rank as f64) / denom;
            member.biased_fitness = member.fit_rank + scale * member.div_rank;
            member.fitness_computed = true;
        }
    }

    /// Binary tournament using biased fitness (smaller is better). Returns a slot id.
    pub fn binary_tournament(&mut self, rng: &mut SmallRng) -> usize {
        let n = self.len();
        let first = self.order_cost[rng.gen_range(0..n)];
        let second = self.order_cost[rng.gen_range(0..n)];
        self.update_biased_fitnesses();
        if self.get(first).biased_fitness < self.get(second).biased_fitness {
            first
        } else {
            second
        }
    }

    /// Keep the best `floor(0.3 * population_size)` members and refill with
    /// educated random individuals. Returns false if the search should stop.
    pub fn diversify(&mut self, ls: &mut LocalSearch, ktns: &mut Ktns, rng: &mut SmallRng) -> bool {
        let keep = (DIVERSIFY_KEEP * self.params.population_size as f64) as usize;
        while self.len() > keep {
            self.remove_at_rank(self.len() - 1);
        }
        while self.len() < self.params.population_size {
            let mut indiv = Individual::new_random(self.data, ktns, rng);
            ls.run(&mut indiv, ktns, rng);
            if self.add(&indiv).is_none() {
                return false;
            }
        }
        debug!(event = "diversified", kept = keep, size = self.len());
        true
    }

    /// Population status: best and average switches, mean distance to the nearest peers.
    pub fn trace_status(&self, it_total: usize, it_noimprov: usize, elapsed_sec: f64) {
        let n = self.len();
        if n == 0 {
            return;
        }
        let best = self.at_rank(0);
        let avg_switches = self.iter().map(|m| m.switches as f64).sum::<f64>() / n as f64;
        let diversity = if n == 1 {
            0.0
        } else {
            self.iter()
                .map(|m| m.avg_closest(self.params.number_close_individuals))
                .sum::<f64>()
                / n as f64
        };
        debug!(
            event = "population",
            it_total,
            it_noimprov,
            elapsed_sec,
            size = n,
            best_switches = best.switches,
            best_zero_blocks = best.zero_blocks,
            avg_switches,
            diversity,
        );
    }

    fn is_sorted(&self) -> bool {
        self.order_cost.windows(2).all(|w| {
            let (a, b) = (self.get(w[0]), self.get(w[1]));
            a.switches < b.switches || (a.switches == b.switches && a.zero_blocks <= b.zero_blocks)
        })
    }
}
