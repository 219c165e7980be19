//! Parent selection strategies.
//!
//! A [`Selector`] is prepared once per generation from the population's
//! fitness values and then sampled for every parent draw.

use crate::schema::SelectionMethod;

use super::genome::RouteRng;

/// Per-generation parent sampler.
#[derive(Debug, Clone)]
pub struct Selector {
    method: SelectionMethod,
    fitness: Vec<f32>,
    /// Cumulative probabilities (roulette and rank methods only).
    cumulative: Vec<f32>,
    /// Last index with non-zero probability, used when rounding leaves the
    /// final cumulative value just below a draw.
    last_weighted: Option<usize>,
}

impl Selector {
    /// Prepare a selector for the given fitness values.
    pub fn new(method: &SelectionMethod, fitness: &[f32]) -> Self {
        let weights = match method {
            SelectionMethod::RouletteWheel => {
                Some(fitness.iter().map(|&f| sanitize(f)).collect::<Vec<_>>())
            }
            SelectionMethod::RankBased => Some(rank_weights(fitness)),
            SelectionMethod::Tournament { .. } | SelectionMethod::UniformPairs => None,
        };

        let (cumulative, last_weighted) = match weights {
            Some(weights) => cumulative_distribution(&weights),
            None => (Vec::new(), None),
        };

        Self {
            method: method.clone(),
            fitness: fitness.to_vec(),
            cumulative,
            last_weighted,
        }
    }

    /// Number of individuals this selector draws from.
    pub fn len(&self) -> usize {
        self.fitness.len()
    }

    /// Whether there is nothing to draw from.
    pub fn is_empty(&self) -> bool {
        self.fitness.is_empty()
    }

    /// Draw one parent index. The population must be non-empty.
    pub fn select(&self, rng: &mut RouteRng) -> usize {
        match &self.method {
            SelectionMethod::RouletteWheel | SelectionMethod::RankBased => {
                self.sample_cumulative(rng)
            }
            SelectionMethod::Tournament { size } => {
                let mut best_idx = rng.index(self.len());
                for _ in 1..*size {
                    let idx = rng.index(self.len());
                    if self.fitness[idx] > self.fitness[best_idx] {
                        best_idx = idx;
                    }
                }
                best_idx
            }
            SelectionMethod::UniformPairs => rng.index(self.len()),
        }
    }

    /// Draw two parent indices.
    pub fn select_pair(&self, rng: &mut RouteRng) -> (usize, usize) {
        (self.select(rng), self.select(rng))
    }

    /// Draw `n` parent indices with replacement.
    pub fn mating_pool(&self, rng: &mut RouteRng, n: usize) -> Vec<usize> {
        (0..n).map(|_| self.select(rng)).collect()
    }

    /// First index whose cumulative probability meets a uniform draw.
    /// Falls back to a uniform pick when every weight is zero.
    fn sample_cumulative(&self, rng: &mut RouteRng) -> usize {
        let Some(last_weighted) = self.last_weighted else {
            return rng.index(self.len());
        };

        let target = rng.unit();
        let idx = self.cumulative.partition_point(|&c| c < target);
        if idx < self.cumulative.len() {
            idx
        } else {
            last_weighted
        }
    }
}

/// Negative and non-finite fitness gets no share of the wheel.
#[inline]
fn sanitize(fitness: f32) -> f32 {
    if fitness.is_finite() {
        fitness.max(0.0)
    } else {
        0.0
    }
}

/// Linear rank weights: best gets `n`, worst gets 1. Ties keep input order.
fn rank_weights(fitness: &[f32]) -> Vec<f32> {
    let n = fitness.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| sanitize(fitness[b]).total_cmp(&sanitize(fitness[a])));

    let mut weights = vec![0.0; n];
    for (position, &idx) in order.iter().enumerate() {
        weights[idx] = (n - position) as f32;
    }
    weights
}

/// Normalize weights into a cumulative distribution.
fn cumulative_distribution(weights: &[f32]) -> (Vec<f32>, Option<usize>) {
    let total: f32 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return (Vec::new(), None);
    }

    let mut cumulative = Vec::with_capacity(weights.len());
    let mut running = 0.0f32;
    let mut last_weighted = None;
    for (i, &w) in weights.iter().enumerate() {
        running += w / total;
        cumulative.push(running);
        if w > 0.0 {
            last_weighted = Some(i);
        }
    }
    (cumulative, last_weighted)
}
