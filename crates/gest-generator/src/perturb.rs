//! Local search around the best ingested point.

use gest_types::{
    incompatible, GeneratorError, GeneratorResult, ObjectiveDirection, Point, VariableSpec, Vocs,
};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::generator::{FromVocs, Generator};
use crate::random::{sample_point, sample_variable, seeded_rng};
use crate::state::{resolve_count, Evaluation, GeneratorCore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationSamplerConfig {
    /// Hard cap on points per `suggest` call.
    pub population: usize,
    /// Points returned when `suggest` is called without a count.
    pub batch_size: usize,
    /// Probability of drawing a fresh random point instead of perturbing.
    pub exploration_weight: f64,
    /// Perturbation half-width as a fraction of each continuous domain.
    pub step_fraction: f64,
    pub seed: Option<u64>,
}

impl Default for PerturbationSamplerConfig {
    fn default() -> Self {
        Self {
            population: 8,
            batch_size: 4,
            exploration_weight: 0.3,
            step_fraction: 0.1,
            seed: None,
        }
    }
}

impl PerturbationSamplerConfig {
    pub fn with_population(mut self, n: usize) -> Self {
        self.population = n;
        self
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn with_exploration_weight(mut self, w: f64) -> Self {
        self.exploration_weight = w;
        self
    }

    pub fn with_step_fraction(mut self, f: f64) -> Self {
        self.step_fraction = f;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<(), String> {
        if self.population == 0 {
            return Err("population must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.exploration_weight) {
            return Err(format!(
                "exploration_weight must lie in [0, 1], got {}",
                self.exploration_weight
            ));
        }
        if !(self.step_fraction > 0.0 && self.step_fraction <= 1.0) {
            return Err(format!(
                "step_fraction must lie in (0, 1], got {}",
                self.step_fraction
            ));
        }
        Ok(())
    }
}

/// Best evaluation seen so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Incumbent {
    pub point: Point,
    pub objective: f64,
}

/// Single-objective sampler. Until data arrives every suggestion is a random
/// draw; afterwards each suggestion is, with probability
/// `exploration_weight`, a random draw and otherwise a perturbation of the
/// incumbent.
#[derive(Debug)]
pub struct PerturbationSampler {
    core: GeneratorCore,
    config: PerturbationSamplerConfig,
    objective: String,
    direction: ObjectiveDirection,
    best: Option<Incumbent>,
    rng: StdRng,
}

impl PerturbationSampler {
    pub fn best(&self) -> Option<&Incumbent> {
        self.best.as_ref()
    }

    pub fn history(&self) -> &[Evaluation] {
        self.core.history()
    }

    pub fn config(&self) -> &PerturbationSamplerConfig {
        &self.config
    }

    fn explore(&mut self) -> Point {
        sample_point(self.core.vocs(), &mut self.rng)
    }

    fn exploit(&mut self, base: &Point) -> Point {
        let step = self.config.step_fraction;
        let rng = &mut self.rng;
        self.core
            .vocs()
            .variables()
            .iter()
            .map(|(name, spec)| {
                let value = match (spec, base.get(name).and_then(Value::as_f64)) {
                    (VariableSpec::Continuous { domain, .. }, Some(v)) => {
                        let [low, high] = *domain;
                        let noise = rng.random_range(-step..step) * (high - low);
                        Value::from((v + noise).clamp(low, high))
                    }
                    // Discrete values and unusable bases are resampled
                    _ => sample_variable(spec, rng),
                };
                (name.clone(), value)
            })
            .collect()
    }

    fn observe(&mut self, evaluation: &Evaluation) {
        let Some(value) = evaluation.value(&self.objective) else {
            warn!(objective = %self.objective, "ingested point has a non-numeric objective");
            return;
        };
        if !value.is_finite() {
            warn!(objective = %self.objective, value, "skipping non-finite objective");
            return;
        }

        let improved = match &self.best {
            None => true,
            Some(best) => self.direction.improves(value, best.objective),
        };
        if improved {
            debug!(objective = %self.objective, value, "new incumbent");
            self.best = Some(Incumbent {
                point: evaluation.point.clone(),
                objective: value,
            });
        }
    }
}

impl FromVocs for PerturbationSampler {
    const NAME: &'static str = "perturbation";
    type Config = PerturbationSamplerConfig;

    fn validate_vocs(vocs: &Vocs) -> GeneratorResult<()> {
        if vocs.n_variables() == 0 {
            return Err(incompatible!(Self::NAME, "requires at least one variable"));
        }
        if vocs.n_constraints() > 0 {
            return Err(incompatible!(Self::NAME, "cannot accept constraints"));
        }
        if vocs.n_objectives() != 1 {
            return Err(incompatible!(
                Self::NAME,
                "requires exactly one objective, got {}",
                vocs.n_objectives()
            ));
        }
        if let Some((name, spec)) = vocs.objectives().iter().next() {
            if spec.direction == ObjectiveDirection::Explore {
                return Err(incompatible!(
                    Self::NAME,
                    "objective {} must be MINIMIZE or MAXIMIZE",
                    name
                ));
            }
        }
        Ok(())
    }

    fn init(vocs: Vocs, config: Self::Config) -> GeneratorResult<Self> {
        config
            .validate()
            .map_err(|message| GeneratorError::InvalidConfig {
                generator: Self::NAME.to_string(),
                message,
            })?;

        let (objective, direction) = vocs
            .objectives()
            .iter()
            .next()
            .map(|(name, spec)| (name.clone(), spec.direction))
            .ok_or_else(|| incompatible!(Self::NAME, "requires exactly one objective, got 0"))?;

        Ok(Self {
            core: GeneratorCore::new(Self::NAME, vocs, true),
            rng: seeded_rng(config.seed),
            config,
            objective,
            direction,
            best: None,
        })
    }
}

impl Generator for PerturbationSampler {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn vocs(&self) -> &Vocs {
        self.core.vocs()
    }

    fn returns_id(&self) -> bool {
        true
    }

    fn suggest(&mut self, num_points: Option<usize>) -> GeneratorResult<Vec<Point>> {
        self.core.ensure_active()?;
        let count = resolve_count(num_points, self.config.batch_size, self.config.population)?;

        let base = self.best.as_ref().map(|best| best.point.clone());
        let mut assignments = Vec::with_capacity(count);
        for _ in 0..count {
            let point = match &base {
                Some(base) if self.rng.random::<f64>() >= self.config.exploration_weight => {
                    self.exploit(base)
                }
                _ => self.explore(),
            };
            assignments.push(point);
        }
        self.core.emit(assignments)
    }

    fn check_ingest(&self, points: &[Point]) -> GeneratorResult<()> {
        self.core.check_batch(points).map(drop)
    }

    fn ingest(&mut self, points: &[Point]) -> GeneratorResult<()> {
        let recorded = self.core.record(points)?.to_vec();
        for evaluation in &recorded {
            self.observe(evaluation);
        }
        Ok(())
    }

    fn finalize(&mut self) -> GeneratorResult<()> {
        self.core.finalize()
    }
}
