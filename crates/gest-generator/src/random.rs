//! Independent random sampling across the variable space.

use gest_types::{incompatible, GeneratorError, GeneratorResult, Point, VariableSpec, Vocs};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::generator::{FromVocs, Generator};
use crate::state::{resolve_count, Evaluation, GeneratorCore};

/// Draw one value for a variable: uniform over a continuous domain, uniform
/// choice over a discrete set.
pub(crate) fn sample_variable(spec: &VariableSpec, rng: &mut StdRng) -> Value {
    match spec {
        VariableSpec::Continuous { domain, .. } => {
            Value::from(rng.random_range(domain[0]..=domain[1]))
        }
        VariableSpec::Discrete { values, .. } => {
            let idx = rng.random_range(0..values.len());
            values[idx].to_json()
        }
    }
}

/// Draw one assignment for every variable of the VOCS.
pub(crate) fn sample_point(vocs: &Vocs, rng: &mut StdRng) -> Point {
    vocs.variables()
        .iter()
        .map(|(name, spec)| (name.clone(), sample_variable(spec, rng)))
        .collect()
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(rand::random::<u64>))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomSamplerConfig {
    /// Points returned when `suggest` is called without a count.
    pub batch_size: usize,
    /// Largest count a single `suggest` call may request.
    pub max_points: usize,
    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for RandomSamplerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            max_points: 10_000,
            seed: None,
        }
    }
}

impl RandomSamplerConfig {
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn with_max_points(mut self, n: usize) -> Self {
        self.max_points = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Samples every variable independently; ingested data is recorded but does
/// not influence later suggestions.
#[derive(Debug)]
pub struct RandomSampler {
    core: GeneratorCore,
    config: RandomSamplerConfig,
    rng: StdRng,
}

impl RandomSampler {
    pub fn history(&self) -> &[Evaluation] {
        self.core.history()
    }

    pub fn config(&self) -> &RandomSamplerConfig {
        &self.config
    }
}

impl FromVocs for RandomSampler {
    const NAME: &'static str = "random";
    type Config = RandomSamplerConfig;

    fn validate_vocs(vocs: &Vocs) -> GeneratorResult<()> {
        if vocs.n_variables() == 0 {
            return Err(incompatible!(Self::NAME, "requires at least one variable"));
        }
        Ok(())
    }

    fn init(vocs: Vocs, config: Self::Config) -> GeneratorResult<Self> {
        let invalid = |message: String| GeneratorError::InvalidConfig {
            generator: Self::NAME.to_string(),
            message,
        };
        if config.batch_size == 0 {
            return Err(invalid("batch_size must be at least 1".to_string()));
        }
        if config.max_points < config.batch_size {
            return Err(invalid(format!(
                "max_points {} is below batch_size {}",
                config.max_points, config.batch_size
            )));
        }
        Ok(Self {
            core: GeneratorCore::new(Self::NAME, vocs, false),
            rng: seeded_rng(config.seed),
            config,
        })
    }
}

impl Generator for RandomSampler {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn vocs(&self) -> &Vocs {
        self.core.vocs()
    }

    fn suggest(&mut self, num_points: Option<usize>) -> GeneratorResult<Vec<Point>> {
        self.core.ensure_active()?;
        let count = resolve_count(num_points, self.config.batch_size, self.config.max_points)?;
        let assignments = (0..count)
            .map(|_| sample_point(self.core.vocs(), &mut self.rng))
            .collect();
        self.core.emit(assignments)
    }

    fn check_ingest(&self, points: &[Point]) -> GeneratorResult<()> {
        self.core.check_batch(points).map(drop)
    }

    fn ingest(&mut self, points: &[Point]) -> GeneratorResult<()> {
        self.core.record(points).map(drop)
    }

    fn finalize(&mut self) -> GeneratorResult<()> {
        self.core.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gest_types::{discrete, ID_FIELD};
    use serde_json::json;

    fn sample_vocs() -> Vocs {
        Vocs::builder()
            .variable("x", [0.5, 1.0])
            .variable("lr", [1e-5, 1e-1])
            .variable("strategy", discrete(["ma_crossover", "momentum", "mean_reversion"]))
            .objective("f", "MAXIMIZE")
            .constant("dataset", "daily")
            .build()
            .unwrap()
    }

    #[test]
    fn random_sampler_respects_domains() {
        let mut rs =
            RandomSampler::construct(sample_vocs(), RandomSamplerConfig::default().with_seed(7))
                .unwrap();
        let points = rs.suggest(Some(50)).unwrap();
        assert_eq!(points.len(), 50);

        let vocs = sample_vocs();
        for point in &points {
            for (name, spec) in vocs.variables() {
                assert!(spec.contains(&point[name]), "{name} out of domain: {}", point[name]);
            }
            assert_eq!(point["dataset"], json!("daily"));
            assert!(!point.contains_key(ID_FIELD));
        }
    }

    #[test]
    fn default_count_uses_batch_size() {
        let mut rs = RandomSampler::construct(
            sample_vocs(),
            RandomSamplerConfig::default().with_batch_size(3),
        )
        .unwrap();
        assert_eq!(rs.suggest(None).unwrap().len(), 3);
        assert_eq!(rs.config().batch_size, 3);
    }

    #[test]
    fn seeded_runs_repeat() {
        let config = RandomSamplerConfig::default().with_seed(42);
        let mut a = RandomSampler::construct(sample_vocs(), config.clone()).unwrap();
        let mut b = RandomSampler::construct(sample_vocs(), config).unwrap();
        assert_eq!(a.suggest(Some(5)).unwrap(), b.suggest(Some(5)).unwrap());
    }

    #[test]
    fn oversized_request_fails_cleanly() {
        let mut rs = RandomSampler::construct(
            sample_vocs(),
            RandomSamplerConfig::default().with_max_points(100),
        )
        .unwrap();
        let err = rs.suggest(Some(usize::MAX)).unwrap_err();
        assert_eq!(
            err,
            GeneratorError::InfeasibleCount {
                requested: usize::MAX,
                available: 100
            }
        );
        assert_eq!(rs.suggest(Some(100)).unwrap().len(), 100);
    }

    #[test]
    fn wide_domains_sample_finite_values() {
        let vocs = Vocs::builder()
            .variable("x", [-1e308, 0.0])
            .build()
            .unwrap();
        let mut rs =
            RandomSampler::construct(vocs, RandomSamplerConfig::default().with_seed(5)).unwrap();
        for point in rs.suggest(Some(20)).unwrap() {
            assert!(point["x"].as_f64().is_some_and(f64::is_finite));
        }

        let overflowing = Vocs::builder().variable("x", [-1e308, 1e308]).build();
        assert!(overflowing.is_err());
    }

    #[test]
    fn rejects_vocs_without_variables() {
        let vocs = Vocs::builder().objective("f", "MINIMIZE").build().unwrap();
        let err = RandomSampler::construct(vocs, RandomSamplerConfig::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::Incompatible { .. }));
    }

    #[test]
    fn rejects_zero_batch() {
        let err = RandomSampler::construct(
            sample_vocs(),
            RandomSamplerConfig::default().with_batch_size(0),
        )
        .unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig { .. }));

        let err = RandomSampler::construct(
            sample_vocs(),
            RandomSamplerConfig::default().with_batch_size(8).with_max_points(4),
        )
        .unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig { .. }));
    }

    #[test]
    fn ingest_records_history() {
        let mut rs = RandomSampler::construct(sample_vocs(), RandomSamplerConfig::default()).unwrap();
        let mut points = rs.suggest(Some(2)).unwrap();
        for point in &mut points {
            point.insert("f".into(), json!(1.0));
        }
        rs.ingest(&points).unwrap();
        assert_eq!(rs.history().len(), 2);
    }
}
