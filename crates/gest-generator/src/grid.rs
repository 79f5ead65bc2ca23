//! Exhaustive grid over the variable space, consumed in a fixed order.

use gest_types::{incompatible, GeneratorError, GeneratorResult, Point, VariableSpec, Vocs};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::generator::{FromVocs, Generator};
use crate::state::{resolve_count, Evaluation, GeneratorCore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSamplerConfig {
    /// Evenly spaced points per continuous domain, ends included.
    pub steps: usize,
    /// Points returned when `suggest` is called without a count.
    pub batch_size: usize,
    /// Upper limit on the planned grid size.
    pub max_points: usize,
}

impl Default for GridSamplerConfig {
    fn default() -> Self {
        Self {
            steps: 5,
            batch_size: 1,
            max_points: 100_000,
        }
    }
}

impl GridSamplerConfig {
    pub fn with_steps(mut self, n: usize) -> Self {
        self.steps = n;
        self
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn with_max_points(mut self, n: usize) -> Self {
        self.max_points = n;
        self
    }
}

/// Walks a pre-planned cartesian grid. Each suggested point carries an
/// identifier; a request for more points than remain fails and leaves the
/// cursor where it was.
#[derive(Debug)]
pub struct GridSampler {
    core: GeneratorCore,
    config: GridSamplerConfig,
    cursor: usize,
    plan: Vec<Point>,
}

impl GridSampler {
    /// Number of grid points for a VOCS, or `None` on overflow.
    pub fn grid_size(vocs: &Vocs, steps: usize) -> Option<usize> {
        vocs.variables().values().try_fold(1usize, |total, spec| {
            let dim = match spec {
                VariableSpec::Continuous { .. } => steps,
                VariableSpec::Discrete { values, .. } => values.len(),
            };
            total.checked_mul(dim)
        })
    }

    fn build_grid(vocs: &Vocs, steps: usize) -> Vec<Point> {
        let axes: Vec<(&str, Vec<Value>)> = vocs
            .variables()
            .iter()
            .map(|(name, spec)| {
                let values = match spec {
                    VariableSpec::Continuous { domain, .. } => (0..steps)
                        .map(|i| {
                            let t = i as f64 / (steps - 1) as f64;
                            Value::from(domain[0] + t * (domain[1] - domain[0]))
                        })
                        .collect(),
                    VariableSpec::Discrete { values, .. } => {
                        values.iter().map(|v| v.to_json()).collect()
                    }
                };
                (name.as_str(), values)
            })
            .collect();

        // Cartesian product
        let mut result: Vec<Point> = vec![Point::new()];
        for (name, values) in &axes {
            let mut next = Vec::with_capacity(result.len() * values.len());
            for existing in &result {
                for value in values {
                    let mut combo = existing.clone();
                    combo.insert(name.to_string(), value.clone());
                    next.push(combo);
                }
            }
            result = next;
        }

        result
    }

    pub fn remaining(&self) -> usize {
        self.plan.len() - self.cursor
    }

    pub fn total(&self) -> usize {
        self.plan.len()
    }

    pub fn history(&self) -> &[Evaluation] {
        self.core.history()
    }
}

impl FromVocs for GridSampler {
    const NAME: &'static str = "grid";
    type Config = GridSamplerConfig;

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

        if config.steps < 2 {
            return Err(invalid(format!("steps must be at least 2, got {}", config.steps)));
        }
        if config.batch_size == 0 {
            return Err(invalid("batch_size must be at least 1".to_string()));
        }
        match Self::grid_size(&vocs, config.steps) {
            Some(size) if size <= config.max_points => {}
            size => {
                return Err(invalid(format!(
                    "grid of {} points exceeds max_points {}",
                    size.map_or_else(|| "overflowing".to_string(), |s| s.to_string()),
                    config.max_points
                )))
            }
        }

        let plan = Self::build_grid(&vocs, config.steps);
        debug!(points = plan.len(), "planned grid");

        Ok(Self {
            core: GeneratorCore::new(Self::NAME, vocs, true),
            config,
            cursor: 0,
            plan,
        })
    }
}

impl Generator for GridSampler {
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
        let count = resolve_count(num_points, self.config.batch_size, self.remaining())?;
        let end = self.cursor + count;
        let batch = self.plan[self.cursor..end].to_vec();
        self.cursor = end;
        self.core.emit(batch)
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

    fn two_by_three() -> Vocs {
        Vocs::builder()
            .variable("a", discrete([1, 2, 3]))
            .variable("b", discrete([10, 11]))
            .objective("f", "MINIMIZE")
            .build()
            .unwrap()
    }

    #[test]
    fn grid_produces_full_product() {
        let vocs = two_by_three();
        assert_eq!(GridSampler::grid_size(&vocs, 5), Some(6));

        let mut grid = GridSampler::construct(vocs, GridSamplerConfig::default()).unwrap();
        assert_eq!(grid.total(), 6);
        let batch = grid.suggest(Some(6)).unwrap();
        assert_eq!(batch.len(), 6);
        assert!(batch.iter().all(|p| p.contains_key(ID_FIELD)));
        assert_eq!(grid.remaining(), 0);
    }

    #[test]
    fn cursor_advances_and_oversize_request_is_harmless() {
        let mut grid = GridSampler::construct(two_by_three(), GridSamplerConfig::default()).unwrap();
        assert_eq!(grid.suggest(Some(4)).unwrap().len(), 4);

        let err = grid.suggest(Some(3)).unwrap_err();
        assert_eq!(
            err,
            GeneratorError::InfeasibleCount {
                requested: 3,
                available: 2
            }
        );
        assert_eq!(grid.remaining(), 2);
        assert_eq!(grid.suggest(Some(2)).unwrap().len(), 2);
        assert!(grid.suggest(None).unwrap().is_empty());
    }

    #[test]
    fn continuous_axis_includes_both_ends() {
        let vocs = Vocs::builder().variable("x", [0.0, 1.0]).build().unwrap();
        let mut grid =
            GridSampler::construct(vocs, GridSamplerConfig::default().with_steps(3)).unwrap();
        let xs: Vec<Value> = grid
            .suggest(Some(3))
            .unwrap()
            .into_iter()
            .map(|p| p["x"].clone())
            .collect();
        assert_eq!(xs, vec![json!(0.0), json!(0.5), json!(1.0)]);
    }

    #[test]
    fn wide_axis_stays_finite() {
        let vocs = Vocs::builder().variable("x", [-1e308, 0.0]).build().unwrap();
        let mut grid =
            GridSampler::construct(vocs, GridSamplerConfig::default().with_steps(3)).unwrap();
        let xs: Vec<f64> = grid
            .suggest(Some(3))
            .unwrap()
            .iter()
            .map(|p| p["x"].as_f64().unwrap())
            .collect();
        assert_eq!(xs, vec![-1e308, -5e307, 0.0]);

        assert!(Vocs::builder().variable("x", [-1e308, 1e308]).build().is_err());
    }

    #[test]
    fn default_count_is_batch_size() {
        let mut grid = GridSampler::construct(
            two_by_three(),
            GridSamplerConfig::default().with_batch_size(4),
        )
        .unwrap();
        assert_eq!(grid.suggest(None).unwrap().len(), 4);
        assert_eq!(grid.suggest(None).unwrap().len(), 2);
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let vocs = Vocs::builder()
            .variable("x", [0.0, 1.0])
            .variable("y", [0.0, 1.0])
            .build()
            .unwrap();
        let err = GridSampler::construct(
            vocs,
            GridSamplerConfig::default().with_steps(10).with_max_points(50),
        )
        .unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig { .. }));
    }

    #[test]
    fn single_step_is_rejected() {
        let err = GridSampler::construct(two_by_three(), GridSamplerConfig::default().with_steps(1))
            .unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig { .. }));
    }
}
