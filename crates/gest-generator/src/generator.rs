//! The generator contract.

use gest_types::{GeneratorResult, Point, Vocs};
use tracing::info;

/// A stateful recommender of candidate points for one VOCS.
///
/// Calls on one instance are expected to be serialized by the caller; every
/// method that changes state takes `&mut self`.
pub trait Generator: Send {
    /// Short algorithm name used in logs and errors.
    fn name(&self) -> &str;

    /// The VOCS this generator was constructed with.
    fn vocs(&self) -> &Vocs;

    /// Whether suggested points carry the reserved `_id` field.
    fn returns_id(&self) -> bool {
        false
    }

    /// Request the next points to evaluate.
    ///
    /// With `Some(n)` exactly `n` points are returned, or
    /// [`GeneratorError::InfeasibleCount`](gest_types::GeneratorError::InfeasibleCount)
    /// if the algorithm cannot produce that many right now. With `None` the
    /// generator picks the count. Every point holds each variable and constant.
    fn suggest(&mut self, num_points: Option<usize>) -> GeneratorResult<Vec<Point>>;

    /// Validate a batch against the ingest contract without applying it.
    fn check_ingest(&self, points: &[Point]) -> GeneratorResult<()>;

    /// Feed evaluated points back. The batch is applied whole or not at all.
    fn ingest(&mut self, points: &[Point]) -> GeneratorResult<()>;

    /// Flush outstanding work into history. Nothing may be called afterwards.
    fn finalize(&mut self) -> GeneratorResult<()> {
        Ok(())
    }
}

/// Construction of a generator against a VOCS.
///
/// [`FromVocs::construct`] always runs the compatibility hook before the
/// implementation builds any state, so an incompatible VOCS never yields an
/// instance.
pub trait FromVocs: Generator + Sized {
    /// Name reported in compatibility errors.
    const NAME: &'static str;

    /// Implementation-specific configuration.
    type Config;

    /// Reject any VOCS this algorithm cannot handle.
    fn validate_vocs(vocs: &Vocs) -> GeneratorResult<()>;

    /// Build the generator from an already compatible VOCS.
    fn init(vocs: Vocs, config: Self::Config) -> GeneratorResult<Self>;

    fn construct(vocs: Vocs, config: Self::Config) -> GeneratorResult<Self> {
        Self::validate_vocs(&vocs)?;
        let generator = Self::init(vocs, config)?;
        info!(
            generator = generator.name(),
            returns_id = generator.returns_id(),
            variables = generator.vocs().n_variables(),
            "generator constructed"
        );
        Ok(generator)
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn vocs(&self) -> &Vocs {
        (**self).vocs()
    }

    fn returns_id(&self) -> bool {
        (**self).returns_id()
    }

    fn suggest(&mut self, num_points: Option<usize>) -> GeneratorResult<Vec<Point>> {
        (**self).suggest(num_points)
    }

    fn check_ingest(&self, points: &[Point]) -> GeneratorResult<()> {
        (**self).check_ingest(points)
    }

    fn ingest(&mut self, points: &[Point]) -> GeneratorResult<()> {
        (**self).ingest(points)
    }

    fn finalize(&mut self) -> GeneratorResult<()> {
        (**self).finalize()
    }
}
