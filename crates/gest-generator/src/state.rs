//! Bookkeeping shared by generator implementations: lifecycle phase, issued
//! identifiers and the ingested history.

use chrono::{DateTime, Utc};
use gest_types::{GeneratorError, GeneratorResult, Point, Vocs, ID_FIELD};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Lifecycle of a generator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Built, nothing suggested or ingested yet.
    Constructed,
    /// At least one `suggest` or `ingest` went through.
    Running,
    /// Terminal.
    Finalized,
}

/// One ingested point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Identifier this generator issued for the point, if any.
    pub id: Option<Uuid>,
    pub point: Point,
    pub ingested_at: DateTime<Utc>,
}

impl Evaluation {
    /// Numeric value of a field, if present.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.point.get(name).and_then(Value::as_f64)
    }
}

/// Resolve the number of points for one `suggest` call.
///
/// An explicit request larger than `available` fails without side effects;
/// an omitted one falls back to `default`, capped at `available`.
pub fn resolve_count(
    num_points: Option<usize>,
    default: usize,
    available: usize,
) -> GeneratorResult<usize> {
    match num_points {
        Some(requested) if requested > available => Err(GeneratorError::InfeasibleCount {
            requested,
            available,
        }),
        Some(requested) => Ok(requested),
        None => Ok(default.min(available)),
    }
}

/// State every reference generator embeds.
#[derive(Debug, Clone)]
pub struct GeneratorCore {
    name: &'static str,
    vocs: Vocs,
    returns_id: bool,
    phase: Phase,
    issued: HashSet<Uuid>,
    history: Vec<Evaluation>,
}

impl GeneratorCore {
    pub fn new(name: &'static str, vocs: Vocs, returns_id: bool) -> Self {
        Self {
            name,
            vocs,
            returns_id,
            phase: Phase::Constructed,
            issued: HashSet::new(),
            history: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn vocs(&self) -> &Vocs {
        &self.vocs
    }

    pub fn returns_id(&self) -> bool {
        self.returns_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &[Evaluation] {
        &self.history
    }

    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    pub fn has_issued(&self, id: &Uuid) -> bool {
        self.issued.contains(id)
    }

    pub fn ensure_active(&self) -> GeneratorResult<()> {
        if self.phase == Phase::Finalized {
            return Err(GeneratorError::Finalized {
                generator: self.name.to_string(),
            });
        }
        Ok(())
    }

    /// Turn variable assignments into suggested points: constants are copied
    /// from the VOCS and, for id-returning generators, a fresh identifier is
    /// attached and remembered.
    pub fn emit(&mut self, assignments: Vec<Point>) -> GeneratorResult<Vec<Point>> {
        self.ensure_active()?;
        self.phase = Phase::Running;

        let points: Vec<Point> = assignments
            .into_iter()
            .map(|mut point| {
                for (name, constant) in self.vocs.constants() {
                    point.insert(name.clone(), constant.value.clone());
                }
                if self.returns_id {
                    let id = Uuid::new_v4();
                    self.issued.insert(id);
                    point.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
                }
                point
            })
            .collect();

        debug!(generator = self.name, count = points.len(), "suggested points");
        Ok(points)
    }

    /// Validate a batch without touching state. Returns the identifier carried
    /// by each point.
    pub fn check_batch(&self, points: &[Point]) -> GeneratorResult<Vec<Option<Uuid>>> {
        self.ensure_active()?;

        let required = self.vocs.all_names();
        points
            .iter()
            .enumerate()
            .map(|(index, point)| {
                if let Some(field) = required.iter().find(|name| !point.contains_key(*name)) {
                    return Err(GeneratorError::MissingField {
                        index,
                        field: field.clone(),
                    });
                }
                point
                    .get(ID_FIELD)
                    .map(|raw| self.known_id(index, raw))
                    .transpose()
            })
            .collect()
    }

    fn known_id(&self, index: usize, raw: &Value) -> GeneratorResult<Uuid> {
        raw.as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .filter(|id| self.has_issued(id))
            .ok_or_else(|| GeneratorError::UnknownId {
                index,
                id: match raw {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            })
    }

    /// Validate the whole batch, then append it to history. Returns the newly
    /// recorded evaluations.
    pub fn record(&mut self, points: &[Point]) -> GeneratorResult<&[Evaluation]> {
        let ids = self.check_batch(points)?;
        self.phase = Phase::Running;

        let start = self.history.len();
        let now = Utc::now();
        self.history
            .extend(points.iter().zip(ids).map(|(point, id)| Evaluation {
                id,
                point: point.clone(),
                ingested_at: now,
            }));

        debug!(
            generator = self.name,
            count = points.len(),
            total = self.history.len(),
            "ingested points"
        );
        Ok(&self.history[start..])
    }

    pub fn finalize(&mut self) -> GeneratorResult<()> {
        self.ensure_active()?;
        self.phase = Phase::Finalized;
        info!(
            generator = self.name,
            evaluations = self.history.len(),
            issued = self.issued.len(),
            "generator finalized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vocs() -> Vocs {
        Vocs::builder()
            .variable("x", [0.0, 1.0])
            .objective("f", "MINIMIZE")
            .constant("k", "fixed")
            .build()
            .unwrap()
    }

    fn assignment(x: f64) -> Point {
        Point::from([("x".to_string(), json!(x))])
    }

    fn evaluated(mut point: Point, f: f64) -> Point {
        point.insert("f".into(), json!(f));
        point
    }

    #[test]
    fn emit_copies_constants_and_issues_ids() {
        let mut core = GeneratorCore::new("test", vocs(), true);
        assert_eq!(core.phase(), Phase::Constructed);

        let points = core.emit(vec![assignment(0.1), assignment(0.2)]).unwrap();
        assert_eq!(core.phase(), Phase::Running);
        assert_eq!(points.len(), 2);
        for point in &points {
            assert_eq!(point["k"], json!("fixed"));
            assert!(point.contains_key(ID_FIELD));
        }
        assert_ne!(points[0][ID_FIELD], points[1][ID_FIELD]);
        assert_eq!(core.issued_count(), 2);
        for point in &points {
            let id = Uuid::parse_str(point[ID_FIELD].as_str().unwrap()).unwrap();
            assert!(core.has_issued(&id));
        }
        assert!(!core.has_issued(&Uuid::new_v4()));
    }

    #[test]
    fn emit_without_ids() {
        let mut core = GeneratorCore::new("test", vocs(), false);
        let points = core.emit(vec![assignment(0.5)]).unwrap();
        assert!(!points[0].contains_key(ID_FIELD));
        assert_eq!(core.issued_count(), 0);
    }

    #[test]
    fn record_accepts_issued_and_exogenous_points() {
        let mut core = GeneratorCore::new("test", vocs(), true);
        let suggested = core.emit(vec![assignment(0.5)]).unwrap();

        let own = evaluated(suggested[0].clone(), 1.0);
        let mut exogenous = evaluated(assignment(0.7), 2.0);
        exogenous.insert("k".into(), json!("fixed"));

        let recorded = core.record(&[own, exogenous]).unwrap();
        assert_eq!(recorded.len(), 2);
        assert!(recorded[0].id.is_some());
        assert!(recorded[1].id.is_none());
        assert_eq!(recorded[1].value("f"), Some(2.0));
    }

    #[test]
    fn unknown_id_rejects_whole_batch() {
        let mut core = GeneratorCore::new("test", vocs(), true);
        let suggested = core.emit(vec![assignment(0.5)]).unwrap();

        let good = evaluated(suggested[0].clone(), 1.0);
        let mut forged = good.clone();
        forged.insert(ID_FIELD.into(), json!(Uuid::new_v4().to_string()));

        let err = core.record(&[good, forged]).unwrap_err();
        assert!(matches!(err, GeneratorError::UnknownId { index: 1, .. }));
        assert!(core.history().is_empty());

        let mut garbage = evaluated(assignment(0.1), 0.0);
        garbage.insert("k".into(), json!("fixed"));
        garbage.insert(ID_FIELD.into(), json!(17));
        let err = core.record(&[garbage]).unwrap_err();
        assert_eq!(
            err,
            GeneratorError::UnknownId {
                index: 0,
                id: "17".into()
            }
        );
    }

    #[test]
    fn missing_field_is_reported() {
        let mut core = GeneratorCore::new("test", vocs(), false);
        let err = core.record(&[assignment(0.5)]).unwrap_err();
        assert!(matches!(err, GeneratorError::MissingField { index: 0, .. }));
    }

    #[test]
    fn finalize_is_terminal() {
        let mut core = GeneratorCore::new("test", vocs(), false);
        core.finalize().unwrap();
        assert_eq!(core.phase(), Phase::Finalized);
        assert!(matches!(core.emit(vec![]), Err(GeneratorError::Finalized { .. })));
        assert!(matches!(core.record(&[]), Err(GeneratorError::Finalized { .. })));
        assert!(matches!(core.finalize(), Err(GeneratorError::Finalized { .. })));
    }

    #[test]
    fn count_resolution() {
        assert_eq!(resolve_count(Some(3), 1, 5).unwrap(), 3);
        assert_eq!(resolve_count(None, 4, 2).unwrap(), 2);
        assert_eq!(resolve_count(None, 4, 10).unwrap(), 4);
        assert_eq!(
            resolve_count(Some(6), 1, 5).unwrap_err(),
            GeneratorError::InfeasibleCount {
                requested: 6,
                available: 5
            }
        );
    }
}
