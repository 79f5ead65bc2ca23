//! The VOCS root: variables, objectives, constraints, constants and observables.
//!
//! A [`Vocs`] can only be obtained through [`VocsBuilder::build`] or by
//! deserializing a document, and both paths normalize every shorthand entry
//! and validate the whole problem eagerly.
//!
//! Name rule: a name appears at most once per category. Variable and constant
//! names must be unique across every category. An objective and a constraint
//! may share a name (one measured quantity, optimized and bounded); an
//! observable may not share a name with anything else.

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::constant::{
    parse_constant, parse_observable, ConstantInput, ConstantSpec, ObservableInput, ObservableSpec,
};
use crate::constraint::{parse_constraint, ConstraintInput, ConstraintSpec};
use crate::errors::{GestResult, SchemaError};
use crate::objective::{parse_objective, ObjectiveInput, ObjectiveSpec};
use crate::value::{json_kind, Point};
use crate::variable::{parse_variable, VariableInput, VariableSpec};

/// The five kinds of named entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Variable,
    Constant,
    Objective,
    Constraint,
    Observable,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Objective => "objective",
            Self::Constraint => "constraint",
            Self::Observable => "observable",
        })
    }
}

/// A validated optimization problem description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VocsDocument")]
pub struct Vocs {
    variables: BTreeMap<String, VariableSpec>,
    objectives: BTreeMap<String, ObjectiveSpec>,
    constraints: BTreeMap<String, ConstraintSpec>,
    constants: BTreeMap<String, ConstantSpec>,
    observables: BTreeMap<String, ObservableSpec>,
}

impl Vocs {
    pub fn builder() -> VocsBuilder {
        VocsBuilder::new()
    }

    /// Parses a JSON document holding shorthand and/or longhand entries.
    pub fn from_json(json: &str) -> GestResult<Self> {
        let document: VocsDocument = serde_json::from_str(json)?;
        Ok(Self::try_from(document)?)
    }

    /// Reads and parses a JSON document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> GestResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Same as [`Vocs::from_json`] for an already-parsed value. A
    /// `serde_json::Value` cannot hold repeated keys, so duplicate names are
    /// only detected when parsing text.
    pub fn from_document(value: Value) -> Result<Self, SchemaError> {
        let document: VocsDocument =
            serde_json::from_value(value).map_err(|e| SchemaError::Document {
                message: e.to_string(),
            })?;
        Self::try_from(document)
    }

    /// Serializes to longhand JSON; every entry carries its `type` tag.
    pub fn to_json(&self) -> GestResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> GestResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn variables(&self) -> &BTreeMap<String, VariableSpec> {
        &self.variables
    }

    pub fn objectives(&self) -> &BTreeMap<String, ObjectiveSpec> {
        &self.objectives
    }

    pub fn constraints(&self) -> &BTreeMap<String, ConstraintSpec> {
        &self.constraints
    }

    pub fn constants(&self) -> &BTreeMap<String, ConstantSpec> {
        &self.constants
    }

    pub fn observables(&self) -> &BTreeMap<String, ObservableSpec> {
        &self.observables
    }

    /// Domains of the continuous variables, in name order.
    pub fn bounds(&self) -> Vec<[f64; 2]> {
        self.variables.values().filter_map(VariableSpec::domain).collect()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    pub fn objective_names(&self) -> Vec<String> {
        self.objectives.keys().cloned().collect()
    }

    pub fn constraint_names(&self) -> Vec<String> {
        self.constraints.keys().cloned().collect()
    }

    pub fn observable_names(&self) -> Vec<String> {
        self.observables.keys().cloned().collect()
    }

    pub fn constant_names(&self) -> Vec<String> {
        self.constants.keys().cloned().collect()
    }

    /// Variables followed by constants.
    pub fn input_names(&self) -> Vec<String> {
        let mut names = self.variable_names();
        names.extend(self.constant_names());
        names
    }

    /// Objectives, then constraints, then observables; a name shared by an
    /// objective and a constraint is listed once.
    pub fn output_names(&self) -> Vec<String> {
        let mut names = self.objective_names();
        for name in self.constraints.keys().chain(self.observables.keys()) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Every name a fully evaluated point carries.
    pub fn all_names(&self) -> Vec<String> {
        let mut names = self.input_names();
        names.extend(self.output_names());
        names
    }

    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn n_constants(&self) -> usize {
        self.constants.len()
    }

    pub fn n_inputs(&self) -> usize {
        self.n_variables() + self.n_constants()
    }

    pub fn n_objectives(&self) -> usize {
        self.objectives.len()
    }

    pub fn n_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn n_observables(&self) -> usize {
        self.observables.len()
    }

    pub fn n_outputs(&self) -> usize {
        self.output_names().len()
    }

    /// Whether every constraint holds for the point. Missing or non-numeric
    /// constraint values count as violations.
    pub fn is_feasible(&self, point: &Point) -> bool {
        self.constraints.iter().all(|(name, constraint)| {
            point
                .get(name)
                .and_then(Value::as_f64)
                .is_some_and(|x| constraint.check(x))
        })
    }

    fn check_names(&self) -> Result<(), SchemaError> {
        let categories: [(Category, Vec<&String>); 5] = [
            (Category::Variable, self.variables.keys().collect()),
            (Category::Constant, self.constants.keys().collect()),
            (Category::Objective, self.objectives.keys().collect()),
            (Category::Constraint, self.constraints.keys().collect()),
            (Category::Observable, self.observables.keys().collect()),
        ];

        let mut seen: HashMap<&str, Category> = HashMap::new();
        for (category, names) in &categories {
            for name in names {
                match seen.get(name.as_str()) {
                    Some(Category::Objective) if *category == Category::Constraint => {}
                    Some(first) => {
                        return Err(SchemaError::NameCollision {
                            name: name.to_string(),
                            first: *first,
                            second: *category,
                        })
                    }
                    None => {
                        seen.insert(name.as_str(), *category);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Collects entries in any accepted form and validates them in [`VocsBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct VocsBuilder {
    variables: Vec<(String, VariableInput)>,
    objectives: Vec<(String, ObjectiveInput)>,
    constraints: Vec<(String, ConstraintInput)>,
    constants: Vec<(String, ConstantInput)>,
    observables: Vec<(String, ObservableInput)>,
}

impl VocsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(mut self, name: impl Into<String>, input: impl Into<VariableInput>) -> Self {
        self.variables.push((name.into(), input.into()));
        self
    }

    pub fn objective(mut self, name: impl Into<String>, input: impl Into<ObjectiveInput>) -> Self {
        self.objectives.push((name.into(), input.into()));
        self
    }

    pub fn constraint(mut self, name: impl Into<String>, input: impl Into<ConstraintInput>) -> Self {
        self.constraints.push((name.into(), input.into()));
        self
    }

    pub fn constant(mut self, name: impl Into<String>, input: impl Into<ConstantInput>) -> Self {
        self.constants.push((name.into(), input.into()));
        self
    }

    /// Observable without a dtype.
    pub fn observable(mut self, name: impl Into<String>) -> Self {
        self.observables.push((name.into(), ObservableInput::Bare));
        self
    }

    pub fn observable_as(
        mut self,
        name: impl Into<String>,
        input: impl Into<ObservableInput>,
    ) -> Self {
        self.observables.push((name.into(), input.into()));
        self
    }

    pub fn build(self) -> Result<Vocs, SchemaError> {
        let vocs = Vocs {
            variables: collect(Category::Variable, self.variables, parse_variable)?,
            objectives: collect(Category::Objective, self.objectives, parse_objective)?,
            constraints: collect(Category::Constraint, self.constraints, parse_constraint)?,
            constants: collect(Category::Constant, self.constants, parse_constant)?,
            observables: collect(Category::Observable, self.observables, parse_observable)?,
        };
        vocs.check_names()?;

        debug!(
            variables = vocs.n_variables(),
            objectives = vocs.n_objectives(),
            constraints = vocs.n_constraints(),
            constants = vocs.n_constants(),
            observables = vocs.n_observables(),
            "validated VOCS"
        );
        Ok(vocs)
    }
}

fn collect<I, S>(
    category: Category,
    entries: Vec<(String, I)>,
    parse: impl Fn(&str, I) -> Result<S, SchemaError>,
) -> Result<BTreeMap<String, S>, SchemaError> {
    let mut out = BTreeMap::new();
    for (name, input) in entries {
        if out.contains_key(&name) {
            return Err(SchemaError::NameCollision {
                name,
                first: category,
                second: category,
            });
        }
        let spec = parse(&name, input)?;
        out.insert(name, spec);
    }
    Ok(out)
}

/// Raw document layout accepted by deserialization.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VocsDocument {
    #[serde(default)]
    variables: Entries,
    #[serde(default)]
    objectives: Entries,
    #[serde(default)]
    constraints: Entries,
    #[serde(default)]
    constants: Entries,
    #[serde(default)]
    observables: Option<ObservablesDocument>,
}

/// The entries of one category in document order. Repeated keys are kept so
/// that the builder reports them as collisions.
#[derive(Debug, Default)]
struct Entries(Vec<(String, Value)>);

struct EntriesVisitor;

impl EntriesVisitor {
    fn collect<'de, A: MapAccess<'de>>(mut map: A) -> Result<Entries, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, Value>()? {
            entries.push(entry);
        }
        Ok(Entries(entries))
    }
}

impl<'de> Visitor<'de> for EntriesVisitor {
    type Value = Entries;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping from names to entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Entries, A::Error> {
        Self::collect(map)
    }
}

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Observables are either a bare list of names or a mapping.
#[derive(Debug)]
enum ObservablesDocument {
    Names(Vec<Value>),
    Entries(Entries),
}

struct ObservablesVisitor;

impl<'de> Visitor<'de> for ObservablesVisitor {
    type Value = ObservablesDocument;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a list of observable names or a mapping")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut names = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(name) = seq.next_element::<Value>()? {
            names.push(name);
        }
        Ok(ObservablesDocument::Names(names))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        EntriesVisitor::collect(map).map(ObservablesDocument::Entries)
    }
}

impl<'de> Deserialize<'de> for ObservablesDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ObservablesVisitor)
    }
}

impl TryFrom<VocsDocument> for Vocs {
    type Error = SchemaError;

    fn try_from(doc: VocsDocument) -> Result<Self, Self::Error> {
        let mut builder = VocsBuilder::new();
        for (name, value) in doc.variables.0 {
            builder = builder.variable(name, value);
        }
        for (name, value) in doc.objectives.0 {
            builder = builder.objective(name, value);
        }
        for (name, value) in doc.constraints.0 {
            builder = builder.constraint(name, value);
        }
        for (name, value) in doc.constants.0 {
            builder = builder.constant(name, value);
        }
        match doc.observables {
            None => {}
            // A bare list of names is shorthand for untyped observables.
            Some(ObservablesDocument::Names(names)) => {
                for name in names {
                    match name {
                        Value::String(name) => builder = builder.observable(name),
                        other => {
                            return Err(SchemaError::Document {
                                message: format!(
                                    "observable names must be strings, found {}",
                                    json_kind(&other)
                                ),
                            })
                        }
                    }
                }
            }
            Some(ObservablesDocument::Entries(entries)) => {
                for (name, value) in entries.0 {
                    builder = builder.observable_as(name, value);
                }
            }
        }
        builder.build()
    }
}
