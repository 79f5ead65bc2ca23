use anyhow::Context;
use gest_generator::gest_types::{config_error, GeneratorError, ObjectiveDirection, Point, Vocs};
use gest_generator::{
    BackgroundConfig, BackgroundIngest, FromVocs, Generator, PerturbationSampler,
    PerturbationSamplerConfig, RandomSampler, RandomSamplerConfig,
};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_VOCS: &str = r#"{
    "variables": {
        "x1": {"type": "ContinuousVariable", "domain": [-2.0, 2.0]},
        "x2": {"type": "ContinuousVariable", "domain": [-2.0, 2.0]}
    },
    "objectives": {"f": "MINIMIZE"},
    "constants": {"label": "sphere"}
}"#;

fn load_vocs() -> anyhow::Result<Vocs> {
    match std::env::var("GEST_VOCS") {
        Ok(path) => {
            Vocs::from_path(&path).with_context(|| format!("loading VOCS document {path}"))
        }
        Err(_) => Ok(Vocs::from_json(DEFAULT_VOCS)?),
    }
}

fn rounds() -> anyhow::Result<usize> {
    let Ok(raw) = std::env::var("GEST_ROUNDS") else {
        return Ok(10);
    };
    raw.parse::<usize>().map_err(|_| {
        anyhow::Error::from(config_error!(
            "GEST_ROUNDS must be a non-negative integer, got {raw}"
        ))
    })
}

/// Pick the local search when the VOCS allows it, plain random sampling otherwise.
fn build_generator(vocs: Vocs) -> anyhow::Result<Box<dyn Generator>> {
    match PerturbationSampler::construct(vocs.clone(), PerturbationSamplerConfig::default()) {
        Ok(generator) => Ok(Box::new(generator)),
        Err(GeneratorError::Incompatible { reason, .. }) => {
            warn!(%reason, "falling back to random sampling");
            let generator = RandomSampler::construct(
                vocs,
                RandomSamplerConfig::default().with_batch_size(4),
            )?;
            Ok(Box::new(generator))
        }
        Err(err) => Err(err.into()),
    }
}

/// Sum of squares over the numeric variables, written to every output.
fn evaluate(vocs: &Vocs, points: &mut [Point]) {
    for point in points.iter_mut() {
        let value: f64 = vocs
            .variable_names()
            .iter()
            .filter_map(|name| point.get(name).and_then(Value::as_f64))
            .map(|x| x * x)
            .sum();
        for name in vocs.output_names() {
            point.insert(name, Value::from(value));
        }
    }
}

fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_env("GEST_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let vocs = load_vocs()?;
    let rounds = rounds()?;
    let (objective, direction) = vocs
        .objectives()
        .iter()
        .next()
        .map(|(name, spec)| (name.clone(), spec.direction))
        .unwrap_or_else(|| (String::new(), ObjectiveDirection::Explore));

    let generator = build_generator(vocs.clone())?;
    let mut generator = BackgroundIngest::new(
        generator,
        BackgroundConfig::default().with_ingest_delay_ms(5),
    )?;

    let mut best: Option<(f64, Point)> = None;
    for round in 0..rounds {
        let mut points = generator.suggest(None)?;
        evaluate(&vocs, &mut points);
        for point in &points {
            let Some(value) = point.get(&objective).and_then(Value::as_f64) else {
                continue;
            };
            let improved = best
                .as_ref()
                .is_none_or(|(incumbent, _)| direction.improves(value, *incumbent));
            if improved {
                best = Some((value, point.clone()));
            }
        }
        generator.ingest(&points)?;
        info!(round, points = points.len(), pending = generator.pending(), "round complete");
    }

    generator.finalize()?;

    match best {
        Some((value, point)) => {
            println!("best {objective} = {value}");
            println!("{}", serde_json::to_string_pretty(&point)?);
        }
        None => println!("no objective to report"),
    }
    Ok(())
}
