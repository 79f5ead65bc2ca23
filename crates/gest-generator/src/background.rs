//! Deferred ingestion on a worker thread.
//!
//! [`BackgroundIngest`] wraps any generator. `ingest` checks the batch on the
//! caller's thread, so malformed batches and unknown identifiers are still
//! reported synchronously, then queues it. A worker applies queued batches in
//! order after an optional delay. `finalize` is the barrier: it closes the
//! queue, waits for the worker and only then finalizes the wrapped generator.

use crossbeam_channel::{unbounded, Receiver, Sender};
use gest_types::{GeneratorError, GeneratorResult, Point, Vocs};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::generator::Generator;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    /// Simulated processing time per queued batch.
    pub ingest_delay_ms: u64,
}

impl BackgroundConfig {
    pub fn with_ingest_delay_ms(mut self, ms: u64) -> Self {
        self.ingest_delay_ms = ms;
        self
    }
}

struct Worker<G> {
    inner: Arc<Mutex<G>>,
    pending: Arc<AtomicUsize>,
    failures: Arc<Mutex<Vec<GeneratorError>>>,
    delay: Duration,
}

impl<G: Generator> Worker<G> {
    fn run(self, rx: Receiver<Vec<Point>>) {
        for batch in rx.iter() {
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            let result = self.inner.lock().ingest(&batch);
            if let Err(err) = result {
                warn!(error = %err, "queued batch failed to apply");
                self.failures.lock().push(err);
            }
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        debug!("ingest queue closed");
    }
}

/// A generator whose ingestion runs in the background.
pub struct BackgroundIngest<G: Generator + 'static> {
    inner: Arc<Mutex<G>>,
    name: String,
    vocs: Vocs,
    returns_id: bool,
    tx: Option<Sender<Vec<Point>>>,
    worker: Option<JoinHandle<()>>,
    pending: Arc<AtomicUsize>,
    failures: Arc<Mutex<Vec<GeneratorError>>>,
    finalized: bool,
}

impl<G: Generator + 'static> BackgroundIngest<G> {
    pub fn new(inner: G, config: BackgroundConfig) -> GeneratorResult<Self> {
        let name = format!("background({})", inner.name());
        let vocs = inner.vocs().clone();
        let returns_id = inner.returns_id();

        let inner = Arc::new(Mutex::new(inner));
        let pending = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = unbounded();

        let worker = Worker {
            inner: Arc::clone(&inner),
            pending: Arc::clone(&pending),
            failures: Arc::clone(&failures),
            delay: Duration::from_millis(config.ingest_delay_ms),
        };
        let handle = thread::Builder::new()
            .name("gest-ingest".to_string())
            .spawn(move || worker.run(rx))
            .map_err(|e| GeneratorError::Worker {
                message: format!("failed to spawn ingest worker: {e}"),
            })?;

        info!(
            generator = %name,
            ingest_delay_ms = config.ingest_delay_ms,
            "background ingest started"
        );

        Ok(Self {
            inner,
            name,
            vocs,
            returns_id,
            tx: Some(tx),
            worker: Some(handle),
            pending,
            failures,
            finalized: false,
        })
    }

    /// Batches accepted by `ingest` but not yet applied.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Lock the wrapped generator. Blocks while the worker is applying a batch.
    pub fn inner(&self) -> MutexGuard<'_, G> {
        self.inner.lock()
    }

    fn ensure_active(&self) -> GeneratorResult<()> {
        if self.finalized {
            return Err(GeneratorError::Finalized {
                generator: self.name.clone(),
            });
        }
        Ok(())
    }

    fn shutdown(&mut self) -> GeneratorResult<()> {
        drop(self.tx.take());
        match self.worker.take() {
            Some(handle) => handle.join().map_err(|_| GeneratorError::Worker {
                message: "ingest worker panicked".to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl<G: Generator + 'static> Generator for BackgroundIngest<G> {
    fn name(&self) -> &str {
        &self.name
    }

    fn vocs(&self) -> &Vocs {
        &self.vocs
    }

    fn returns_id(&self) -> bool {
        self.returns_id
    }

    fn suggest(&mut self, num_points: Option<usize>) -> GeneratorResult<Vec<Point>> {
        self.ensure_active()?;
        self.inner.lock().suggest(num_points)
    }

    fn check_ingest(&self, points: &[Point]) -> GeneratorResult<()> {
        self.ensure_active()?;
        self.inner.lock().check_ingest(points)
    }

    fn ingest(&mut self, points: &[Point]) -> GeneratorResult<()> {
        self.check_ingest(points)?;
        let tx = self.tx.as_ref().ok_or_else(|| GeneratorError::Worker {
            message: "ingest queue is closed".to_string(),
        })?;

        self.pending.fetch_add(1, Ordering::SeqCst);
        if tx.send(points.to_vec()).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(GeneratorError::Worker {
                message: "ingest worker has stopped".to_string(),
            });
        }
        debug!(generator = %self.name, count = points.len(), "queued batch");
        Ok(())
    }

    fn finalize(&mut self) -> GeneratorResult<()> {
        self.ensure_active()?;
        self.finalized = true;

        self.shutdown()?;
        self.inner.lock().finalize()?;

        let failures = std::mem::take(&mut *self.failures.lock());
        if let Some(first) = failures.first() {
            return Err(GeneratorError::Worker {
                message: format!("{} queued batch(es) failed, first: {first}", failures.len()),
            });
        }
        Ok(())
    }
}

impl<G: Generator + 'static> Drop for BackgroundIngest<G> {
    fn drop(&mut self) {
        if self.shutdown().is_err() {
            warn!(generator = %self.name, "ingest worker panicked during shutdown");
        }
    }
}
