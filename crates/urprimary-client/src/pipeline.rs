//! Producer/consumer pipeline with a background worker thread.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use urprimary_frame::{FrameError, FrameReader, Package, PackageConsumer};

use crate::error::Result;

/// Source of packages for a [`Pipeline`].
pub trait Producer: Send + 'static {
    /// Produce the next package if one is available now.
    ///
    /// Must not block waiting for a complete frame. `Ok(None)` means no
    /// package is ready yet.
    fn try_produce(&mut self) -> std::result::Result<Option<Package>, FrameError>;

    /// Drop any partially buffered input.
    fn reset(&mut self) {}
}

impl<T: Read + Send + 'static> Producer for FrameReader<T> {
    fn try_produce(&mut self) -> std::result::Result<Option<Package>, FrameError> {
        self.poll_package()
    }

    fn reset(&mut self) {
        FrameReader::reset(self);
    }
}

/// Receives pipeline lifecycle events. Called from the worker thread.
#[allow(unused_variables)]
pub trait Notifier: Send + Sync + 'static {
    /// The worker loop started.
    fn started(&self, name: &str) {}

    /// The worker loop exited, either on `stop()` or after a fatal fault.
    fn stopped(&self, name: &str) {}

    /// The producer reported an error.
    fn fault(&self, name: &str, error: &FrameError) {}
}

/// A notifier that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Name used for the worker thread and in logs.
    pub name: String,
    /// Sleep between polls when the producer had nothing. Default: 1 ms.
    pub idle_backoff: Duration,
    /// Reset the producer and keep going after a framing fault instead of
    /// halting. Stream loss always halts. Default: false.
    pub retry_on_framing_fault: bool,
    /// Halt with [`FrameError::Stalled`] when the producer yields nothing
    /// for this long. `None` waits forever. Default: `None`.
    pub stall_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "primary pipeline".to_string(),
            idle_backoff: Duration::from_millis(1),
            retry_on_framing_fault: false,
            stall_timeout: None,
        }
    }
}

struct Stage<P, C> {
    producer: P,
    consumer: C,
}

/// Runs a producer/dispatch loop on a background thread.
///
/// The pipeline owns one producer and one consumer for its whole lifetime.
/// Packages are dispatched in the order the producer yields them.
pub struct Pipeline<P, C> {
    config: PipelineConfig,
    stage: Arc<Mutex<Stage<P, C>>>,
    notifier: Arc<dyn Notifier>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl<P: Producer, C: PackageConsumer + Send + 'static> Pipeline<P, C> {
    /// Create a stopped pipeline.
    pub fn new(producer: P, consumer: C, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_config(producer, consumer, notifier, PipelineConfig::default())
    }

    /// Create a stopped pipeline with explicit configuration.
    pub fn with_config(
        producer: P,
        consumer: C,
        notifier: Arc<dyn Notifier>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            config,
            stage: Arc::new(Mutex::new(Stage { producer, consumer })),
            notifier,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Start the worker loop. A no-op if it is already running.
    pub fn run(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        // Reap a worker that halted on its own.
        self.join_worker();

        self.running.store(true, Ordering::SeqCst);
        let ctx = WorkerContext {
            name: self.config.name.clone(),
            idle_backoff: self.config.idle_backoff,
            retry_on_framing_fault: self.config.retry_on_framing_fault,
            stall_timeout: self.config.stall_timeout,
            stage: Arc::clone(&self.stage),
            notifier: Arc::clone(&self.notifier),
            running: Arc::clone(&self.running),
        };
        let spawned = thread::Builder::new()
            .name(self.config.name.clone())
            .spawn(move || ctx.run());
        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                Err(err.into())
            }
        }
    }

    /// Stop the worker loop and wait for it to exit.
    ///
    /// No consumer call happens after this returns. A no-op if the pipeline
    /// is already stopped.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.join_worker();
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!(pipeline = %self.config.name, "pipeline worker panicked");
            }
        }
    }

    /// Whether the worker loop is running.
    ///
    /// Turns false on its own when the loop halts after a fatal fault.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Drop partially buffered producer input.
    pub fn reset_producer(&self) {
        self.stage.lock().producer.reset();
    }

    /// Run `f` with the consumer, between dispatches.
    pub fn with_consumer<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.stage.lock().consumer)
    }

    /// Run `f` with the producer, between dispatches.
    pub fn with_producer<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        f(&mut self.stage.lock().producer)
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl<P, C> Drop for Pipeline<P, C> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl<P, C> std::fmt::Debug for Pipeline<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.config.name)
            .field("running", &self.running.load(Ordering::SeqCst))
            .finish()
    }
}

struct WorkerContext<P, C> {
    name: String,
    idle_backoff: Duration,
    retry_on_framing_fault: bool,
    stall_timeout: Option<Duration>,
    stage: Arc<Mutex<Stage<P, C>>>,
    notifier: Arc<dyn Notifier>,
    running: Arc<AtomicBool>,
}

enum Step {
    Dispatched,
    Idle,
    Halt,
}

impl<P: Producer, C: PackageConsumer> WorkerContext<P, C> {
    fn run(self) {
        info!(pipeline = %self.name, "pipeline started");
        self.notifier.started(&self.name);

        let mut last_package = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            match self.step() {
                Step::Dispatched => last_package = Instant::now(),
                Step::Idle => {
                    let idle = last_package.elapsed();
                    if self.stall_timeout.is_some_and(|limit| idle >= limit) {
                        let err = FrameError::Stalled { idle };
                        warn!(pipeline = %self.name, error = %err, "pipeline halted");
                        self.notifier.fault(&self.name, &err);
                        break;
                    }
                    thread::sleep(self.idle_backoff);
                }
                Step::Halt => break,
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(pipeline = %self.name, "pipeline stopped");
        self.notifier.stopped(&self.name);
    }

    fn step(&self) -> Step {
        let mut stage = self.stage.lock();
        let Stage { producer, consumer } = &mut *stage;
        match producer.try_produce() {
            Ok(Some(pkg)) => {
                if !pkg.consume_with(consumer) {
                    debug!(pipeline = %self.name, kind = pkg.kind(), "package not consumed");
                }
                Step::Dispatched
            }
            Ok(None) => Step::Idle,
            Err(err) if err.is_framing_fault() && self.retry_on_framing_fault => {
                warn!(pipeline = %self.name, error = %err, "framing fault, resynchronizing");
                producer.reset();
                self.notifier.fault(&self.name, &err);
                Step::Dispatched
            }
            Err(err) => {
                warn!(pipeline = %self.name, error = %err, "pipeline halted");
                self.notifier.fault(&self.name, &err);
                Step::Halt
            }
        }
    }
}
