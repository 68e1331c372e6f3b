//! Background loading with progress reporting.
//!
//! Archive loading and map processing are the slow paths. The functions here
//! run them on a worker thread and stream [`Event`]s back over a channel:
//! any number of `Progress` events with non-decreasing `completed` counts,
//! then exactly one `Finished` event. The channel closes after `Finished`.
//! A panic inside the job is reported as `Finished(Err(WorkerPanicked))`.
//!
//! There is no cancellation; dropping the receiver discards the result.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::error::{DecodeError, Result};
use crate::lod::LodArchive;
use crate::map::Map;

use super::resolver::{AssetCatalog, AssetResolver};
use super::{MapProcessor, ProcessedMap};

/// A coarse progress report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingProgress {
    /// Human-readable description of the current step.
    pub step: String,
    /// Steps finished so far.
    pub completed: usize,
    /// Total number of steps.
    pub total: usize,
}

impl LoadingProgress {
    /// Fraction of work done, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// A message from a background job.
#[derive(Debug)]
pub enum Event<T> {
    /// Work is under way.
    Progress(LoadingProgress),
    /// The job ended; always the last event.
    Finished(Result<T>),
}

/// Parses `archives` in order on a worker thread, reporting
/// "loading archive N of M" before each one.
///
/// The resulting catalog searches the archives in the order given. The first
/// archive that fails to parse ends the job with its error.
#[must_use]
pub fn spawn_load_archives(archives: Vec<(String, Vec<u8>)>) -> Receiver<Event<AssetCatalog>> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = run_guarded(|| load_archives(archives, &tx));
        // The receiver may be gone; nothing left to report to.
        let _ = tx.send(Event::Finished(result));
    });

    rx
}

fn load_archives(
    archives: Vec<(String, Vec<u8>)>,
    tx: &Sender<Event<AssetCatalog>>,
) -> Result<AssetCatalog> {
    let total = archives.len();
    let mut catalog = AssetCatalog::new();

    for (i, (name, bytes)) in archives.into_iter().enumerate() {
        let _ = tx.send(Event::Progress(LoadingProgress {
            step: format!("loading archive {} of {total}", i + 1),
            completed: i,
            total,
        }));
        catalog.push(LodArchive::parse(name, bytes)?);
    }

    let _ = tx.send(Event::Progress(LoadingProgress {
        step: format!("loaded {total} archives"),
        completed: total,
        total,
    }));
    log::info!("Loaded {total} archives");

    Ok(catalog)
}

/// Processes `map` on a worker thread, forwarding the processor's progress.
#[must_use]
pub fn spawn_process_map<R>(map: Map, resolver: R) -> Receiver<Event<ProcessedMap>>
where
    R: AssetResolver + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = run_guarded(|| {
            MapProcessor::new(resolver).process(&map, &mut |progress| {
                let _ = tx.send(Event::Progress(progress));
            })
        });
        let _ = tx.send(Event::Finished(result));
    });

    rx
}

/// Runs `job`, turning a panic into `DecodeError::WorkerPanicked`.
fn run_guarded<T>(job: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
        let reason = panic_message(payload.as_ref());
        log::error!("Background job panicked: {reason}");
        Err(DecodeError::WorkerPanicked { reason })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
