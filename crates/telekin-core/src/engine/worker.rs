use super::cancel::CancelToken;
use super::config::{Setup, SweepConfig};
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::state::{CurveSample, FragmentResult};
use crate::core::models::fragment::ReactionChannel;
use crate::core::tables::masses::MassTable;
use crate::workflows::telescope::{self, SweepEvent, TelescopeResult};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// One setup to be swept, identified by its position in the batch.
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub setup: Setup,
    pub config: SweepConfig,
}

/// Messages from the worker thread, delivered in the order they were produced.
#[derive(Debug)]
pub enum WorkerMessage {
    JobStarted {
        job: usize,
        name: String,
    },
    Progress(Progress),
    SweepStarted {
        job: usize,
        channel: ReactionChannel,
        total_samples: usize,
    },
    Sample {
        job: usize,
        channel: ReactionChannel,
        sample: CurveSample,
    },
    SweepFinished {
        job: usize,
        result: Box<FragmentResult>,
    },
    /// Completion notification; the next job starts only after this is sent.
    JobFinished {
        job: usize,
        result: Result<TelescopeResult, EngineError>,
    },
    /// The batch is over, either completed or cancelled.
    Finished,
}

/// Runs a batch of sweeps on a dedicated thread.
///
/// Jobs execute strictly one after another. Dropping the receiving side
/// does not stop the thread; call [`SweepWorker::cancel`] for that.
pub struct SweepWorker {
    handle: Option<JoinHandle<()>>,
    cancel: CancelToken,
    receiver: Receiver<WorkerMessage>,
}

impl SweepWorker {
    pub fn spawn(jobs: Vec<Job>, masses: Arc<MassTable>) -> Result<Self, EngineError> {
        let (sender, receiver) = mpsc::channel();
        let cancel = CancelToken::new();
        let token = cancel.clone();

        let handle = thread::Builder::new()
            .name("telekin-sweep".to_string())
            .spawn(move || run_batch(jobs, &masses, &token, &sender))
            .map_err(|e| EngineError::Worker(e.to_string()))?;

        Ok(Self {
            handle: Some(handle),
            cancel,
            receiver,
        })
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Blocks for the next message; `None` once the worker has exited.
    pub fn recv(&self) -> Option<WorkerMessage> {
        self.receiver.recv().ok()
    }

    pub fn messages(&self) -> impl Iterator<Item = WorkerMessage> + '_ {
        self.receiver.iter()
    }

    pub fn join(mut self) -> Result<(), EngineError> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| EngineError::Worker("sweep thread panicked".to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for SweepWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            let _ = handle.join();
        }
    }
}

fn run_batch(
    jobs: Vec<Job>,
    masses: &MassTable,
    cancel: &CancelToken,
    sender: &Sender<WorkerMessage>,
) {
    let progress_sender = sender.clone();
    let reporter = ProgressReporter::with_callback(Box::new(move |event| {
        // Progress is advisory; a closed channel just means nobody is watching.
        let _ = progress_sender.send(WorkerMessage::Progress(event));
    }));

    for (job, Job { name, setup, config }) in jobs.into_iter().enumerate() {
        if cancel.is_cancelled() {
            debug!(job, "Skipping remaining jobs after cancellation");
            break;
        }
        info!(job, name = %name, "Starting job");
        if sender.send(WorkerMessage::JobStarted { job, name }).is_err() {
            warn!("Worker channel closed; stopping batch");
            return;
        }

        let result = telescope::run_streaming(&setup, &config, masses, &reporter, cancel, &mut |event| {
            let message = match event {
                SweepEvent::Started {
                    channel,
                    total_samples,
                } => WorkerMessage::SweepStarted {
                    job,
                    channel: *channel,
                    total_samples,
                },
                SweepEvent::Sample { channel, sample } => WorkerMessage::Sample {
                    job,
                    channel: *channel,
                    sample: sample.clone(),
                },
                SweepEvent::Finished { result } => WorkerMessage::SweepFinished {
                    job,
                    result: Box::new(result.clone()),
                },
            };
            let _ = sender.send(message);
        });

        let cancelled = matches!(result, Err(EngineError::Cancelled));
        if sender.send(WorkerMessage::JobFinished { job, result }).is_err() || cancelled {
            break;
        }
    }
    let _ = sender.send(WorkerMessage::Finished);
}
