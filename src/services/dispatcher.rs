//! Asynchronous image job execution.
//!
//! Jobs run on tokio's blocking pool so decoding, resampling and encoding
//! never stall the async runtime. A semaphore bounds how many run at once.
//! Every request yields exactly one [`JobResponse`] carrying the request's
//! correlation id; failures are reported in the response, never raised.
//!
//! A job whose caller goes away (a dropped future, a disconnected client)
//! is deregistered and flagged as cancelled; its blocking work keeps its
//! permit until it stops at the next checkpoint.

use scan_imaging::{apply_filter, resample_with_cancel, PixelImage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, Semaphore};

use super::codec::DynImageCodec;
use crate::error::JobError;
use crate::models::{JobConfig, JobRequest, JobResponse, OutputFormat, ParsedJob};

type CancelFlag = Arc<AtomicBool>;
type InFlight = Mutex<HashMap<String, CancelFlag>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, CancelFlag>> {
    // The map holds no invariant a panicking holder could break
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registration of one job in the in-flight map, undone on drop.
struct InFlightGuard<'a> {
    in_flight: &'a InFlight,
    correlation_id: String,
    cancel: CancelFlag,
}

impl<'a> InFlightGuard<'a> {
    fn register(in_flight: &'a InFlight, correlation_id: String) -> Self {
        let cancel: CancelFlag = Arc::new(AtomicBool::new(false));
        lock(in_flight).insert(correlation_id.clone(), cancel.clone());
        Self {
            in_flight,
            correlation_id,
            cancel,
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        // Stops blocking work whose caller is gone; a no-op once it finished
        self.cancel.store(true, Ordering::Relaxed);
        let mut in_flight = lock(self.in_flight);
        // A later job may have reused the id; only remove our own flag
        if in_flight
            .get(&self.correlation_id)
            .is_some_and(|flag| Arc::ptr_eq(flag, &self.cancel))
        {
            in_flight.remove(&self.correlation_id);
        }
    }
}

pub struct JobDispatcher {
    codec: DynImageCodec,
    permits: Arc<Semaphore>,
    in_flight: InFlight,
    max_image_bytes: usize,
    output_format: OutputFormat,
    jpeg_quality: u8,
}

impl JobDispatcher {
    pub fn new(codec: DynImageCodec, config: &JobConfig) -> Self {
        Self {
            codec,
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            in_flight: Mutex::new(HashMap::new()),
            max_image_bytes: config.max_image_bytes,
            output_format: config.output_format,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Run a job to completion and wrap the outcome in a response.
    pub async fn handle(&self, request: JobRequest) -> JobResponse {
        let correlation_id = request.correlation_id.clone();
        let operation = request.operation.clone();
        let started = Instant::now();

        match self.process(request).await {
            Ok(bytes) => {
                tracing::info!(
                    correlation_id = %correlation_id,
                    operation = %operation,
                    output_bytes = bytes.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Job completed"
                );
                JobResponse::success(correlation_id, bytes)
            }
            Err(e) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    operation = %operation,
                    kind = e.kind(),
                    error = %e,
                    "Job failed"
                );
                JobResponse::error(correlation_id, &e)
            }
        }
    }

    /// Run a job and return the encoded result.
    pub async fn process(&self, request: JobRequest) -> Result<Vec<u8>, JobError> {
        let job = request.parse()?;

        let size = job.image_bytes().len();
        if size > self.max_image_bytes {
            return Err(JobError::ImageTooLarge {
                size,
                max: self.max_image_bytes,
            });
        }

        // Registered before waiting for a permit so queued jobs can be cancelled
        let guard = InFlightGuard::register(&self.in_flight, request.correlation_id);
        self.run_blocking(job, guard.cancel.clone()).await
    }

    async fn run_blocking(&self, job: ParsedJob, cancel: CancelFlag) -> Result<Vec<u8>, JobError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| JobError::WorkerFailed(e.to_string()))?;

        let codec = self.codec.clone();
        let format = self.output_format;
        let quality = self.jpeg_quality;

        tokio::task::spawn_blocking(move || {
            // Held by the work itself, so an abandoned job still counts
            let _permit = permit;
            execute(job, &codec, format, quality, &cancel)
        })
        .await
        .map_err(|e| JobError::WorkerFailed(format!("Job task failed: {e}")))?
    }

    /// Run a job in the background; the response arrives on the receiver.
    pub fn submit(self: &Arc<Self>, request: JobRequest) -> oneshot::Receiver<JobResponse> {
        let (tx, rx) = oneshot::channel();
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let response = dispatcher.handle(request).await;
            if tx.send(response).is_err() {
                tracing::debug!("Job receiver dropped before completion");
            }
        });
        rx
    }

    /// Start a message-passing worker: requests go in one channel, responses
    /// come out of the other in completion order.
    pub fn start_worker(self: &Arc<Self>, buffer: usize) -> JobWorker {
        let (request_tx, mut request_rx) = mpsc::channel::<JobRequest>(buffer.max(1));
        let (response_tx, response_rx) = mpsc::channel::<JobResponse>(buffer.max(1));
        let dispatcher = self.clone();

        tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                let dispatcher = dispatcher.clone();
                let response_tx = response_tx.clone();
                tokio::spawn(async move {
                    let response = dispatcher.handle(request).await;
                    if response_tx.send(response).await.is_err() {
                        tracing::debug!("Worker response channel closed");
                    }
                });
            }
            tracing::debug!("Worker request channel closed");
        });

        JobWorker {
            requests: request_tx,
            responses: response_rx,
        }
    }

    /// Ask an in-flight job to stop. Returns false if no job has that id.
    ///
    /// The job still produces its single response, an error unless it had
    /// already finished the cancellable part of its work.
    pub async fn cancel(&self, correlation_id: &str) -> bool {
        match lock(&self.in_flight).get(correlation_id) {
            Some(flag) => {
                flag.store(true, Ordering::Relaxed);
                tracing::info!(correlation_id = %correlation_id, "Job cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Number of jobs queued or running.
    pub async fn in_flight_count(&self) -> usize {
        lock(&self.in_flight).len()
    }
}

/// Channel ends of a worker started by [`JobDispatcher::start_worker`].
pub struct JobWorker {
    requests: mpsc::Sender<JobRequest>,
    responses: mpsc::Receiver<JobResponse>,
}

impl JobWorker {
    pub async fn send(&self, request: JobRequest) -> Result<(), JobError> {
        self.requests
            .send(request)
            .await
            .map_err(|_| JobError::WorkerFailed("worker stopped".to_string()))
    }

    /// Next finished job, or `None` once the worker has stopped.
    pub async fn recv(&mut self) -> Option<JobResponse> {
        self.responses.recv().await
    }

    /// A sender that can be moved to other tasks.
    pub fn sender(&self) -> mpsc::Sender<JobRequest> {
        self.requests.clone()
    }
}

fn check_cancelled(cancel: &AtomicBool) -> Result<(), JobError> {
    if cancel.load(Ordering::Relaxed) {
        Err(JobError::Cancelled)
    } else {
        Ok(())
    }
}

/// Decode, transform and encode. Runs on the blocking pool.
fn execute(
    job: ParsedJob,
    codec: &DynImageCodec,
    format: OutputFormat,
    quality: u8,
    cancel: &AtomicBool,
) -> Result<Vec<u8>, JobError> {
    check_cancelled(cancel)?;

    let output: PixelImage = match job {
        ParsedJob::Perspective {
            image_bytes,
            quad,
            image_size,
        } => {
            let source = codec.decode(&image_bytes)?;
            if let Some(declared) = image_size {
                if (declared.width, declared.height) != (source.width(), source.height()) {
                    tracing::warn!(
                        declared_width = declared.width,
                        declared_height = declared.height,
                        width = source.width(),
                        height = source.height(),
                        "Declared image size differs from decoded size, using decoded"
                    );
                }
            }
            check_cancelled(cancel)?;
            resample_with_cancel(&source, &quad, cancel)?
        }
        ParsedJob::Filter {
            image_bytes,
            filter,
        } => {
            let mut image = codec.decode(&image_bytes)?;
            check_cancelled(cancel)?;
            apply_filter(&mut image, filter);
            image
        }
    };

    check_cancelled(cancel)?;
    codec.encode(&output, format, quality)
}
