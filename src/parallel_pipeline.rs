// THEORY:
// The `parallel_pipeline` module holds the two execution policies that sit on top
// of `CompositionPipeline`:
//
// 1.  **Batch analysis**: a `WorkerPool` of long-lived tokio tasks, fed by a
//     round-robin dispatcher. Each task carries its own `oneshot` reply channel,
//     so callers simply await their answer and results are naturally returned in
//     submission order, whichever worker finished first.
// 2.  **Live analysis**: a camera produces frames far faster than subject
//     detection can run. `FrameThrottle` admits at most one frame per interval
//     and never a second frame while the previous one is still being analyzed.
//     Skipped frames are simply dropped; a result is never partially surfaced.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::frame_recommender::FrameAnalysisResult;
use crate::error::{CompositionError, CompositionResult};
use crate::pipeline::{CompositionAnalysis, CompositionPipeline};

struct AnalysisTask {
    frame: Frame,
    result_sender: oneshot::Sender<CompositionResult<CompositionAnalysis>>,
}

/// A fixed set of analysis workers behind a round-robin dispatcher.
///
/// Must be created inside a tokio runtime. Workers stop once the pool is dropped.
pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<AnalysisTask>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(pipeline: Arc<CompositionPipeline>, size: usize) -> Self {
        let size = size.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<AnalysisTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..size)
            .map(|_| mpsc::unbounded_channel::<AnalysisTask>())
            .unzip();

        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    warn!(worker = worker_idx, "Worker is gone, task dropped");
                }
                worker_idx = (worker_idx + 1) % size;
            }
        });

        let workers = worker_receivers
            .into_iter()
            .enumerate()
            .map(|(worker_id, mut worker_receiver)| {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    while let Some(task) = worker_receiver.recv().await {
                        let result = pipeline.analyze(task.frame).await;
                        // The caller may have stopped waiting; that is not an error here.
                        let _ = task.result_sender.send(result);
                    }
                    debug!(worker = worker_id, "Analysis worker stopped");
                })
            })
            .collect();

        Self {
            task_sender,
            workers,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues one frame and waits for its analysis.
    pub async fn analyze(&self, frame: Frame) -> CompositionResult<CompositionAnalysis> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.task_sender
            .send(AnalysisTask {
                frame,
                result_sender,
            })
            .map_err(|_| CompositionError::internal("worker pool is shut down"))?;

        result_receiver
            .await
            .map_err(|_| CompositionError::internal("analysis worker dropped the task"))?
    }
}

/// Analyzes many still images concurrently.
pub struct BatchPipeline {
    pool: WorkerPool,
}

impl BatchPipeline {
    /// Sizes the pool from `BatchConfig` (one worker per logical CPU by default).
    pub fn new(pipeline: CompositionPipeline) -> Self {
        let workers = pipeline.config().batch.effective_concurrency();
        info!(workers, "Batch pipeline ready");
        Self {
            pool: WorkerPool::new(Arc::new(pipeline), workers),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.pool.size()
    }

    /// Analyzes every frame; results are in input order, one per frame.
    pub async fn analyze_all(
        &self,
        frames: impl IntoIterator<Item = Frame>,
    ) -> Vec<CompositionResult<CompositionAnalysis>> {
        let pending: Vec<_> = frames
            .into_iter()
            .map(|frame| self.pool.analyze(frame))
            .collect();
        join_all(pending).await
    }
}

/// Admits at most one live frame per interval, and only one at a time.
#[derive(Debug)]
pub struct FrameThrottle {
    interval: Duration,
    last_started: Mutex<Option<Instant>>,
    in_flight: AtomicBool,
}

/// Marks a frame as in flight; dropping it lets the next frame through.
#[derive(Debug)]
pub struct ThrottleGuard<'a> {
    throttle: &'a FrameThrottle,
}

impl Drop for ThrottleGuard<'_> {
    fn drop(&mut self) {
        self.throttle.in_flight.store(false, Ordering::Release);
    }
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_started: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Admits a frame observed at `now`, or returns `None` when it must be skipped.
    pub fn try_acquire(&self, now: Instant) -> Option<ThrottleGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        let mut last_started = self
            .last_started
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = *last_started {
            if now.saturating_duration_since(previous) < self.interval {
                self.in_flight.store(false, Ordering::Release);
                return None;
            }
        }
        *last_started = Some(now);
        Some(ThrottleGuard { throttle: self })
    }
}

/// Lightweight analysis of a live frame stream.
pub struct LiveFramePipeline {
    pipeline: CompositionPipeline,
    throttle: FrameThrottle,
}

impl LiveFramePipeline {
    pub fn new(pipeline: CompositionPipeline) -> Self {
        let throttle = FrameThrottle::new(pipeline.config().throttle.interval);
        Self { pipeline, throttle }
    }

    pub fn throttle(&self) -> &FrameThrottle {
        &self.throttle
    }

    /// Analyzes `frame` unless it is throttled.
    pub async fn submit(&self, frame: &Frame) -> Option<FrameAnalysisResult> {
        self.submit_at(frame, Instant::now()).await
    }

    /// Like `submit`, with the frame's arrival time supplied by the caller.
    pub async fn submit_at(&self, frame: &Frame, now: Instant) -> Option<FrameAnalysisResult> {
        let Some(_guard) = self.throttle.try_acquire(now) else {
            trace!("Live frame skipped by throttle");
            return None;
        };
        Some(self.pipeline.analyze_frame(frame).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(2500);

    #[test]
    fn first_frame_is_admitted() {
        let throttle = FrameThrottle::new(INTERVAL);
        assert!(throttle.try_acquire(Instant::now()).is_some());
    }

    #[test]
    fn frames_inside_the_interval_are_skipped() {
        let throttle = FrameThrottle::new(INTERVAL);
        let t0 = Instant::now();
        drop(throttle.try_acquire(t0));

        assert!(throttle.try_acquire(t0 + Duration::from_millis(2499)).is_none());
        assert!(throttle.try_acquire(t0 + INTERVAL).is_some());
    }

    #[test]
    fn in_flight_frame_blocks_the_next_one() {
        let throttle = FrameThrottle::new(INTERVAL);
        let t0 = Instant::now();
        let guard = throttle.try_acquire(t0);
        assert!(guard.is_some());
        assert!(throttle.is_in_flight());

        // Long after the interval, but the previous frame is still running.
        assert!(throttle.try_acquire(t0 + Duration::from_secs(60)).is_none());

        drop(guard);
        assert!(!throttle.is_in_flight());
        assert!(throttle.try_acquire(t0 + Duration::from_secs(60)).is_some());
    }

    #[test]
    fn skipped_frame_does_not_reset_the_clock() {
        let throttle = FrameThrottle::new(INTERVAL);
        let t0 = Instant::now();
        drop(throttle.try_acquire(t0));
        drop(throttle.try_acquire(t0 + Duration::from_secs(2)));
        assert!(throttle.try_acquire(t0 + Duration::from_secs(3)).is_some());
    }
}
