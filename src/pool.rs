//! Reward evaluation, either inline on the driver thread or on a fixed pool of worker threads.
//!
//! Workers are pure: each job carries its own copy of the parent state, the worker applies the
//! job's rotation to that copy and sends back the reward. Nothing mutable is shared.

use crate::error::{Result, SolverError};
use crate::heuristic::DistanceEstimator;
use crate::rotation::Rotation;
use crate::state::PuzzleState;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Capacity of both the job and the result queue. A batch larger than this is submitted in
/// chunks so the driver never blocks on a full job queue while results pile up.
const CHANNEL_CAPACITY: usize = 64;

struct Job {
    index: usize,
    state: PuzzleState,
    rotation: Rotation,
}

type JobResult = (usize, std::result::Result<f64, String>);

/// A fixed-size pool of reward workers fed through a bounded job queue.
pub struct WorkerPool {
    jobs: Sender<Job>,
    results: Receiver<JobResult>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns |workers| threads that score states with |estimator|.
    ///
    /// # Errors
    /// `InvalidConfig` if |workers| is zero, `SearchAborted` if a thread cannot be spawned.
    pub fn new(workers: usize, estimator: Arc<dyn DistanceEstimator>) -> Result<WorkerPool> {
        if workers == 0 {
            return Err(SolverError::InvalidConfig {
                msg: "worker pool needs at least one worker",
            });
        }
        let (job_tx, job_rx) = bounded::<Job>(CHANNEL_CAPACITY);
        let (result_tx, result_rx) = bounded::<JobResult>(CHANNEL_CAPACITY);

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let rx = job_rx.clone();
            let tx = result_tx.clone();
            let estimator = Arc::clone(&estimator);
            let handle = thread::Builder::new()
                .name(format!("reward-worker-{worker_id}"))
                .spawn(move || {
                    while let Ok(Job {
                        index,
                        state,
                        rotation,
                    }) = rx.recv()
                    {
                        let reward = catch_unwind(AssertUnwindSafe(|| {
                            estimator.reward(&state.apply_rotation(rotation))
                        }))
                        .map_err(|_| format!("worker {worker_id} panicked scoring {rotation}"));
                        if tx.send((index, reward)).is_err() {
                            break;
                        }
                    }
                })
                .map_err(|e| SolverError::SearchAborted {
                    reason: format!("could not spawn worker {worker_id}: {e}"),
                })?;
            handles.push(handle);
        }
        debug!("started {workers} reward workers");

        Ok(WorkerPool {
            jobs: job_tx,
            results: result_rx,
            handles,
        })
    }

    /// Number of worker threads still running.
    #[must_use]
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Closes the job queue and waits for every worker to finish. Any later `evaluate` fails
    /// with `SearchAborted`.
    pub fn shutdown(&mut self) {
        // Swapping in a sender whose receiver is already gone closes the real queue, which ends
        // every worker loop.
        let (closed, _) = bounded(0);
        drop(std::mem::replace(&mut self.jobs, closed));
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("reward worker exited abnormally");
            }
        }
    }

    /// Rewards of |state| turned by each of |rotations|, in the same order. Returns only once
    /// every job has reported back.
    ///
    /// # Errors
    /// `SearchAborted` if the queues close or a worker fails before the batch completes.
    pub fn evaluate(&self, state: &PuzzleState, rotations: &[Rotation]) -> Result<Vec<f64>> {
        let mut rewards = vec![0.0; rotations.len()];

        for (chunk_start, chunk) in (0..)
            .step_by(CHANNEL_CAPACITY)
            .zip(rotations.chunks(CHANNEL_CAPACITY))
        {
            for (offset, rotation) in chunk.iter().enumerate() {
                let job = Job {
                    index: chunk_start + offset,
                    state: state.clone(),
                    rotation: *rotation,
                };
                self.jobs.send(job).map_err(|_| SolverError::SearchAborted {
                    reason: "job queue closed".to_string(),
                })?;
            }
            // Drain the whole chunk even after a failure so no stale result leaks into the next
            // batch.
            let mut failure = None;
            for _ in 0..chunk.len() {
                let (index, reward) =
                    self.results.recv().map_err(|_| SolverError::SearchAborted {
                        reason: "result queue closed".to_string(),
                    })?;
                match reward {
                    Ok(reward) => rewards[index] = reward,
                    Err(reason) => {
                        warn!("{reason}");
                        failure.get_or_insert(reason);
                    }
                }
            }
            if let Some(reason) = failure {
                return Err(SolverError::SearchAborted { reason });
            }
        }
        Ok(rewards)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Where rewards come from during a search.
pub struct Evaluator {
    estimator: Arc<dyn DistanceEstimator>,
    pool: Option<WorkerPool>,
}

impl Evaluator {
    /// Scores every state on the calling thread.
    #[must_use]
    pub fn inline(estimator: Arc<dyn DistanceEstimator>) -> Evaluator {
        Evaluator {
            estimator,
            pool: None,
        }
    }

    /// Scores sibling batches on a pool of |workers| threads.
    ///
    /// # Errors
    /// See `WorkerPool::new`.
    pub fn pooled(estimator: Arc<dyn DistanceEstimator>, workers: usize) -> Result<Evaluator> {
        let pool = WorkerPool::new(workers, Arc::clone(&estimator))?;
        Ok(Evaluator {
            estimator,
            pool: Some(pool),
        })
    }

    /// Inline when |workers| is zero, pooled otherwise.
    ///
    /// # Errors
    /// See `WorkerPool::new`.
    pub fn with_workers(
        estimator: Arc<dyn DistanceEstimator>,
        workers: usize,
    ) -> Result<Evaluator> {
        if workers == 0 {
            Ok(Evaluator::inline(estimator))
        } else {
            Evaluator::pooled(estimator, workers)
        }
    }

    /// Worker threads in use; zero when inline.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.as_ref().map_or(0, WorkerPool::size)
    }

    /// Reward of a single state, always on the calling thread.
    #[must_use]
    pub fn reward(&self, state: &PuzzleState) -> f64 {
        self.estimator.reward(state)
    }

    /// Rewards of |state| turned by each of |rotations|.
    ///
    /// # Errors
    /// `SearchAborted` if pooled evaluation fails.
    pub fn rewards(&self, state: &PuzzleState, rotations: &[Rotation]) -> Result<Vec<f64>> {
        match &self.pool {
            Some(pool) => pool.evaluate(state, rotations),
            None => Ok(rotations
                .iter()
                .map(|r| self.estimator.reward(&state.apply_rotation(*r)))
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::{reward, Estimator};

    #[test]
    fn test_pool_matches_inline() {
        let state = PuzzleState::scrambled(&crate::moves::parse_move("R1 U2 F3").unwrap());
        let rotations = Rotation::possible_after(state.last_move());
        let inline = Evaluator::inline(Arc::new(Estimator::Composite));
        let pooled = Evaluator::pooled(Arc::new(Estimator::Composite), 4).unwrap();
        assert_eq!(4, pooled.workers());
        assert_eq!(0, inline.workers());

        let expected: Vec<f64> = rotations
            .iter()
            .map(|r| reward(&state.apply_rotation(*r)))
            .collect();
        assert_eq!(expected, inline.rewards(&state, &rotations).unwrap());
        assert_eq!(expected, pooled.rewards(&state, &rotations).unwrap());
    }

    #[test]
    fn test_pool_handles_large_batches() {
        let pool = WorkerPool::new(3, Arc::new(Estimator::Naive)).unwrap();
        let rotations: Vec<Rotation> = Rotation::all().iter().copied().cycle().take(200).collect();
        let rewards = pool.evaluate(&PuzzleState::solved(), &rotations).unwrap();
        assert_eq!(200, rewards.len());
        assert_eq!(rewards[0], rewards[18]);
        assert!(rewards.iter().all(|r| *r > 0.0 && *r < 1.0));
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(WorkerPool::new(0, Arc::new(Estimator::Composite)).is_err());
        assert_eq!(
            0,
            Evaluator::with_workers(Arc::new(Estimator::Composite), 0)
                .unwrap()
                .workers()
        );
    }

    #[test]
    fn test_panicking_estimator_aborts() {
        let estimator = |_: &PuzzleState| -> f64 { panic!("model unavailable") };
        let pool = WorkerPool::new(2, Arc::new(estimator)).unwrap();
        let result = pool.evaluate(&PuzzleState::solved(), &Rotation::possible_after(None));
        assert!(matches!(result, Err(SolverError::SearchAborted { .. })));
    }

    #[test]
    fn test_closed_queue_aborts() {
        let mut pool = WorkerPool::new(2, Arc::new(Estimator::Composite)).unwrap();
        let rotations = Rotation::possible_after(None);
        assert!(pool.evaluate(&PuzzleState::solved(), &rotations).is_ok());
        pool.shutdown();
        assert_eq!(0, pool.size());
        assert_eq!(
            Err(SolverError::SearchAborted {
                reason: "job queue closed".to_string()
            }),
            pool.evaluate(&PuzzleState::solved(), &rotations)
        );
    }
}
