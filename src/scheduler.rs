//! Batched, throttled execution of per-feed tasks.
//!
//! Tasks run in consecutive groups of `batch_size`. A group's tasks run
//! concurrently on the current task (no spawning), the whole group is awaited,
//! and the scheduler then sleeps for `inter_batch_delay` before starting the
//! next group. No sleep follows the last group.

use crate::config::PipelineConfig;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct BatchScheduler {
    batch_size: usize,
    inter_batch_delay: Duration,
}

impl BatchScheduler {
    pub fn new(batch_size: usize, inter_batch_delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            inter_batch_delay,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.batch_size, config.inter_batch_delay())
    }

    /// Number of groups `task_count` tasks are split into.
    pub fn batch_count(&self, task_count: usize) -> usize {
        task_count.div_ceil(self.batch_size)
    }

    /// Run `per_task` over every task and collect the outputs.
    ///
    /// Outputs come back in completion order: groups in sequence, and within
    /// a group whichever task finished first. `per_task` is expected to handle
    /// its own failures; the scheduler never aborts a group.
    #[instrument(level = "info", skip_all, fields(tasks = tasks.len(), batch_size = self.batch_size))]
    pub async fn run<T, R, F, Fut>(&self, tasks: Vec<T>, per_task: F) -> Vec<R>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        let total_batches = self.batch_count(tasks.len());
        let mut results = Vec::with_capacity(tasks.len());
        let mut remaining = tasks.into_iter().peekable();
        let mut batch_index = 0;

        while remaining.peek().is_some() {
            let batch: Vec<T> = remaining.by_ref().take(self.batch_size).collect();
            batch_index += 1;
            let size = batch.len();
            debug!(batch = batch_index, of = total_batches, size, "Starting batch");

            let outputs: Vec<R> = stream::iter(batch)
                .map(&per_task)
                .buffer_unordered(size)
                .collect()
                .await;
            results.extend(outputs);

            if remaining.peek().is_some() {
                debug!(delay = ?self.inter_batch_delay, "Pausing between batches");
                tokio::time::sleep(self.inter_batch_delay).await;
            }
        }

        info!(batches = total_batches, results = results.len(), "All batches completed");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_seven_tasks_in_three_batches_with_two_delays() {
        let scheduler = BatchScheduler::new(3, Duration::from_millis(500));
        let starts: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        let t0 = Instant::now();

        let results = scheduler
            .run((0..7).collect::<Vec<u32>>(), |i| {
                let starts = Arc::clone(&starts);
                async move {
                    starts.lock().unwrap().push(Instant::now());
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    i
                }
            })
            .await;

        let mut sorted = results.clone();
        sorted.sort();
        assert_eq!(sorted, (0..7).collect::<Vec<u32>>());

        let starts = starts.lock().unwrap().clone();
        let mut groups: Vec<(Duration, usize)> = Vec::new();
        for start in starts {
            let offset = start - t0;
            match groups.last_mut() {
                Some((at, n)) if *at == offset => *n += 1,
                _ => groups.push((offset, 1)),
            }
        }
        assert_eq!(
            groups,
            vec![
                (Duration::ZERO, 3),
                (Duration::from_millis(600), 3),
                (Duration::from_millis(1200), 1),
            ]
        );
        assert_eq!(t0.elapsed(), Duration::from_millis(1300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_never_exceeds_batch_size() {
        let scheduler = BatchScheduler::new(2, Duration::from_millis(10));
        let state = Arc::new(Mutex::new((0usize, 0usize)));

        scheduler
            .run((0..5).collect::<Vec<u64>>(), |i| {
                let state = Arc::clone(&state);
                async move {
                    {
                        let mut s = state.lock().unwrap();
                        s.0 += 1;
                        s.1 = s.1.max(s.0);
                    }
                    tokio::time::sleep(Duration::from_millis(5 + i)).await;
                    state.lock().unwrap().0 -= 1;
                }
            })
            .await;

        assert_eq!(state.lock().unwrap().1, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_batch_has_no_delay() {
        let scheduler = BatchScheduler::new(4, Duration::from_secs(60));
        let t0 = Instant::now();
        let results = scheduler.run(vec![1, 2, 3], |i| async move { i * 2 }).await;
        assert_eq!(results.len(), 3);
        assert_eq!(t0.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_no_tasks() {
        let scheduler = BatchScheduler::new(3, Duration::from_millis(500));
        let results: Vec<u8> = scheduler.run(Vec::<u8>::new(), |i| async move { i }).await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_batch_count() {
        let scheduler = BatchScheduler::new(3, Duration::ZERO);
        assert_eq!(scheduler.batch_count(7), 3);
        assert_eq!(scheduler.batch_count(6), 2);
        assert_eq!(scheduler.batch_count(0), 0);
        assert_eq!(BatchScheduler::new(0, Duration::ZERO).batch_count(2), 2);
    }
}
