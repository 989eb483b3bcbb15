//! Sequence parallelizer: fan frames out across blocking worker tasks and
//! join them under a bounded wait.
//!
//! Frames are moved by value into the worker that owns their partition and
//! moved back with their index, so no two workers ever touch the same slot
//! and no lock guards the sequence.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::error::{PipelineError, PipelineResult};

/// Items after processing, plus how many worker tasks did the work.
#[derive(Debug)]
pub struct Parallelized<T> {
    pub items: Vec<T>,
    /// Zero when the single item was processed on the calling task.
    pub workers: usize,
}

/// Split `len` indices into contiguous ranges, one per worker, with at most
/// `workers` ranges of `ceil(len / workers)` indices each. Trailing ranges
/// that would be empty are dropped.
pub fn plan_partitions(len: usize, workers: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, len);
    let per_worker = len.div_ceil(workers);
    (0..workers)
        .map(|w| (w * per_worker).min(len)..((w + 1) * per_worker).min(len))
        .filter(|range| !range.is_empty())
        .collect()
}

/// Apply `work` to every item, replacing it with the result.
///
/// - no items: `InvalidInput`
/// - one item: processed inline on the calling task
/// - more: partitioned with [`plan_partitions`], one `spawn_blocking` task
///   per partition draining its range in order
///
/// The join is bounded by `limit`. A timeout, a failing item or a panicking
/// worker fails the whole call; workers still running are abandoned and
/// their results dropped.
pub async fn run_partitioned<T, F>(
    items: Vec<T>,
    workers: usize,
    limit: Duration,
    work: F,
) -> PipelineResult<Parallelized<T>>
where
    T: Send + 'static,
    F: Fn(usize, T) -> PipelineResult<T> + Send + Sync + 'static,
{
    let total = items.len();
    match total {
        0 => {
            return Err(PipelineError::InvalidInput("Empty sequence".to_string()));
        }
        1 => {
            let item = items.into_iter().next().ok_or_else(|| {
                PipelineError::InvalidInput("Empty sequence".to_string())
            })?;
            return Ok(Parallelized {
                items: vec![work(0, item)?],
                workers: 0,
            });
        }
        _ => {}
    }

    let partitions = plan_partitions(total, workers);
    tracing::debug!(
        "Processing {} frames in {} workers ({} frames per worker)",
        total,
        partitions.len(),
        partitions.first().map(|r| r.len()).unwrap_or(0)
    );

    let work = Arc::new(work);
    let remaining = Arc::new(AtomicUsize::new(total));
    let mut items = items.into_iter().enumerate();
    let mut handles: Vec<JoinHandle<PipelineResult<Vec<(usize, T)>>>> =
        Vec::with_capacity(partitions.len());

    for (worker, range) in partitions.iter().enumerate() {
        let queue: Vec<(usize, T)> = items.by_ref().take(range.len()).collect();
        let work = Arc::clone(&work);
        let remaining = Arc::clone(&remaining);
        handles.push(tokio::task::spawn_blocking(move || {
            let mut done = Vec::with_capacity(queue.len());
            for (index, item) in queue {
                tracing::trace!(
                    "Worker {}: processing frame {} ({} remaining)",
                    worker,
                    index,
                    remaining.load(Ordering::Relaxed)
                );
                done.push((index, work(index, item)?));
                remaining.fetch_sub(1, Ordering::Relaxed);
            }
            Ok(done)
        }));
    }

    let worker_count = handles.len();
    let joined = timeout(limit, async move {
        let mut results = Vec::with_capacity(worker_count);
        for handle in handles {
            results.push(handle.await);
        }
        results
    })
    .await;

    let results = match joined {
        Ok(results) => results,
        Err(_) => {
            tracing::warn!(
                "Sequence timed out after {:?} with {} of {} frames unfinished",
                limit,
                remaining.load(Ordering::Relaxed),
                total
            );
            return Err(PipelineError::ProcessingTimeout {
                frames: total,
                timeout_secs: limit.as_secs(),
            });
        }
    };

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
    for result in results {
        match result {
            Ok(Ok(done)) => {
                for (index, item) in done {
                    slots[index] = Some(item);
                }
            }
            Ok(Err(e)) => return Err(e),
            Err(e) => {
                return Err(PipelineError::transform(
                    "worker",
                    format!("Task join error: {}", e),
                ))
            }
        }
    }

    let items = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                PipelineError::transform("worker", format!("frame {index} was not returned"))
            })
        })
        .collect::<PipelineResult<Vec<T>>>()?;

    Ok(Parallelized {
        items,
        workers: worker_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Mutex;
    use std::thread::ThreadId;

    #[test]
    fn test_plan_nine_frames_four_workers() {
        let plan = plan_partitions(9, 4);
        assert_eq!(plan, vec![0..3, 3..6, 6..9]);
    }

    #[test]
    fn test_plan_more_workers_than_frames() {
        assert_eq!(plan_partitions(2, 8), vec![0..1, 1..2]);
        assert!(plan_partitions(0, 4).is_empty());
        assert_eq!(plan_partitions(5, 0), vec![0..5]);
    }

    proptest! {
        #[test]
        fn prop_partitions_cover_every_index_once(len in 1usize..200, workers in 1usize..32) {
            let plan = plan_partitions(len, workers);
            prop_assert!(plan.len() <= workers.min(len));
            let mut next = 0;
            for range in &plan {
                prop_assert_eq!(range.start, next);
                prop_assert!(!range.is_empty());
                next = range.end;
            }
            prop_assert_eq!(next, len);
        }
    }

    #[tokio::test]
    async fn test_empty_sequence_is_invalid() {
        let result = run_partitioned(Vec::<u32>::new(), 4, Duration::from_secs(1), |_, v| Ok(v)).await;
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_single_item_runs_inline() {
        let caller = std::thread::current().id();
        let seen: Arc<Mutex<Vec<ThreadId>>> = Arc::default();
        let record = Arc::clone(&seen);
        let out = run_partitioned(vec![1u32], 4, Duration::from_secs(1), move |_, v| {
            record.lock().unwrap().push(std::thread::current().id());
            Ok(v * 10)
        })
        .await
        .unwrap();
        assert_eq!(out.items, vec![10]);
        assert_eq!(out.workers, 0);
        assert_eq!(*seen.lock().unwrap(), vec![caller]);
    }

    #[tokio::test]
    async fn test_results_reassembled_in_order() {
        let items: Vec<u32> = (0..9).collect();
        let out = run_partitioned(items, 4, Duration::from_secs(5), |index, v| {
            assert_eq!(index as u32, v);
            Ok(v * 2)
        })
        .await
        .unwrap();
        assert_eq!(out.items, (0..9).map(|v| v * 2).collect::<Vec<_>>());
        assert_eq!(out.workers, 3);
    }

    #[tokio::test]
    async fn test_multiple_items_leave_calling_thread() {
        let caller = std::thread::current().id();
        let seen: Arc<Mutex<Vec<ThreadId>>> = Arc::default();
        let record = Arc::clone(&seen);
        run_partitioned(vec![0u8; 4], 2, Duration::from_secs(5), move |_, v| {
            record.lock().unwrap().push(std::thread::current().id());
            Ok(v)
        })
        .await
        .unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.iter().all(|id| *id != caller));
    }

    #[tokio::test]
    async fn test_one_failing_item_fails_all() {
        let result = run_partitioned((0..6).collect::<Vec<u32>>(), 3, Duration::from_secs(5), |_, v| {
            if v == 4 {
                Err(PipelineError::transform("test", "bad frame"))
            } else {
                Ok(v)
            }
        })
        .await;
        assert!(matches!(result, Err(PipelineError::TransformFailure { .. })));
    }

    #[tokio::test]
    async fn test_panicking_worker_is_transform_failure() {
        let result = run_partitioned(vec![0u32, 1], 2, Duration::from_secs(5), |_, v| {
            if v == 1 {
                panic!("worker blew up");
            }
            Ok(v)
        })
        .await;
        assert!(matches!(
            result,
            Err(PipelineError::TransformFailure { ref stage, .. }) if stage == "worker"
        ));
    }

    #[tokio::test]
    async fn test_slow_workers_time_out() {
        let result = run_partitioned(vec![0u32; 2], 2, Duration::from_millis(50), |_, v| {
            std::thread::sleep(Duration::from_millis(500));
            Ok(v)
        })
        .await;
        assert!(matches!(
            result,
            Err(PipelineError::ProcessingTimeout { frames: 2, .. })
        ));
    }
}
