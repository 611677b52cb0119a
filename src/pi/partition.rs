use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread;

use tracing::{debug, info};

use crate::errors::PiError;
use crate::pi::rational::Rational;
use crate::pi::series::{self, TermRange};
use crate::worker_pool::{current_worker_tid, ThreadPool};

/// Worker count for `total_terms`: the override if given, else the available
/// parallelism, clamped to `[1, total_terms]`.
pub fn worker_count(total_terms: u64, requested: Option<usize>) -> usize {
    let wanted = requested
        .filter(|w| *w > 0)
        .unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
    let cap = usize::try_from(total_terms).unwrap_or(usize::MAX).max(1);
    wanted.clamp(1, cap)
}

/// Splits `[0, total_terms]` into at most `workers` contiguous, non-empty ranges
/// of `ceil(total_terms / workers)` indices; the last range runs through
/// `total_terms` itself.
pub fn partition(total_terms: u64, workers: usize) -> Result<Vec<TermRange>, PiError> {
    if total_terms == 0 {
        return Err(PiError::DegenerateInput("total term count must be positive".into()));
    }
    if workers == 0 {
        return Err(PiError::DegenerateInput("worker count must be positive".into()));
    }

    let w = (workers as u64).min(total_terms);
    let chunk = total_terms.div_ceil(w);
    let starts: Vec<u64> = (0..w).map(|i| i * chunk).take_while(|s| *s <= total_terms).collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = match starts.get(i + 1) {
                Some(next) => next - 1,
                None => total_terms,
            };
            TermRange::new(start, end)
        })
        .collect()
}

/// Runs `eval` for every range on `pool` and waits for all of them.
///
/// Results come back in partition order no matter which worker finishes
/// first. The first failed range (by partition index) is reported.
pub fn evaluate_ranges<F>(pool: &ThreadPool, ranges: &[TermRange], eval: F) -> Result<Vec<Rational>, PiError>
where
    F: Fn(TermRange) -> Result<Rational, PiError> + Send + Sync + 'static,
{
    let eval = Arc::new(eval);
    let (tx, rx) = mpsc::channel::<(usize, Result<Rational, PiError>)>();

    for (idx, &range) in ranges.iter().enumerate() {
        let tx = tx.clone();
        let eval = Arc::clone(&eval);
        pool.execute(move || {
            debug!(range = %range, tid = ?current_worker_tid(), "evaluating terms");
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (*eval)(range)))
                .unwrap_or_else(|payload| {
                    Err(PiError::WorkerFailure { range, reason: panic_reason(payload.as_ref()) })
                });
            let _ = tx.send((idx, outcome));
        })?;
    }
    drop(tx);

    // barrier: the channel closes once every job has reported or been dropped
    let mut slots: Vec<Option<Result<Rational, PiError>>> = ranges.iter().map(|_| None).collect();
    for (idx, outcome) in rx.iter() {
        slots[idx] = Some(outcome);
    }

    debug!(
        pool = pool.name(),
        total = pool.total_workers(),
        active = pool.active_workers(),
        workers = ?pool.per_worker_snapshots(),
        "all partitions returned"
    );

    slots
        .into_iter()
        .zip(ranges)
        .map(|(slot, &range)| match slot {
            Some(Ok(sum)) => Ok(sum),
            Some(Err(PiError::WorkerFailure { range, reason })) => Err(PiError::WorkerFailure { range, reason }),
            Some(Err(err)) => Err(PiError::RangeFailed { range, source: Box::new(err) }),
            None => Err(PiError::WorkerFailure {
                range,
                reason: "worker terminated without producing a result".into(),
            }),
        })
        .collect()
}

/// Folds partial sums left to right with exact addition.
pub fn merge_in_order(parts: Vec<Rational>) -> Result<Rational, PiError> {
    let mut iter = parts.into_iter();
    let mut total = iter
        .next()
        .ok_or_else(|| PiError::DegenerateInput("no partial sums to merge".into()))?;
    for part in iter {
        total.merge(&part);
    }
    Ok(total)
}

/// Sum of terms `0..=total_terms` computed on a dedicated pool.
/// Returns the sum and the number of workers used.
pub fn parallel_series_sum(total_terms: u64, workers: usize) -> Result<(Rational, usize), PiError> {
    let ranges = partition(total_terms, workers)?;
    let pool = ThreadPool::new("chudnovsky", ranges.len())?;

    info!(ranges = ranges.len(), total_terms, "dispatching series partitions");
    let parts = evaluate_ranges(&pool, &ranges, series::accumulate)?;

    info!("merging {} partial sums", parts.len());
    let sum = merge_in_order(parts)?;
    Ok((sum, ranges.len()))
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}
