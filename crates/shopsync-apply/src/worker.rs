//! Bounded-concurrency fan-out within one phase (spec §5 "Fan-out within a
//! phase... suggested 4-8"). Workers pull from a queue of prepared items;
//! failures are folded into the phase's `PhaseStats`, never raised.

use futures::stream::{self, StreamExt};
use shopsync_core::stats::{Outcome, PhaseStats};
use std::future::Future;

pub const DEFAULT_CONCURRENCY: usize = 6;

pub enum WorkOutcome {
    Created,
    Updated,
    Skipped,
    Failed(String),
}

pub async fn run_phase<T, Fut>(
    phase_name: impl Into<String>,
    items: Vec<T>,
    concurrency: usize,
    work: impl Fn(T) -> Fut,
) -> PhaseStats
where
    Fut: Future<Output = WorkOutcome>,
{
    let mut stats = PhaseStats::new(phase_name);
    let outcomes: Vec<WorkOutcome> = stream::iter(items)
        .map(work)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    for outcome in outcomes {
        match outcome {
            WorkOutcome::Created => stats.record(Outcome::Created),
            WorkOutcome::Updated => stats.record(Outcome::Updated),
            WorkOutcome::Skipped => stats.record(Outcome::Skipped),
            WorkOutcome::Failed(message) => stats.record_failure(message),
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn folds_mixed_outcomes_into_stats() {
        let items = vec![1, 2, 3, 4];
        let stats = run_phase("t", items, 2, |i| async move {
            if i % 2 == 0 {
                WorkOutcome::Created
            } else {
                WorkOutcome::Failed(format!("bad item {i}"))
            }
        })
        .await;

        assert_eq!(stats.total, 4);
        assert_eq!(stats.created, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.errors.len(), 2);
    }
}
