//! Per-phase outcome accumulator (spec §7). Nothing except a configuration
//! error or an unwritable output directory aborts a run; every other failure
//! is folded into a `PhaseStats` and reported at the end.

use serde::Serialize;

const MAX_SAMPLED_ERRORS: usize = 10;

#[derive(Debug, Default, Clone, Serialize)]
pub struct PhaseStats {
    pub phase: String,
    pub total: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub failed: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Skipped,
    Failed,
}

impl PhaseStats {
    pub fn new(phase: impl Into<String>) -> Self {
        PhaseStats {
            phase: phase.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.record(Outcome::Failed);
        if self.errors.len() < MAX_SAMPLED_ERRORS {
            self.errors.push(message.into());
        }
    }

    pub fn merge(&mut self, other: PhaseStats) {
        self.total += other.total;
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.failed += other.failed;
        for err in other.errors {
            if self.errors.len() < MAX_SAMPLED_ERRORS {
                self.errors.push(err);
            }
        }
    }
}

/// All phase stats for one run; the process exit code is nonzero iff any
/// phase has `failed > 0`.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunStats {
    pub phases: Vec<PhaseStats>,
}

impl RunStats {
    pub fn push(&mut self, stats: PhaseStats) {
        self.phases.push(stats);
    }

    pub fn any_failed(&self) -> bool {
        self.phases.iter().any(|p| p.failed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_sampled_errors() {
        let mut stats = PhaseStats::new("products");
        for i in 0..20 {
            stats.record_failure(format!("err {i}"));
        }
        assert_eq!(stats.failed, 20);
        assert_eq!(stats.errors.len(), MAX_SAMPLED_ERRORS);
    }

    #[test]
    fn run_fails_if_any_phase_failed() {
        let mut run = RunStats::default();
        run.push(PhaseStats::new("a"));
        let mut failing = PhaseStats::new("b");
        failing.record_failure("boom");
        run.push(failing);
        assert!(run.any_failed());
    }
}
