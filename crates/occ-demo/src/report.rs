//! Final state reporting.

use std::fmt;

use occ_demo_core::{Resource, UpdateMode, WorkerStats};
use serde::Serialize;

/// Summary of a run: the record as read after every worker joined, plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct FinalReport {
    /// Mode the workers ran in.
    pub mode: UpdateMode,

    /// Per-worker statistics, in spawn order.
    pub workers: Vec<WorkerStats>,

    /// The record read after the run.
    pub resource: Resource,

    /// Counter value read before the run, if the read succeeded.
    pub initial_num_calls: Option<u64>,

    /// Sum of committed writes across workers.
    pub total_writes: u64,

    /// Sum of failed attempts across workers.
    pub total_errors: u64,

    /// Commits whose effect is missing from the final counter.
    pub lost_updates: Option<u64>,
}

impl FinalReport {
    /// Build a report from the run's stats and the final record.
    #[must_use]
    pub fn new(
        mode: UpdateMode,
        workers: Vec<WorkerStats>,
        resource: Resource,
        initial_num_calls: Option<u64>,
    ) -> Self {
        let total_writes: u64 = workers.iter().map(|w| w.writes).sum();
        let total_errors: u64 = workers.iter().map(WorkerStats::errors).sum();
        let lost_updates = initial_num_calls.map(|initial| {
            let applied = resource.num_calls.saturating_sub(initial);
            total_writes.saturating_sub(applied)
        });

        Self {
            mode,
            workers,
            resource,
            initial_num_calls,
            total_writes,
            total_errors,
            lost_updates,
        }
    }

    /// Counter value expected if every commit took effect.
    #[must_use]
    pub fn expected_num_calls(&self) -> Option<u64> {
        self.initial_num_calls
            .map(|initial| initial.saturating_add(self.total_writes))
    }
}

impl fmt::Display for FinalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for worker in &self.workers {
            writeln!(f, "{worker}")?;
        }
        writeln!(f, "Final state:")?;
        writeln!(f, "ResourceID:   {}", self.resource.resource_id)?;
        writeln!(f, "AccountID:    {}", self.resource.account_id)?;
        writeln!(f, "Status:       {}", self.resource.status)?;
        writeln!(f, "Num calls:    {}", self.resource.num_calls)?;
        writeln!(f, "Mode:         {}", self.mode)?;
        writeln!(f, "Total writes: {}", self.total_writes)?;
        write!(f, "Total errors: {}", self.total_errors)?;
        if let (Some(expected), Some(lost)) = (self.expected_num_calls(), self.lost_updates) {
            write!(f, "\nExpected:     {expected}\nLost updates: {lost}")?;
        }
        Ok(())
    }
}
