//! Fetch, shuffle, bound, then visit one topic at a time.

use crate::candidates::{CandidatePool, CandidateSource, WorkItem};
use crate::error::ScheduleError;
use crate::pacing::Pacer;
use crate::visit::{VisitExecutor, VisitOutcome};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Items between two progress markers.
pub const PROGRESS_EVERY: usize = 25;

pub type VisitFuture<'a> = Pin<Box<dyn Future<Output = VisitOutcome> + Send + 'a>>;

/// Something that visits one work item and never fails outright.
pub trait Visitor: Send + Sync {
    fn visit<'a>(&'a self, item: &'a WorkItem) -> VisitFuture<'a>;
}

impl Visitor for VisitExecutor {
    fn visit<'a>(&'a self, item: &'a WorkItem) -> VisitFuture<'a> {
        Box::pin(VisitExecutor::visit(self, item))
    }
}

/// The shuffled, bounded subset of candidates actually visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    items: Vec<WorkItem>,
}

impl RunPlan {
    /// Dedups `candidates`, shuffles them and keeps at most `max_items`.
    pub fn draw(candidates: Vec<WorkItem>, max_items: usize, pacer: &Pacer) -> Self {
        let mut items = candidates.into_iter().collect::<CandidatePool>().into_items();
        pacer.shuffle(&mut items);
        items.truncate(max_items);
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub planned: usize,
    pub attempted: usize,
    pub succeeded: usize,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    fn record(&mut self, outcome: VisitOutcome) {
        self.attempted += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        }
    }
}

pub struct EngagementScheduler {
    source: CandidateSource,
    visitor: Arc<dyn Visitor>,
    pacer: Arc<Pacer>,
}

impl EngagementScheduler {
    pub fn new(source: CandidateSource, visitor: Arc<dyn Visitor>, pacer: Arc<Pacer>) -> Self {
        Self {
            source,
            visitor,
            pacer,
        }
    }

    /// Visits up to `max_items` topics, strictly one after another.
    ///
    /// `max_items == 0` is a no-op. A run with no candidates at all is an
    /// error; individual visit failures never abort the run.
    pub async fn run(&self, max_items: usize) -> Result<RunSummary, ScheduleError> {
        if max_items == 0 {
            tracing::info!("Topic limit is 0, skipping visits");
            return Ok(RunSummary::default());
        }

        let candidates = self.source.fetch(max_items).await?;
        if candidates.is_empty() {
            return Err(ScheduleError::NoCandidates);
        }

        let plan = RunPlan::draw(candidates, max_items, &self.pacer);
        let total = plan.len();
        tracing::info!(planned = total, "Planned topic visits");

        let mut summary = RunSummary {
            planned: total,
            ..RunSummary::default()
        };

        for (index, item) in plan.items().iter().enumerate() {
            let outcome = self.visitor.visit(item).await;
            summary.record(outcome);

            if !outcome.is_success() {
                let pause = self.pacer.backoff().await;
                tracing::debug!(url = item.url(), pause_secs = pause.as_secs_f64(), "Backed off");
            }
            self.pacer.topic_delay().await;

            let processed = index + 1;
            if processed % PROGRESS_EVERY == 0 {
                tracing::info!(processed, total, "Visit progress");
            }
        }

        tracing::info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed(),
            "Visits finished"
        );
        Ok(summary)
    }
}
