//! Poll orchestration for a bounded collection run.
//!
//! The collector calls a [`SensorSource`] a fixed number of times, strictly in
//! sequence, sleeping a fixed interval between calls, and keeps every outcome
//! in poll order.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::client::SensorSource;
use crate::config::Config;
use crate::model::PollOutcome;

/// How many polls to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Number of poll cycles
    pub count: u32,

    /// Delay after every poll except the last
    pub interval: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            count: 10,
            interval: Duration::from_secs(30),
        }
    }
}

impl PollSchedule {
    pub fn new(count: u32, interval: Duration) -> Self {
        Self { count, interval }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_count, config.poll_interval)
    }
}

/// Counts of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub polls: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Every outcome of a run, in poll order. Index `i` holds poll `i + 1`.
#[derive(Debug, Clone)]
pub struct Collection {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<PollOutcome>,
}

impl Collection {
    pub fn stats(&self) -> CollectionStats {
        let succeeded = self.outcomes.iter().filter(|o| o.is_success()).count();

        CollectionStats {
            polls: self.outcomes.len(),
            succeeded,
            failed: self.outcomes.len() - succeeded,
        }
    }

    /// Wall-clock time between the first poll starting and the last finishing.
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Run a full collection against `source`.
///
/// Polls are never overlapped: poll `i + 1` starts only after poll `i` has
/// returned and the interval has elapsed. No sleep follows the final poll.
pub async fn collect<S>(source: &S, schedule: PollSchedule) -> Collection
where
    S: SensorSource + ?Sized,
{
    let run_id = Uuid::new_v4();
    let span = info_span!("collection", run_id = %run_id);

    async move {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(schedule.count as usize);

        info!("Starting data collection...");

        for poll in 1..=schedule.count {
            info!("Making API call {}/{}...", poll, schedule.count);

            let outcome = source.poll().await;
            debug!(poll = poll, success = outcome.is_success(), "Poll finished");
            outcomes.push(outcome);

            if poll < schedule.count {
                tokio::time::sleep(schedule.interval).await;
            }
        }

        let collection = Collection {
            run_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        let stats = collection.stats();
        info!(
            polls = stats.polls,
            succeeded = stats.succeeded,
            failed = stats.failed,
            started_at = %collection.started_at.to_rfc3339(),
            finished_at = %collection.finished_at.to_rfc3339(),
            elapsed_secs = collection.elapsed().num_seconds(),
            "Polling finished"
        );

        collection
    }
    .instrument(span)
    .await
}
