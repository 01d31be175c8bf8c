//! Enrichment job orchestration.
//!
//! Drives one Surfe batch from submission to completion:
//! 1. Submit every contact as a single email-only batch
//! 2. Poll the callback URL at a fixed interval
//! 3. Stop on `COMPLETED`, on the first failed poll, when the poll budget
//!    runs out, or when the caller cancels
//!
//! Time is read and spent only through [`Clock`], so the loop can be driven
//! deterministically in tests.

use crate::errors::AppError;
use crate::models::{EnrichedContact, JobStatus, PollResponse, SourceContact};
use crate::surfe_client::SurfeClient;
use reqwest::StatusCode;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often to poll and when to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Maximum number of status requests. `None` means unbounded.
    pub max_polls: Option<u32>,
    /// Maximum time since submission. `None` means unbounded.
    pub max_elapsed: Option<Duration>,
}

impl PollPolicy {
    /// Fixed interval with no budget at all.
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_polls: None,
            max_elapsed: None,
        }
    }
}

/// Source of time for the poll loop.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Wall-clock time backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Shared flag a caller raises to stop the poll loop between iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Submitted,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobPhase::Submitted | JobPhase::Polling)
    }
}

/// State of one remote enrichment job. Lives only for one
/// [`submit_and_await`] call.
#[derive(Debug, Clone)]
pub struct EnrichmentJob {
    callback_url: String,
    phase: JobPhase,
    percent_completed: f64,
    status: Option<JobStatus>,
    polls: u32,
    started: Instant,
}

impl EnrichmentJob {
    pub fn new(callback_url: String, started: Instant) -> Self {
        Self {
            callback_url,
            phase: JobPhase::Submitted,
            percent_completed: 0.0,
            status: None,
            polls: 0,
            started,
        }
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn percent_completed(&self) -> f64 {
        self.percent_completed
    }

    pub fn status(&self) -> Option<&JobStatus> {
        self.status.as_ref()
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Refuses the next poll if the budget is spent.
    pub fn check_budget(&mut self, policy: &PollPolicy, now: Instant) -> Result<(), AppError> {
        let elapsed = now.saturating_duration_since(self.started);
        let polls_spent = policy.max_polls.is_some_and(|max| self.polls >= max);
        // The first poll is always allowed by the time budget.
        let time_spent =
            self.polls > 0 && policy.max_elapsed.is_some_and(|max| elapsed >= max);

        if polls_spent || time_spent {
            self.phase = JobPhase::TimedOut;
            return Err(AppError::PollingTimeout {
                polls: self.polls,
                elapsed,
            });
        }
        Ok(())
    }

    pub fn cancel(&mut self) -> AppError {
        self.phase = JobPhase::Cancelled;
        AppError::Cancelled { polls: self.polls }
    }

    /// Marks the job failed, passing the error through.
    pub fn fail(&mut self, err: AppError) -> AppError {
        self.phase = JobPhase::Failed;
        err
    }

    /// Applies one status response.
    ///
    /// Returns the enriched people once the job is `COMPLETED`.
    pub fn apply(
        &mut self,
        response: PollResponse,
    ) -> Result<Option<Vec<EnrichedContact>>, AppError> {
        self.polls += 1;
        self.phase = JobPhase::Polling;
        self.percent_completed = response.percent_completed;
        self.status = Some(response.status.clone());

        match response.status {
            JobStatus::Completed => match response.people {
                Some(people) => {
                    self.phase = JobPhase::Completed;
                    Ok(Some(people))
                }
                None => Err(self.fail(AppError::MalformedResponse {
                    context: "completed status response (expected people)".to_string(),
                    body: response.raw,
                })),
            },
            JobStatus::Failed => Err(self.fail(AppError::Polling {
                status: StatusCode::OK,
                body: response.raw,
            })),
            _ => Ok(None),
        }
    }
}

/// Submits `records` for enrichment and waits for the job to complete.
///
/// Failures are never retried; any error aborts the whole batch.
pub async fn submit_and_await<C: Clock>(
    client: &SurfeClient,
    records: &[SourceContact],
    policy: &PollPolicy,
    clock: &C,
    cancel: &CancelFlag,
) -> Result<Vec<EnrichedContact>, AppError> {
    if cancel.is_cancelled() {
        return Err(AppError::Cancelled { polls: 0 });
    }

    let callback_url = client.submit(records).await?;
    tracing::info!("✓ Successfully submitted {} contacts", records.len());

    let mut job = EnrichmentJob::new(callback_url, clock.now());

    loop {
        if cancel.is_cancelled() {
            let err = job.cancel();
            tracing::warn!("{}", err);
            return Err(err);
        }

        if let Err(err) = job.check_budget(policy, clock.now()) {
            tracing::error!("{}", err);
            return Err(err);
        }

        let response = match client.poll(job.callback_url()).await {
            Ok(response) => response,
            Err(err) => return Err(job.fail(err)),
        };

        if let Some(people) = job.apply(response)? {
            tracing::info!("Percent completed: {}%", job.percent_completed());
            tracing::info!(
                "✓ Enrichment completed after {} polls: {} people returned",
                job.polls(),
                people.len()
            );
            return Ok(people);
        }

        tracing::info!("Percent completed: {}%", job.percent_completed());
        clock.sleep(policy.interval).await;
    }
}
