//! Job awaiter
//!
//! Polls one or more asynchronous jobs until every one of them succeeds, any
//! of them fails, or a shared deadline passes.
//!
//! Per job the lifecycle is `SUBMITTED -> POLLING -> {SUCCEEDED | FAILED |
//! TIMED_OUT}`. A job seen in a terminal status is never polled again within
//! the same await.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use async_trait::async_trait;
use rackspace_core::domain::job::JobErrorDetail;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::config::{AwaitConfig, TransportErrorPolicy};
use crate::error::{AwaitError, ClientError, Result};

/// Classification of a single status snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Not terminal yet; poll again
    Pending,
    Succeeded,
    Failed(JobErrorDetail),
}

/// Source of job status snapshots
///
/// Implemented by anything that can report the status of a remote
/// asynchronous operation: Cloud DNS jobs, load balancer provisioning, or a
/// scripted fake in tests.
#[async_trait]
pub trait JobStatusProvider: Send + Sync {
    type Id: Clone + Eq + Hash + fmt::Display + Send + Sync;
    type Snapshot: Send;

    /// Fetches the current status of one job
    async fn fetch_status(&self, id: &Self::Id) -> Result<Self::Snapshot>;

    /// Fetches the status of several jobs
    ///
    /// The default fetches them one by one. Providers with a batch endpoint
    /// can override it; results must come back in the order of `ids`. A job
    /// with no corresponding result is treated as a failed poll.
    async fn fetch_statuses(&self, ids: &[Self::Id]) -> Vec<Result<Self::Snapshot>> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            results.push(self.fetch_status(id).await);
        }
        results
    }

    /// Decides whether a snapshot is terminal
    fn classify(&self, snapshot: &Self::Snapshot) -> JobState;
}

/// Waits for jobs to reach a terminal status
pub struct JobAwaiter<'a, P: JobStatusProvider + ?Sized> {
    provider: &'a P,
    config: AwaitConfig,
}

impl<'a, P: JobStatusProvider + ?Sized> JobAwaiter<'a, P> {
    pub fn new(provider: &'a P, config: AwaitConfig) -> Self {
        Self { provider, config }
    }

    /// Waits for a single job and returns its final snapshot
    pub async fn await_one(&self, id: P::Id) -> std::result::Result<P::Snapshot, AwaitError> {
        let mut snapshots = self.await_all(std::slice::from_ref(&id)).await?;
        // await_all returns exactly one snapshot per distinct id
        snapshots.pop().ok_or_else(|| AwaitError::Timeout {
            pending: vec![id.to_string()],
            waited: self.config.timeout,
        })
    }

    /// Waits until every job succeeds
    ///
    /// Duplicate ids are watched once. On success the final snapshots are
    /// returned in the order the ids were first given. Any job failure, the
    /// shared deadline, or a polling failure (under
    /// [`TransportErrorPolicy::Propagate`]) fails the whole await.
    pub async fn await_all(
        &self,
        ids: &[P::Id],
    ) -> std::result::Result<Vec<P::Snapshot>, AwaitError> {
        let mut seen = HashSet::new();
        let order: Vec<P::Id> = ids
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();

        let started = Instant::now();
        // No representable deadline means the timeout can never be reached
        let deadline = started.checked_add(self.config.timeout);
        let mut interval = self.config.poll_interval;
        let mut pending = order.clone();
        let mut finished: HashMap<P::Id, P::Snapshot> = HashMap::with_capacity(order.len());
        let mut round = 0u32;

        while !pending.is_empty() {
            round += 1;
            debug!("Poll round {}: {} job(s) pending", round, pending.len());

            let mut results = self.provider.fetch_statuses(&pending).await.into_iter();
            let mut still_pending = Vec::with_capacity(pending.len());

            for id in pending {
                let result = results
                    .next()
                    .unwrap_or_else(|| Err(ClientError::MissingStatus(id.to_string())));
                let snapshot = match result {
                    Ok(snapshot) => snapshot,
                    Err(err) => match self.config.transport_errors {
                        TransportErrorPolicy::Propagate => {
                            return Err(AwaitError::Transport {
                                job_id: id.to_string(),
                                source: err,
                            });
                        }
                        TransportErrorPolicy::RetryWithinDeadline => {
                            warn!("Failed to poll job {}, will retry: {}", id, err);
                            still_pending.push(id);
                            continue;
                        }
                    },
                };

                match self.provider.classify(&snapshot) {
                    JobState::Pending => still_pending.push(id),
                    JobState::Succeeded => {
                        info!("Job {} completed after {:?}", id, started.elapsed());
                        finished.insert(id, snapshot);
                    }
                    JobState::Failed(detail) => {
                        warn!("Job {} failed: {}", id, detail);
                        return Err(AwaitError::JobFailed {
                            job_id: id.to_string(),
                            detail,
                        });
                    }
                }
            }

            pending = still_pending;
            if pending.is_empty() {
                break;
            }

            let now = Instant::now();
            let delay = match deadline {
                Some(deadline) if now >= deadline => {
                    return Err(AwaitError::Timeout {
                        pending: pending.iter().map(ToString::to_string).collect(),
                        waited: now - started,
                    });
                }
                Some(deadline) => interval.min(deadline - now),
                None => interval,
            };

            sleep(delay).await;
            interval = self.config.next_interval(interval);
        }

        Ok(order
            .iter()
            .filter_map(|id| finished.remove(id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use rackspace_core::domain::job::JobStatus;

    use super::*;

    const INTERVAL: Duration = Duration::from_secs(1);

    /// Replays a fixed sequence of statuses per job; the last entry repeats
    struct ScriptedJobs {
        scripts: HashMap<&'static str, Vec<Option<JobStatus>>>,
        polls: Mutex<HashMap<&'static str, usize>>,
    }

    impl ScriptedJobs {
        fn new(scripts: &[(&'static str, Vec<Option<JobStatus>>)]) -> Self {
            Self {
                scripts: scripts.iter().cloned().collect(),
                polls: Mutex::new(HashMap::new()),
            }
        }

        fn polls(&self, id: &str) -> usize {
            self.polls.lock().unwrap().get(id).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl JobStatusProvider for ScriptedJobs {
        type Id = &'static str;
        type Snapshot = (&'static str, JobStatus);

        async fn fetch_status(&self, id: &Self::Id) -> Result<Self::Snapshot> {
            let n = {
                let mut polls = self.polls.lock().unwrap();
                let count = polls.entry(*id).or_insert(0);
                *count += 1;
                *count
            };
            let script = &self.scripts[id];
            let step = script[(n - 1).min(script.len() - 1)];
            // `None` scripts a transport failure
            step.map(|status| (*id, status))
                .ok_or_else(|| ClientError::api_error(503, "Service Unavailable"))
        }

        fn classify(&self, snapshot: &Self::Snapshot) -> JobState {
            match snapshot.1 {
                JobStatus::Completed => JobState::Succeeded,
                JobStatus::Error => JobState::Failed(JobErrorDetail {
                    code: Some(400),
                    message: Some(format!("{} rejected", snapshot.0)),
                    details: None,
                }),
                _ => JobState::Pending,
            }
        }
    }

    /// Batch lookup that only answers for the first id it is asked about
    struct FirstOnlyBatch(ScriptedJobs);

    #[async_trait]
    impl JobStatusProvider for FirstOnlyBatch {
        type Id = &'static str;
        type Snapshot = (&'static str, JobStatus);

        async fn fetch_status(&self, id: &Self::Id) -> Result<Self::Snapshot> {
            self.0.fetch_status(id).await
        }

        async fn fetch_statuses(&self, ids: &[Self::Id]) -> Vec<Result<Self::Snapshot>> {
            match ids.first() {
                Some(id) => vec![self.0.fetch_status(id).await],
                None => Vec::new(),
            }
        }

        fn classify(&self, snapshot: &Self::Snapshot) -> JobState {
            self.0.classify(snapshot)
        }
    }

    fn config(polls: u32) -> AwaitConfig {
        AwaitConfig::default()
            .with_poll_interval(INTERVAL)
            .with_timeout(INTERVAL * polls)
    }

    use JobStatus::{Completed, Error, Running};

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_poll() {
        let jobs = ScriptedJobs::new(&[("a", vec![Some(Running), Some(Running), Some(Completed)])]);
        let started = Instant::now();

        let snapshot = JobAwaiter::new(&jobs, config(5)).await_one("a").await.unwrap();

        assert_eq!(snapshot, ("a", Completed));
        assert_eq!(jobs.polls("a"), 3);
        assert_eq!(started.elapsed(), INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_success_is_a_timeout() {
        let jobs = ScriptedJobs::new(&[
            ("a", vec![Some(Completed)]),
            ("b", vec![Some(Running)]),
        ]);

        let err = JobAwaiter::new(&jobs, config(2))
            .await_all(&["a", "b"])
            .await
            .unwrap_err();

        match err {
            AwaitError::Timeout { pending, .. } => assert_eq!(pending, vec!["b".to_string()]),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(jobs.polls("a"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_stops_immediately() {
        let jobs = ScriptedJobs::new(&[("a", vec![Some(Error)])]);
        let started = Instant::now();

        let err = JobAwaiter::new(&jobs, config(5)).await_one("a").await.unwrap_err();

        match err {
            AwaitError::JobFailed { job_id, detail } => {
                assert_eq!(job_id, "a");
                assert_eq!(detail.message.as_deref(), Some("a rejected"));
            }
            other => panic!("expected job failure, got {:?}", other),
        }
        assert_eq!(jobs.polls("a"), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failure_fails_the_batch() {
        let jobs = ScriptedJobs::new(&[
            ("a", vec![Some(Running), Some(Completed)]),
            ("b", vec![Some(Running), Some(Error)]),
            ("c", vec![Some(Completed)]),
        ]);

        let err = JobAwaiter::new(&jobs, config(5))
            .await_all(&["a", "b", "c"])
            .await
            .unwrap_err();

        assert!(matches!(err, AwaitError::JobFailed { ref job_id, .. } if job_id == "b"));
        assert_eq!(jobs.polls("c"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_succeed_in_given_order() {
        let jobs = ScriptedJobs::new(&[
            ("a", vec![Some(Running), Some(Running), Some(Completed)]),
            ("b", vec![Some(Completed)]),
        ]);

        let snapshots = JobAwaiter::new(&jobs, config(5))
            .await_all(&["a", "b", "a"])
            .await
            .unwrap();

        assert_eq!(snapshots, vec![("a", Completed), ("b", Completed)]);
        assert_eq!(jobs.polls("a"), 3);
        assert_eq!(jobs.polls("b"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_never_overshoots_deadline() {
        let jobs = ScriptedJobs::new(&[("a", vec![Some(Running)])]);
        let config = AwaitConfig {
            poll_interval: Duration::from_secs(3),
            max_poll_interval: Duration::from_secs(3),
            timeout: Duration::from_secs(7),
            ..AwaitConfig::default()
        };
        let started = Instant::now();

        let err = JobAwaiter::new(&jobs, config).await_one("a").await.unwrap_err();

        assert!(err.is_timeout());
        // polls at 0s, 3s, 6s, then a last one clamped to the 7s deadline
        assert_eq!(started.elapsed(), Duration::from_secs(7));
        assert_eq!(jobs.polls("a"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_propagates_by_default() {
        let jobs = ScriptedJobs::new(&[("a", vec![None, Some(Completed)])]);

        let err = JobAwaiter::new(&jobs, config(5)).await_one("a").await.unwrap_err();

        match err {
            AwaitError::Transport { job_id, source } => {
                assert_eq!(job_id, "a");
                assert!(source.is_server_error());
            }
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(jobs.polls("a"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_retried_when_configured() {
        let jobs = ScriptedJobs::new(&[("a", vec![None, None, Some(Completed)])]);
        let config = AwaitConfig {
            transport_errors: TransportErrorPolicy::RetryWithinDeadline,
            ..config(5)
        };

        let snapshot = JobAwaiter::new(&jobs, config).await_one("a").await.unwrap();

        assert_eq!(snapshot.1, Completed);
        assert_eq!(jobs.polls("a"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retried_transport_errors_still_time_out() {
        let jobs = ScriptedJobs::new(&[("a", vec![None])]);
        let config = AwaitConfig {
            transport_errors: TransportErrorPolicy::RetryWithinDeadline,
            ..config(2)
        };

        let err = JobAwaiter::new(&jobs, config).await_one("a").await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_spaces_out_polls() {
        let jobs = ScriptedJobs::new(&[(
            "a",
            vec![Some(Running), Some(Running), Some(Running), Some(Completed)],
        )]);
        let config = AwaitConfig {
            poll_interval: Duration::from_secs(1),
            max_poll_interval: Duration::from_secs(3),
            backoff_multiplier: 2.0,
            timeout: Duration::from_secs(60),
            ..AwaitConfig::default()
        };
        let started = Instant::now();

        JobAwaiter::new(&jobs, config).await_one("a").await.unwrap();

        // sleeps of 1s, 2s, then capped at 3s
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_reads_are_stable() {
        let jobs = ScriptedJobs::new(&[("a", vec![Some(Completed)])]);
        let awaiter = JobAwaiter::new(&jobs, config(5));

        let first = awaiter.await_one("a").await.unwrap();
        let second = awaiter.await_one("a").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(jobs.polls("a"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_batch_result_is_a_transport_error() {
        let jobs = FirstOnlyBatch(ScriptedJobs::new(&[
            ("a", vec![Some(Completed)]),
            ("b", vec![Some(Completed)]),
        ]));

        let err = JobAwaiter::new(&jobs, config(5))
            .await_all(&["a", "b"])
            .await
            .unwrap_err();

        match err {
            AwaitError::Transport { job_id, source } => {
                assert_eq!(job_id, "b");
                assert!(matches!(source, ClientError::MissingStatus(ref id) if id == "b"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(jobs.0.polls("b"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_batch_result_is_polled_again_when_retrying() {
        let jobs = FirstOnlyBatch(ScriptedJobs::new(&[
            ("a", vec![Some(Completed)]),
            ("b", vec![Some(Completed)]),
        ]));
        let config = AwaitConfig {
            transport_errors: TransportErrorPolicy::RetryWithinDeadline,
            ..config(5)
        };

        let snapshots = JobAwaiter::new(&jobs, config)
            .await_all(&["a", "b"])
            .await
            .unwrap();

        assert_eq!(snapshots, vec![("a", Completed), ("b", Completed)]);
        assert_eq!(jobs.0.polls("b"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_deadline_does_not_panic() {
        let jobs = ScriptedJobs::new(&[("a", vec![Some(Running), Some(Completed)])]);
        let config = AwaitConfig::default()
            .with_poll_interval(INTERVAL)
            .with_timeout(Duration::MAX);
        let started = Instant::now();

        let snapshot = JobAwaiter::new(&jobs, config).await_one("a").await.unwrap();

        assert_eq!(snapshot, ("a", Completed));
        assert_eq!(started.elapsed(), INTERVAL);
    }
}
