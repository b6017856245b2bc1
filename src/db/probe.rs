use crate::db::postgres::{ConnectionSettings, connect};
use crate::error::NotesError;
use backon::{ExponentialBuilder, Retryable};
use sqlx::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

/// Bounded retry schedule for reaching the database server.
///
/// Delays start at `base_delay` and double up to `max_delay`; equal values
/// give a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub connect_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: usize,
        base_delay: Duration,
        max_delay: Duration,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
            connect_timeout,
        }
    }

    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }
}

/// Poll the maintenance database until a connection succeeds or the policy
/// is exhausted. Every failure is treated as transient.
pub async fn wait_for_database(settings: &ConnectionSettings, policy: &RetryPolicy) -> bool {
    let opts = settings.maintenance_options();
    let attempt = AtomicUsize::new(0);

    info!(
        host = %settings.host,
        port = settings.port,
        max_attempts = policy.max_attempts,
        "waiting for database"
    );

    let result = (|| async {
        attempt.fetch_add(1, Ordering::Relaxed);
        let conn = connect(&opts, policy.connect_timeout).await?;
        conn.close().await?;
        Ok::<(), NotesError>(())
    })
    .retry(policy.backoff())
    .notify(|err: &NotesError, dur: Duration| {
        warn!(
            attempt = attempt.load(Ordering::Relaxed),
            max_attempts = policy.max_attempts,
            error = %err,
            "database not reachable, retrying in {:?}",
            dur
        );
    })
    .await;

    match result {
        Ok(()) => {
            info!(
                attempts = attempt.load(Ordering::Relaxed),
                "database available"
            );
            true
        }
        Err(e) => {
            error!(
                attempts = attempt.load(Ordering::Relaxed),
                error = %e,
                "database unavailable after exhausting retries"
            );
            false
        }
    }
}
