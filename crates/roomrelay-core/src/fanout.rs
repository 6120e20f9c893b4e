use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rand::Rng;
use roomrelay_models::subscription::Subscription;
use tokio::sync::{Mutex, Semaphore};

use crate::platform::{PlatformClient, PlatformError};

/// Per-`(guild_id, channel_id)` mutexes. Holding the mutex for a target
/// across its send call, in combination with the coordinator processing
/// inbound events in arrival order, is what preserves the per-target FIFO
/// guarantee across separate fan-out invocations: `tokio::sync::Mutex`
/// queues waiters in the order they start waiting.
#[derive(Clone, Default)]
pub struct TargetLocks {
    locks: Arc<DashMap<(i64, i64), Arc<Mutex<()>>>>,
}

impl TargetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, guild_id: i64, channel_id: i64) -> Arc<Mutex<()>> {
        self.locks
            .entry((guild_id, channel_id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FanOutOutcome {
    pub delivered_count: i64,
    pub failed_count: i64,
}

pub struct FanOutReport {
    pub outcome: FanOutOutcome,
    /// Targets whose delivery failed with a *permanent* platform error
    /// (channel deleted, forbidden, bot expelled) and must be deactivated by
    /// the caller, which owns the Store handle. A transient failure that
    /// exhausts its retry budget counts toward `failed_count` only — the
    /// subscription stays active, per §4.8(3).
    pub permanently_failed: Vec<Subscription>,
}

/// Terminal outcome of `deliver_with_retry`: either the retry budget ran out
/// on a transient error, or the platform reported the failure as permanent
/// outright (no retry attempted).
enum DeliveryFailure {
    TransientExhausted,
    Permanent,
}

/// Dispatches one delivery task per target with a bounded per-room
/// concurrency cap, retrying transient failures with exponential backoff
/// and jitter up to `max_attempts` tries before demoting to permanent.
pub async fn fan_out<P, F>(
    platform: &P,
    locks: &TargetLocks,
    targets: &[Subscription],
    concurrency: usize,
    max_attempts: u32,
    envelope_for: F,
) -> FanOutReport
where
    P: PlatformClient,
    F: Fn(&Subscription) -> String,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::with_capacity(targets.len());

    for target in targets {
        let permits = semaphore.clone();
        let lock = locks.lock_for(target.guild_id, target.channel_id);
        let envelope_text = envelope_for(target);
        tasks.push(async move {
            let _permit = permits.acquire_owned().await.expect("semaphore never closes");
            let _guard = lock.lock().await;
            deliver_with_retry(platform, target.channel_id, &envelope_text, max_attempts).await
        });
    }

    let results = futures::future::join_all(tasks).await;

    let mut outcome = FanOutOutcome::default();
    let mut permanently_failed = Vec::new();
    for (target, result) in targets.iter().zip(results) {
        match result {
            Ok(()) => outcome.delivered_count += 1,
            Err(DeliveryFailure::TransientExhausted) => {
                outcome.failed_count += 1;
            }
            Err(DeliveryFailure::Permanent) => {
                outcome.failed_count += 1;
                permanently_failed.push(target.clone());
            }
        }
    }

    FanOutReport {
        outcome,
        permanently_failed,
    }
}

async fn deliver_with_retry<P: PlatformClient>(
    platform: &P,
    channel_id: i64,
    envelope_text: &str,
    max_attempts: u32,
) -> Result<(), DeliveryFailure> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match platform.send_message(channel_id, envelope_text).await {
            Ok(_) => return Ok(()),
            Err(err) if err.is_transient() && attempt < max_attempts.max(1) => {
                let backoff_ms = 50u64 * 2u64.saturating_pow(attempt - 1);
                let jitter_ms = rand::thread_rng().gen_range(0..50);
                tokio::time::sleep(Duration::from_millis(backoff_ms + jitter_ms)).await;
            }
            Err(PlatformError::Transient(_)) => return Err(DeliveryFailure::TransientExhausted),
            Err(PlatformError::Permanent(_)) => return Err(DeliveryFailure::Permanent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatformClient;
    use chrono::Utc;

    fn target(guild_id: i64, channel_id: i64) -> Subscription {
        Subscription {
            id: channel_id,
            room_id: 1,
            guild_id,
            channel_id,
            guild_name: format!("Guild {guild_id}"),
            channel_name: format!("chan-{channel_id}"),
            registered_by: 1,
            registered_at: Utc::now(),
            is_active: true,
            last_message_at: None,
        }
    }

    #[tokio::test]
    async fn delivers_to_every_target_and_counts_none_failed() {
        let platform = MockPlatformClient::new();
        let locks = TargetLocks::new();
        let targets = vec![target(2, 20), target(3, 30)];
        let report = fan_out(&platform, &locks, &targets, 32, 3, |_| "hi".to_string()).await;
        assert_eq!(report.outcome.delivered_count, 2);
        assert_eq!(report.outcome.failed_count, 0);
        assert!(report.permanently_failed.is_empty());
        assert_eq!(platform.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried_and_is_reported() {
        let platform = MockPlatformClient::new();
        *platform.fail_sends_for_channel.lock().unwrap() = Some(30);
        let locks = TargetLocks::new();
        let targets = vec![target(2, 20), target(3, 30)];
        let report = fan_out(&platform, &locks, &targets, 32, 3, |_| "hi".to_string()).await;
        assert_eq!(report.outcome.delivered_count, 1);
        assert_eq!(report.outcome.failed_count, 1);
        assert_eq!(report.permanently_failed.len(), 1);
        assert_eq!(report.permanently_failed[0].channel_id, 30);
    }

    #[tokio::test]
    async fn transient_failure_exhausting_retries_counts_failed_but_stays_active() {
        let platform = MockPlatformClient::new();
        platform.transient_failures.lock().unwrap().insert(30, 3);
        let locks = TargetLocks::new();
        let targets = vec![target(2, 20), target(3, 30)];
        let report = fan_out(&platform, &locks, &targets, 32, 3, |_| "hi".to_string()).await;
        assert_eq!(report.outcome.delivered_count, 1);
        assert_eq!(report.outcome.failed_count, 1);
        assert!(
            report.permanently_failed.is_empty(),
            "a retry-exhausted transient failure must not deactivate the subscription"
        );
    }
}
