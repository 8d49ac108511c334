//! Per-audit wall-clock budget and sub-request quota.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::config::MIN_PROBE_TIMEOUT_MS;

/// Budget context owned by one audit.
///
/// Carries the overall deadline (as both an [`Instant`] and a
/// [`CancellationToken`] fired when it elapses) and the discretionary
/// sub-request quota. Probes derive their per-request timeouts through
/// [`AuditBudget::within`] so none can outlive the audit.
#[derive(Debug)]
pub struct AuditBudget {
    started: Instant,
    deadline: Instant,
    quota: AtomicI64,
    cancel: CancellationToken,
    deadline_task: tokio::task::JoinHandle<()>,
}

impl AuditBudget {
    /// Starts a budget clock with the given overall window and quota.
    pub fn new(overall: Duration, quota: u32) -> Self {
        let started = Instant::now();
        let cancel = CancellationToken::new();
        let deadline_task = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(overall).await;
                cancel.cancel();
            }
        });
        Self {
            started,
            deadline: started + overall,
            quota: AtomicI64::new(i64::from(quota)),
            cancel,
            deadline_task,
        }
    }

    /// Milliseconds since the audit started.
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Time remaining before the overall deadline.
    pub fn time_left(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether the overall deadline has passed.
    pub fn expired(&self) -> bool {
        self.time_left().is_zero()
    }

    /// Shapes a per-probe timeout: capped at the remaining budget, floored
    /// at [`MIN_PROBE_TIMEOUT_MS`] so late probes stay viable.
    pub fn within(&self, ms: u64) -> Duration {
        let left = self.time_left().as_millis() as u64;
        Duration::from_millis(ms.min(left).max(MIN_PROBE_TIMEOUT_MS))
    }

    /// Spends `n` units of the sub-request quota. Returns false (without
    /// going negative) when the quota is exhausted; the caller must skip
    /// the probe.
    pub fn spend(&self, n: u32) -> bool {
        let n = i64::from(n);
        let prior = self.quota.fetch_sub(n, Ordering::SeqCst);
        if prior < n {
            self.quota.fetch_add(n, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Remaining sub-request quota.
    pub fn quota_left(&self) -> u32 {
        self.quota.load(Ordering::SeqCst).max(0) as u32
    }

    /// Token fired when the overall deadline elapses; threaded into every
    /// probe so in-flight reads abort promptly.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for AuditBudget {
    fn drop(&mut self) {
        self.deadline_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn within_clamps_to_remaining_budget() {
        let budget = AuditBudget::new(Duration::from_millis(1_000), 8);
        assert_eq!(budget.within(500), Duration::from_millis(500));
        // Requests longer than the remaining window are capped.
        assert!(budget.within(60_000) <= Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn within_floors_at_minimum() {
        let budget = AuditBudget::new(Duration::from_millis(1), 8);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(
            budget.within(5_000),
            Duration::from_millis(MIN_PROBE_TIMEOUT_MS)
        );
    }

    #[tokio::test]
    async fn quota_exhausts_and_stays_at_zero() {
        let budget = AuditBudget::new(Duration::from_secs(5), 2);
        assert!(budget.spend(1));
        assert!(budget.spend(1));
        assert!(!budget.spend(1));
        assert!(!budget.spend(1));
        assert_eq!(budget.quota_left(), 0);
    }

    #[tokio::test]
    async fn token_fires_at_deadline() {
        let budget = AuditBudget::new(Duration::from_millis(20), 8);
        let token = budget.cancel_token();
        tokio::time::timeout(Duration::from_millis(500), token.cancelled())
            .await
            .expect("deadline token should fire");
        assert!(budget.expired());
    }
}
