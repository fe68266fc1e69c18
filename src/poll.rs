use std::{future::Future, time::Duration};

use stakeledger_core::{config::RetryConfig, Epoch, PoolId};
use tracing::debug;

use crate::client::{Client, ClientError};

/// Bounded exponential backoff for polling the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub backoff_unit: Duration,
    pub backoff_factor: u32,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero based)
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = u32::try_from(attempt).unwrap_or(u32::MAX);
        let factor = self.backoff_factor.saturating_pow(exp);

        self.backoff_unit
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(value: &RetryConfig) -> Self {
        Self {
            max_retries: value.max_retries,
            backoff_unit: Duration::from_millis(value.backoff_unit_millis),
            backoff_factor: value.backoff_factor,
            max_backoff: Duration::from_millis(value.max_backoff_millis),
        }
    }
}

/// Calls `probe` until it yields a value, sleeping between attempts
///
/// Errors from the probe are returned right away; only `Ok(None)` is retried.
pub async fn wait_for<T, F, Fut>(
    what: &str,
    policy: &RetryPolicy,
    mut probe: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, ClientError>>,
{
    let attempts = policy.max_retries + 1;

    for attempt in 0..attempts {
        if let Some(value) = probe().await? {
            return Ok(value);
        }

        if attempt + 1 < attempts {
            let delay = policy.backoff(attempt);
            debug!(what, attempt, ?delay, "condition not met, backing off");
            tokio::time::sleep(delay).await;
        }
    }

    Err(ClientError::Timeout {
        what: what.to_owned(),
        attempts,
    })
}

pub async fn wait_for_epoch(
    client: &Client,
    target: Epoch,
    policy: &RetryPolicy,
) -> Result<Epoch, ClientError> {
    wait_for(&format!("epoch {target}"), policy, || async move {
        let state = client.protocol_state().await?;
        Ok((state.epoch >= target).then_some(state.epoch))
    })
    .await
}

pub async fn wait_for_pool_registration(
    client: &Client,
    pool_id: PoolId,
    policy: &RetryPolicy,
) -> Result<(), ClientError> {
    wait_for(&format!("registration of {pool_id}"), policy, || async move {
        let state = client.pool_state(pool_id).await?;
        Ok(state.map(|_| ()))
    })
    .await
}

pub async fn wait_for_pool_retirement(
    client: &Client,
    pool_id: PoolId,
    policy: &RetryPolicy,
) -> Result<(), ClientError> {
    wait_for(&format!("retirement of {pool_id}"), policy, || async move {
        let state = client.pool_state(pool_id).await?;
        Ok(state.is_none().then_some(()))
    })
    .await
}
