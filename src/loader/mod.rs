//! # Secret Loading
//!
//! Retrieves a batch of secrets from a [`Provider`] with bounded parallelism.
//!
//! One task is spawned per distinct key. A semaphore sized to
//! [`concurrency_limit`] gates the calls into the provider, and all tasks share
//! one cancellation token. Results flow through a channel into an
//! [`Aggregator`], which either assembles the complete [`SecretMap`] or stops
//! at the first error. In both cases [`load`] joins every spawned task before
//! it returns.

use crate::provider::Provider;
use crate::{Result, SetSecretsError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;


/// Secret key to secret value, as returned by a successful [`load`].
pub type SecretMap = HashMap<String, String>;

/// Outcome of a single retrieval task.
#[derive(Debug)]
pub struct FetchResult {
    pub key: String,
    pub value: Result<String>,
}

/// Effective number of concurrent provider calls for `keys` keys.
///
/// Never below 1, and never above the number of keys since extra permits
/// would go unused.
pub fn concurrency_limit(hint: usize, keys: usize) -> usize {
    hint.max(1).min(keys.max(1))
}

/// Drops repeated keys, keeping the first occurrence of each.
pub fn dedup_keys<S: AsRef<str>>(keys: &[S]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(keys.len());
    keys.iter()
        .map(|key| key.as_ref())
        .filter(|key| seen.insert(*key))
        .map(str::to_string)
        .collect()
}

/// Collects fetch results into a [`SecretMap`].
///
/// `Collecting` moves to a terminal state either on the first error
/// ([`accept`](Aggregator::accept) returns it and the partial map is dropped
/// with the aggregator) or when [`finish`](Aggregator::finish) confirms that
/// every requested key is present.
#[derive(Debug)]
pub struct Aggregator {
    requested: Vec<String>,
    secrets: SecretMap,
}

impl Aggregator {
    pub fn new(requested: Vec<String>) -> Self {
        let secrets = SecretMap::with_capacity(requested.len());
        Self { requested, secrets }
    }

    /// Records one result, or hands back its error.
    pub fn accept(&mut self, result: FetchResult) -> Result<()> {
        let value = result.value?;
        self.secrets.insert(result.key, value);
        Ok(())
    }

    /// Returns the collected secrets once every requested key has a value.
    pub fn finish(self) -> Result<SecretMap> {
        if let Some(missing) = self
            .requested
            .iter()
            .find(|key| !self.secrets.contains_key(*key))
        {
            return Err(SetSecretsError::LostSecret(missing.clone()));
        }
        Ok(self.secrets)
    }
}

/// Retrieves the value of every key from `provider`.
///
/// Returns a map holding exactly the distinct requested keys, or the first
/// error any retrieval produced; never a partial map. An empty key list returns
/// an empty map without calling the provider.
///
/// At most `concurrency_limit(provider.concurrency(), keys)` calls are in
/// flight at once. The first failure cancels a token derived from `cancel`,
/// which pending tasks and cancellation-aware providers observe; `cancel`
/// itself is never cancelled here. Cancelling `cancel` from outside aborts the
/// load with [`SetSecretsError::Cancelled`].
///
/// Does not return before every spawned task has finished.
pub async fn load<S: AsRef<str>>(
    cancel: &CancellationToken,
    provider: Arc<dyn Provider>,
    keys: &[S],
) -> Result<SecretMap> {
    let keys = dedup_keys(keys);
    if keys.is_empty() {
        return Ok(SecretMap::new());
    }

    let limit = concurrency_limit(provider.concurrency(), keys.len());
    tracing::debug!(
        provider = provider.name(),
        keys = keys.len(),
        concurrency = limit,
        "Loading secrets"
    );

    let shared = cancel.child_token();
    let _cancel_on_return = shared.clone().drop_guard();
    let semaphore = Arc::new(Semaphore::new(limit));
    // Sized to the task count so no sender ever waits on the receiver
    let (tx, mut rx) = mpsc::channel(keys.len());

    let mut tasks = JoinSet::new();
    for key in &keys {
        tasks.spawn(fetch(
            key.clone(),
            Arc::clone(&provider),
            Arc::clone(&semaphore),
            shared.clone(),
            tx.clone(),
        ));
    }
    drop(tx);

    let mut aggregator = Aggregator::new(keys);
    let outcome = loop {
        match rx.recv().await {
            Some(result) => {
                if let Err(e) = aggregator.accept(result) {
                    break Err(e);
                }
            }
            None => break aggregator.finish(),
        }
    };
    drop(rx);

    if outcome.is_err() {
        shared.cancel();
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Secret retrieval task did not complete");
        }
    }

    match &outcome {
        Ok(secrets) => tracing::debug!(count = secrets.len(), "Loaded secrets"),
        Err(e) => tracing::debug!(error = %e, "Loading secrets failed"),
    }

    outcome
}

/// Retrieves one key under a semaphore permit and reports the result.
async fn fetch(
    key: String,
    provider: Arc<dyn Provider>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    results: mpsc::Sender<FetchResult>,
) {
    let value = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SetSecretsError::Cancelled(key.clone())),
        permit = semaphore.acquire() => match permit {
            Ok(_permit) => provider.get_secret(&cancel, &key).await,
            Err(_) => Err(SetSecretsError::Cancelled(key.clone())),
        },
    };

    let failed = value.is_err();
    if let Err(e) = &value {
        tracing::debug!(key = %key, error = %e, "Secret retrieval failed");
    }

    // The receiver is gone once the load has already failed
    let _ = results.send(FetchResult { key, value }).await;

    if failed {
        cancel.cancel();
    }
}
