//! Bulk resource fetching with retry rounds
//!
//! [`Fetcher::fetch_many`] retrieves a list of URLs and returns one body per
//! URL in input order. Each round splits the outstanding URLs into chunks no
//! larger than the process's open-file ceiling, fetches a chunk concurrently
//! on a client scoped to that chunk, and classifies every body. URLs whose
//! body shows a known upstream failure are carried into the next round.
//!
//! Rounds repeat until every URL has a valid body. There is no upper bound
//! unless `max-rounds` is configured or a cancellation signal is attached;
//! callers needing bounded latency must supply one of them.

use crate::config::{FetcherConfig, UserAgentConfig};
use crate::fetcher::classifier::classify;
use crate::fetcher::client::build_http_client;
use crate::fetcher::solver::ChallengeSolver;
use crate::{FetchError, FetchResult};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Retrieves batches of URLs from the catalog
#[derive(Clone)]
pub struct Fetcher {
    config: FetcherConfig,
    user_agent: UserAgentConfig,
    solver: Option<Arc<dyn ChallengeSolver>>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Fetcher {
    /// Creates a fetcher without a challenge solver or cancellation signal
    pub fn new(config: FetcherConfig, user_agent: UserAgentConfig) -> Self {
        Self {
            config,
            user_agent,
            solver: None,
            cancel: None,
        }
    }

    /// Routes rate-limited requests through `solver`
    pub fn with_solver(mut self, solver: Arc<dyn ChallengeSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Aborts fetching once `true` is sent on the channel
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn has_solver(&self) -> bool {
        self.solver.is_some()
    }

    /// Number of requests issued concurrently per chunk
    pub fn chunk_size(&self) -> usize {
        let ceiling = open_file_limit().unwrap_or(self.config.fallback_chunk_size);
        let size = match self.config.max_chunk_size {
            Some(max) => ceiling.min(max),
            None => ceiling,
        };
        size.max(1)
    }

    /// Fetches a single URL, see [`Fetcher::fetch_many`]
    pub async fn fetch_one(&self, url: &str) -> FetchResult<String> {
        let mut bodies = self.fetch_many(&[url.to_string()]).await?;
        Ok(bodies.pop().unwrap_or_default())
    }

    /// Fetches every URL and returns their bodies in input order
    ///
    /// # Errors
    ///
    /// * `FetchError::Transport` - a request failed twice at the transport level
    /// * `FetchError::Upstream` - a URL answered with a permanent error page
    /// * `FetchError::Cancelled` - the cancellation signal fired
    /// * `FetchError::RetriesExhausted` - `max-rounds` rounds left URLs outstanding
    pub async fn fetch_many(&self, urls: &[String]) -> FetchResult<Vec<String>> {
        let mut slots: Vec<Option<String>> = vec![None; urls.len()];
        let mut pending: Vec<usize> = (0..urls.len()).collect();
        let mut cancel = self.cancel.clone();
        let chunk_size = self.chunk_size();
        let mut round: u32 = 0;

        while !pending.is_empty() {
            if cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
                return Err(FetchError::Cancelled {
                    pending: pending.len(),
                });
            }

            if let Some(max_rounds) = self.config.max_rounds {
                if round >= max_rounds {
                    return Err(FetchError::RetriesExhausted {
                        rounds: round,
                        pending: pending.len(),
                    });
                }
            }

            if round > 0 {
                tracing::debug!(
                    "Retry round {} for {} of {} URLs",
                    round,
                    pending.len(),
                    urls.len()
                );
                if self.config.retry_delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
            }
            round += 1;

            let mut retry = Vec::new();

            for chunk in pending.chunks(chunk_size) {
                let outcomes = match cancel.as_mut() {
                    Some(rx) => tokio::select! {
                        outcomes = self.fetch_chunk(urls, chunk) => outcomes?,
                        _ = cancelled(rx) => {
                            return Err(FetchError::Cancelled { pending: pending.len() });
                        }
                    },
                    None => self.fetch_chunk(urls, chunk).await?,
                };

                for (index, body) in outcomes {
                    match body {
                        Some(body) => slots[index] = Some(body),
                        None => retry.push(index),
                    }
                }
            }

            retry.sort_unstable();
            pending = retry;
        }

        Ok(slots.into_iter().map(Option::unwrap_or_default).collect())
    }

    /// Fetches one chunk concurrently on a client scoped to the chunk
    ///
    /// Returns each index with its body, or None if it must be retried.
    async fn fetch_chunk(
        &self,
        urls: &[String],
        indices: &[usize],
    ) -> FetchResult<Vec<(usize, Option<String>)>> {
        let client = build_http_client(&self.user_agent, &self.config)?;
        let mut tasks = JoinSet::new();

        for &index in indices {
            let client = client.clone();
            let solver = self.solver.clone();
            let url = urls[index].clone();
            tasks.spawn(async move {
                let outcome = fetch_classified(&client, solver.as_deref(), &url).await;
                (index, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(indices.len());
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined?;
            outcomes.push((index, outcome?));
        }

        Ok(outcomes)
    }
}

/// Fetches and classifies one URL
///
/// Rate-limited bodies are retried through the solver when one is set.
/// Non-recoverable error pages are returned as errors, not queued.
async fn fetch_classified(
    client: &Client,
    solver: Option<&dyn ChallengeSolver>,
    url: &str,
) -> FetchResult<Option<String>> {
    let body = get_with_retry(client, url).await?;

    let failure = match classify(&body) {
        Ok(()) => return Ok(Some(body)),
        Err(failure) if !failure.is_recoverable() => {
            return Err(FetchError::Upstream {
                url: url.to_string(),
                failure,
            })
        }
        Err(failure) => failure,
    };

    let Some(solver) = solver.filter(|_| failure.is_rate_limited()) else {
        tracing::warn!("{} for {}, queued for retry", failure, url);
        return Ok(None);
    };

    tracing::debug!("{} for {}, retrying through challenge solver", failure, url);
    match solver.solve(url).await {
        Ok(body) => match classify(&body) {
            Ok(()) => Ok(Some(body)),
            Err(failure) if !failure.is_recoverable() => Err(FetchError::Upstream {
                url: url.to_string(),
                failure,
            }),
            Err(failure) => {
                tracing::warn!("{} for {} via solver, queued for retry", failure, url);
                Ok(None)
            }
        },
        Err(e) => {
            tracing::warn!("Challenge solver failed for {}: {}", url, e);
            Ok(None)
        }
    }
}

/// GETs a body, retrying a transport failure once immediately
async fn get_with_retry(client: &Client, url: &str) -> FetchResult<String> {
    match get_body(client, url).await {
        Ok(body) => Ok(body),
        Err(first) => {
            tracing::warn!("Transport error for {}, retrying once: {}", url, first);
            get_body(client, url)
                .await
                .map_err(|source| FetchError::Transport {
                    url: url.to_string(),
                    source,
                })
        }
    }
}

async fn get_body(client: &Client, url: &str) -> Result<String, reqwest::Error> {
    client.get(url).send().await?.text().await
}

/// Resolves once `true` has been sent; never resolves if the sender is dropped
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Soft limit on open file descriptors for this process
#[cfg(unix)]
fn open_file_limit() -> Option<usize> {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: getrlimit only writes into the struct we pass
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) } != 0 {
        return None;
    }
    if rlim.rlim_cur == libc::RLIM_INFINITY {
        return None;
    }
    usize::try_from(rlim.rlim_cur).ok()
}

#[cfg(not(unix))]
fn open_file_limit() -> Option<usize> {
    None
}
