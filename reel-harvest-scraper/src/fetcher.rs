//! HTTP GET with a single, consistently applied rate-limit discipline.

use std::future::Future;

use tokio::sync::{Mutex, Semaphore};
use tokio::time::{Duration, Instant};

use reel_harvest_core::resolve_url;
use reel_harvest_lib::HarvestSettings;

use crate::error::FetchError;

/// Source of page bodies.
///
/// `Ok(None)` means the page is absent for this run: HTTP 404, any other
/// non-200 status, a timeout or a transport failure. `Err` is reserved for
/// calls that are malformed, such as an empty URL.
pub trait Fetcher: Send + Sync + 'static {
    /// Base that relative URLs resolve against.
    fn base_url(&self) -> &str;

    fn fetch(&self, url: &str) -> impl Future<Output = Result<Option<String>, FetchError>> + Send;
}

/// How requests are paced. One discipline per fetcher, never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDiscipline {
    /// At least `min_interval` between the starts of consecutive requests.
    Serial { min_interval: Duration },
    /// At most `max_in_flight` requests outstanding at once.
    Concurrent { max_in_flight: usize },
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub base_url: String,
    pub discipline: FetchDiscipline,
    pub timeout: Duration,
    pub user_agent: String,
}

impl FetcherConfig {
    /// Pacing and timeouts from settings. `max_in_flight` selects the
    /// concurrent discipline; otherwise requests are serial.
    pub fn from_settings(base_url: &str, settings: &HarvestSettings) -> Self {
        let discipline = match settings.max_in_flight {
            Some(max_in_flight) => FetchDiscipline::Concurrent { max_in_flight },
            None => FetchDiscipline::Serial {
                min_interval: Duration::from_millis(settings.min_request_interval_ms),
            },
        };
        Self {
            base_url: base_url.to_string(),
            discipline,
            timeout: Duration::from_secs(settings.request_timeout_secs.max(1)),
            user_agent: settings.user_agent.clone(),
        }
    }
}

enum Gate {
    Serial {
        min_interval: Duration,
        last_request: Mutex<Instant>,
    },
    Concurrent(Semaphore),
}

/// reqwest-backed [`Fetcher`].
pub struct HttpFetcher {
    http: reqwest::Client,
    base_url: String,
    gate: Gate,
}

impl HttpFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        let gate = match config.discipline {
            FetchDiscipline::Serial { min_interval } => Gate::Serial {
                min_interval,
                last_request: Mutex::new(
                    Instant::now()
                        .checked_sub(min_interval)
                        .unwrap_or_else(Instant::now),
                ),
            },
            FetchDiscipline::Concurrent { max_in_flight } => {
                Gate::Concurrent(Semaphore::new(max_in_flight.max(1)))
            }
        };

        Ok(Self {
            http,
            base_url: config.base_url,
            gate,
        })
    }

    /// Wait until the serial clock allows another request, then restart it.
    async fn wait_turn(last_request: &Mutex<Instant>, min_interval: Duration) {
        let mut last = last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < min_interval {
            tokio::time::sleep(min_interval - elapsed).await;
        }
        *last = Instant::now();
    }

    async fn get(&self, url: &str) -> Option<String> {
        let resp = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("GET {url} failed: {e}");
                return None;
            }
        };
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            log::debug!("GET {url}: 404");
            return None;
        }
        if !status.is_success() {
            log::warn!("GET {url}: HTTP {}", status.as_u16());
            return None;
        }
        match resp.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                log::warn!("GET {url}: failed to read body: {e}");
                None
            }
        }
    }
}

impl Fetcher for HttpFetcher {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, url: &str) -> Result<Option<String>, FetchError> {
        let absolute = resolve_url(&self.base_url, url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        match &self.gate {
            Gate::Serial {
                min_interval,
                last_request,
            } => {
                Self::wait_turn(last_request, *min_interval).await;
                Ok(self.get(&absolute).await)
            }
            Gate::Concurrent(permits) => {
                let Ok(_permit) = permits.acquire().await else {
                    log::warn!("GET {absolute}: fetcher is shutting down");
                    return Ok(None);
                };
                Ok(self.get(&absolute).await)
            }
        }
    }
}
