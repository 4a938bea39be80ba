use crate::core::errors::Result;
use log::{error, info};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/*-------------------------------------------------------------------------------------------------
  Provenance
-------------------------------------------------------------------------------------------------*/

/// How the dataset behind a lookup was obtained.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    /// Served from the table already loaded in this process; no fetch happened.
    Local,

    /// Fetched, and an intermediate cache in front of the upstream source answered.
    WarmCache,

    /// Fetched, and the intermediate cache missed or was absent.
    ColdRetrieval,
}

impl Provenance {
    /// Classify the status header reported by an intermediate cache (Cloudflare
    /// `cf-cache-status`, CloudFront `x-cache`). No header means a cold retrieval.
    pub fn from_cache_status(cache_status: Option<&str>) -> Provenance {
        let Some(cache_status) = cache_status else {
            return Provenance::ColdRetrieval;
        };

        let cache_status = cache_status.to_ascii_lowercase();
        if WARM_CACHE_STATUSES
            .iter()
            .any(|status| cache_status.contains(status))
        {
            Provenance::WarmCache
        } else {
            Provenance::ColdRetrieval
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Local => f.write_str("LOCAL"),
            Provenance::WarmCache => f.write_str("WARM_CACHE"),
            Provenance::ColdRetrieval => f.write_str("COLD_RETRIEVAL"),
        }
    }
}

/// Intermediate-cache status headers, in order of preference.
const CACHE_STATUS_HEADERS: [&str; 2] = ["cf-cache-status", "x-cache"];

/// Status fragments that mean the intermediate cache answered without going upstream.
const WARM_CACHE_STATUSES: [&str; 4] = ["hit", "stale", "revalidated", "updating"];

/*-------------------------------------------------------------------------------------------------
  Fetcher
-------------------------------------------------------------------------------------------------*/

/// Raw dataset returned by a [Fetcher].
#[derive(Clone, Debug)]
pub struct FetchedDataset {
    /// AWS IP Ranges JSON document.
    pub json: String,

    /// Whether an intermediate cache answered.
    pub provenance: Provenance,

    /// Raw intermediate-cache status, when one was reported.
    pub cache_status: Option<String>,
}

/// Source of the AWS IP Ranges dataset. Any failure is reported as
/// [Error::FetchFailed](crate::Error::FetchFailed); implementations do not retry.
pub trait Fetcher: Send + Sync {
    fn fetch(&self) -> Result<FetchedDataset>;
}

/*-------------------------------------------------------------------------------------------------
  HTTP Fetcher
-------------------------------------------------------------------------------------------------*/

/// Retrieves the dataset with a single HTTP GET.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    url: String,
    timeout: Option<Duration>,
}

impl HttpFetcher {
    /// Create a fetcher for `url`; a `timeout` of `None` waits indefinitely.
    pub fn new(url: &str, timeout: Option<Duration>) -> Self {
        Self {
            url: url.to_string(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn get(&self) -> Result<FetchedDataset> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let response = client.get(&self.url).send()?.error_for_status()?;

        let cache_status = CACHE_STATUS_HEADERS.iter().find_map(|header| {
            response
                .headers()
                .get(*header)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        });
        let provenance = Provenance::from_cache_status(cache_status.as_deref());

        let json = response.text()?;

        Ok(FetchedDataset {
            json,
            provenance,
            cache_status,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self) -> Result<FetchedDataset> {
        info!("Get AWS IP Ranges from URL: GET {}", self.url);
        self.get()
            .inspect(|dataset| {
                info!(
                    "Get AWS IP Ranges from URL: Ok ({} bytes, {}, cache status {:?})",
                    dataset.json.len(),
                    dataset.provenance,
                    dataset.cache_status
                )
            })
            .inspect_err(|error| error!("Get AWS IP Ranges from URL: FAILED: {}", error))
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
