use crate::core::block_table::BlockTable;
use crate::core::errors::{Error, Result};
use crate::core::fetcher::{Fetcher, Provenance};
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/*-------------------------------------------------------------------------------------------------
  Cache State
-------------------------------------------------------------------------------------------------*/

/// A published [BlockTable] plus how and when it was obtained. Replaced wholesale on every
/// refresh, never modified in place.
#[derive(Debug)]
pub struct CacheState {
    table: Arc<BlockTable>,
    provenance: Provenance,
    cache_status: Option<String>,
    loaded_at: DateTime<Utc>,
    valid_until: Option<DateTime<Utc>>,
}

impl CacheState {
    pub fn table(&self) -> &Arc<BlockTable> {
        &self.table
    }

    /// Provenance reported by the fetch that produced this table.
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Raw intermediate-cache status reported by the fetch, if any.
    pub fn cache_status(&self) -> Option<&str> {
        self.cache_status.as_deref()
    }

    pub fn loaded_at(&self) -> &DateTime<Utc> {
        &self.loaded_at
    }

    /// Expiry time; `None` means the table is kept for the life of the process.
    pub fn valid_until(&self) -> Option<&DateTime<Utc>> {
        self.valid_until.as_ref()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until
            .is_some_and(|valid_until| now >= valid_until)
    }
}

/// The state a caller received and how it was obtained for that call: [Provenance::Local] when
/// an already-published table was reused, otherwise the provenance of the fetch the call made.
#[derive(Clone, Debug)]
pub struct CacheSnapshot {
    pub state: Arc<CacheState>,
    pub provenance: Provenance,
}

impl CacheSnapshot {
    fn local(state: Arc<CacheState>) -> Self {
        Self {
            state,
            provenance: Provenance::Local,
        }
    }

    pub fn table(&self) -> &Arc<BlockTable> {
        self.state.table()
    }
}

/*-------------------------------------------------------------------------------------------------
  Refresh Record
-------------------------------------------------------------------------------------------------*/

/// Outcome of the most recent refresh, guarded by the refresh lock.
#[derive(Debug, Default)]
struct RefreshRecord {
    last_failure: Option<String>,
}

/*-------------------------------------------------------------------------------------------------
  Range Cache
-------------------------------------------------------------------------------------------------*/

/// Process-wide holder of the current [BlockTable].
///
/// The first call loads the table; later calls reuse it until the optional `ttl` expires.
/// Readers load the published state with a single atomic pointer read and always see a complete
/// table. Refreshes are serialized: callers that arrive during a fetch wait for it and share its
/// result, success or failure, instead of fetching again.
#[derive(Debug)]
pub struct RangeCache<F> {
    fetcher: F,
    ttl: Option<Duration>,
    state: ArcSwapOption<CacheState>,
    refresh_lock: Mutex<RefreshRecord>,
    // Incremented under `refresh_lock` each time a refresh finishes
    completed_refreshes: AtomicU64,
}

/*--------------------------------------------------------------------------------------
  Range Cache Implementation
--------------------------------------------------------------------------------------*/

impl<F: Fetcher> RangeCache<F> {
    /// Create an empty cache that loads once and keeps the table for the life of the process.
    pub fn new(fetcher: F) -> Self {
        Self::with_ttl(fetcher, None)
    }

    /// Create an empty cache whose tables expire `ttl` after they are loaded.
    pub fn with_ttl(fetcher: F, ttl: Option<Duration>) -> Self {
        Self {
            fetcher,
            ttl,
            state: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(RefreshRecord::default()),
            completed_refreshes: AtomicU64::new(0),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// The active table, loading it first if none has been loaded (or the loaded one expired).
    pub fn current(&self) -> Result<Arc<BlockTable>> {
        self.snapshot()
            .map(|snapshot| Arc::clone(snapshot.state.table()))
    }

    /// The active state, loading it first if none has been loaded (or the loaded one expired).
    ///
    /// A failed first load leaves the cache empty, so the next call fetches again. A failed
    /// reload of an expired table keeps serving the expired table.
    pub fn snapshot(&self) -> Result<CacheSnapshot> {
        if let Some(state) = self.fresh_state() {
            return Ok(CacheSnapshot::local(state));
        }

        let observed_refreshes = self.completed_refreshes.load(Ordering::SeqCst);
        let mut record = self
            .refresh_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Another caller may have published while this one waited
        if let Some(state) = self.fresh_state() {
            debug!("AWS IP Ranges were loaded by a concurrent caller");
            return Ok(CacheSnapshot::local(state));
        }

        // A refresh that finished while this caller waited failed; share its outcome
        if self.completed_refreshes.load(Ordering::SeqCst) != observed_refreshes {
            if let Some(failure) = &record.last_failure {
                debug!("AWS IP Ranges refresh by a concurrent caller failed: {failure}");
                let error = Error::FetchFailed(failure.clone().into());
                return self.stale_or(error);
            }
        }

        let refreshed = self.refresh();
        record.last_failure = refreshed.as_ref().err().map(|error| match error {
            Error::FetchFailed(source) => source.to_string(),
            other => other.to_string(),
        });
        self.completed_refreshes.fetch_add(1, Ordering::SeqCst);

        match refreshed {
            Ok(state) => Ok(CacheSnapshot {
                provenance: state.provenance(),
                state,
            }),
            Err(error) => self.stale_or(error),
        }
    }

    /// The published state, if any, without triggering a load.
    pub fn loaded(&self) -> Option<Arc<CacheState>> {
        self.state.load_full()
    }

    /*-------------------------------------------------------------------------
      Private Methods
    -------------------------------------------------------------------------*/

    fn fresh_state(&self) -> Option<Arc<CacheState>> {
        self.state
            .load_full()
            .filter(|state| !state.is_expired(Utc::now()))
    }

    /// Fall back to the published (expired) table after a failed refresh, or return `error`
    /// when nothing has been published.
    fn stale_or(&self, error: Error) -> Result<CacheSnapshot> {
        match self.state.load_full() {
            Some(stale_state) => {
                warn!(
                    "Unable to refresh expired AWS IP Ranges; using ranges loaded at {}: {}",
                    stale_state.loaded_at(),
                    error
                );
                Ok(CacheSnapshot::local(stale_state))
            }
            None => Err(error),
        }
    }

    /// Fetch, parse, and publish a new table. Nothing is published on failure.
    fn refresh(&self) -> Result<Arc<CacheState>> {
        info!("Loading AWS IP Ranges");

        let dataset = self.fetcher.fetch()?;
        let table = BlockTable::from_json(&dataset.json)
            .inspect_err(|error| log::error!("Unable to parse AWS IP Ranges JSON: {}", error))?;

        let loaded_at = Utc::now();
        let valid_until = self
            .ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| loaded_at.checked_add_signed(ttl));

        let state = Arc::new(CacheState {
            table: Arc::new(table),
            provenance: dataset.provenance,
            cache_status: dataset.cache_status,
            loaded_at,
            valid_until,
        });

        self.state.store(Some(Arc::clone(&state)));

        info!(
            "Published {} AWS IP blocks ({}){}",
            state.table().len(),
            state.provenance(),
            match state.valid_until() {
                Some(valid_until) => format!("; valid until {valid_until}"),
                None => String::new(),
            }
        );

        Ok(state)
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
