//! Get-or-fetch cache of per-date environmental data.
//!
//! # Responsibility
//! - Serve stored environmental records and fill misses from the data source.
//! - Serve moon phases, computing and storing them on first access.
//!
//! # Invariants
//! - A stored record is returned verbatim and never re-fetched.
//! - At most one external fetch per date is in flight per cache instance.
//! - A date's fill lock lives only while some caller holds it.
//! - When two writers race, the row that reached storage first wins and is
//!   what every caller gets back.
//! - Storage failures are logged and never hide a freshly fetched record.

use crate::calc::astronomy::moon_phase;
use crate::config::{ConfigurationError, Coordinates, Settings};
use crate::model::astro::MoonPhaseRecord;
use crate::model::environment::EnvironmentalRecord;
use crate::provider::{EnvironmentSource, FetchError};
use crate::repo::environment_repo::EnvironmentRepository;
use chrono::NaiveDate;
use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Read side of per-date environmental enrichment.
pub trait EnvironmentLookup {
    /// Environmental record for `date`, or `None` when no data is available.
    fn environment(&self, date: NaiveDate) -> Option<EnvironmentalRecord>;
    fn moon_phase(&self, date: NaiveDate) -> MoonPhaseRecord;
}

impl<E: EnvironmentLookup + ?Sized> EnvironmentLookup for &E {
    fn environment(&self, date: NaiveDate) -> Option<EnvironmentalRecord> {
        (**self).environment(date)
    }

    fn moon_phase(&self, date: NaiveDate) -> MoonPhaseRecord {
        (**self).moon_phase(date)
    }
}

pub struct EnvironmentalCache<R, S> {
    repo: R,
    source: S,
    coordinates: Option<Coordinates>,
    fill_locks: Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl<R: EnvironmentRepository, S: EnvironmentSource> EnvironmentalCache<R, S> {
    /// Coordinates are taken from `settings` once, at construction.
    pub fn new(repo: R, source: S, settings: &Settings) -> Self {
        Self {
            repo,
            source,
            coordinates: settings.coordinates().ok(),
            fill_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the record for `date`, fetching and storing it on a miss.
    ///
    /// `None` means "no data": the fetch failed or is unsupported for this date.
    pub fn get_or_fetch(&self, date: NaiveDate) -> Option<EnvironmentalRecord> {
        match self.try_get_or_fetch(date) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(
                    "event=env_cache module=service status=no_data date={} error={}",
                    date, err
                );
                None
            }
        }
    }

    /// Like `get_or_fetch`, but reports why no record is available.
    pub fn try_get_or_fetch(&self, date: NaiveDate) -> Result<EnvironmentalRecord, FetchError> {
        if let Some(record) = self.lookup(date) {
            return Ok(record);
        }

        let lock = self.fill_lock(date);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.fill(date)
        };
        self.release_fill_lock(date, lock);
        result
    }

    /// Number of dates whose fill lock is currently held or awaited.
    pub fn pending_fill_locks(&self) -> usize {
        self.fill_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn fill(&self, date: NaiveDate) -> Result<EnvironmentalRecord, FetchError> {
        // Another caller may have filled the date while we waited.
        if let Some(record) = self.lookup(date) {
            return Ok(record);
        }

        let at = self
            .coordinates
            .ok_or(ConfigurationError::MissingCoordinates)?;
        let fetched = self.source.fetch(date, at)?;

        match self.repo.insert_record_if_absent(&fetched) {
            Ok(true) => {
                info!(
                    "event=env_cache module=service status=stored date={} source_kind={}",
                    date,
                    fetched.source_kind.as_str()
                );
            }
            Ok(false) => {
                if let Some(stored) = self.lookup(date) {
                    return Ok(stored);
                }
            }
            Err(err) => {
                error!(
                    "event=env_cache module=service status=error date={} error_code=persist_failed error={}",
                    date, err
                );
            }
        }
        Ok(fetched)
    }

    /// Moon phase for `date`, stored on first computation.
    pub fn moon_phase(&self, date: NaiveDate) -> MoonPhaseRecord {
        match self.repo.get_moon_phase(date) {
            Ok(Some(record)) => return record,
            Ok(None) => {}
            Err(err) => {
                warn!(
                    "event=moon_cache module=service status=error date={} error_code=read_failed error={}",
                    date, err
                );
            }
        }

        let record = moon_phase(date);
        if let Err(err) = self.repo.insert_moon_phase_if_absent(&record) {
            warn!(
                "event=moon_cache module=service status=error date={} error_code=persist_failed error={}",
                date, err
            );
        }
        record
    }

    fn lookup(&self, date: NaiveDate) -> Option<EnvironmentalRecord> {
        match self.repo.get_record(date) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    "event=env_cache module=service status=error date={} error_code=read_failed error={}",
                    date, err
                );
                None
            }
        }
    }

    fn fill_lock(&self, date: NaiveDate) -> Arc<Mutex<()>> {
        let mut locks = self
            .fill_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(date).or_default())
    }

    /// Drops the map entry once no other caller holds or awaits it.
    fn release_fill_lock(&self, date: NaiveDate, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .fill_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let unshared = locks
            .get(&date)
            .map_or(false, |held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
        if unshared {
            locks.remove(&date);
        }
    }
}

impl<R: EnvironmentRepository, S: EnvironmentSource> EnvironmentLookup
    for EnvironmentalCache<R, S>
{
    fn environment(&self, date: NaiveDate) -> Option<EnvironmentalRecord> {
        self.get_or_fetch(date)
    }

    fn moon_phase(&self, date: NaiveDate) -> MoonPhaseRecord {
        EnvironmentalCache::moon_phase(self, date)
    }
}
