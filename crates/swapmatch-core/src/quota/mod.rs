//! Per-client daily request quota.
//!
//! Single-process and best-effort: counters live in one in-memory map and
//! reset implicitly the first time a client shows up on a later calendar
//! day. This is a gate in front of the pipeline, not a distributed rate
//! limiter.

use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy)]
struct QuotaRecord {
    date: NaiveDate,
    count: u32,
}

/// Raised when a client has exhausted its allowance for the day.
#[derive(Debug, Clone, Error)]
#[error("daily request limit reached ({limit} requests); the quota resets at the next calendar day")]
pub struct QuotaExceeded {
    /// The configured daily maximum.
    pub limit: u32,
}

/// Admits or rejects requests against a per-client daily counter.
pub struct QuotaGuard {
    limit: u32,
    records: Mutex<HashMap<String, QuotaRecord>>,
}

impl QuotaGuard {
    /// Creates a guard allowing `limit` requests per client per day.
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// The configured daily maximum.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Decides admit/reject for `client` on `today`.
    ///
    /// On admit, the client's counter is incremented and the remaining
    /// allowance returned. A stored record from an earlier date is reset
    /// before the decision; no midnight timer exists or is needed.
    pub fn check(&self, client: &str, today: NaiveDate) -> Result<u32, QuotaExceeded> {
        let mut records = self.records.lock();
        let record = records
            .entry(client.to_string())
            .or_insert(QuotaRecord { date: today, count: 0 });

        if record.date != today {
            record.date = today;
            record.count = 0;
        }

        if record.count >= self.limit {
            return Err(QuotaExceeded { limit: self.limit });
        }

        record.count += 1;
        Ok(self.limit - record.count)
    }
}

impl std::fmt::Debug for QuotaGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGuard")
            .field("limit", &self.limit)
            .field("clients", &self.records.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn admits_until_the_limit() {
        let guard = QuotaGuard::new(3);
        assert_eq!(guard.check("10.0.0.1", day(1)).unwrap(), 2);
        assert_eq!(guard.check("10.0.0.1", day(1)).unwrap(), 1);
        assert_eq!(guard.check("10.0.0.1", day(1)).unwrap(), 0);
        assert!(guard.check("10.0.0.1", day(1)).is_err());
    }

    #[test]
    fn clients_are_counted_independently() {
        let guard = QuotaGuard::new(1);
        assert!(guard.check("10.0.0.1", day(1)).is_ok());
        assert!(guard.check("10.0.0.2", day(1)).is_ok());
        assert!(guard.check("10.0.0.1", day(1)).is_err());
    }

    #[test]
    fn counter_resets_on_a_later_calendar_date() {
        let guard = QuotaGuard::new(1);
        assert!(guard.check("10.0.0.1", day(1)).is_ok());
        assert!(guard.check("10.0.0.1", day(1)).is_err());

        // First request of the next day is admitted regardless of prior count.
        assert_eq!(guard.check("10.0.0.1", day(2)).unwrap(), 0);
    }

    #[test]
    fn zero_limit_rejects_everything() {
        let guard = QuotaGuard::new(0);
        assert!(guard.check("10.0.0.1", day(1)).is_err());
    }
}
