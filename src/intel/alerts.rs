//! # Alert Aggregator
//! Bounded, time-expiring feed of advisories raised by collectors.
//!
//! Every append enforces two rules, in order:
//! 1. count: drop from the head until `len <= max_alerts`;
//! 2. time: remove every entry whose `expires_at < now`.
//!
//! An alert can therefore be evicted by count pressure before it expires.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::intel::types::{Advisory, Alert, SourceCategory};

pub const DEFAULT_MAX_ALERTS: usize = 100;

#[derive(Debug)]
pub struct AlertAggregator {
    inner: Mutex<Inner>,
    max_alerts: usize,
    ttl: ChronoDuration,
}

#[derive(Debug)]
struct Inner {
    /// Oldest at the front.
    buf: VecDeque<Alert>,
    next_id: u64,
}

impl AlertAggregator {
    pub fn new(max_alerts: usize, ttl: Duration) -> Self {
        let max_alerts = max_alerts.max(1);
        Self {
            inner: Mutex::new(Inner {
                buf: VecDeque::with_capacity(max_alerts.min(10_000)),
                next_id: 1,
            }),
            max_alerts,
            ttl: ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::MAX),
        }
    }

    pub fn max_alerts(&self) -> usize {
        self.max_alerts
    }

    /// Turn an advisory into an alert (fresh id, configured TTL) and append it.
    pub fn raise(
        &self,
        source_id: &str,
        category: SourceCategory,
        advisory: &Advisory,
        now: DateTime<Utc>,
    ) -> Alert {
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut inner = self.inner.lock();
        let alert = Alert {
            id: inner.next_id,
            source_id: source_id.to_string(),
            category,
            severity: advisory.level,
            message: advisory.message.clone(),
            created_at: now,
            expires_at,
        };
        inner.next_id += 1;
        Self::push_locked(&mut inner, alert.clone(), self.max_alerts, now);
        alert
    }

    /// Append a prebuilt alert. The id is kept as given.
    pub fn append(&self, alert: Alert, now: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        inner.next_id = inner.next_id.max(alert.id.saturating_add(1));
        Self::push_locked(&mut inner, alert, self.max_alerts, now);
    }

    fn push_locked(inner: &mut Inner, alert: Alert, max: usize, now: DateTime<Utc>) {
        inner.buf.push_back(alert);
        while inner.buf.len() > max {
            inner.buf.pop_front();
        }
        inner.buf.retain(|a| !a.is_expired(now));
    }

    /// Up to `limit` non-expired alerts, newest first.
    pub fn active(&self, limit: usize, now: DateTime<Utc>) -> Vec<Alert> {
        let inner = self.inner.lock();
        inner
            .buf
            .iter()
            .rev()
            .filter(|a| !a.is_expired(now))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn active_count(&self, now: DateTime<Utc>) -> usize {
        let inner = self.inner.lock();
        inner.buf.iter().filter(|a| !a.is_expired(now)).count()
    }

    /// Raw buffer length, including entries that expired since the last append.
    pub fn len(&self) -> usize {
        self.inner.lock().buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().buf.is_empty()
    }

    /// All buffered alerts, oldest first.
    pub fn snapshot(&self) -> Vec<Alert> {
        self.inner.lock().buf.iter().cloned().collect()
    }
}
