// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Token-bucket admission control. Each (client, endpoint) pair gets its own
// bucket; the per-endpoint policy is chosen by endpoint class. Buckets refill
// continuously and idle buckets are evicted once the map grows past a
// threshold.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

// -- Policies -----------------------------------------------------------------

/// Refill and capacity parameters for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPolicy {
    /// Maximum tokens a bucket can hold, and its starting balance.
    pub capacity: u32,
    /// Tokens restored per `window`.
    pub refill_tokens: u32,
    /// Length of one refill window.
    pub window: Duration,
}

/// Endpoint classes with distinct admission policies.
///
/// Password operations get a tighter budget than the rest of the pipeline
/// so credential guessing through the service stays slow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    /// Lock/unlock endpoints: 5 requests per minute.
    CredentialChange,
    /// Everything else: 10 requests per minute.
    Standard,
}

impl EndpointClass {
    /// Classify an endpoint by its path.
    pub fn of(endpoint: &str) -> Self {
        if endpoint.ends_with("/unlock") || endpoint.ends_with("/lock") {
            EndpointClass::CredentialChange
        } else {
            EndpointClass::Standard
        }
    }

    /// The admission policy for this class.
    pub fn policy(self) -> BucketPolicy {
        match self {
            EndpointClass::CredentialChange => BucketPolicy {
                capacity: 5,
                refill_tokens: 5,
                window: Duration::from_secs(60),
            },
            EndpointClass::Standard => BucketPolicy {
                capacity: 10,
                refill_tokens: 10,
                window: Duration::from_secs(60),
            },
        }
    }
}

// -- Buckets ------------------------------------------------------------------

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    policy: BucketPolicy,
}

impl TokenBucket {
    fn new(policy: BucketPolicy, now: Instant) -> Self {
        Self {
            tokens: policy.capacity as f64,
            last_refill: now,
            policy,
        }
    }

    /// Refill from elapsed time, then try to take one token.
    fn try_consume(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let refill = elapsed.as_secs_f64() / self.policy.window.as_secs_f64()
            * self.policy.refill_tokens as f64;
        self.tokens = (self.tokens + refill).min(self.policy.capacity as f64);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

// -- Controller ---------------------------------------------------------------

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected,
}

/// Shared admission controller for the whole pipeline.
///
/// Thread-safe; one instance is meant to serve all requests. The bucket map
/// is bounded: once it holds more than `sweep_threshold` entries, buckets
/// that have not been touched within `idle_ttl` are evicted before a new
/// bucket is inserted.
#[derive(Debug)]
pub struct AdmissionController {
    buckets: Mutex<HashMap<(String, String), TokenBucket>>,
    idle_ttl: Duration,
    sweep_threshold: usize,
}

impl AdmissionController {
    pub fn new(idle_ttl: Duration, sweep_threshold: usize) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            idle_ttl,
            sweep_threshold,
        }
    }

    /// Check whether `client` may run one request against `endpoint` now.
    pub fn try_admit(&self, client: &str, endpoint: &str) -> Admission {
        self.try_admit_at(client, endpoint, Instant::now())
    }

    /// Admission check against an explicit clock reading. `try_admit` is the
    /// production entry point; this one exists so refill behaviour can be
    /// driven deterministically.
    pub fn try_admit_at(&self, client: &str, endpoint: &str, now: Instant) -> Admission {
        let mut buckets = self.buckets.lock().unwrap_or_else(|err| err.into_inner());

        let key = (client.to_string(), endpoint.to_string());
        if !buckets.contains_key(&key) && buckets.len() >= self.sweep_threshold {
            let before = buckets.len();
            buckets
                .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < self.idle_ttl);
            debug!(evicted = before - buckets.len(), remaining = buckets.len(), "Swept idle buckets");
            if buckets.len() >= self.sweep_threshold {
                warn!(
                    tracked = buckets.len(),
                    threshold = self.sweep_threshold,
                    "Bucket map still above threshold after sweep"
                );
            }
        }

        let bucket = buckets
            .entry(key)
            .or_insert_with(|| TokenBucket::new(EndpointClass::of(endpoint).policy(), now));

        if bucket.try_consume(now) {
            Admission::Admitted
        } else {
            debug!(client, endpoint, "Admission rejected");
            Admission::Rejected
        }
    }

    /// Number of buckets currently tracked.
    pub fn tracked_buckets(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .len()
    }
}
