// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunable engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum accepted upload size, in megabytes.
    pub max_upload_mb: u32,
    /// How long an admission bucket may sit idle before it is evicted.
    pub admission_idle_ttl_secs: u64,
    /// Bucket-map size at which an eviction sweep is attempted.
    pub admission_sweep_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: 50,
            admission_idle_ttl_secs: 600,
            admission_sweep_threshold: 1024,
        }
    }
}

impl EngineConfig {
    /// Maximum accepted upload size, in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb as usize * 1024 * 1024
    }

    /// Idle TTL for admission buckets, as a [`std::time::Duration`].
    pub fn admission_idle_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.admission_idle_ttl_secs)
    }
}
