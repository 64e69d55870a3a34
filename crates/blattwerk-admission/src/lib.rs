// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-admission — Token-bucket admission control, keyed by
// (client, endpoint), with idle-bucket eviction.

pub mod limiter;

pub use limiter::{Admission, AdmissionController, BucketPolicy, EndpointClass};
