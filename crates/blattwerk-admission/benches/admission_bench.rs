// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the admission controller hot path.

use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use blattwerk_admission::AdmissionController;

/// Benchmark the admission check with a warm bucket map. This is the path
/// every request takes before any document work starts.
fn bench_admission_check(c: &mut Criterion) {
    let controller = AdmissionController::new(Duration::from_secs(600), 4096);

    // Warm the map with a realistic population of clients.
    for i in 0..500 {
        controller.try_admit(&format!("10.0.{}.{}", i / 256, i % 256), "/pdf/split");
    }

    c.bench_function("admission_check (warm map)", |b| {
        b.iter(|| {
            let outcome = controller.try_admit(black_box("10.0.0.42"), black_box("/pdf/split"));
            black_box(outcome);
        });
    });
}

criterion_group!(benches, bench_admission_check);
criterion_main!(benches);
