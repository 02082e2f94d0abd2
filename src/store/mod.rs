//! Observation store
//!
//! Persists the labeled observations the predictor is trained on. Supports
//! create, delete, bulk delete and a reset to the canonical seed set, plus
//! read-only listing, counting and averaging. It never retrains the model
//! itself; callers pair every mutation with a retrain.

pub mod sqlite;

pub use sqlite::SqliteObservationStore;

/// Canonical seed set loaded by `reset()`, as (years, job_level, salary)
pub const SEED_OBSERVATIONS: &[(f64, i64, f64)] = &[
    (1.0, 1, 300000.0),
    (2.0, 2, 500000.0),
    (3.0, 5, 800000.0),
    (4.0, 5, 1200000.0),
    (5.0, 9, 2500000.0),
    (8.0, 7, 2800000.0),
    (10.0, 10, 5000000.0),
];
