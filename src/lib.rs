//! Salary Predictor - Library
//!
//! A small salary-prediction service:
//! - SQLite-backed store of (years, job level, salary) observations
//! - Ordinary least squares model retrained on every dataset change
//! - axum HTTP API for predictions, dataset edits and statistics
//!
//! # Example
//!
//! ```ignore
//! use salary_predictor::{SalaryService, SqliteObservationStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = SalaryService::new(SqliteObservationStore::open_in_memory()?);
//!     service.reset().await?;
//!     let prediction = service.predict(3.0, 4).await?;
//!     println!("{}", prediction.yearly);
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod error;
pub mod store;
pub mod predictor;
pub mod service;
pub mod currency;
pub mod config;
pub mod server;
pub mod cli;

pub use config::Config;
pub use error::{Result, ServiceError};
pub use predictor::{Predictor, RetrainOutcome};
pub use server::{router, ServerState};
pub use service::SalaryService;
pub use store::SqliteObservationStore;
pub use types::{DatasetStats, NewObservation, Observation, Prediction};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
