//! Salary predictor
//!
//! Holds the model state (a trained flag plus the fitted coefficients) behind
//! a reader/writer lock. `retrain()` rebuilds it from the full observation
//! store; `predict()` evaluates the current fit. Predictions only ever see a
//! complete fit because writers are exclusive.

pub mod regression;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::error::{Result, ServiceError};
use crate::store::SqliteObservationStore;
use crate::types::{ListOrder, Observation, Prediction};
use regression::LinearModel;

/// Features are (years, job_level)
pub type SalaryModel = LinearModel<2>;

/// Process-wide model state, rebuilt on every retrain
#[derive(Debug, Clone, Default)]
pub struct ModelState {
    is_trained: bool,
    model: Option<SalaryModel>,
}

impl ModelState {
    pub fn is_trained(&self) -> bool {
        self.is_trained
    }

    /// The fitted model, only while trained
    pub fn model(&self) -> Option<&SalaryModel> {
        if self.is_trained {
            self.model.as_ref()
        } else {
            None
        }
    }
}

/// Outcome of a retrain, for logging and callers that care
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetrainOutcome {
    /// Fit succeeded over this many rows
    Trained { rows: usize },
    /// The store was empty
    Empty,
    /// The fit failed; the model is untrained
    Failed,
}

/// Regression model over the observation store
pub struct Predictor {
    store: SqliteObservationStore,
    state: RwLock<ModelState>,
}

impl Predictor {
    /// Create an untrained predictor over `store`
    pub fn new(store: SqliteObservationStore) -> Self {
        Self {
            store,
            state: RwLock::new(ModelState::default()),
        }
    }

    /// Rebuild the model from every stored observation.
    ///
    /// Fit failures leave the model untrained and are logged, never returned.
    /// Only a failure to read the store is an error, and it also leaves the
    /// model untrained.
    pub async fn retrain(&self) -> Result<RetrainOutcome> {
        // Held across the read so retrains are serialised against each other.
        let mut state = self.state.write().await;

        let rows = match self.store.list(ListOrder::None).await {
            Ok(rows) => rows,
            Err(e) => {
                state.is_trained = false;
                error!("Failed to read observations for retrain: {}", e);
                return Err(e);
            }
        };

        if rows.is_empty() {
            warn!("Observation store empty, model cannot train");
            state.is_trained = false;
            return Ok(RetrainOutcome::Empty);
        }

        let (features, targets) = training_matrix(&rows);
        match SalaryModel::fit(&features, &targets) {
            Ok(model) => {
                info!(
                    "Model retrained on {} rows (r² = {:.4})",
                    rows.len(),
                    model.r_squared()
                );
                state.model = Some(model);
                state.is_trained = true;
                Ok(RetrainOutcome::Trained { rows: rows.len() })
            }
            Err(e) => {
                error!("Error training model: {}", e);
                state.is_trained = false;
                Ok(RetrainOutcome::Failed)
            }
        }
    }

    /// Predict the yearly (and monthly) salary
    pub async fn predict(&self, years: f64, job_level: i64) -> Result<Prediction> {
        let state = self.state.read().await;
        let model = state.model().ok_or(ServiceError::ModelNotTrained)?;

        let raw = model.predict(&[years, job_level as f64]);
        if !raw.is_finite() {
            return Err(ServiceError::Internal(format!(
                "prediction for years={} level={} is not finite",
                years, job_level
            )));
        }

        Ok(Prediction::from_raw(raw))
    }

    pub async fn is_trained(&self) -> bool {
        self.state.read().await.is_trained()
    }

    /// Snapshot of the current model state
    pub async fn state(&self) -> ModelState {
        self.state.read().await.clone()
    }
}

fn training_matrix(rows: &[Observation]) -> (Vec<[f64; 2]>, Vec<f64>) {
    rows.iter()
        .map(|o| ([o.years, o.job_level as f64], o.salary))
        .unzip()
}
