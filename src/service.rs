//! Salary service
//!
//! The top-level context handed to request handlers: owns the observation
//! store and the predictor, and pairs every store mutation with a retrain.
//!
//! A mutation is committed before the retrain runs. If the retrain then
//! fails to read the store, the mutation stays committed while the model is
//! left untrained, and the error is still returned to the caller.

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;
use crate::predictor::{ModelState, Predictor, RetrainOutcome};
use crate::store::SqliteObservationStore;
use crate::types::{DatasetStats, Field, ListOrder, NewObservation, Observation, Prediction};

#[derive(Clone)]
pub struct SalaryService {
    store: SqliteObservationStore,
    predictor: Arc<Predictor>,
}

impl SalaryService {
    pub fn new(store: SqliteObservationStore) -> Self {
        let predictor = Arc::new(Predictor::new(store.clone()));
        Self { store, predictor }
    }

    /// One-time startup step: optionally seed an empty store, then train.
    pub async fn initialize(&self, seed_on_empty: bool) -> Result<RetrainOutcome> {
        if seed_on_empty && self.store.count().await? == 0 {
            info!("Observation store empty, loading default observations");
            self.store.reset().await?;
        }
        self.predictor.retrain().await
    }

    pub async fn add_observation(&self, obs: NewObservation) -> Result<Observation> {
        let created = self.store.add(obs).await?;
        debug!("Added observation {}: {}", created.id, created);
        self.predictor.retrain().await?;
        Ok(created)
    }

    pub async fn delete_observation(&self, id: i64) -> Result<()> {
        self.store.delete(id).await?;
        debug!("Deleted observation {}", id);
        self.predictor.retrain().await?;
        Ok(())
    }

    /// Restore the canonical seed set
    pub async fn reset(&self) -> Result<()> {
        self.store.reset().await?;
        info!("Observation store reset to defaults");
        self.predictor.retrain().await?;
        Ok(())
    }

    /// Remove every observation, returning how many were removed
    pub async fn delete_all(&self) -> Result<usize> {
        let count = self.store.delete_all().await?;
        info!("Deleted all {} observations", count);
        self.predictor.retrain().await?;
        Ok(count)
    }

    pub async fn stats(&self) -> Result<DatasetStats> {
        Ok(DatasetStats {
            data_points: self.store.count().await?,
            average_salary: self.store.average(Field::Salary).await?,
            avg_experience: self.store.average(Field::Years).await?,
        })
    }

    /// Dataset ordered by years of experience
    pub async fn observations(&self) -> Result<Vec<Observation>> {
        self.store.list(ListOrder::Years).await
    }

    pub async fn predict(&self, years: f64, job_level: i64) -> Result<Prediction> {
        self.predictor.predict(years, job_level).await
    }

    pub async fn model_state(&self) -> ModelState {
        self.predictor.state().await
    }

    /// Force a retrain outside of a mutation
    pub async fn retrain(&self) -> Result<RetrainOutcome> {
        self.predictor.retrain().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::store::SEED_OBSERVATIONS;

    fn service() -> SalaryService {
        SalaryService::new(SqliteObservationStore::open_in_memory().unwrap())
    }

    fn obs(years: f64, job_level: i64, salary: f64) -> NewObservation {
        NewObservation::new(years, job_level, salary).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_on_empty_store() {
        let svc = service();
        assert_eq!(svc.initialize(false).await.unwrap(), RetrainOutcome::Empty);
        assert!(matches!(
            svc.predict(1.0, 1).await,
            Err(ServiceError::ModelNotTrained)
        ));
    }

    #[tokio::test]
    async fn test_initialize_seeds_when_asked() {
        let svc = service();
        assert_eq!(
            svc.initialize(true).await.unwrap(),
            RetrainOutcome::Trained { rows: 7 }
        );
        assert_eq!(svc.stats().await.unwrap().data_points, 7);
    }

    #[tokio::test]
    async fn test_initialize_does_not_reseed_populated_store() {
        let svc = service();
        svc.add_observation(obs(1.0, 1, 1.0)).await.unwrap();
        svc.initialize(true).await.unwrap();
        assert_eq!(svc.stats().await.unwrap().data_points, 1);
    }

    #[tokio::test]
    async fn test_add_then_predict() {
        let svc = service();
        svc.initialize(false).await.unwrap();

        svc.add_observation(obs(2.0, 3, 600000.0)).await.unwrap();
        let p = svc.predict(2.0, 3).await.unwrap();
        assert!(p.yearly > 0.0);
        assert_eq!(p.monthly, p.yearly / 12.0);
    }

    #[tokio::test]
    async fn test_non_empty_sets_always_train() {
        let sets: Vec<Vec<(f64, i64, f64)>> = vec![
            vec![(0.0, 0, 0.0)],
            vec![(1.0, 1, 10.0), (1.0, 1, 20.0)],
            vec![(1.0, 2, 10.0), (2.0, 4, 20.0), (3.0, 6, 30.0)],
            SEED_OBSERVATIONS.to_vec(),
        ];

        for set in sets {
            let svc = service();
            for (y, l, s) in set {
                svc.add_observation(obs(y, l, s)).await.unwrap();
            }
            assert!(svc.model_state().await.is_trained());
            assert!(svc.predict(4.0, 4).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_delete_all_then_predict() {
        let svc = service();
        svc.reset().await.unwrap();
        assert!(svc.predict(3.0, 3).await.is_ok());

        assert_eq!(svc.delete_all().await.unwrap(), 7);
        assert!(matches!(
            svc.predict(3.0, 3).await,
            Err(ServiceError::ModelNotTrained)
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let svc = service();
        svc.reset().await.unwrap();

        let err = svc.delete_observation(9999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(9999)));
        assert_eq!(svc.stats().await.unwrap().data_points, 7);
        assert!(svc.model_state().await.is_trained());
    }

    #[tokio::test]
    async fn test_delete_last_row_untrains() {
        let svc = service();
        let created = svc.add_observation(obs(2.0, 3, 600000.0)).await.unwrap();
        svc.delete_observation(created.id).await.unwrap();
        assert!(!svc.model_state().await.is_trained());
    }

    #[tokio::test]
    async fn test_stats() {
        let svc = service();
        let empty = svc.stats().await.unwrap();
        assert_eq!(
            empty,
            DatasetStats { data_points: 0, average_salary: 0.0, avg_experience: 0.0 }
        );

        svc.reset().await.unwrap();
        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.data_points, 7);
        assert!((stats.average_salary - 13100000.0 / 7.0).abs() < 1e-6);
        assert!((stats.avg_experience - 33.0 / 7.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_observations_sorted_by_years() {
        let svc = service();
        svc.add_observation(obs(9.0, 1, 1.0)).await.unwrap();
        svc.add_observation(obs(4.0, 1, 1.0)).await.unwrap();

        let rows = svc.observations().await.unwrap();
        assert_eq!(rows[0].years, 4.0);
        assert_eq!(rows[1].years, 9.0);
    }
}
