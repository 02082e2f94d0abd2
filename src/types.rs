//! Shared types used across modules
//!
//! Observations, statistics and prediction results, plus the numeric
//! coercion rules applied to request fields before they reach the store
//! or the predictor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ServiceError};

/// A single stored (years, job_level, salary) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Assigned by the store on creation
    pub id: i64,
    /// Years of experience
    pub years: f64,
    /// Job level
    pub job_level: i64,
    /// Yearly salary
    pub salary: f64,
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Yrs | Lvl {} | ₹{}", self.years, self.job_level, self.salary)
    }
}

/// A validated observation that has not been persisted yet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewObservation {
    pub years: f64,
    pub job_level: i64,
    pub salary: f64,
}

impl NewObservation {
    /// Build an observation from already-typed values, enforcing the data model
    pub fn new(years: f64, job_level: i64, salary: f64) -> Result<Self> {
        if !years.is_finite() || years < 0.0 {
            return Err(ServiceError::Validation(format!(
                "years must be a non-negative number, got {}",
                years
            )));
        }
        if !salary.is_finite() {
            return Err(ServiceError::Validation(format!(
                "salary must be a finite number, got {}",
                salary
            )));
        }
        Ok(Self { years, job_level, salary })
    }

    /// Build an observation from raw request fields
    pub fn from_fields(
        years: Option<&Value>,
        level: Option<&Value>,
        salary: Option<&Value>,
    ) -> Result<Self> {
        let years = coerce_f64("years", years)?;
        let job_level = coerce_i64("level", level)?;
        let salary = coerce_f64("salary", salary)?;
        Self::new(years, job_level, salary)
    }
}

/// Numeric columns that can be averaged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Years,
    JobLevel,
    Salary,
}

impl Field {
    /// Column name in the observations table
    pub fn column(&self) -> &'static str {
        match self {
            Field::Years => "years",
            Field::JobLevel => "job_level",
            Field::Salary => "salary",
        }
    }
}

/// Ordering for observation listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Insertion order
    #[default]
    None,
    /// Ascending years of experience
    Years,
}

/// Dataset summary served by the stats endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub data_points: usize,
    pub average_salary: f64,
    pub avg_experience: f64,
}

/// Output of a successful prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// Absolute value of the fitted yearly salary
    pub yearly: f64,
    /// `yearly / 12`
    pub monthly: f64,
}

impl Prediction {
    pub fn from_raw(raw: f64) -> Self {
        let yearly = raw.abs();
        Self {
            yearly,
            monthly: yearly / 12.0,
        }
    }
}

/// Coerce a request field into a finite float.
///
/// Accepts JSON numbers and strings holding a number. Missing, null and
/// non-numeric values are validation errors.
pub fn coerce_f64(name: &str, value: Option<&Value>) -> Result<f64> {
    let parsed = match value {
        None | Some(Value::Null) => {
            return Err(ServiceError::Validation(format!("missing field '{}'", name)))
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ServiceError::Validation(format!(
            "field '{}' is not a number",
            name
        ))),
    }
}

/// Coerce a request field into an integer.
///
/// Integral floats (`3.0`) are accepted; fractional values are rejected.
pub fn coerce_i64(name: &str, value: Option<&Value>) -> Result<i64> {
    let not_integer = || ServiceError::Validation(format!("field '{}' is not an integer", name));

    match value {
        None | Some(Value::Null) => {
            Err(ServiceError::Validation(format!("missing field '{}'", name)))
        }
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Ok(v),
            None => n.as_f64().and_then(integral).ok_or_else(not_integer),
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
                .ok_or_else(not_integer)
        }
        Some(_) => Err(not_integer()),
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}
