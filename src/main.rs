//! Salary Predictor
//!
//! Web service that predicts salaries from years of experience and job level.

use salary_predictor::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::run().await
}
