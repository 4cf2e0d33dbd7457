//! Continuous test driver: HTTP client for sensor service → prediction
//! service round trips.
//!
//! Each cycle fetches a random row from the sensor service and posts it to
//! the prediction service. There are no retries; the first failed call ends
//! the run.

use std::time::Duration;

use crate::config::DriverConfig;
use crate::types::{FeatureRow, PredictResponse, PredictionResult};

/// Driver errors
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    ServerError {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Totals reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    pub cycles: usize,
    pub faults: usize,
}

#[derive(Clone)]
pub struct ContinuousTester {
    http: reqwest::Client,
    random_input_url: String,
    predict_url: String,
    delay: Duration,
}

impl ContinuousTester {
    pub fn new(config: &DriverConfig) -> Result<Self, DriverError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("motor-fault/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            random_input_url: config.random_input_url.clone(),
            predict_url: config.predict_url.clone(),
            delay: Duration::from_secs(config.delay_secs),
        })
    }

    /// Override the pause between cycles.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// GET a random row from the sensor service.
    pub async fn fetch_random_input(&self) -> Result<FeatureRow, DriverError> {
        let resp = self.http.get(&self.random_input_url).send().await?;
        let resp = check_status(resp, &self.random_input_url)?;
        Ok(resp.json().await?)
    }

    /// POST a row to the prediction service.
    pub async fn predict(&self, row: &FeatureRow) -> Result<PredictResponse, DriverError> {
        let resp = self.http.post(&self.predict_url).json(row).send().await?;
        let resp = check_status(resp, &self.predict_url)?;
        Ok(resp.json().await?)
    }

    /// One fetch-then-predict round trip.
    pub async fn run_cycle(&self) -> Result<PredictionResult, DriverError> {
        let input = self.fetch_random_input().await?;
        let PredictResponse { prediction } = self.predict(&input).await?;
        Ok(PredictionResult { input, prediction })
    }

    /// Run `count` cycles, calling `on_cycle` after each, pausing the
    /// configured delay between cycles.
    pub async fn run<F>(&self, count: usize, mut on_cycle: F) -> Result<DriverSummary, DriverError>
    where
        F: FnMut(usize, &PredictionResult),
    {
        let mut summary = DriverSummary::default();
        for i in 0..count {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let result = self.run_cycle().await?;
            summary.cycles += 1;
            if result.prediction == 1 {
                summary.faults += 1;
            }
            on_cycle(i + 1, &result);
        }
        Ok(summary)
    }
}

fn check_status(resp: reqwest::Response, url: &str) -> Result<reqwest::Response, DriverError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(DriverError::ServerError {
            url: url.to_string(),
            status: resp.status(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_service_is_error() {
        let config = DriverConfig {
            random_input_url: "http://127.0.0.1:1/random_input".to_string(),
            ..DriverConfig::default()
        };
        let tester = ContinuousTester::new(&config).unwrap();
        assert!(matches!(tester.run_cycle().await, Err(DriverError::Http(_))));
    }

    #[tokio::test]
    async fn test_zero_cycles() {
        let tester = ContinuousTester::new(&DriverConfig::default()).unwrap();
        let summary = tester.run(0, |_, _| {}).await.unwrap();
        assert_eq!(summary, DriverSummary::default());
    }
}
