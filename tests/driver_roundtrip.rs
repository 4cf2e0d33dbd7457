//! Driver Round-Trip Tests
//!
//! Both listeners run on ephemeral loopback ports; the continuous test
//! driver talks to them over real HTTP.

use std::sync::Arc;
use std::time::Duration;

use motor_fault::api::ServiceState;
use motor_fault::config::{DriverConfig, StreamConfig};
use motor_fault::driver::{ContinuousTester, DriverError};
use motor_fault::forest::{ForestConfig, RandomForest};
use motor_fault::generator::InputGenerator;
use motor_fault::server::{self, TaskName};
use motor_fault::types::LabeledRow;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

struct Running {
    driver_config: DriverConfig,
    task_set: JoinSet<anyhow::Result<TaskName>>,
    token: CancellationToken,
}

impl Running {
    async fn stop(mut self) {
        self.token.cancel();
        server::run_supervisor(&mut self.task_set, self.token).await.unwrap();
    }
}

async fn start_services() -> Running {
    let generator = InputGenerator::default();
    let rows: Vec<LabeledRow> = generator
        .generate_batch(&mut StdRng::seed_from_u64(11), 200)
        .into_iter()
        .map(|features| LabeledRow {
            label: u8::from(features.torque > 50.0 && features.tool_wear > 150.0),
            features,
        })
        .collect();
    let forest = RandomForest::fit(
        ForestConfig {
            n_trees: 5,
            ..ForestConfig::default()
        },
        &rows,
    )
    .unwrap();
    let stream = StreamConfig {
        interval_ms: 0,
        ..StreamConfig::default()
    };
    let state = ServiceState::new(Arc::new(forest), generator, Vec::new(), stream);

    let sensor = server::bind("127.0.0.1:0").await.unwrap();
    let predict = server::bind("127.0.0.1:0").await.unwrap();
    let driver_config = DriverConfig {
        random_input_url: format!("http://{}/random_input", sensor.local_addr().unwrap()),
        predict_url: format!("http://{}/predict", predict.local_addr().unwrap()),
        delay_secs: 0,
    };

    let token = CancellationToken::new();
    let mut task_set = JoinSet::new();
    server::spawn_services(&mut task_set, state, sensor, predict, token.clone());

    Running {
        driver_config,
        task_set,
        token,
    }
}

#[tokio::test]
async fn test_cycle_returns_binary_label() {
    let running = start_services().await;
    let tester = ContinuousTester::new(&running.driver_config).unwrap();

    let result = tester.run_cycle().await.unwrap();
    assert!(result.prediction <= 1);
    assert!((305.0..=315.0).contains(&result.input.process_temperature));

    running.stop().await;
}

#[tokio::test]
async fn test_run_reports_every_cycle() {
    let running = start_services().await;
    let tester = ContinuousTester::new(&running.driver_config)
        .unwrap()
        .with_delay(Duration::ZERO);

    let mut seen = Vec::new();
    let summary = tester
        .run(5, |i, result| seen.push((i, result.prediction)))
        .await
        .unwrap();

    assert_eq!(summary.cycles, 5);
    assert_eq!(seen.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    assert_eq!(
        summary.faults,
        seen.iter().filter(|(_, p)| *p == 1).count()
    );

    running.stop().await;
}

#[tokio::test]
async fn test_wrong_route_aborts_run() {
    let running = start_services().await;
    let mut config = running.driver_config.clone();
    // Prediction listener has no /random_input route.
    config.random_input_url = config.predict_url.replace("/predict", "/random_input");
    let tester = ContinuousTester::new(&config).unwrap();

    let mut cycles = 0;
    let err = tester.run(3, |_, _| cycles += 1).await.unwrap_err();
    assert!(matches!(
        err,
        DriverError::ServerError { status, .. } if status == reqwest::StatusCode::NOT_FOUND
    ));
    assert_eq!(cycles, 0);

    running.stop().await;
}
