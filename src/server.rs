//! Listener lifecycle: bind, serve with graceful shutdown, supervise.
//!
//! Each listener runs as a task in a `JoinSet`. The supervisor returns when
//! the shutdown token fires or when every task has finished; a task that
//! fails or panics cancels the others.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::api::{create_predict_app, create_sensor_app, ServiceState};
use crate::config::MotorConfig;
use crate::dataset::Dataset;
use crate::forest::{self, Classifier};
use crate::generator::InputGenerator;

/// Supervised task identity, reported when a task exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskName {
    SensorService,
    PredictionService,
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorService => write!(f, "SensorService"),
            Self::PredictionService => write!(f, "PredictionService"),
        }
    }
}

/// Bind a TCP listener with the address in the error context.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))
}

/// Spawn an HTTP server task into the `JoinSet`.
pub fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    name: TaskName,
    listener: TcpListener,
    app: Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!(
            addr = ?listener.local_addr().ok(),
            "[{name}] Task starting"
        );

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[{name}] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[{name}] Graceful shutdown complete");
                Ok(name)
            }
            Err(e) => {
                error!("[{name}] Server error: {e}");
                Err(anyhow::anyhow!("{name} server error: {e}"))
            }
        }
    });
}

/// Spawn both listeners sharing one [`ServiceState`].
pub fn spawn_services(
    task_set: &mut JoinSet<Result<TaskName>>,
    state: ServiceState,
    sensor_listener: TcpListener,
    predict_listener: TcpListener,
    cancel_token: CancellationToken,
) {
    let state = state.with_shutdown(cancel_token.clone());
    spawn_http_server(
        task_set,
        TaskName::SensorService,
        sensor_listener,
        create_sensor_app(state.clone()),
        cancel_token.clone(),
    );
    spawn_http_server(
        task_set,
        TaskName::PredictionService,
        predict_listener,
        create_predict_app(state),
        cancel_token,
    );
}

/// Wait for shutdown or for a task to fail.
pub async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring");

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: task {task_name} completed normally");
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: task failed with error: {e}");
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: task panicked: {e}");
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {e}"));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Let listeners finish their graceful shutdown.
    while let Some(result) = task_set.join_next().await {
        if let Ok(Ok(task_name)) = result {
            info!("Supervisor: task {task_name} stopped");
        }
    }
    Ok(())
}

/// Build the shared service state from configuration: the model artifact
/// is loaded once here and never reloaded.
pub fn load_service_state(config: &MotorConfig) -> Result<ServiceState> {
    let artifact = forest::load_from_disk(&config.paths.model).with_context(|| {
        format!(
            "Failed to load model artifact {} (run `train` first)",
            config.paths.model.display()
        )
    })?;
    info!(
        path = %config.paths.model.display(),
        trees = artifact.forest.trees().len(),
        training_rows = artifact.metadata.training_rows,
        "Model artifact loaded"
    );

    let dataset = Dataset::load(&config.paths.dataset).with_context(|| {
        format!(
            "Failed to load replay dataset {}",
            config.paths.dataset.display()
        )
    })?;

    let model: Arc<dyn Classifier> = Arc::new(artifact.forest);
    Ok(ServiceState::new(
        model,
        InputGenerator::new(&config.generator),
        dataset.into_rows(),
        config.stream.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::tests::create_test_state;

    #[tokio::test]
    async fn test_services_shut_down_on_cancel() {
        let mut task_set = JoinSet::new();
        let token = CancellationToken::new();
        spawn_services(
            &mut task_set,
            create_test_state(),
            bind("127.0.0.1:0").await.unwrap(),
            bind("127.0.0.1:0").await.unwrap(),
            token.clone(),
        );

        token.cancel();
        run_supervisor(&mut task_set, token).await.unwrap();
        assert!(task_set.is_empty());
    }

    #[test]
    fn test_missing_model_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = MotorConfig::default();
        config.paths.model = dir.path().join("absent.json");
        let err = load_service_state(&config).err().unwrap();
        assert!(format!("{err:#}").contains("absent.json"));
    }

    #[tokio::test]
    async fn test_bind_error_names_address() {
        let held = bind("127.0.0.1:0").await.unwrap();
        let addr = held.local_addr().unwrap().to_string();
        let err = bind(&addr).await.unwrap_err();
        assert!(err.to_string().contains(&addr));
    }
}
