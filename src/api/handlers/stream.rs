//! WebSocket dataset replay
//!
//! Protocol (JSON text frames):
//! - client: `{"event": "start_stream", "stop_on_fault": false}`
//! - server: `{"event": "sensor_data", "data": {"input", "prediction", "alerts"}}`
//!   once per dataset row, then `{"event": "stream_end", "data": {"emitted": n}}`
//!
//! A connection may start any number of streams one after another. The
//! stream ends early if the client disconnects or the server shuts down.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::ServiceState;
use crate::replay::SensorReplay;
use crate::types::SensorEvent;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    StartStream {
        #[serde(default)]
        stop_on_fault: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    SensorData(SensorEvent),
    StreamEnd { emitted: usize },
    Error { message: String },
}

/// GET /ws
pub async fn stream_ws(ws: WebSocketUpgrade, State(state): State<ServiceState>) -> Response {
    ws.on_upgrade(move |socket: WebSocket| async move {
        let (sink, stream) = socket.split();
        run_session(sink, stream, state).await;
    })
}

/// How a single stream finished.
enum StreamOutcome {
    Completed,
    Disconnected,
}

/// Drive one connection until the client goes away or the server shuts down.
pub async fn run_session<S, R, E>(mut sink: S, mut incoming: R, state: ServiceState)
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    tracing::debug!("Stream client connected");
    loop {
        let msg = tokio::select! {
            msg = incoming.next() => msg,
            () = state.shutdown.cancelled() => break,
        };
        let text = match msg {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_)) | Err(_)) | None => break,
            Some(Ok(_)) => continue,
        };

        match serde_json::from_str::<ClientEvent>(&text) {
            Ok(ClientEvent::StartStream { stop_on_fault }) => {
                let replay = SensorReplay::new(
                    state.replay_rows.clone(),
                    state.model.clone(),
                    state.stream.alerts,
                    state.stream.interval(),
                )
                .stop_on_fault(stop_on_fault);

                match stream_rows(&mut sink, &mut incoming, replay, &state).await {
                    StreamOutcome::Completed => {}
                    StreamOutcome::Disconnected => break,
                }
            }
            Err(e) => {
                let event = ServerEvent::Error {
                    message: format!("Unrecognised message: {e}"),
                };
                if send_event(&mut sink, &event).await.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("Stream client disconnected");
}

async fn stream_rows<S, R, E>(
    sink: &mut S,
    incoming: &mut R,
    mut replay: SensorReplay,
    state: &ServiceState,
) -> StreamOutcome
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    tracing::info!(rows = state.replay_rows.len(), "Stream started");
    loop {
        tokio::select! {
            event = replay.next_event() => {
                let Some(event) = event else { break };
                state.counters.record_prediction(event.prediction);
                state.counters.record_stream_event();
                if send_event(sink, &ServerEvent::SensorData(event)).await.is_err() {
                    return StreamOutcome::Disconnected;
                }
            }
            msg = incoming.next() => {
                // Requests arriving mid-stream are ignored.
                if matches!(msg, Some(Ok(Message::Close(_)) | Err(_)) | None) {
                    return StreamOutcome::Disconnected;
                }
            }
            () = state.shutdown.cancelled() => return StreamOutcome::Disconnected,
        }
    }

    let emitted = replay.emitted();
    tracing::info!(emitted, "Stream finished");
    if send_event(sink, &ServerEvent::StreamEnd { emitted }).await.is_err() {
        return StreamOutcome::Disconnected;
    }
    StreamOutcome::Completed
}

async fn send_event<S>(sink: &mut S, event: &ServerEvent) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let text = serde_json::to_string(event).map_err(|e| {
        tracing::error!(error = %e, "Failed to encode stream event");
    })?;
    sink.send(Message::Text(text)).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_state;
    use super::*;
    use futures::channel::mpsc;

    fn text(value: &serde_json::Value) -> Result<Message, axum::Error> {
        Ok(Message::Text(value.to_string()))
    }

    async fn collect_events(out: mpsc::UnboundedReceiver<Message>) -> Vec<ServerEvent> {
        out.filter_map(|m| async move {
            match m {
                Message::Text(t) => Some(serde_json::from_str(&t).unwrap()),
                _ => None,
            }
        })
        .collect()
        .await
    }

    #[tokio::test]
    async fn test_stream_emits_every_row_then_ends() {
        let state = create_test_state();
        let (sink, out) = mpsc::unbounded();
        let incoming = futures::stream::iter(vec![text(&serde_json::json!({"event": "start_stream"}))])
            .chain(futures::stream::pending());

        let session = tokio::spawn(run_session(sink, Box::pin(incoming), state.clone()));
        let mut out = out;
        let mut events = Vec::new();
        while let Some(Message::Text(t)) = out.next().await {
            let event: ServerEvent = serde_json::from_str(&t).unwrap();
            let done = matches!(event, ServerEvent::StreamEnd { .. });
            events.push(event);
            if done {
                break;
            }
        }
        state.shutdown.cancel();
        session.await.unwrap();

        assert_eq!(events.len(), 4);
        for (event, row) in events.iter().zip(state.replay_rows.iter()) {
            match event {
                ServerEvent::SensorData(e) => assert_eq!(e.input, *row),
                other => panic!("expected sensor_data, got {other:?}"),
            }
        }
        assert_eq!(events[3], ServerEvent::StreamEnd { emitted: 3 });
        assert_eq!(state.counters.stream_events(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_pings_do_not_stall_stream() {
        let mut state = create_test_state();
        state.stream.interval_ms = 2000;
        let (sink, mut out) = mpsc::unbounded();
        let (client, incoming) = mpsc::unbounded::<Result<Message, axum::Error>>();
        client
            .unbounded_send(text(&serde_json::json!({"event": "start_stream"})))
            .unwrap();

        // Keepalive every second, faster than the row interval.
        let pinger = client.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                if pinger.unbounded_send(Ok(Message::Ping(Vec::new()))).is_err() {
                    break;
                }
            }
        });

        let start = tokio::time::Instant::now();
        let session = tokio::spawn(run_session(sink, incoming, state.clone()));
        let mut events = Vec::new();
        while let Some(Message::Text(t)) = out.next().await {
            let event: ServerEvent = serde_json::from_str(&t).unwrap();
            let done = matches!(event, ServerEvent::StreamEnd { .. });
            events.push(event);
            if done {
                break;
            }
        }
        let elapsed = start.elapsed();
        state.shutdown.cancel();
        session.await.unwrap();

        assert_eq!(events.len(), 4);
        assert_eq!(events[3], ServerEvent::StreamEnd { emitted: 3 });
        assert!(
            elapsed >= std::time::Duration::from_secs(4) && elapsed < std::time::Duration::from_secs(5),
            "stream took {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_stop_on_fault_ends_early() {
        let state = create_test_state();
        let (sink, out) = mpsc::unbounded();
        let incoming = futures::stream::iter(vec![text(
            &serde_json::json!({"event": "start_stream", "stop_on_fault": true}),
        )])
        .chain(futures::stream::pending());

        let token = state.shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            token.cancel();
        });
        run_session(sink, incoming, state).await;

        let events = collect_events(out).await;
        assert_eq!(events.len(), 3);
        match &events[1] {
            ServerEvent::SensorData(e) => {
                assert!(e.is_fault());
                assert_eq!(e.alerts.len(), 4);
            }
            other => panic!("expected sensor_data, got {other:?}"),
        }
        assert_eq!(events[2], ServerEvent::StreamEnd { emitted: 2 });
    }

    #[tokio::test]
    async fn test_unknown_message_gets_error_event() {
        let state = create_test_state();
        let (sink, out) = mpsc::unbounded();
        let incoming = futures::stream::iter(vec![
            text(&serde_json::json!({"event": "reboot"})),
            Ok(Message::Close(None)),
        ]);

        run_session(sink, incoming, state).await;

        let events = collect_events(out).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ServerEvent::Error { message } if message.contains("Unrecognised")));
    }

    #[tokio::test]
    async fn test_client_close_mid_stream() {
        let mut state = create_test_state();
        state.stream.interval_ms = 60_000;
        let (sink, out) = mpsc::unbounded();
        let incoming = futures::stream::iter(vec![
            text(&serde_json::json!({"event": "start_stream"})),
            Ok(Message::Close(None)),
        ]);

        run_session(sink, incoming, state).await;

        let events = collect_events(out).await;
        assert!(events.len() <= 1);
        assert!(!events.iter().any(|e| matches!(e, ServerEvent::StreamEnd { .. })));
    }
}
