//! Dataset replay for the push stream.
//!
//! Walks the loaded dataset rows in file order, predicting each one and
//! flagging sensors above their alert threshold. Rows are paced by the
//! configured interval; there is no delay before the first row.
//!
//! [`SensorReplay::next_event`] is cancel-safe: the deadline for the next row
//! is fixed when the previous row is emitted, so dropping the future mid-wait
//! and calling again resumes the same wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::AlertThresholds;
use crate::forest::Classifier;
use crate::types::{FeatureRow, SensorEvent, FEATURE_COLUMNS};

/// Sensor column names whose value is strictly above its threshold, in
/// feature order.
pub fn alerts_for(row: &FeatureRow, thresholds: &AlertThresholds) -> Vec<String> {
    let limits = [
        thresholds.temperature,
        thresholds.speed,
        thresholds.torque,
        thresholds.tool_wear,
    ];
    row.to_array()
        .iter()
        .zip(limits)
        .zip(FEATURE_COLUMNS)
        .filter(|((value, limit), _)| **value > *limit)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Replays dataset rows as [`SensorEvent`]s for one stream subscriber.
pub struct SensorReplay {
    rows: Arc<Vec<FeatureRow>>,
    model: Arc<dyn Classifier>,
    thresholds: AlertThresholds,
    interval: Duration,
    stop_on_fault: bool,
    position: usize,
    next_due: Option<Instant>,
    halted: bool,
}

impl SensorReplay {
    pub fn new(
        rows: Arc<Vec<FeatureRow>>,
        model: Arc<dyn Classifier>,
        thresholds: AlertThresholds,
        interval: Duration,
    ) -> Self {
        Self {
            rows,
            model,
            thresholds,
            interval,
            stop_on_fault: false,
            position: 0,
            next_due: None,
            halted: false,
        }
    }

    /// End the replay after the first row predicted as a fault.
    #[must_use]
    pub const fn stop_on_fault(mut self, enabled: bool) -> Self {
        self.stop_on_fault = enabled;
        self
    }

    /// Number of events produced so far.
    pub const fn emitted(&self) -> usize {
        self.position
    }

    /// Next event, or `None` once the dataset is exhausted (or a fault was
    /// hit with `stop_on_fault`).
    pub async fn next_event(&mut self) -> Option<SensorEvent> {
        if self.halted {
            return None;
        }
        let row = *self.rows.get(self.position)?;

        if let Some(due) = self.next_due {
            tokio::time::sleep_until(due).await;
        }
        self.position += 1;
        self.next_due = (!self.interval.is_zero()).then(|| Instant::now() + self.interval);

        let event = SensorEvent {
            input: row,
            prediction: self.model.predict(&row),
            alerts: alerts_for(&row, &self.thresholds),
        };
        if self.stop_on_fault && event.is_fault() {
            tracing::debug!(row = self.position, "Fault predicted, stopping replay");
            self.halted = true;
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;

    /// Faults iff torque above 50.
    struct TorqueRule;

    impl Classifier for TorqueRule {
        fn classes(&self) -> &[Label] {
            &[0, 1]
        }

        fn predict(&self, row: &FeatureRow) -> Label {
            Label::from(row.torque > 50.0)
        }
    }

    fn rows() -> Arc<Vec<FeatureRow>> {
        Arc::new(vec![
            FeatureRow::new(308.0, 1500.0, 40.0, 10.0),
            FeatureRow::new(313.0, 1900.0, 45.0, 20.0),
            FeatureRow::new(309.0, 1400.0, 58.0, 210.0),
            FeatureRow::new(310.0, 1600.0, 30.0, 30.0),
        ])
    }

    fn replay(interval: Duration) -> SensorReplay {
        SensorReplay::new(rows(), Arc::new(TorqueRule), AlertThresholds::default(), interval)
    }

    #[test]
    fn test_alerts() {
        let t = AlertThresholds::default();
        assert!(alerts_for(&FeatureRow::new(310.0, 1500.0, 40.0, 100.0), &t).is_empty());
        assert_eq!(
            alerts_for(&FeatureRow::new(313.0, 1900.0, 40.0, 201.0), &t),
            vec!["Process temperature [K]", "Rotational speed [rpm]", "Tool wear [min]"]
        );
        // Equal to threshold is not an alert.
        assert!(alerts_for(&FeatureRow::new(312.0, 1800.0, 55.0, 200.0), &t).is_empty());
    }

    #[tokio::test]
    async fn test_one_event_per_row_in_order() {
        let mut replay = replay(Duration::ZERO);
        let mut seen = Vec::new();
        while let Some(event) = replay.next_event().await {
            seen.push(event);
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(replay.emitted(), 4);
        for (event, row) in seen.iter().zip(rows().iter()) {
            assert_eq!(event.input, *row);
        }
        assert_eq!(
            seen.iter().map(|e| e.prediction).collect::<Vec<_>>(),
            vec![0, 0, 1, 0]
        );
        assert!(replay.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_stop_on_fault() {
        let mut replay = replay(Duration::ZERO).stop_on_fault(true);
        let mut count = 0;
        while let Some(event) = replay.next_event().await {
            count += 1;
            if count == 3 {
                assert!(event.is_fault());
            }
        }
        assert_eq!(count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_by_interval() {
        let mut replay = replay(Duration::from_secs(2));
        let start = tokio::time::Instant::now();

        replay.next_event().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        replay.next_event().await;
        replay.next_event().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_wait_keeps_cadence() {
        let mut replay = replay(Duration::from_secs(2));
        let start = tokio::time::Instant::now();
        let mut emitted = Vec::new();

        // Abandon the pending wait every 700ms, as a select loop does when
        // another branch wins.
        while emitted.len() < 4 {
            match tokio::time::timeout(Duration::from_millis(700), replay.next_event()).await {
                Ok(Some(_)) => emitted.push(start.elapsed()),
                Ok(None) => break,
                Err(_) => {}
            }
        }

        assert_eq!(
            emitted,
            vec![
                Duration::ZERO,
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(6),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_dataset() {
        let mut replay = SensorReplay::new(
            Arc::new(Vec::new()),
            Arc::new(TorqueRule),
            AlertThresholds::default(),
            Duration::ZERO,
        );
        assert!(replay.next_event().await.is_none());
    }
}
