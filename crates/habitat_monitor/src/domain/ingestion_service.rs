use crate::domain::{AlertService, PendingAlert, SeriesCheckpointer, SeriesStore};
use common::domain::{
    DomainError, DomainResult, HabitatStatus, NewReading, Reading, HUMIDITY_KEY, TEMPERATURE_KEY,
    TIME_KEY,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Outcome of accepting one reading.
#[derive(Debug, Clone)]
pub struct IngestionReceipt {
    pub reading: Arc<Reading>,
    pub status: HabitatStatus,
    /// Alert raised by this reading, still to be delivered.
    pub alert: Option<PendingAlert>,
}

/// Turn a decoded request body into a [`NewReading`].
///
/// `temp` and `hum` must be numbers or numeric strings. `time` is ignored, the store stamps
/// readings itself. Every other key is kept as an extra field.
pub fn parse_payload(payload: Value) -> DomainResult<NewReading> {
    let Value::Object(mut fields) = payload else {
        return Err(DomainError::ValidationError(
            "payload must be a JSON object".to_string(),
        ));
    };

    let temperature = take_number(&mut fields, TEMPERATURE_KEY)?;
    let humidity = take_number(&mut fields, HUMIDITY_KEY)?;
    fields.remove(TIME_KEY);

    Ok(NewReading::new(temperature, humidity).with_extra(fields))
}

fn take_number(fields: &mut Map<String, Value>, key: &str) -> DomainResult<f64> {
    let value = fields
        .remove(key)
        .ok_or_else(|| DomainError::ValidationError(format!("missing field '{}'", key)))?;
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.ok_or_else(|| DomainError::ValidationError(format!("field '{}' must be numeric", key)))
}

/// Accepts readings: store, checkpoint when due, classify and evaluate alerts.
pub struct IngestionService {
    store: Arc<SeriesStore>,
    checkpointer: Arc<SeriesCheckpointer>,
    alerts: Arc<AlertService>,
}

impl IngestionService {
    pub fn new(
        store: Arc<SeriesStore>,
        checkpointer: Arc<SeriesCheckpointer>,
        alerts: Arc<AlertService>,
    ) -> Self {
        Self {
            store,
            checkpointer,
            alerts,
        }
    }

    #[instrument(skip_all, fields(temperature = new_reading.temperature, humidity = new_reading.humidity))]
    pub async fn ingest(&self, new_reading: NewReading) -> DomainResult<IngestionReceipt> {
        let appended = self.store.append(new_reading).await?;
        if appended.evicted > 0 {
            debug!(evicted = appended.evicted, "evicted oldest readings");
        }

        if self.checkpointer.is_due(appended.sequence) {
            self.checkpointer.checkpoint(&self.store).await;
        }

        let reading = appended.reading;
        info!(
            temperature = reading.temperature,
            humidity = reading.humidity,
            stored = appended.len,
            "received reading"
        );

        let status = self
            .alerts
            .envelope()
            .status(reading.temperature, reading.humidity);
        let alert = self.alerts.evaluate(&reading).await;

        Ok(IngestionReceipt {
            reading,
            status,
            alert,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AlertPolicy;
    use common::domain::{
        AlertDestination, ConditionStatus, MockMessageSink, MockSeriesRepository,
    };
    use serde_json::json;
    use std::time::Duration;

    fn alerts(destination: Option<&str>) -> Arc<AlertService> {
        Arc::new(
            AlertService::new(
                AlertPolicy::default(),
                Arc::new(MockMessageSink::new()),
                Duration::from_secs(5),
            )
            .with_destination(destination.map(AlertDestination::new)),
        )
    }

    #[test]
    fn test_parse_payload_keeps_extras_and_drops_time() {
        let reading = parse_payload(json!({
            "temp": 28.5,
            "hum": "55",
            "time": "2020-01-01T00:00:00",
            "battery": 3.7
        }))
        .unwrap();

        assert_eq!(reading.temperature, 28.5);
        assert_eq!(reading.humidity, 55.0);
        assert!(reading.occurred_at.is_none());
        assert_eq!(reading.extra.len(), 1);
        assert_eq!(reading.extra["battery"], json!(3.7));
    }

    #[test]
    fn test_parse_payload_rejects_bad_shapes() {
        for payload in [
            json!([1, 2]),
            json!({"hum": 50}),
            json!({"temp": 20}),
            json!({"temp": "warm", "hum": 50}),
            json!({"temp": true, "hum": 50}),
            json!({"temp": null, "hum": 50}),
        ] {
            assert!(
                matches!(parse_payload(payload.clone()), Err(DomainError::ValidationError(_))),
                "{} should be rejected",
                payload
            );
        }
    }

    #[tokio::test]
    async fn test_ingest_checkpoints_every_nth_reading() {
        let mut repository = MockSeriesRepository::new();
        repository
            .expect_save()
            .withf(|readings| readings.len() == 3)
            .times(1)
            .returning(|_| Ok(()));
        let store = Arc::new(SeriesStore::new());
        let service = IngestionService::new(
            Arc::clone(&store),
            Arc::new(SeriesCheckpointer::new(Arc::new(repository), 3)),
            alerts(None),
        );

        for temp in [28.0, 29.0, 30.0, 31.0] {
            service.ingest(NewReading::new(temp, 50.0)).await.unwrap();
        }

        assert_eq!(store.size().await, 4);
    }

    #[tokio::test]
    async fn test_ingest_reports_status_and_alert() {
        let store = Arc::new(SeriesStore::new());
        let service = IngestionService::new(
            store,
            Arc::new(SeriesCheckpointer::new(Arc::new(MockSeriesRepository::new()), 0)),
            alerts(Some("chan")),
        );

        let calm = service.ingest(NewReading::new(30.0, 50.0)).await.unwrap();
        assert_eq!(calm.status.temp_status, ConditionStatus::Ok);
        assert!(calm.alert.is_none());

        let hot = service.ingest(NewReading::new(42.0, 50.0)).await.unwrap();
        assert_eq!(hot.status.temp_status, ConditionStatus::Warning);
        assert_eq!(hot.status.hum_status, ConditionStatus::Ok);
        assert!(hot.alert.is_some());
    }

    #[tokio::test]
    async fn test_ingest_rejects_non_finite_reading() {
        let store = Arc::new(SeriesStore::new());
        let service = IngestionService::new(
            Arc::clone(&store),
            Arc::new(SeriesCheckpointer::new(Arc::new(MockSeriesRepository::new()), 1)),
            alerts(None),
        );

        let payload = parse_payload(json!({"temp": "NaN", "hum": 50})).unwrap();
        let result = service.ingest(payload).await;

        assert!(matches!(result, Err(DomainError::ValidationError(_))));
        assert_eq!(store.size().await, 0);
    }
}
