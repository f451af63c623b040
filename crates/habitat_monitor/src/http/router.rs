use crate::http::{command, data, health, root, update, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/update", post(update))
        .route("/data", get(data))
        .route("/health", get(health))
        .route("/commands", post(command))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AlertPolicy, AlertService, CommandService, IngestionService, SeriesCheckpointer,
        SeriesStore,
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use common::domain::{
        AlertDestination, DomainError, MockMessageSink, MockPlotRenderer, MockSeriesRepository,
        NewReading,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Harness {
        store: Arc<SeriesStore>,
        router: Router,
    }

    fn harness(sink: MockMessageSink, destination: Option<&str>) -> Harness {
        let store = Arc::new(SeriesStore::new());
        let alerts = Arc::new(
            AlertService::new(AlertPolicy::default(), Arc::new(sink), Duration::from_secs(5))
                .with_destination(destination.map(AlertDestination::new)),
        );
        let checkpointer = Arc::new(SeriesCheckpointer::new(
            Arc::new(MockSeriesRepository::new()),
            0,
        ));
        let state = AppState {
            store: Arc::clone(&store),
            ingestion: Arc::new(IngestionService::new(
                Arc::clone(&store),
                checkpointer,
                Arc::clone(&alerts),
            )),
            commands: Arc::new(CommandService::new(
                Arc::clone(&store),
                Arc::clone(&alerts),
                Arc::new(MockPlotRenderer::new()),
            )),
            alerts,
        };
        Harness {
            store,
            router: create_router(state),
        }
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_update_stores_reading_and_reports_status() {
        let h = harness(MockMessageSink::new(), None);

        let (status, body) = send(
            h.router,
            post_json("/update", r#"{"temp": 41.0, "hum": "50", "rssi": -70}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "OK",
                "message": "Data received",
                "tortoise_status": {"temp_status": "warning", "hum_status": "ok"}
            })
        );
        let latest = h.store.latest().await.unwrap();
        assert_eq!(latest.temperature, 41.0);
        assert_eq!(latest.extra["rssi"], json!(-70));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_payloads() {
        for (payload, detail) in [
            ("{not json", Some("Invalid JSON")),
            (r#"{"hum": 50}"#, None),
            (r#"{"temp": "hot", "hum": 50}"#, None),
            (r#"[28, 50]"#, None),
        ] {
            let h = harness(MockMessageSink::new(), None);

            let (status, body) = send(h.router, post_json("/update", payload)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
            if let Some(detail) = detail {
                assert_eq!(body["detail"], detail);
            }
            assert_eq!(h.store.size().await, 0);
        }
    }

    #[tokio::test]
    async fn test_update_dispatches_alert_and_survives_delivery_failure() {
        let mut sink = MockMessageSink::new();
        sink.expect_send()
            .withf(|destination, content| {
                destination.as_str() == "alerts" && content.contains("TEMPERATURE TOO LOW")
            })
            .times(1)
            .returning(|_, _| Err(DomainError::DispatchError("offline".to_string())));
        let h = harness(sink, Some("alerts"));

        let (status, _) = send(h.router, post_json("/update", r#"{"temp": 10, "hum": 50}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(h.store.size().await, 1);
    }

    #[tokio::test]
    async fn test_data_applies_limit_after_filter() {
        let h = harness(MockMessageSink::new(), None);
        let now = chrono::Utc::now();
        h.store
            .restore(
                (0..5)
                    .map(|i| {
                        NewReading::new(20.0 + i as f64, 50.0)
                            .at(now - chrono::Duration::hours(48 - 12 * i))
                            .into_reading(now)
                    })
                    .collect(),
            )
            .await;

        let (status, body) = send(h.router, get("/data?hours=24&limit=2")).await;

        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["temp"], json!(23.0));
        assert_eq!(data[1]["temp"], json!(24.0));
        assert!(data[1]["time"].is_string());
    }

    #[tokio::test]
    async fn test_data_default_limit() {
        let h = harness(MockMessageSink::new(), None);
        for i in 0..150 {
            h.store
                .append(NewReading::new(i as f64, 50.0))
                .await
                .unwrap();
        }

        let (_, body) = send(h.router, get("/data")).await;

        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 100);
        assert_eq!(data[99]["temp"], json!(149.0));
    }

    #[tokio::test]
    async fn test_data_with_largest_hours_returns_everything() {
        let h = harness(MockMessageSink::new(), None);
        h.store.append(NewReading::new(28.0, 50.0)).await.unwrap();
        h.store.append(NewReading::new(29.0, 51.0)).await.unwrap();

        let (status, body) = send(h.router, get("/data?hours=4294967295")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_data_rejects_negative_hours() {
        let h = harness(MockMessageSink::new(), None);

        let (status, body) = send(h.router, get("/data?hours=-1")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let h = harness(MockMessageSink::new(), None);
        h.store.append(NewReading::new(28.0, 50.0)).await.unwrap();

        let (status, body) = send(h.router.clone(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["data_points"], 1);
        assert!(body["timestamp"].is_string());

        let (status, body) = send(h.router, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["endpoints"]["/update"].is_string());
    }

    #[tokio::test]
    async fn test_commands_endpoint() {
        let h = harness(MockMessageSink::new(), None);

        let (status, body) = send(
            h.router.clone(),
            post_json("/commands", r#"{"channel_id": "7", "content": "!temp"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"], json!(["No data available yet!"]));
        assert!(body["attachment"].is_null());

        let (status, _) = send(h.router, post_json("/commands", r#"{"content": "!temp"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
