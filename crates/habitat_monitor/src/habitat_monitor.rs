use crate::domain::{
    AlertPolicy, AlertService, CommandService, IngestionService, SeriesCheckpointer, SeriesStore,
    DEFAULT_ALERT_COOLDOWN_SECS, DEFAULT_FLUSH_EVERY,
};
use crate::http::{create_router, run_http_server, AppState, HttpServerConfig};
use axum::Router;
use common::domain::{
    AlertDestination, HabitatEnvelope, MessageSink, PlotRenderer, SeriesRepository,
    MAX_DATA_POINTS,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct HabitatMonitorConfig {
    pub http: HttpServerConfig,
    pub max_data_points: usize,
    pub flush_every: u64,
    pub envelope: HabitatEnvelope,
    pub alert_cooldown: chrono::Duration,
    pub alert_destination: Option<AlertDestination>,
    pub dispatch_timeout: Duration,
    pub rearm_on_dispatch_failure: bool,
}

impl Default for HabitatMonitorConfig {
    fn default() -> Self {
        Self {
            http: HttpServerConfig::default(),
            max_data_points: MAX_DATA_POINTS,
            flush_every: DEFAULT_FLUSH_EVERY,
            envelope: HabitatEnvelope::default(),
            alert_cooldown: chrono::Duration::seconds(DEFAULT_ALERT_COOLDOWN_SECS),
            alert_destination: None,
            dispatch_timeout: Duration::from_secs(10),
            rearm_on_dispatch_failure: false,
        }
    }
}

/// The monitor as a runnable module: store, services and the HTTP API wired together.
pub struct HabitatMonitor {
    state: AppState,
    checkpointer: Arc<SeriesCheckpointer>,
    http: HttpServerConfig,
}

impl HabitatMonitor {
    pub fn new(
        config: HabitatMonitorConfig,
        repository: Arc<dyn SeriesRepository>,
        sink: Arc<dyn MessageSink>,
        renderer: Arc<dyn PlotRenderer>,
    ) -> Self {
        debug!("Initializing habitat monitor module");

        let store = Arc::new(SeriesStore::with_capacity(config.max_data_points));
        let checkpointer = Arc::new(SeriesCheckpointer::new(repository, config.flush_every));
        let alerts = Arc::new(
            AlertService::new(
                AlertPolicy::new(config.envelope, config.alert_cooldown),
                sink,
                config.dispatch_timeout,
            )
            .with_destination(config.alert_destination)
            .with_rearm_on_failure(config.rearm_on_dispatch_failure),
        );
        let ingestion = Arc::new(IngestionService::new(
            Arc::clone(&store),
            Arc::clone(&checkpointer),
            Arc::clone(&alerts),
        ));
        let commands = Arc::new(CommandService::new(
            Arc::clone(&store),
            Arc::clone(&alerts),
            renderer,
        ));

        Self {
            state: AppState {
                store,
                ingestion,
                alerts,
                commands,
            },
            checkpointer,
            http: config.http,
        }
    }

    /// Load the last checkpoint into the store.
    pub async fn restore(&self) -> usize {
        self.checkpointer.restore(&self.state.store).await
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub fn router(&self) -> Router {
        create_router(self.state())
    }

    /// Closer writing a final checkpoint once the API has stopped.
    pub fn checkpoint_closer(
        &self,
    ) -> impl FnOnce() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
        let checkpointer = Arc::clone(&self.checkpointer);
        let store = Arc::clone(&self.state.store);
        move || {
            Box::pin(async move {
                let points = store.size().await;
                if checkpointer.checkpoint(&store).await {
                    info!(data_points = points, "final checkpoint written");
                }
                Ok(())
            })
        }
    }

    pub fn into_runner_process(
        self,
    ) -> impl FnOnce(
        CancellationToken,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
    > {
        move |ctx| Box::pin(async move { run_http_server(self.http, self.state, ctx).await })
    }
}
