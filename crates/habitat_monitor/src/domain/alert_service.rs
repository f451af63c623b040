use crate::domain::{AlertPolicy, AlertState};
use chrono::{DateTime, Utc};
use common::domain::{
    AlertDestination, AlertEvent, DomainError, DomainResult, HabitatEnvelope, MessageSink, Reading,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

/// An alert that was decided on but not yet delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAlert {
    pub event: AlertEvent,
    /// Cooldown marker before this alert advanced it.
    previous_alert_at: Option<DateTime<Utc>>,
}

/// Owns the alert state and delivers alerts through a [`MessageSink`].
///
/// Evaluation and delivery are split so a transport can answer its caller before or after
/// delivery. Delivery failures are logged and never retried.
pub struct AlertService {
    policy: AlertPolicy,
    state: Mutex<AlertState>,
    sink: Arc<dyn MessageSink>,
    dispatch_timeout: Duration,
    rearm_on_failure: bool,
}

impl AlertService {
    pub fn new(policy: AlertPolicy, sink: Arc<dyn MessageSink>, dispatch_timeout: Duration) -> Self {
        Self {
            policy,
            state: Mutex::new(AlertState::default()),
            sink,
            dispatch_timeout,
            rearm_on_failure: false,
        }
    }

    /// Roll the cooldown back when a delivery fails.
    pub fn with_rearm_on_failure(mut self, rearm: bool) -> Self {
        self.rearm_on_failure = rearm;
        self
    }

    pub fn with_destination(self, destination: Option<AlertDestination>) -> Self {
        Self {
            state: Mutex::new(AlertState {
                last_alert_at: None,
                destination,
            }),
            ..self
        }
    }

    pub fn envelope(&self) -> &HabitatEnvelope {
        self.policy.envelope()
    }

    pub async fn set_destination(&self, destination: AlertDestination) {
        info!(destination = %destination, "alert destination set");
        self.state.lock().await.destination = Some(destination);
    }

    pub async fn destination(&self) -> Option<AlertDestination> {
        self.state.lock().await.destination.clone()
    }

    pub async fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_alert_at
    }

    pub async fn evaluate(&self, reading: &Reading) -> Option<PendingAlert> {
        self.evaluate_at(reading, Utc::now()).await
    }

    pub async fn evaluate_at(&self, reading: &Reading, now: DateTime<Utc>) -> Option<PendingAlert> {
        let mut state = self.state.lock().await;
        let previous_alert_at = state.last_alert_at;
        let event = self.policy.evaluate(reading, &mut state, now)?;
        Some(PendingAlert {
            event,
            previous_alert_at,
        })
    }

    /// Deliver an alert, bounded by the dispatch timeout.
    #[instrument(skip_all, fields(destination = %pending.event.destination, breaches = pending.event.breaches.len()))]
    pub async fn dispatch(&self, pending: PendingAlert) -> DomainResult<()> {
        let message = pending.event.message();
        let outcome = match tokio::time::timeout(
            self.dispatch_timeout,
            self.sink.send(&pending.event.destination, &message),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DomainError::DispatchError(format!(
                "delivery timed out after {:?}",
                self.dispatch_timeout
            ))),
        };

        match &outcome {
            Ok(()) => info!("alert delivered"),
            Err(e) => {
                error!(error = %e, "failed to deliver alert");
                if self.rearm_on_failure {
                    self.rearm(&pending).await;
                }
            }
        }
        outcome
    }

    async fn rearm(&self, pending: &PendingAlert) {
        let mut state = self.state.lock().await;
        // only undo our own advance, not a newer one
        if state.last_alert_at == Some(pending.event.raised_at) {
            state.last_alert_at = pending.previous_alert_at;
            warn!("alert cooldown re-armed after failed delivery");
        }
    }
}
