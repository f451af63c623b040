//! Runs the long-lived pieces of the habitat monitor side by side and shuts them down together.
//!
//! A [`Runner`] owns a set of named app processes (the HTTP API, background listeners) and a set
//! of closers (final checkpoint, flushing logs). Processes run until one of them fails, all of
//! them finish, or SIGINT/SIGTERM arrives. Closers then run under a shared timeout.
//!
//! ```no_run
//! use habitat_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     Runner::new()
//!         .with_named_process("heartbeat", |ctx| async move {
//!             loop {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => break,
//!                     _ = tokio::time::sleep(Duration::from_secs(30)) => {
//!                         tracing::info!("still alive");
//!                     }
//!                 }
//!             }
//!             Ok(())
//!         })
//!         .with_closer(|| async move {
//!             tracing::info!("saving state");
//!             Ok(())
//!         })
//!         .run()
//!         .await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Boxed future every process and closer resolves to.
pub type RunnerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A process receives the shared cancellation token and runs until it is cancelled.
pub type AppProcess = Box<dyn FnOnce(CancellationToken) -> RunnerFuture + Send>;

/// Cleanup executed once every process has stopped.
pub type Closer = Box<dyn FnOnce() -> RunnerFuture + Send>;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every process stopped without error (or was cancelled).
    Clean,
    /// The named process failed and brought the others down.
    Failed {
        process: String,
        error: anyhow::Error,
    },
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Clean => 0,
            RunOutcome::Failed { .. } => 1,
        }
    }
}

pub struct Runner {
    processes: Vec<(String, AppProcess)>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
    handle_signals: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Creates a runner with no processes, a 10 second closer timeout and signal handling on.
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
            handle_signals: true,
        }
    }

    /// Adds a process under `name`. The name shows up in every log line about the process.
    pub fn with_named_process<N, F, Fut>(mut self, name: N, process: F) -> Self
    where
        N: Into<String>,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let process: AppProcess = Box::new(move |token| -> RunnerFuture { Box::pin(process(token)) });
        self.processes.push((name.into(), process));
        self
    }

    /// Adds a cleanup step. All closers run concurrently; a failing closer does not stop the others.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let closer: Closer = Box::new(move || -> RunnerFuture { Box::pin(closer()) });
        self.closers.push(closer);
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Uses an externally owned token so callers can stop the runner themselves.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Disables SIGINT/SIGTERM handling (tests drive shutdown through the token instead).
    pub fn without_signal_handlers(mut self) -> Self {
        self.handle_signals = false;
        self
    }

    /// Runs to completion and exits the process with the outcome's exit code.
    pub async fn run(self) {
        let outcome = self.execute().await;
        match &outcome {
            RunOutcome::Clean => tracing::info!("Application exiting normally"),
            RunOutcome::Failed { process, error } => {
                tracing::error!(process = %process, "Application exiting with error: {:#}", error)
            }
        }
        std::process::exit(outcome.exit_code());
    }

    /// Runs every process, waits for shutdown, runs the closers and reports the outcome.
    pub async fn execute(self) -> RunOutcome {
        let token = self.cancellation_token;
        let mut join_set = JoinSet::new();

        for (name, process) in self.processes {
            let process_token = token.clone();
            tracing::debug!(process = %name, "Starting app process");
            join_set.spawn(async move {
                let result = process(process_token).await;
                (name, result)
            });
        }

        if self.handle_signals {
            spawn_signal_handlers(token.clone());
        }

        let mut outcome = RunOutcome::Clean;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    tracing::debug!(process = %name, "App process completed");
                }
                Ok((name, Err(error))) => {
                    if !token.is_cancelled() {
                        tracing::error!(process = %name, "App process error: {:#}", error);
                        outcome = RunOutcome::Failed {
                            process: name,
                            error,
                        };
                        token.cancel();
                    }
                }
                Err(join_error) => {
                    tracing::error!("App process panicked: {}", join_error);
                    if !token.is_cancelled() {
                        outcome = RunOutcome::Failed {
                            process: "unknown".to_string(),
                            error: anyhow::anyhow!("process panicked: {join_error}"),
                        };
                        token.cancel();
                    }
                }
            }

            if token.is_cancelled() {
                break;
            }
        }

        join_set.shutdown().await;

        if !self.closers.is_empty() {
            tracing::info!("Running closers with timeout of {:?}", self.closer_timeout);
            match tokio::time::timeout(self.closer_timeout, run_closers(self.closers)).await {
                Ok(()) => tracing::info!("All closers completed"),
                Err(_) => tracing::error!("Closers timed out after {:?}", self.closer_timeout),
            }
        }

        outcome
    }
}

fn spawn_signal_handlers(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => tracing::error!("Error setting up signal handler: {}", err),
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
                token.cancel();
            }
            Err(err) => tracing::error!("Error setting up SIGTERM handler: {}", err),
        }
    });
}

async fn run_closers(closers: Vec<Closer>) {
    let mut closer_set = JoinSet::new();
    for closer in closers {
        closer_set.spawn(closer());
    }

    while let Some(result) = closer_set.join_next().await {
        match result {
            Ok(Ok(())) => tracing::debug!("Closer completed successfully"),
            Ok(Err(err)) => tracing::error!("Closer error: {:#}", err),
            Err(err) => tracing::error!("Closer panicked: {}", err),
        }
    }
}
