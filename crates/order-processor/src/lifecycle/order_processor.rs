use crate::adapters::{load_sdk_config, DynamoStore, SqsQueue};
use crate::config::{ConfigError, ProcessorConfig};
use crate::metrics::OrderMetrics;
use crate::model::OrderRecord;
use crate::server::{HealthServer, ServerError, ServerState};
use queue_framework::{LoopExit, MessageQueue, Outcome, PollLoop, RecordStore};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Final state reported when the processor stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub exit: LoopExit,
    pub processed: u64,
    pub failed: u64,
}

/// The running processor: the poll loop plus its metrics server.
pub struct OrderProcessor {
    poll_loop: PollLoop<OrderRecord>,
    metrics: OrderMetrics,
    server: HealthServer,
    shutdown_grace: Duration,
}

impl OrderProcessor {
    /// Builds the AWS clients and starts the server.
    pub async fn start(config: ProcessorConfig) -> Result<Self, StartupError> {
        let sdk_config = load_sdk_config(&config.aws).await;
        let queue = SqsQueue::new(aws_sdk_sqs::Client::new(&sdk_config), &config.queue_url);
        let store = DynamoStore::new(
            aws_sdk_dynamodb::Client::new(&sdk_config),
            &config.table_name,
        );

        Self::with_adapters(&config, Arc::new(queue), Arc::new(store)).await
    }

    /// Starts the server and wires the loop to the given queue and store.
    pub async fn with_adapters(
        config: &ProcessorConfig,
        queue: Arc<dyn MessageQueue>,
        store: Arc<dyn RecordStore<OrderRecord>>,
    ) -> Result<Self, StartupError> {
        let metrics = OrderMetrics::new(config.environment.clone())?;

        let server = HealthServer::bind(
            &config.server,
            ServerState {
                metrics: metrics.clone(),
                readiness: config.readiness(),
            },
        )
        .await?;

        let poll_loop = PollLoop::new(queue, store, Arc::new(metrics.clone()), config.poll);

        Ok(Self {
            poll_loop,
            metrics,
            server,
            shutdown_grace: config.server.shutdown_grace,
        })
    }

    pub fn metrics(&self) -> &OrderMetrics {
        &self.metrics
    }

    pub fn server_addr(&self) -> std::net::SocketAddr {
        self.server.local_addr()
    }

    /// Runs the loop until `cancel` fires, then stops the server.
    pub async fn run(self, cancel: CancellationToken) -> RunSummary {
        let exit = self.poll_loop.run(cancel).await;

        match self.server.shutdown(self.shutdown_grace).await {
            Ok(()) => info!("metrics server shut down gracefully"),
            Err(e) => error!(error = %e, "error shutting down metrics server"),
        }

        RunSummary {
            exit,
            processed: self.metrics.count(Outcome::Success),
            failed: self.metrics.count(Outcome::Error),
        }
    }
}
