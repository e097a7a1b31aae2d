use order_processor::config::ProcessorConfig;
use order_processor::lifecycle::OrderProcessor;
use queue_framework::shutdown::cancel_on_signal;
use queue_framework::tracing::setup_tracing;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    setup_tracing();

    let config = match ProcessorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    info!(
        queue_url = %config.queue_url,
        table = %config.table_name,
        environment = %config.environment,
        "starting SQS poller"
    );

    let processor = match OrderProcessor::start(config).await {
        Ok(processor) => processor,
        Err(e) => {
            error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let signals = cancel_on_signal(cancel.clone());

    let summary = processor.run(cancel.clone()).await;
    cancel.cancel();
    let _ = signals.await;

    info!(
        exit = ?summary.exit,
        processed = summary.processed,
        failed = summary.failed,
        "Order processor stopped"
    );
    ExitCode::SUCCESS
}
