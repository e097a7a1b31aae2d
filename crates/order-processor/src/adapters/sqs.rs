use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client;
use queue_framework::{
    AcknowledgeError, Delivery, Lease, MessageQueue, ReceiveOptions, TransportError,
};
use std::time::Duration;
use tracing::debug;

/// Message id used when SQS returns none.
pub const UNKNOWN_MESSAGE_ID: &str = "unknown";

/// An SQS queue addressed by URL.
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

fn whole_seconds(duration: Duration) -> i32 {
    i32::try_from(duration.as_secs()).unwrap_or(i32::MAX)
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn receive_batch(&self, options: &ReceiveOptions) -> Result<Vec<Delivery>, TransportError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(options.max_messages)
            .wait_time_seconds(whole_seconds(options.wait_time))
            .visibility_timeout(whole_seconds(options.lease_duration))
            .send()
            .await
            .map_err(|e| TransportError::new(DisplayErrorContext(&e).to_string()))?;

        let deliveries: Vec<Delivery> = output
            .messages()
            .iter()
            .map(|message| {
                Delivery::new(
                    message.body().map(|body| body.as_bytes().to_vec()),
                    Lease::new(
                        message.message_id().unwrap_or(UNKNOWN_MESSAGE_ID),
                        message.receipt_handle().unwrap_or_default(),
                    ),
                )
            })
            .collect();

        debug!(batch_size = deliveries.len(), "Received SQS batch");
        Ok(deliveries)
    }

    async fn delete_lease(&self, lease: Lease) -> Result<(), AcknowledgeError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(lease.token())
            .send()
            .await
            .map_err(|e| AcknowledgeError::new(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_seconds_saturates() {
        assert_eq!(whole_seconds(Duration::from_secs(10)), 10);
        assert_eq!(whole_seconds(Duration::from_millis(1500)), 1);
        assert_eq!(whole_seconds(Duration::from_secs(u64::MAX)), i32::MAX);
    }
}
