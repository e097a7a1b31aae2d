//! # AWS Adapters
//!
//! Implementations of the framework's capability traits on top of the AWS SDK:
//!
//! | Type | Trait | Service |
//! |------|-------|---------|
//! | [`SqsQueue`] | [`MessageQueue`](queue_framework::MessageQueue) | SQS |
//! | [`DynamoStore`] | [`RecordStore`](queue_framework::RecordStore) | DynamoDB |
//!
//! Both clients share one [`SdkConfig`](aws_config::SdkConfig) built by [`load_sdk_config`].

pub mod aws;
pub mod dynamodb;
pub mod sqs;

pub use aws::load_sdk_config;
pub use dynamodb::DynamoStore;
pub use sqs::SqsQueue;
